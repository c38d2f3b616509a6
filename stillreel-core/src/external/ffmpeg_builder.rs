//! Filter graph construction for segment encodes.
//!
//! Segment synthesis always chains the same three filters: fill the frame,
//! crop to the exact output geometry, then apply the zoom/pan motion.

/// Builder for constructing comma-separated video filter chains.
#[derive(Debug, Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    /// Creates a new empty filter chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scales so the image covers `width`x`height`, keeping aspect ratio.
    #[must_use]
    pub fn add_scale_to_fill(mut self, width: u32, height: u32) -> Self {
        self.filters.push(format!(
            "scale={width}:{height}:force_original_aspect_ratio=increase"
        ));
        self
    }

    /// Center crop to exactly `width`x`height`.
    #[must_use]
    pub fn add_center_crop(mut self, width: u32, height: u32) -> Self {
        self.filters.push(format!("crop={width}:{height}"));
        self
    }

    /// Zoom that grows by `zoom_step` per output frame up to `max_zoom`,
    /// with the crop window recentred every frame.
    #[must_use]
    pub fn add_center_zoom(
        mut self,
        zoom_step: f64,
        max_zoom: f64,
        frame_count: u32,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Self {
        self.filters.push(format!(
            "zoompan=z='min(1+{zoom_step}*on,{max_zoom})':d={frame_count}:\
             x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={width}x{height}:fps={frame_rate}"
        ));
        self
    }

    /// Joins the chain into a single `-vf` argument.
    #[must_use]
    pub fn build(self) -> String {
        self.filters.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_filter_has_no_separator() {
        assert_eq!(
            VideoFilterChain::new().add_center_crop(720, 1280).build(),
            "crop=720:1280"
        );
    }

    #[test]
    fn test_full_motion_chain() {
        let chain = VideoFilterChain::new()
            .add_scale_to_fill(1080, 1920)
            .add_center_crop(1080, 1920)
            .add_center_zoom(0.002, 1.3, 90, 1080, 1920, 30)
            .build();

        assert_eq!(
            chain,
            "scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,\
             zoompan=z='min(1+0.002*on,1.3)':d=90:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s=1080x1920:fps=30"
        );
    }
}
