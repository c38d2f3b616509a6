//! JSON event handler for structured progress output
//!
//! Writes one JSON object per line (NDJSON) for consumption by whatever
//! service drives stillreel as a subprocess.

use super::{Event, EventHandler};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event handler that writes events as JSON lines
pub struct JsonEventHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl Default for JsonEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonEventHandler {
    /// Create a handler writing to stdout
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a handler with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_json(&self, value: serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            if let Ok(json_str) = serde_json::to_string(&value) {
                let _ = writeln!(output, "{}", json_str);
                let _ = output.flush();
            }
        }
    }
}

/// Converts an event into its JSON form.
pub fn event_to_json(event: &Event, timestamp: u64) -> serde_json::Value {
    match event {
        Event::JobStarted {
            audio_path,
            image_count,
        } => json!({
            "type": "job_started",
            "audio_path": audio_path,
            "image_count": image_count,
            "timestamp": timestamp
        }),

        Event::StageChanged { stage } => json!({
            "type": "stage_changed",
            "stage": stage.to_string(),
            "timestamp": timestamp
        }),

        Event::SegmentEncoded { index, total } => json!({
            "type": "segment_encoded",
            "index": index,
            "total": total,
            "timestamp": timestamp
        }),

        Event::JobCompleted {
            output_path,
            filename,
            duration_secs,
            segment_count,
            elapsed,
        } => json!({
            "type": "job_completed",
            "output_path": output_path,
            "filename": filename,
            "duration_seconds": duration_secs,
            "segment_count": segment_count,
            "elapsed_seconds": elapsed.as_secs_f64(),
            "timestamp": timestamp
        }),

        Event::JobFailed { stage, message } => json!({
            "type": "job_failed",
            "stage": stage.map(|s| s.to_string()),
            "message": message,
            "timestamp": timestamp
        }),
    }
}

impl EventHandler for JsonEventHandler {
    fn handle(&self, event: &Event) {
        self.write_json(event_to_json(event, Self::get_timestamp()));
    }
}
