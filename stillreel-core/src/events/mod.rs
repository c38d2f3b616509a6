use crate::pipeline::JobStage;
use std::sync::Arc;
use std::time::Duration;

pub mod json_handler;

pub use json_handler::JsonEventHandler;

#[derive(Debug, Clone)]
pub enum Event {
    // Job lifecycle events
    JobStarted {
        audio_path: String,
        image_count: usize,
    },

    StageChanged {
        stage: JobStage,
    },

    // Synthesis events, emitted in completion order
    SegmentEncoded {
        index: usize,
        total: usize,
    },

    JobCompleted {
        output_path: String,
        filename: String,
        duration_secs: f64,
        segment_count: usize,
        elapsed: Duration,
    },

    JobFailed {
        stage: Option<JobStage>,
        message: String,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn has_handlers(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl EventHandler for Recorder {
        fn handle(&self, event: &Event) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_dispatch_reaches_every_handler() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let mut dispatcher = EventDispatcher::new();
        assert!(!dispatcher.has_handlers());
        dispatcher.add_handler(first.clone());
        dispatcher.add_handler(second.clone());

        dispatcher.emit(Event::SegmentEncoded { index: 0, total: 2 });
        dispatcher.emit(Event::StageChanged {
            stage: JobStage::Assembling,
        });

        assert_eq!(first.events.lock().unwrap().len(), 2);
        assert_eq!(second.events.lock().unwrap().len(), 2);
    }
}
