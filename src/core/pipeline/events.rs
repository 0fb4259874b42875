use std::sync::Mutex;

/// Progress notifications emitted while a pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StepStarted {
        index: usize,
        total: usize,
        description: String,
    },
    /// One item of a step's parallel sub-map completed.
    ItemFinished {
        step: usize,
        completed: usize,
        total: usize,
    },
    Finished,
}

/// Receives pipeline events. Failing to observe an event never affects the run.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

impl<F> EventSink for F
where
    F: Fn(PipelineEvent) + Send + Sync,
{
    fn emit(&self, event: PipelineEvent) {
        self(event)
    }
}

/// Keeps every event in memory; used by tests and callers that replay progress.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
