// ─── Task Pipeline ───
// Ordered steps over one mutable state value. A step may fan a list of items
// out through `StepScope::parallel_map` with a bounded number in flight.

pub mod events;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

pub use events::{EventSink, NullSink, PipelineEvent, RecordingSink};

/// How many sub-map items a step lets run at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Concurrency {
    #[default]
    Unbounded,
    Limited(usize),
}

impl Concurrency {
    fn limit(self, items: usize) -> usize {
        match self {
            Concurrency::Unbounded => items.max(1),
            Concurrency::Limited(n) => n.max(1),
        }
    }
}

/// One unit of pipeline work.
#[async_trait]
pub trait Step<S: Send>: Send + Sync {
    /// Shown in progress output; may depend on what earlier steps resolved.
    fn description(&self, state: &S) -> String;

    fn concurrency(&self) -> Concurrency {
        Concurrency::Unbounded
    }

    async fn run(&self, state: &mut S, scope: &StepScope<'_>) -> LauncherResult<()>;
}

/// Handle a running step uses to fan out work and report item progress.
pub struct StepScope<'a> {
    index: usize,
    concurrency: Concurrency,
    events: &'a dyn EventSink,
}

impl<'a> StepScope<'a> {
    pub fn new(index: usize, concurrency: Concurrency, events: &'a dyn EventSink) -> Self {
        Self {
            index,
            concurrency,
            events,
        }
    }

    /// Run `action` over every item, at most `concurrency` at a time.
    ///
    /// The first failure stops new items from starting. Items already in
    /// flight finish and their results are dropped; the first error is
    /// returned. Successful results come back in completion order.
    pub async fn parallel_map<I, T, F, Fut>(&self, items: Vec<I>, action: F) -> LauncherResult<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> Fut + Sync,
        Fut: Future<Output = LauncherResult<T>> + Send,
    {
        let total = items.len();
        let limit = self.concurrency.limit(total);
        let aborted = AtomicBool::new(false);

        debug!("Step {}: {} items, {} in flight", self.index, total, limit);

        let action = &action;
        let aborted_ref = &aborted;
        let mut outcomes = stream::iter(items)
            .map(move |item| async move {
                if aborted_ref.load(Ordering::SeqCst) {
                    return None;
                }
                Some(action(item).await)
            })
            .buffer_unordered(limit);

        let mut results = Vec::with_capacity(total);
        let mut first_error: Option<LauncherError> = None;

        while let Some(outcome) = outcomes.next().await {
            match outcome {
                Some(Ok(value)) if first_error.is_none() => {
                    results.push(value);
                    self.events.emit(PipelineEvent::ItemFinished {
                        step: self.index,
                        completed: results.len(),
                        total,
                    });
                }
                Some(Err(e)) if first_error.is_none() => {
                    aborted.store(true, Ordering::SeqCst);
                    first_error = Some(e);
                }
                // Skipped after abort, or finished after the first failure.
                _ => {}
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}

/// An ordered list of steps over state `S`.
pub struct Pipeline<S> {
    steps: Vec<Box<dyn Step<S>>>,
}

impl<S: Send> Default for Pipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send> Pipeline<S> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn step(mut self, step: impl Step<S> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order. The first failing step aborts the run.
    pub async fn run(&self, state: &mut S, events: &dyn EventSink) -> LauncherResult<()> {
        let total = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            let description = step.description(state);
            info!("[{}/{}] {}", index, total, description);

            events.emit(PipelineEvent::StepStarted {
                index,
                total,
                description: description.clone(),
            });

            let scope = StepScope::new(index, step.concurrency(), events);
            step.run(state, &scope)
                .await
                .map_err(|source| LauncherError::StepFailed {
                    index,
                    description,
                    source: Box::new(source),
                })?;
        }

        events.emit(PipelineEvent::Finished);
        Ok(())
    }
}
