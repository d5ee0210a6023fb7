//! Named fetch-then-callback pipelines.
//!
//! A pipeline is an ordered list of steps. Executing it fetches each step's
//! URL in registration order and hands the parsed body to the step's
//! callback. Steps are awaited one by one, so a later callback can rely on
//! an earlier one having populated state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::EngineResult;
use crate::source::{DataSource, Notifier};
use crate::types::Params;

/// Callback receiving a step's parsed response body.
pub type StepCallback<C> = dyn Fn(&mut C, Value) -> EngineResult<()> + Send + Sync;

/// Wrap a closure as a step callback.
///
/// Keep the returned `Arc` to register the same callback elsewhere; a
/// second registration under the same pipeline name is rejected.
pub fn step_callback<C, F>(f: F) -> Arc<StepCallback<C>>
where
    F: Fn(&mut C, Value) -> EngineResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One fetch + callback step.
pub struct PipelineStep<C> {
    pub url: String,
    pub callback: Arc<StepCallback<C>>,
}

impl<C> Clone for PipelineStep<C> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<C> fmt::Debug for PipelineStep<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStep")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Registry and executor of named pipelines.
pub struct Pipeline<C> {
    default_url: String,
    steps: RwLock<HashMap<String, Vec<PipelineStep<C>>>>,
    source: Arc<dyn DataSource>,
    notifier: Arc<dyn Notifier>,
}

impl<C> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("default_url", &self.default_url)
            .field("pipelines", &self.steps.read().len())
            .finish_non_exhaustive()
    }
}

impl<C> Pipeline<C> {
    /// Create a pipeline registry. Steps added without a URL use `default_url`.
    pub fn new(
        default_url: impl Into<String>,
        source: Arc<dyn DataSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            default_url: default_url.into(),
            steps: RwLock::new(HashMap::new()),
            source,
            notifier,
        }
    }

    /// Append a step to the pipeline `name`.
    ///
    /// Returns `false` (and logs) when the same callback is already
    /// registered under `name`, or when no URL is available.
    pub fn add_step(&self, name: &str, callback: Arc<StepCallback<C>>, url: Option<&str>) -> bool {
        let url = url.unwrap_or(&self.default_url);
        if url.is_empty() {
            warn!(pipeline = %name, "pipeline step has no url; ignoring");
            return false;
        }

        let mut steps = self.steps.write();
        let list = steps.entry(name.to_string()).or_default();
        let duplicate = list
            .iter()
            .any(|s| std::ptr::addr_eq(Arc::as_ptr(&s.callback), Arc::as_ptr(&callback)));
        if duplicate {
            warn!(pipeline = %name, url = %url, "duplicate pipeline step ignored");
            return false;
        }

        list.push(PipelineStep {
            url: url.to_string(),
            callback,
        });
        debug!(pipeline = %name, url = %url, steps = list.len(), "pipeline step added");
        true
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.steps
            .read()
            .get(name)
            .is_some_and(|list| !list.is_empty())
    }

    pub fn count_event_steps(&self, name: &str) -> usize {
        self.steps.read().get(name).map(|v| v.len()).unwrap_or(0)
    }

    fn snapshot(&self, name: &str) -> Vec<PipelineStep<C>> {
        self.steps.read().get(name).cloned().unwrap_or_default()
    }

    /// Run every step of `name` in order.
    ///
    /// The first failed fetch notifies the user, skips the remaining steps
    /// and is returned. Callbacks that already ran keep their effects.
    pub async fn execute(&self, name: &str, context: &mut C) -> EngineResult<()> {
        let steps = self.snapshot(name);
        if steps.is_empty() {
            debug!(pipeline = %name, "no steps registered for pipeline");
            return Ok(());
        }

        for (index, step) in steps.iter().enumerate() {
            let body = match self.source.fetch(&step.url, &Params::new()).await {
                Ok(body) => body,
                Err(e) => {
                    error!(
                        pipeline = %name,
                        step = index,
                        url = %step.url,
                        error = %e,
                        "pipeline step failed; aborting remaining steps"
                    );
                    self.notifier
                        .notify(&format!("Failed to load data from {}: {e}", step.url));
                    return Err(e);
                }
            };
            (step.callback)(context, body)?;
        }

        info!(pipeline = %name, steps = steps.len(), "pipeline complete");
        Ok(())
    }
}
