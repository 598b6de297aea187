//! The conversion workflow controller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, OnceCell, RwLock};
use tracing::{debug, error, info, warn};

use crate::engine::{Engine, EngineError, MediaInfo};

use super::error::WorkflowError;
use super::recipe::{Recipe, RecipeInput};
use super::types::{ConversionOutput, FailureReport, InputSlot, SelectedFile, WorkflowSnapshot};

/// Buffer size for engine progress updates.
const PROGRESS_BUFFER_SIZE: usize = 16;

/// Drives one fixed conversion recipe against an engine it owns.
///
/// At most one conversion runs at a time; the engine is loaded on the first
/// conversion and kept for the lifetime of the workflow.
pub struct Workflow {
    recipe: &'static Recipe,
    engine: Arc<dyn Engine>,
    ready: OnceCell<()>,
    busy: AtomicBool,
    state: RwLock<WorkflowState>,
}

#[derive(Default)]
struct WorkflowState {
    selections: HashMap<InputSlot, SelectedFile>,
    progress: Option<f32>,
    result: Option<ConversionOutput>,
    last_error: Option<FailureReport>,
}

impl Workflow {
    pub fn new(recipe: &'static Recipe, engine: Arc<dyn Engine>) -> Self {
        Self {
            recipe,
            engine,
            ready: OnceCell::new(),
            busy: AtomicBool::new(false),
            state: RwLock::new(WorkflowState::default()),
        }
    }

    pub fn recipe(&self) -> &'static Recipe {
        self.recipe
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_engine_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Replaces the file of a slot. `None` keeps the current selection.
    pub async fn select(
        &self,
        slot: InputSlot,
        file: Option<SelectedFile>,
    ) -> Result<(), WorkflowError> {
        if !self.recipe.accepts(slot) {
            return Err(WorkflowError::UnsupportedSlot { slot });
        }
        self.store_selection(slot, file).await;
        Ok(())
    }

    pub(crate) async fn store_selection(&self, slot: InputSlot, file: Option<SelectedFile>) {
        let Some(file) = file else {
            return;
        };
        debug!(
            workflow = self.recipe.id,
            slot = %slot,
            name = %file.name,
            size_bytes = file.size_bytes(),
            "Input selected"
        );
        self.state.write().await.selections.insert(slot, file);
    }

    pub async fn selection(&self, slot: InputSlot) -> Option<SelectedFile> {
        self.state.read().await.selections.get(&slot).cloned()
    }

    /// The current result, if a conversion has succeeded.
    pub async fn download(&self) -> Option<ConversionOutput> {
        self.state.read().await.result.clone()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let busy = self.is_busy();
        let state = self.state.read().await;

        let selections = self
            .recipe
            .inputs
            .iter()
            .filter_map(|i| state.selections.get(&i.slot).map(|f| f.summary(i.slot)))
            .collect();
        let missing = self
            .recipe
            .inputs
            .iter()
            .filter(|i| !state.selections.contains_key(&i.slot))
            .map(|i| i.slot)
            .collect();

        WorkflowSnapshot {
            workflow: self.recipe.id,
            title: self.recipe.title,
            busy,
            engine_ready: self.is_engine_ready(),
            progress: if busy { state.progress } else { None },
            selections,
            missing,
            result: state.result.as_ref().map(|r| r.summary()),
            last_error: state.last_error.clone(),
        }
    }

    /// Runs the recipe on the selected inputs.
    ///
    /// Refused with `MissingInput` or `Busy` without touching any state. A
    /// failed attempt is recorded as the last error and leaves the previous
    /// result in place.
    pub async fn convert(&self) -> Result<ConversionOutput, WorkflowError> {
        let inputs = self.collect_inputs().await?;
        let _busy = BusyGuard::acquire(&self.busy).ok_or(WorkflowError::Busy)?;

        {
            let mut state = self.state.write().await;
            state.last_error = None;
            state.progress = Some(0.0);
        }

        let start = Instant::now();
        info!(workflow = self.recipe.id, "Conversion started");

        let mut scratch = ScratchGuard::new(Arc::clone(&self.engine));
        let outcome = self.run_pipeline(&inputs, &mut scratch).await;
        scratch.release().await;

        let mut state = self.state.write().await;
        state.progress = None;

        match outcome {
            Ok(bytes) => {
                let output =
                    ConversionOutput::new(self.recipe.output_name, self.recipe.output_mime, bytes);
                info!(
                    workflow = self.recipe.id,
                    output_id = %output.id,
                    size_bytes = output.size_bytes(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Conversion finished"
                );
                state.result = Some(output.clone());
                Ok(output)
            }
            Err(e) => {
                error!(
                    workflow = self.recipe.id,
                    kind = ?e.failure_kind(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Conversion failed: {}",
                    e
                );
                if let Some(stderr) = engine_stderr(&e) {
                    debug!(workflow = self.recipe.id, stderr = %stderr, "Engine output");
                }
                state.last_error = e.report();
                Err(e)
            }
        }
    }

    async fn collect_inputs(&self) -> Result<Vec<(RecipeInput, SelectedFile)>, WorkflowError> {
        let state = self.state.read().await;
        self.recipe
            .inputs
            .iter()
            .map(|input| {
                state
                    .selections
                    .get(&input.slot)
                    .cloned()
                    .map(|file| (*input, file))
                    .ok_or(WorkflowError::MissingInput { slot: input.slot })
            })
            .collect()
    }

    /// Loads the engine once. A failed load leaves the workflow unready so the
    /// next conversion tries again.
    async fn ensure_engine(&self) -> Result<(), WorkflowError> {
        self.ready
            .get_or_try_init(|| async {
                info!(
                    workflow = self.recipe.id,
                    engine = self.engine.name(),
                    "Loading engine"
                );
                self.engine.load().await
            })
            .await
            .map(|_| ())
            .map_err(WorkflowError::EngineLoad)
    }

    async fn run_pipeline(
        &self,
        inputs: &[(RecipeInput, SelectedFile)],
        scratch: &mut ScratchGuard,
    ) -> Result<Vec<u8>, WorkflowError> {
        self.ensure_engine().await?;

        for (input, file) in inputs {
            scratch.track(input.scratch_name);
            self.engine
                .write_file(input.scratch_name, file.data())
                .await
                .map_err(WorkflowError::Storage)?;
        }

        let timing = self.probe_slot(self.recipe.timing_slot).await?;

        if let Some(slot) = self.recipe.requires_audio {
            let has_audio = if slot == self.recipe.timing_slot {
                timing.has_audio()
            } else {
                self.probe_slot(slot).await?.has_audio()
            };
            if !has_audio {
                return Err(WorkflowError::NoAudioTrack { slot });
            }
        }

        let expected = (timing.duration_secs > 0.0).then_some(timing.duration_secs);
        scratch.track(self.recipe.output_name);
        self.exec_with_progress(expected).await?;

        let bytes = self
            .engine
            .read_file(self.recipe.output_name)
            .await
            .map_err(WorkflowError::Storage)?;

        if bytes.is_empty() {
            return Err(WorkflowError::EmptyOutput {
                output: self.recipe.output_name,
            });
        }
        Ok(bytes)
    }

    async fn probe_slot(&self, slot: InputSlot) -> Result<MediaInfo, WorkflowError> {
        let Some(input) = self.recipe.input(slot) else {
            return Err(WorkflowError::UnsupportedSlot { slot });
        };

        self.engine
            .probe(input.scratch_name)
            .await
            .map_err(|e| match e {
                EngineError::FileNotFound { .. } | EngineError::Io(_) => WorkflowError::Storage(e),
                e if e.is_invalid_input() => WorkflowError::InvalidInput {
                    slot: Some(slot),
                    source: e,
                },
                e => WorkflowError::Execution(e),
            })
    }

    async fn exec_with_progress(&self, expected: Option<f64>) -> Result<(), WorkflowError> {
        let (tx, mut rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);

        let exec = self
            .engine
            .exec(self.recipe.exec_request(expected), Some(tx));
        let forward = async {
            while let Some(progress) = rx.recv().await {
                self.state.write().await.progress = Some(progress.percent);
            }
        };

        let (result, ()) = tokio::join!(exec, forward);

        result.map_err(|e| match self.recipe.requires_audio {
            Some(slot) if e.is_missing_stream() => WorkflowError::NoAudioTrack { slot },
            _ if e.is_invalid_input() => WorkflowError::InvalidInput {
                slot: None,
                source: e,
            },
            _ => WorkflowError::Execution(e),
        })
    }
}

fn engine_stderr(e: &WorkflowError) -> Option<&str> {
    match e {
        WorkflowError::Execution(source) | WorkflowError::InvalidInput { source, .. } => {
            source.stderr()
        }
        _ => None,
    }
}

/// Holds the busy flag for the duration of one attempt.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Scratch files written during one attempt.
///
/// `release` removes them. If the guard is dropped unreleased (the driving
/// future was cancelled) removal is spawned on the current runtime.
struct ScratchGuard {
    engine: Arc<dyn Engine>,
    names: Vec<&'static str>,
}

impl ScratchGuard {
    fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            names: Vec::new(),
        }
    }

    fn track(&mut self, name: &'static str) {
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    async fn release(mut self) {
        let names = std::mem::take(&mut self.names);
        remove_all(self.engine.as_ref(), &names).await;
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        if self.names.is_empty() {
            return;
        }
        let names = std::mem::take(&mut self.names);
        let engine = Arc::clone(&self.engine);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { remove_all(engine.as_ref(), &names).await });
            }
            Err(_) => warn!(files = ?names, "No runtime to remove scratch files"),
        }
    }
}

async fn remove_all(engine: &dyn Engine, names: &[&'static str]) {
    for name in names {
        match engine.delete_file(name).await {
            Ok(()) | Err(EngineError::FileNotFound { .. }) => {}
            Err(e) => warn!(file = name, "Failed to remove scratch file: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_is_exclusive() {
        let flag = AtomicBool::new(false);
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(BusyGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(BusyGuard::acquire(&flag).is_some());
    }
}
