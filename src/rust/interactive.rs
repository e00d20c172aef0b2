//! Read-classify-print loop over console input.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use log::info;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::artifact::ModelStore;
use crate::classifier::{ClassPrediction, ClassifierError, Model};
use crate::config::PredictionView;
use crate::data::ClassificationRecord;
use crate::prediction::{load_or_reuse, predict_and_report};

pub const PROMPT: &str = "Please enter another string to classify or just <Enter> to exit the program.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Terminated,
}

/// Holds the one model of a prediction session. The artifact is read on
/// first use only; every later classification reuses it.
pub struct InteractiveSession<S: ModelStore> {
    store: S,
    model_path: PathBuf,
    model: Option<Arc<Model>>,
    view: PredictionView,
    state: LoopState,
}

impl<S: ModelStore> InteractiveSession<S> {
    pub fn new(store: S, model_path: impl Into<PathBuf>, view: PredictionView) -> Self {
        Self {
            store,
            model_path: model_path.into(),
            model: None,
            view,
            state: LoopState::AwaitingInput,
        }
    }

    /// Starts the session with a model that is already in memory.
    pub fn with_model(mut self, model: Arc<Model>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// Loads the model if needed, then classifies and prints `records`.
    pub fn classify<W: Write>(
        &mut self,
        records: &[ClassificationRecord],
        out: &mut W,
    ) -> Result<Vec<ClassPrediction>, ClassifierError> {
        let model = load_or_reuse(&self.store, &self.model_path, self.model.take())?;
        let predictions = predict_and_report(&model, records, self.view, out);
        self.model = Some(model);
        predictions
    }

    /// Classifies one line at a time until an empty line or end of input.
    /// Returns the number of lines classified.
    pub async fn run<R, W>(&mut self, mut input: R, out: &mut W) -> Result<usize, ClassifierError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut classified = 0;
        let mut buf = Vec::new();
        while self.state == LoopState::AwaitingInput {
            buf.clear();
            let read = input.read_until(b'\n', &mut buf).await?;
            // Invalid UTF-8 is replaced, never rejected
            let line = String::from_utf8_lossy(&buf);
            let text = line.trim_end_matches(&['\n', '\r'][..]);
            if read == 0 || text.is_empty() {
                self.state = LoopState::Terminated;
                break;
            }
            self.classify(&[ClassificationRecord::unlabeled(text)], out)?;
            classified += 1;
        }
        info!("Interactive loop finished after {} classifications", classified);
        Ok(classified)
    }
}

/// Prints `message` and waits for one line (or end of input).
pub async fn wait_for_enter<R, W>(message: &str, mut input: R, out: &mut W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", message)?;
    out.flush()?;
    let mut buf = Vec::new();
    input.read_until(b'\n', &mut buf).await?;
    Ok(())
}
