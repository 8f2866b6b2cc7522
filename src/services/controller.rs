use std::sync::Arc;

use crate::clients::Backend;
use crate::error::AppError;
use crate::models::{AnalyzeRequest, UploadedFile};
use crate::render::charts::{rerender, ChartKind, ChartQuery, Figure};
use crate::services::ingest::{validate_batch, CandidateFile, FileSource};
use crate::services::selection::SelectedColumns;
use crate::state::{Batch, Store, ViewState};

/// Drives the upload → analyze phases against the backend and keeps the
/// single view state current.
pub struct Dashboard {
    store: Store,
    backend: Arc<dyn Backend>,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            store: Store::new(),
            backend,
        }
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.store.snapshot()
    }

    /// Validates the whole batch before anything is sent. On any failure the
    /// current state is left as it was.
    pub async fn upload(
        &self,
        source: FileSource,
        candidates: Vec<CandidateFile>,
    ) -> Result<Arc<ViewState>, AppError> {
        let batch = validate_batch(candidates)?;
        tracing::info!(
            "Accepted {} files from {:?}: {:?}",
            batch.len(),
            source,
            batch.names().collect::<Vec<_>>()
        );

        let _guard = self.store.begin_request()?;
        let files = self.backend.upload(batch).await?;
        check_unique_filenames(&files)?;

        Ok(self.store.replace(ViewState::loaded(files)))
    }

    /// `toggled` holds the submitted `(toggle id, column)` pairs. An empty
    /// selection is rejected without contacting the backend.
    pub async fn analyze(&self, toggled: Vec<(String, String)>) -> Result<Arc<ViewState>, AppError> {
        Self::selection_in(&self.store.snapshot(), toggled.iter().cloned())?;
        let _guard = self.store.begin_request()?;

        // Re-read under the guard; an upload may have landed in between.
        let current = self.store.snapshot();
        let (batch, selected) = Self::selection_in(&current, toggled)?;

        let request = AnalyzeRequest {
            files: batch.filenames(),
            columns: selected.as_slice().to_vec(),
        };

        let outcome = match self.backend.analyze(&request).await {
            Ok(result) => result.check_disjoint().map(|_| result).map_err(AppError::Backend),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => Ok(self.store.replace(current.analyzed(selected, result)?)),
            Err(e) => {
                tracing::warn!("Analysis failed, clearing visualizations: {}", e);
                self.store.replace(current.without_analysis(selected));
                Err(e)
            }
        }
    }

    fn selection_in<I>(
        state: &ViewState,
        toggled: I,
    ) -> Result<(&Arc<Batch>, SelectedColumns), AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let batch = state
            .batch()
            .ok_or_else(|| AppError::validation("Upload files before analyzing"))?;
        let selected = batch.universe.read_selection(toggled)?;
        Ok((batch, selected))
    }

    /// Redraws a single chart from the analysis already held.
    pub fn chart(&self, kind: ChartKind, query: &ChartQuery) -> Result<Figure, AppError> {
        let current = self.store.snapshot();
        match (current.batch(), current.analysis()) {
            (Some(batch), Some(analysis)) => rerender(kind, query, &batch.files, &analysis.result),
            _ => Err(AppError::validation("Run an analysis before changing charts")),
        }
    }
}

fn check_unique_filenames(files: &[UploadedFile]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    match files.iter().find(|f| !seen.insert(f.filename.as_str())) {
        Some(dup) => Err(AppError::Backend(format!(
            "Duplicate file name {} in upload response",
            dup.filename
        ))),
        None => Ok(()),
    }
}
