use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::AppError;
use crate::models::{AnalysisResult, UploadedFile};
use crate::services::selection::{ColumnUniverse, SelectedColumns};

/// Files accepted by the most recent successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub files: Vec<UploadedFile>,
    pub universe: ColumnUniverse,
}

impl Batch {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        let universe = ColumnUniverse::from_files(&files);
        Self { files, universe }
    }

    pub fn filenames(&self) -> Vec<String> {
        self.files.iter().map(|f| f.filename.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub selected: SelectedColumns,
    pub result: AnalysisResult,
}

/// The dashboard's view model. Every transition builds a new value; the page
/// is rendered from whichever value is current.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    #[default]
    Empty,
    FilesLoaded {
        batch: Arc<Batch>,
        selected: Option<SelectedColumns>,
    },
    Analyzed {
        batch: Arc<Batch>,
        analysis: Arc<Analysis>,
    },
}

impl ViewState {
    /// Upload success: the new batch replaces everything, including any
    /// analysis of the previous batch.
    pub fn loaded(files: Vec<UploadedFile>) -> Self {
        if files.is_empty() {
            return ViewState::Empty;
        }
        ViewState::FilesLoaded {
            batch: Arc::new(Batch::new(files)),
            selected: None,
        }
    }

    pub fn analyzed(&self, selected: SelectedColumns, result: AnalysisResult) -> Result<Self, AppError> {
        let batch = self
            .batch()
            .ok_or_else(|| AppError::validation("Upload files before analyzing"))?;
        Ok(ViewState::Analyzed {
            batch: Arc::clone(batch),
            analysis: Arc::new(Analysis { selected, result }),
        })
    }

    /// Analysis failure: drop the charts, keep the batch and the user's
    /// column choice.
    pub fn without_analysis(&self, selected: SelectedColumns) -> Self {
        match self.batch() {
            Some(batch) => ViewState::FilesLoaded {
                batch: Arc::clone(batch),
                selected: Some(selected),
            },
            None => ViewState::Empty,
        }
    }

    pub fn batch(&self) -> Option<&Arc<Batch>> {
        match self {
            ViewState::Empty => None,
            ViewState::FilesLoaded { batch, .. } | ViewState::Analyzed { batch, .. } => Some(batch),
        }
    }

    pub fn analysis(&self) -> Option<&Arc<Analysis>> {
        match self {
            ViewState::Analyzed { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<&SelectedColumns> {
        match self {
            ViewState::Empty => None,
            ViewState::FilesLoaded { selected, .. } => selected.as_ref(),
            ViewState::Analyzed { analysis, .. } => Some(&analysis.selected),
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            ViewState::Empty => "empty",
            ViewState::FilesLoaded { .. } => "files-loaded",
            ViewState::Analyzed { .. } => "analyzed",
        }
    }
}

/// Single holder of the current view state.
pub struct Store {
    current: RwLock<Arc<ViewState>>,
    in_flight: Mutex<()>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ViewState::Empty)),
            in_flight: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.current.read().clone()
    }

    pub fn replace(&self, next: ViewState) -> Arc<ViewState> {
        let next = Arc::new(next);
        let previous = std::mem::replace(&mut *self.current.write(), Arc::clone(&next));
        tracing::debug!("view state {} -> {}", previous.phase_name(), next.phase_name());
        next
    }

    /// Held for the lifetime of one backend request.
    pub fn begin_request(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.in_flight.try_lock().map_err(|_| AppError::Busy)
    }
}
