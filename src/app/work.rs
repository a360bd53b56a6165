//! The package being worked on and the application state holding it.

use crate::app::context::ImportContext;
use crate::app::prefs::Prefs;
use crate::core::{DataObjectPackage, GlobalMetadata};
use crate::inout::ImportOutcome;
use parking_lot::Mutex;
use std::sync::Arc;

/// What an export writes around the package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportContext {
    pub global_metadata: GlobalMetadata,
}

/// A normalized package with the context it came from.
#[derive(Debug, Clone)]
pub struct Work {
    pub creation_context: ImportContext,
    pub package: DataObjectPackage,
    pub export_context: ExportContext,
    /// Summary of the import that built the package
    pub summary: String,
}

impl Work {
    /// Work built from a normalized import outcome.
    pub fn from_import(creation_context: ImportContext, outcome: ImportOutcome) -> Self {
        Self {
            creation_context,
            package: outcome.package,
            export_context: ExportContext {
                global_metadata: outcome.global_metadata.unwrap_or_default(),
            },
            summary: outcome.summary,
        }
    }
}

/// State shared between the caller and import workers.
#[derive(Debug, Default)]
pub struct AppState {
    pub prefs: Prefs,
    work: Option<Work>,
}

/// Handle on the application state.
pub type SharedAppState = Arc<Mutex<AppState>>;

impl AppState {
    pub fn new(prefs: Prefs) -> Self {
        Self { prefs, work: None }
    }

    pub fn shared(prefs: Prefs) -> SharedAppState {
        Arc::new(Mutex::new(Self::new(prefs)))
    }

    pub fn work(&self) -> Option<&Work> {
        self.work.as_ref()
    }

    pub fn work_mut(&mut self) -> Option<&mut Work> {
        self.work.as_mut()
    }

    /// Install `work` as the current one, returning the previous work.
    pub fn set_work(&mut self, work: Work) -> Option<Work> {
        tracing::debug!(summary = %work.summary, "Current work replaced");
        self.work.replace(work)
    }

    pub fn take_work(&mut self) -> Option<Work> {
        self.work.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_work_returns_previous() {
        let outcome = |summary: &str| ImportOutcome {
            package: DataObjectPackage::new(),
            global_metadata: None,
            summary: summary.to_string(),
        };
        let mut state = AppState::default();
        assert!(state.work().is_none());
        state.set_work(Work::from_import(ImportContext::sip("a.zip"), outcome("first")));
        let previous = state.set_work(Work::from_import(ImportContext::sip("b.zip"), outcome("second")));
        assert_eq!(previous.unwrap().summary, "first");
        assert_eq!(state.work().unwrap().summary, "second");
        assert_eq!(state.work().unwrap().export_context, ExportContext::default());
    }
}
