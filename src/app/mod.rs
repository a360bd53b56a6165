//! Application layer: preferences, import contexts, the current work and
//! background imports.
//!
//! ```no_run
//! use resip::app::{AppState, FixedTmpDirPolicy, ImportContext, ImportRunner, Prefs};
//! use std::sync::Arc;
//!
//! # fn main() -> resip::Result<()> {
//! let prefs = Prefs::load("resip.yaml".as_ref())?;
//! let context = ImportContext::sip("transfer.zip");
//! let state = AppState::shared(prefs);
//! let runner = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Clean));
//! let report = runner.start(context)?.join()?;
//! println!("{}", report.final_line);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod edit;
pub mod import_thread;
pub mod prefs;
pub mod tmpdir;
pub mod work;

pub use context::ImportContext;
pub use import_thread::{ImportHandle, ImportReport, ImportRunner, ImportStatus};
pub use prefs::Prefs;
pub use tmpdir::{FixedTmpDirPolicy, TmpDirDecision, TmpDirResolver};
pub use work::{AppState, ExportContext, SharedAppState, Work};
