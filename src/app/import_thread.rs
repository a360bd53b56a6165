//! Background import runs.
//!
//! An [`ImportRunner`] runs one import at a time on a worker thread: it
//! resolves the extraction directory, runs the importer chosen by the
//! [`ImportContext`], normalizes the package and only then installs it as
//! the current [`Work`]. A failed or cancelled run leaves the application
//! state untouched.

use crate::app::context::ImportContext;
use crate::app::tmpdir::{TmpDirResolver, tmp_dir_target};
use crate::app::work::{SharedAppState, Work};
use crate::common::{Error, ProgressLevel, ProgressLogger, ProgressSink, Result};
use crate::core::vitam_normalize;
use crate::mailextract::MailExtractor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Final line of a cancelled run.
pub const CANCELLED_LINE: &str = "-> data was not modified.";
/// Final line of a failed run.
pub const FAILED_LINE: &str = "-> Error during import, data was not modified.";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Succeeded,
    Cancelled,
    Failed,
}

/// Outcome of a finished run.
#[derive(Debug)]
pub struct ImportReport {
    pub status: ImportStatus,
    /// Last line sent to the progress sink
    pub final_line: String,
    /// Cause of a failed or cancelled run
    pub error: Option<Error>,
}

/// Mutual exclusion of import runs.
#[derive(Debug, Clone, Default)]
struct ImportGate(Arc<AtomicBool>);

/// Proof of a running import, releasing the gate when dropped.
#[derive(Debug)]
struct GateToken(Arc<AtomicBool>);

impl ImportGate {
    fn try_acquire(&self) -> Option<GateToken> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateToken(Arc::clone(&self.0)))
    }

    fn is_taken(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for GateToken {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Starts imports into a shared application state.
pub struct ImportRunner {
    state: SharedAppState,
    gate: ImportGate,
    resolver: Arc<dyn TmpDirResolver>,
    mail_extractor: Option<Arc<dyn MailExtractor>>,
    sink: Option<ProgressSink>,
    level: ProgressLevel,
}

impl ImportRunner {
    pub fn new(state: SharedAppState, resolver: Arc<dyn TmpDirResolver>) -> Self {
        Self {
            state,
            gate: ImportGate::default(),
            resolver,
            mail_extractor: None,
            sink: None,
            level: ProgressLevel::ObjectsGroup,
        }
    }

    pub fn with_mail_extractor(mut self, extractor: Arc<dyn MailExtractor>) -> Self {
        self.mail_extractor = Some(extractor);
        self
    }

    /// Send progress lines up to `level` to `sink`.
    pub fn with_progress_sink(mut self, level: ProgressLevel, sink: ProgressSink) -> Self {
        self.level = level;
        self.sink = Some(sink);
        self
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_taken()
    }

    /// Start importing `context` on a worker thread.
    ///
    /// Fails with [`Error::ImportInProgress`] while another run is going on.
    pub fn start(&self, context: ImportContext) -> Result<ImportHandle> {
        let token = self.gate.try_acquire().ok_or(Error::ImportInProgress)?;
        let (work_dir, step) = {
            let state = self.state.lock();
            (state.prefs.work_dir.clone(), state.prefs.progress_step)
        };
        let mut progress = ProgressLogger::new(self.level, step);
        if let Some(sink) = &self.sink {
            progress = progress.with_sink(Arc::clone(sink));
        }

        let run = ImportRun {
            context,
            work_dir,
            state: Arc::clone(&self.state),
            resolver: Arc::clone(&self.resolver),
            mail_extractor: self.mail_extractor.clone(),
            progress: progress.clone(),
        };
        tracing::debug!(kind = run.context.description(), "Import started");
        let thread = std::thread::Builder::new()
            .name("resip-import".to_string())
            .spawn(move || {
                let _token = token;
                run.execute()
            })?;
        Ok(ImportHandle { thread, progress })
    }
}

/// Handle on a running import.
pub struct ImportHandle {
    thread: JoinHandle<ImportReport>,
    progress: ProgressLogger,
}

impl ImportHandle {
    /// Ask the run to stop at its next progress check.
    pub fn cancel(&self) {
        tracing::debug!("Import cancellation requested");
        self.progress.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the end of the run.
    pub fn join(self) -> Result<ImportReport> {
        self.thread
            .join()
            .map_err(|_| Error::Other("Import worker panicked".to_string()))
    }
}

struct ImportRun {
    context: ImportContext,
    work_dir: std::path::PathBuf,
    state: SharedAppState,
    resolver: Arc<dyn TmpDirResolver>,
    mail_extractor: Option<Arc<dyn MailExtractor>>,
    progress: ProgressLogger,
}

impl ImportRun {
    fn build_work(&self) -> Result<Work> {
        let target = match self.context.on_disk_input() {
            Some(source) => Some(tmp_dir_target(&self.work_dir, source, self.resolver.as_ref())?),
            None => None,
        };
        let mut importer = self
            .context
            .build_importer(target.as_deref(), self.mail_extractor.clone())?;
        let mut outcome = importer.do_import(&self.progress)?;
        let normalized = vitam_normalize(&mut outcome.package, &self.progress)?;
        outcome.summary = format!("{}\n{}", outcome.summary, normalized);
        Ok(Work::from_import(self.context.clone(), outcome))
    }

    fn execute(self) -> ImportReport {
        let result = self.build_work().and_then(|work| {
            // Last chance for a cancel to win over the install
            self.progress.check_interrupt()?;
            let summary = work.summary.clone();
            let mut state = self.state.lock();
            state.set_work(work);
            if let Some(dir) = self.context.import_dir() {
                state.prefs.import_dir = Some(dir);
            }
            Ok(summary)
        });
        let report = match result {
            Ok(summary) => ImportReport {
                status: ImportStatus::Succeeded,
                final_line: format!("-> {}", summary),
                error: None,
            },
            Err(e) if e.is_cancellation() => {
                tracing::debug!(error = %e, "Import cancelled");
                ImportReport {
                    status: ImportStatus::Cancelled,
                    final_line: CANCELLED_LINE.to_string(),
                    error: Some(e),
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, kind = self.context.description(), "Import failed");
                self.progress
                    .log(ProgressLevel::Global, &format!("Import impossible\n-> {}", e));
                ImportReport {
                    status: ImportStatus::Failed,
                    final_line: FAILED_LINE.to_string(),
                    error: Some(e),
                }
            },
        };
        self.progress.log(ProgressLevel::Global, &report.final_line);
        tracing::debug!(status = ?report.status, "Import finished");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::prefs::Prefs;
    use crate::app::tmpdir::FixedTmpDirPolicy;
    use crate::app::work::AppState;
    use crate::mailextract::{MailExtractError, MailExtractOptions};
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Extractor waiting for a release signal, polling for cancellation.
    struct GatedExtractor {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl MailExtractor for GatedExtractor {
        fn extract(
            &self,
            _options: &MailExtractOptions,
            _source: &Path,
            target: &Path,
            progress: &ProgressLogger,
        ) -> std::result::Result<String, MailExtractError> {
            loop {
                progress.check_interrupt()?;
                match self.release.lock().recv_timeout(Duration::from_millis(10)) {
                    Ok(()) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        return Err(MailExtractError::Extraction("released twice".to_string()));
                    },
                }
            }
            std::fs::write(target.join("message.eml"), "Subject: hi")?;
            Ok("1 message".to_string())
        }
    }

    fn gated_runner(work_dir: &Path) -> (ImportRunner, SharedAppState, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let state = AppState::shared(Prefs {
            work_dir: work_dir.to_path_buf(),
            ..Default::default()
        });
        let runner = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Clean))
            .with_mail_extractor(Arc::new(GatedExtractor { release: Mutex::new(rx) }));
        (runner, state, tx)
    }

    fn mail_context(dir: &Path) -> ImportContext {
        ImportContext::mail(dir.join("box.mbox"), MailExtractOptions::default(), &Prefs::default())
    }

    #[test]
    fn test_second_start_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, state, release) = gated_runner(dir.path());
        let handle = runner.start(mail_context(dir.path())).unwrap();
        assert!(runner.is_running());
        assert!(matches!(runner.start(mail_context(dir.path())), Err(Error::ImportInProgress)));
        assert_eq!(state.lock().prefs.import_dir, None);

        release.send(()).unwrap();
        let report = handle.join().unwrap();
        assert_eq!(report.status, ImportStatus::Succeeded);
        assert!(report.final_line.starts_with("-> 1 message"));
        assert!(!runner.is_running());
        let state = state.lock();
        let work = state.work().unwrap();
        assert_eq!(work.package.binary_data_object_count(), 1);
        assert_eq!(report.final_line, format!("-> {}", work.summary));
        assert_eq!(
            work.summary.lines().last(),
            Some(format!("Normalized package: {}", work.package.description()).as_str())
        );
        assert_eq!(state.prefs.import_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_cancel_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, state, _release) = gated_runner(dir.path());
        let handle = runner.start(mail_context(dir.path())).unwrap();
        handle.cancel();
        let report = handle.join().unwrap();
        assert_eq!(report.status, ImportStatus::Cancelled);
        assert_eq!(report.final_line, CANCELLED_LINE);
        assert!(state.lock().work().is_none());
        assert!(!runner.is_running());
    }

    #[test]
    fn test_failure_logs_and_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let state = AppState::shared(Prefs {
            work_dir: dir.path().join("work"),
            ..Default::default()
        });
        let runner = ImportRunner::new(Arc::clone(&state), Arc::new(FixedTmpDirPolicy::Cancel)).with_progress_sink(
            ProgressLevel::Step,
            Arc::new(move |_, line: &str| sink_lines.lock().push(line.to_string())),
        );

        let report = runner
            .start(ImportContext::sip(dir.path().join("missing.zip")))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(report.status, ImportStatus::Failed);
        assert!(state.lock().work().is_none());
        let lines = lines.lock();
        assert!(lines.iter().any(|l| l.starts_with("Import impossible\n-> ")));
        assert_eq!(lines.last().map(String::as_str), Some(FAILED_LINE));
    }
}
