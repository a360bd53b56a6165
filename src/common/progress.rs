//! Progress reporting for long running imports and exports.
//!
//! A [`ProgressLogger`] forwards messages to `tracing` and, up to its
//! configured level, to an optional sink such as a text area. Per-object
//! messages are coalesced with [`ProgressLogger::progress_log_if_step`] so
//! that a sink only sees one line every `step` units of work.
//!
//! The logger also carries the cooperative cancellation flag of a run: once
//! the flag is raised every progress call fails with [`Error::Interrupted`].

use crate::common::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Granularity of a progress message, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProgressLevel {
    /// Start and end of a whole operation
    Global,
    /// Main steps of an operation
    Step,
    /// Batches of objects
    ObjectsGroup,
    /// Warnings about single objects
    ObjectsWarnings,
    /// Single objects
    Objects,
}

impl fmt::Display for ProgressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgressLevel::Global => "global",
            ProgressLevel::Step => "step",
            ProgressLevel::ObjectsGroup => "objects_group",
            ProgressLevel::ObjectsWarnings => "objects_warnings",
            ProgressLevel::Objects => "objects",
        };
        f.write_str(name)
    }
}

/// Callback receiving the progress lines shown to the user.
pub type ProgressSink = Arc<dyn Fn(ProgressLevel, &str) + Send + Sync>;

/// Level-filtered, step-coalescing progress logger.
#[derive(Clone)]
pub struct ProgressLogger {
    level: ProgressLevel,
    step: u64,
    sink: Option<ProgressSink>,
    cancel: Arc<AtomicBool>,
}

impl ProgressLogger {
    /// Logger forwarding messages up to `level`, one step line every `step` units.
    pub fn new(level: ProgressLevel, step: u64) -> Self {
        Self {
            level,
            step: step.max(1),
            sink: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Logger that only traces, used when nobody watches the progress.
    pub fn silent() -> Self {
        Self::new(ProgressLevel::Global, u64::MAX)
    }

    pub fn with_sink(mut self, sink: ProgressSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn level(&self) -> ProgressLevel {
        self.level
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Request cancellation of the run using this logger.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Interrupted`] once cancellation was requested.
    pub fn check_interrupt(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Log a progress message, failing if the run was cancelled.
    pub fn progress_log(&self, level: ProgressLevel, message: &str) -> Result<()> {
        self.check_interrupt()?;
        self.log(level, message);
        Ok(())
    }

    /// Log a progress message when `count` is a multiple of the step.
    ///
    /// The cancellation flag is checked on every call.
    pub fn progress_log_if_step(&self, level: ProgressLevel, count: u64, message: &str) -> Result<()> {
        self.check_interrupt()?;
        if count % self.step == 0 {
            self.log(level, message);
        }
        Ok(())
    }

    /// Log a message whatever the cancellation state.
    ///
    /// Used for failure and final status lines, which must not be lost to an
    /// interruption.
    pub fn log(&self, level: ProgressLevel, message: &str) {
        tracing::info!(progress_level = %level, "{}", message);
        if level <= self.level {
            if let Some(sink) = &self.sink {
                sink(level, message);
            }
        }
    }
}

impl fmt::Debug for ProgressLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressLogger")
            .field("level", &self.level)
            .field("step", &self.step)
            .field("has_sink", &self.sink.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
