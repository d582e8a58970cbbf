//! Auxiliary lifecycles of a run
//!
//! Each lifecycle is held by a guard whose `Drop` ends it, so teardown happens
//! on every exit path, panics included. The runner declares the guards in
//! setup order; they are released in reverse.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::commands::{CommandRecorder, UndoStack};

/// Host console redirection
pub trait ConsoleOutput: Send + Sync {
    fn start(&self);
    fn end(&self);
}

/// Host UI refresh batching
pub trait UiRefresh: Send + Sync {
    fn init(&self);
    fn finalise(&self);
}

/// Console lifecycle for hosts without a console view: script output already
/// goes to tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConsole;

impl ConsoleOutput for LogConsole {
    fn start(&self) {
        debug!("Console output started");
    }

    fn end(&self) {
        debug!("Console output ended");
    }
}

/// Refresh lifecycle for hosts without a UI
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRefresh;

impl UiRefresh for NoRefresh {
    fn init(&self) {}

    fn finalise(&self) {}
}

pub(crate) struct ConsoleGuard {
    console: Arc<dyn ConsoleOutput>,
}

impl ConsoleGuard {
    pub(crate) fn start(console: Arc<dyn ConsoleOutput>) -> Self {
        console.start();
        Self { console }
    }
}

impl Drop for ConsoleGuard {
    fn drop(&mut self) {
        self.console.end();
    }
}

pub(crate) struct RefreshGuard {
    refresh: Arc<dyn UiRefresh>,
}

impl RefreshGuard {
    pub(crate) fn start(refresh: Arc<dyn UiRefresh>) -> Self {
        refresh.init();
        Self { refresh }
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.refresh.finalise();
    }
}

/// How a recorder session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecorderEnd {
    Committed(usize),
    RolledBack(usize),
}

/// Owns the recorder session; dropping it commits whatever was recorded
pub(crate) struct RecorderGuard {
    recorder: CommandRecorder,
    label: String,
    stack: Arc<Mutex<dyn UndoStack>>,
    finished: bool,
}

impl RecorderGuard {
    pub(crate) fn start(recorder: CommandRecorder, label: String, stack: Arc<Mutex<dyn UndoStack>>) -> Self {
        recorder.start();
        Self {
            recorder,
            label,
            stack,
            finished: false,
        }
    }

    /// End the session explicitly
    pub(crate) fn finish(mut self, rollback: bool) -> RecorderEnd {
        self.finished = true;
        if rollback {
            RecorderEnd::RolledBack(self.recorder.rollback())
        } else {
            RecorderEnd::Committed(self.commit())
        }
    }

    fn commit(&self) -> usize {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        self.recorder.finalise(&self.label, &mut *stack)
    }
}

impl Drop for RecorderGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.commit();
        }
    }
}
