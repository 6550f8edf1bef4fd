//! Test doubles for the kernel's seams: the terminal and the notice sink.

use std::sync::{Arc, Mutex, PoisonError};

use chirsh_types::Notice;
use nix::unistd::Pid;

use crate::scheduler::{JobTable, NoticeSink};
use crate::terminal::Terminal;

/// One terminal ownership change observed by [`RecordingTerminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    GiveTo(Pid),
    Reclaim,
}

/// Terminal that records hand-overs instead of calling `tcsetpgrp`.
///
/// Reports itself as detached so children never touch the real terminal.
#[derive(Debug, Default)]
pub struct RecordingTerminal {
    events: Mutex<Vec<TerminalEvent>>,
}

impl RecordingTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TerminalEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: TerminalEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Terminal for RecordingTerminal {
    fn give_to(&self, pgid: Pid) -> nix::Result<()> {
        self.push(TerminalEvent::GiveTo(pgid));
        Ok(())
    }

    fn reclaim(&self) -> nix::Result<()> {
        self.push(TerminalEvent::Reclaim);
        Ok(())
    }

    fn is_attached(&self) -> bool {
        false
    }
}

/// Notice sink that keeps every notice for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotices {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

/// A job table that never touches the real terminal and drops its notices.
pub fn job_table() -> JobTable {
    JobTable::new(Arc::new(RecordingTerminal::new()), Arc::new(RecordingNotices::new()))
}
