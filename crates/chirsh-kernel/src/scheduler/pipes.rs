//! Inter-stage pipes for one pipeline launch.
//!
//! All N−1 pipes are created up front. Each end is an [`OwnedFd`], so every
//! descriptor the parent holds is closed exactly once: when the pipe is
//! released after its consumer is spawned, or when the set is dropped
//! (including on a failed setup).

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

struct Pipe {
    read: OwnedFd,
    write: OwnedFd,
}

/// The pipes between consecutive stages. Pipe `i` connects stage `i`'s
/// stdout to stage `i + 1`'s stdin.
pub struct PipeSet {
    pipes: Vec<Option<Pipe>>,
}

impl PipeSet {
    /// Create `count` pipes with `pipe(2)`.
    pub fn open(count: usize) -> nix::Result<Self> {
        Self::open_with(count, nix::unistd::pipe)
    }

    /// Create `count` pipes with a custom factory.
    ///
    /// All or nothing: if the factory fails, every pipe already created is
    /// closed before the error is returned.
    pub fn open_with<F>(count: usize, mut make: F) -> nix::Result<Self>
    where
        F: FnMut() -> nix::Result<(OwnedFd, OwnedFd)>,
    {
        let mut pipes = Vec::with_capacity(count);
        for _ in 0..count {
            let (read, write) = make()?;
            pipes.push(Some(Pipe { read, write }));
        }
        Ok(Self { pipes })
    }

    /// Number of pipes in the set, released or not.
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Descriptor stage `stage` should read from, if it is not the first.
    pub fn stdin_for(&self, stage: usize) -> Option<RawFd> {
        let index = stage.checked_sub(1)?;
        self.pipes
            .get(index)?
            .as_ref()
            .map(|p| p.read.as_raw_fd())
    }

    /// Descriptor stage `stage` should write to, if it is not the last.
    pub fn stdout_for(&self, stage: usize) -> Option<RawFd> {
        self.pipes
            .get(stage)?
            .as_ref()
            .map(|p| p.write.as_raw_fd())
    }

    /// Every descriptor this process still holds.
    pub fn open_fds(&self) -> Vec<RawFd> {
        self.pipes
            .iter()
            .flatten()
            .flat_map(|p| [p.read.as_raw_fd(), p.write.as_raw_fd()])
            .collect()
    }

    /// Close both ends of pipe `index` in this process. Idempotent.
    pub fn release(&mut self, index: usize) {
        if let Some(slot) = self.pipes.get_mut(index) {
            slot.take();
        }
    }
}
