//! Process-group primitives used by single-writer exports
//!
//! A distributed run elects one I/O process to write shared files while every
//! process waits on a collective barrier afterwards. [`SerialCommunicator`] is
//! the single-process case; [`LocalCommunicator`] emulates a process group with
//! threads sharing a `std::sync::Barrier`.

use std::sync::{Arc, Barrier};

/// Minimal communicator contract
pub trait Communicator {
    /// Rank of this process in `0..size()`
    fn rank(&self) -> usize;

    /// Number of processes in the group
    fn size(&self) -> usize;

    /// Whether this process performs shared file I/O
    fn is_io_process(&self) -> bool {
        self.rank() == 0
    }

    /// Block until every process in the group has reached the barrier
    fn barrier(&self);
}

/// Single-process communicator
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}
}

/// Thread-backed process group
#[derive(Debug, Clone)]
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
}

impl LocalCommunicator {
    /// Create `size` communicators sharing one barrier, one per rank
    ///
    /// # Panics
    /// Panics if `size` is zero
    pub fn group(size: usize) -> Vec<LocalCommunicator> {
        assert!(size > 0, "communicator group size must be positive");
        let barrier = Arc::new(Barrier::new(size));
        (0..size)
            .map(|rank| LocalCommunicator {
                rank,
                size,
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}
