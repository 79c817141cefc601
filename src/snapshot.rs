use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::params::ParameterSet;

/// An immutable, published copy of the effective parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Strictly increasing publication counter.
    pub version: u64,
    pub params: ParameterSet,
}

/// Control-side writer. Each publish swaps in a whole new snapshot, so a
/// reader can never observe fields from two different updates.
pub struct SnapshotPublisher {
    current: Arc<ArcSwap<Snapshot>>,
    /// The snapshot replaced by the last publish. A reader that was mid-load
    /// during that publish ends up owning a reference to it; holding one here
    /// means that reference is never the last, so the audio thread never
    /// frees a snapshot.
    retired: Option<Arc<Snapshot>>,
}

/// Real-time side reader. Loading is lock-free and does not allocate.
#[derive(Clone)]
pub struct SnapshotReader {
    current: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new(params: ParameterSet) -> (Self, SnapshotReader) {
        let current = Arc::new(ArcSwap::from_pointee(Snapshot { version: 0, params }));

        (
            Self {
                current: Arc::clone(&current),
                retired: None,
            },
            SnapshotReader { current },
        )
    }

    pub fn publish(&mut self, params: ParameterSet) -> u64 {
        // Only the control context publishes, so a plain load is enough to
        // derive the next version.
        let version = self.current.load().version + 1;
        let previous = self.current.swap(Arc::new(Snapshot { version, params }));
        // Whatever was retired before is dropped here, on the control side.
        self.retired = Some(previous);
        version
    }

    pub fn current(&self) -> Snapshot {
        **self.current.load()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            current: Arc::clone(&self.current),
        }
    }
}

impl SnapshotReader {
    /// Copies the latest fully-formed snapshot. The guard is released before
    /// returning, so at most one publish can overlap it.
    #[inline]
    pub fn load(&self) -> Snapshot {
        **self.current.load()
    }
}
