//! Scoped save/restore of a run's mutable coherence state.

use rand::rngs::SmallRng;
use uuid::Uuid;

use crate::dialectic::DialecticalProgressor;
use crate::pool::EntityPool;
use crate::usage::UsageTracker;

/// A full copy of one run's mutable state: pool weights, usage log,
/// dialectical cursor, position counter, and the seeded generator itself
/// (so a restored run replays the same randomness).
///
/// Snapshots are opaque to callers and only valid against the run that
/// produced them: `restore` rejects a foreign snapshot.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub(crate) run_id: Uuid,
    pub(crate) position: u64,
    pub(crate) pool: EntityPool,
    pub(crate) tracker: UsageTracker,
    pub(crate) progressor: DialecticalProgressor,
    pub(crate) rng: SmallRng,
}

impl Snapshot {
    /// The run this snapshot belongs to.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}
