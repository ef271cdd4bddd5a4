//! DTU store port
//!
//! The DTU store is an external collaborator. The engine only needs to read
//! a record by id and mutate one in place when an approved revision is
//! applied.

use collab_domain::{Dtu, DtuId};

/// Keyed store of knowledge units
///
/// Implementations live in the infrastructure layer and may carry their own
/// concurrency control; `mutate` must apply the closure atomically with
/// respect to other calls for the same id.
pub trait DtuStore: Send + Sync {
    /// Fetch a snapshot of a DTU.
    fn get(&self, id: &DtuId) -> Option<Dtu>;

    /// Mutate a DTU in place, returning the updated record, or `None` if absent.
    fn mutate(&self, id: &DtuId, mutation: &mut dyn FnMut(&mut Dtu)) -> Option<Dtu>;
}
