use dashmap::DashMap;

use crate::error::AppError;

/// Pool of chairs currently free to accept a ride.
///
/// `claim_one` must never hand the same chair to two concurrent
/// claimants, and must not block on entries another claimant is
/// taking: claiming walks a snapshot of candidates and relies on the
/// per-key atomicity of `remove` — exactly one caller wins each entry,
/// everyone else skips to the next candidate.
#[derive(Default)]
pub struct VacantChairRegistry {
    entries: DashMap<String, ()>,
}

impl VacantChairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a chair as vacant. Publishing a chair that is already
    /// vacant is a caller error, not a state to silently absorb.
    pub fn publish(&self, chair_id: &str) -> Result<(), AppError> {
        use dashmap::mapref::entry::Entry;

        match self.entries.entry(chair_id.to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "chair {chair_id} is already vacant"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(())
            }
        }
    }

    /// Removes a chair that went offline. Returns false if it was not
    /// vacant (already claimed or never published).
    pub fn retire(&self, chair_id: &str) -> bool {
        self.entries.remove(chair_id).is_some()
    }

    /// Atomically claims one arbitrary vacant chair, or None if the
    /// pool is empty or every candidate was taken by a concurrent
    /// claimant first.
    pub fn claim_one(&self) -> Option<String> {
        let candidates: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();

        for chair_id in candidates {
            // remove is atomic per key: of any number of concurrent
            // claimants, exactly one sees Some here.
            if self.entries.remove(&chair_id).is_some() {
                return Some(chair_id);
            }
        }

        None
    }

    pub fn contains(&self, chair_id: &str) -> bool {
        self.entries.contains_key(chair_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
