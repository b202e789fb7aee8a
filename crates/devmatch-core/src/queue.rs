//! Candidate queue.

use std::collections::{HashSet, VecDeque};

use devmatch_proto::{Profile, ProfileId};
use tracing::warn;

/// Ordered candidates, consumed from the head only.
///
/// Holds no duplicate ids, and an id that has been consumed is never let back
/// in for the lifetime of the queue. Refilling replaces the contents; it never
/// appends, so re-fetching after a partial failure cannot duplicate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateQueue {
    profiles: VecDeque<Profile>,
    consumed: HashSet<ProfileId>,
}

impl CandidateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `profiles`, preserving their order.
    ///
    /// Duplicates and already-consumed ids are dropped. Returns the number of
    /// profiles dropped.
    pub fn replace(&mut self, profiles: Vec<Profile>) -> usize {
        let offered = profiles.len();
        let mut seen = HashSet::with_capacity(offered);

        self.profiles = profiles
            .into_iter()
            .filter(|p| {
                if self.consumed.contains(&p.id) {
                    warn!(profile = %p.id, "dropping already decided candidate");
                    return false;
                }
                if !seen.insert(p.id.clone()) {
                    warn!(profile = %p.id, "dropping duplicate candidate");
                    return false;
                }
                true
            })
            .collect();

        offered - self.profiles.len()
    }

    /// Current head.
    pub fn head(&self) -> Option<&Profile> {
        self.profiles.front()
    }

    /// Remove the head and remember its id as consumed.
    pub fn pop_head(&mut self) -> Option<Profile> {
        let head = self.profiles.pop_front()?;
        self.consumed.insert(head.id.clone());
        Some(head)
    }

    /// Whether `id` has been consumed from this queue.
    pub fn is_consumed(&self, id: &ProfileId) -> bool {
        self.consumed.contains(id)
    }

    /// Number of pending candidates.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// True if no candidates are pending.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Pending candidates, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    /// Ids of pending candidates, head first.
    pub fn ids(&self) -> Vec<ProfileId> {
        self.profiles.iter().map(|p| p.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles(ids: &[&str]) -> Vec<Profile> {
        ids.iter().map(|id| Profile::new(*id, id.to_uppercase(), "", "")).collect()
    }

    fn ids(q: &CandidateQueue) -> Vec<&str> {
        q.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn replace_keeps_server_order() {
        let mut q = CandidateQueue::new();
        assert_eq!(q.replace(profiles(&["c", "a", "b"])), 0);
        assert_eq!(ids(&q), ["c", "a", "b"]);
    }

    #[test]
    fn replace_drops_duplicates() {
        let mut q = CandidateQueue::new();
        assert_eq!(q.replace(profiles(&["a", "b", "a"])), 1);
        assert_eq!(ids(&q), ["a", "b"]);
    }

    #[test]
    fn replace_is_not_append() {
        let mut q = CandidateQueue::new();
        q.replace(profiles(&["a", "b"]));
        q.replace(profiles(&["b", "c"]));
        assert_eq!(ids(&q), ["b", "c"]);
    }

    #[test]
    fn consumed_ids_never_return() {
        let mut q = CandidateQueue::new();
        q.replace(profiles(&["a", "b", "c"]));
        assert_eq!(q.pop_head().map(|p| p.id), Some(ProfileId::from("a")));
        assert!(q.is_consumed(&"a".into()));

        // Refetch still lists `a`
        assert_eq!(q.replace(profiles(&["a", "b", "c"])), 1);
        assert_eq!(ids(&q), ["b", "c"]);
    }

    #[test]
    fn pop_on_empty_is_none() {
        let mut q = CandidateQueue::new();
        assert!(q.pop_head().is_none());
        assert!(q.is_empty());
    }
}
