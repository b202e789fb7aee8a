//! Reference model of session behaviour.
//!
//! Deliberately naive: plain vectors and a set, no generations, no I/O. The
//! real [`devmatch_core::Session`] must agree with it on every operation
//! result and on the observable state afterwards.

use std::collections::HashSet;

/// User slot. Mapped to identity token `u{n}`.
pub type ModelUser = u8;

/// Candidate slot. Mapped to profile id `p{n}`.
pub type ModelProfile = u8;

/// Token for a model user.
pub fn user_token(user: ModelUser) -> String {
    format!("u{user}")
}

/// Profile id for a model candidate.
pub fn profile_key(id: ModelProfile) -> String {
    format!("p{id}")
}

/// An input applied to both the model and the real session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Sign in as `user`.
    Login {
        /// Who signs in.
        user: ModelUser,
    },
    /// Sign out.
    Logout,
    /// A fetch for the current session completes with `ids`.
    Load {
        /// Server order, may contain repeats.
        ids: Vec<ModelProfile>,
    },
    /// Decide on whatever is at the head.
    DecideHead {
        /// Like if true, dislike otherwise.
        like: bool,
    },
    /// Decide on a specific candidate, which may not be the head.
    DecideOther {
        /// Candidate decided on.
        id: ModelProfile,
    },
    /// A match arrives on the current channel.
    Match {
        /// Matched candidate.
        id: ModelProfile,
    },
    /// A match arrives on a channel from an earlier session.
    StaleMatch {
        /// Matched candidate.
        id: ModelProfile,
    },
    /// Hide the match overlay.
    Dismiss,
}

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// No identity.
    NotLoggedIn,
    /// Nothing to decide on.
    EmptyQueue,
    /// Decision was not for the head.
    NotHead,
}

/// Outcome of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Accepted.
    Ok,
    /// Refused, state unchanged.
    Error(OperationError),
}

impl OperationResult {
    /// True if accepted.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Everything the model and the real session are compared on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservableState {
    /// Identity token.
    pub identity: Option<String>,
    /// Queue ids, head first.
    pub queue: Vec<String>,
    /// Profile id of the shown match.
    pub active_match: Option<String>,
}

/// Reference session.
#[derive(Debug, Default)]
pub struct ModelSession {
    user: Option<ModelUser>,
    queue: Vec<ModelProfile>,
    decided: HashSet<ModelProfile>,
    active_match: Option<ModelProfile>,
}

impl ModelSession {
    /// Signed-out model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `op`.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Login { user } => {
                if self.user != Some(*user) {
                    *self = Self { user: Some(*user), ..Self::default() };
                }
                OperationResult::Ok
            },
            Operation::Logout => {
                *self = Self::default();
                OperationResult::Ok
            },
            Operation::Load { ids } => {
                if self.user.is_some() {
                    self.queue.clear();
                    for id in ids {
                        if !self.decided.contains(id) && !self.queue.contains(id) {
                            self.queue.push(*id);
                        }
                    }
                }
                OperationResult::Ok
            },
            Operation::DecideHead { .. } => match self.check_decide(None) {
                Ok(()) => self.pop_head(),
                Err(e) => OperationResult::Error(e),
            },
            Operation::DecideOther { id } => match self.check_decide(Some(*id)) {
                Ok(()) => self.pop_head(),
                Err(e) => OperationResult::Error(e),
            },
            Operation::Match { id } => {
                if self.user.is_some() {
                    self.active_match = Some(*id);
                }
                OperationResult::Ok
            },
            Operation::StaleMatch { .. } => OperationResult::Ok,
            Operation::Dismiss => {
                self.active_match = None;
                OperationResult::Ok
            },
        }
    }

    /// Current observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            identity: self.user.map(user_token),
            queue: self.queue.iter().copied().map(profile_key).collect(),
            active_match: self.active_match.map(profile_key),
        }
    }

    /// Ids decided this session.
    pub fn decided(&self) -> impl Iterator<Item = String> + '_ {
        self.decided.iter().copied().map(profile_key)
    }

    fn check_decide(&self, id: Option<ModelProfile>) -> Result<(), OperationError> {
        if self.user.is_none() {
            return Err(OperationError::NotLoggedIn);
        }
        let head = self.queue.first().ok_or(OperationError::EmptyQueue)?;
        match id {
            Some(id) if id != *head => Err(OperationError::NotHead),
            _ => Ok(()),
        }
    }

    fn pop_head(&mut self) -> OperationResult {
        let head = self.queue.remove(0);
        self.decided.insert(head);
        OperationResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decided_profiles_never_come_back() {
        let mut model = ModelSession::new();
        model.apply(&Operation::Login { user: 0 });
        model.apply(&Operation::Load { ids: vec![1, 2, 3] });
        model.apply(&Operation::DecideHead { like: true });
        model.apply(&Operation::Load { ids: vec![1, 2, 2, 4] });

        assert_eq!(model.observable_state().queue, vec!["p2", "p4"]);
    }

    #[test]
    fn relogin_same_user_keeps_state() {
        let mut model = ModelSession::new();
        model.apply(&Operation::Login { user: 1 });
        model.apply(&Operation::Load { ids: vec![5] });
        model.apply(&Operation::Login { user: 1 });

        assert_eq!(model.observable_state().queue, vec!["p5"]);
    }

    #[test]
    fn signed_out_decide_is_refused() {
        let mut model = ModelSession::new();
        assert_eq!(
            model.apply(&Operation::DecideHead { like: false }),
            OperationResult::Error(OperationError::NotLoggedIn)
        );
    }
}
