//! Binding state machine
//!
//! ```text
//! Uninitialized --identity I--> Bound(I)
//! Bound(I)      --identity I--> Bound(I)   (keep)
//! Bound(I)      --identity J--> Bound(J)   (re-initialize)
//! any           --no identity-> unchanged  (keep)
//! ```

use crate::identity::RunIdentity;

/// Which run the coordinator's sinks are bound for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BindState {
    #[default]
    Uninitialized,
    Bound(RunIdentity),
}

impl BindState {
    pub fn identity(&self) -> Option<&RunIdentity> {
        match self {
            Self::Uninitialized => None,
            Self::Bound(identity) => Some(identity),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

/// What the coordinator must do after observing an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Keep,
    Initialize,
}

/// Pure transition function driving `get_logger`
pub fn next_state(state: &BindState, identity: Option<&RunIdentity>) -> (BindState, Transition) {
    match (state, identity) {
        (_, None) => (state.clone(), Transition::Keep),
        (BindState::Bound(current), Some(id)) if current == id => (state.clone(), Transition::Keep),
        (_, Some(id)) => (BindState::Bound(id.clone()), Transition::Initialize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> RunIdentity {
        RunIdentity::new(name).unwrap()
    }

    #[test]
    fn test_first_identity_initializes() {
        let (state, transition) = next_state(&BindState::Uninitialized, Some(&id("run-1")));
        assert_eq!(state, BindState::Bound(id("run-1")));
        assert_eq!(transition, Transition::Initialize);
    }

    #[test]
    fn test_same_identity_keeps() {
        let bound = BindState::Bound(id("run-1"));
        let (state, transition) = next_state(&bound, Some(&id("run-1")));
        assert_eq!(state, bound);
        assert_eq!(transition, Transition::Keep);
    }

    #[test]
    fn test_new_identity_reinitializes() {
        let (state, transition) = next_state(&BindState::Bound(id("run-1")), Some(&id("run-2")));
        assert_eq!(state.identity(), Some(&id("run-2")));
        assert_eq!(transition, Transition::Initialize);
    }

    #[test]
    fn test_missing_identity_is_noop() {
        let (state, transition) = next_state(&BindState::Uninitialized, None);
        assert_eq!(state, BindState::Uninitialized);
        assert_eq!(transition, Transition::Keep);

        let bound = BindState::Bound(id("run-1"));
        let (state, transition) = next_state(&bound, None);
        assert_eq!(state, bound);
        assert_eq!(transition, Transition::Keep);
        assert!(state.is_bound());
    }
}
