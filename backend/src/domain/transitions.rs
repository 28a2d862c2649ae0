//! Package lifecycle transition table.
//!
//! Pure mapping from `(current state, action)` to the next state. This is the
//! only place a package's next state is computed.

use super::{Error, PackageState, ScanAction};

use PackageState::{Collected, Delivered, InTransit, Pending, Rejected, Submitted};

/// Outcome of a valid table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The package moves to the given state.
    Advance(PackageState),
    /// The action is accepted but leaves the state untouched.
    Remain,
}

impl Transition {
    /// State the package holds after the action.
    pub const fn resulting_state(self, current: PackageState) -> PackageState {
        match self {
            Self::Advance(next) => next,
            Self::Remain => current,
        }
    }

    /// State to persist, if any.
    pub const fn state_write(self) -> Option<PackageState> {
        match self {
            Self::Advance(next) => Some(next),
            Self::Remain => None,
        }
    }
}

/// States from which `action` is accepted.
pub fn allowed_states(action: ScanAction) -> &'static [PackageState] {
    match action {
        ScanAction::Collect => &[Submitted],
        ScanAction::Deliver => &[InTransit],
        ScanAction::ConfirmReceipt => &[Delivered],
        ScanAction::Print => &[Pending, Submitted, InTransit, Delivered],
        ScanAction::Process => &[Submitted, InTransit],
        ScanAction::Reject => &[Pending, Submitted],
        ScanAction::Resubmit => &[Rejected],
    }
}

/// Compute the transition for `action` applied to a package in `current`.
///
/// Fails with [`crate::domain::ErrorCode::InvalidStateTransition`] when
/// `current` is not one of [`allowed_states`].
///
/// # Examples
/// ```
/// use courier::domain::transitions::{Transition, next_state};
/// use courier::domain::{PackageState, ScanAction};
///
/// let transition = next_state(PackageState::Submitted, ScanAction::Collect).expect("valid");
/// assert_eq!(transition, Transition::Advance(PackageState::InTransit));
/// assert!(next_state(PackageState::Pending, ScanAction::Collect).is_err());
/// ```
pub fn next_state(current: PackageState, action: ScanAction) -> Result<Transition, Error> {
    if !allowed_states(action).contains(&current) {
        return Err(Error::invalid_transition(action, current));
    }

    Ok(match action {
        ScanAction::Collect => Transition::Advance(InTransit),
        ScanAction::Deliver => Transition::Advance(Delivered),
        ScanAction::ConfirmReceipt => Transition::Advance(Collected),
        ScanAction::Reject => Transition::Advance(Rejected),
        ScanAction::Resubmit => Transition::Advance(Pending),
        ScanAction::Print | ScanAction::Process => Transition::Remain,
    })
}
