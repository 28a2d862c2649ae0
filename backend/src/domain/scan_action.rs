//! Scan actions callers can request against a package.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{PackageState, transitions};

/// A caller-invoked operation applied to one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    /// Pick the package up at its origin.
    Collect,
    /// Hand the package over at its destination.
    Deliver,
    /// Receiver confirms they hold the package.
    ConfirmReceipt,
    /// Print a label. Never changes state.
    Print,
    /// Warehouse workflow marker. Never changes state.
    Process,
    /// Staff refuse the package.
    Reject,
    /// Staff return a rejected package to `pending`.
    Resubmit,
}

impl ScanAction {
    /// Every action.
    pub const ALL: [Self; 7] = [
        Self::Collect,
        Self::Deliver,
        Self::ConfirmReceipt,
        Self::Print,
        Self::Process,
        Self::Reject,
        Self::Resubmit,
    ];

    /// Stable wire and storage form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::Deliver => "deliver",
            Self::ConfirmReceipt => "confirm_receipt",
            Self::Print => "print",
            Self::Process => "process",
            Self::Reject => "reject",
            Self::Resubmit => "resubmit",
        }
    }

    /// States from which this action is accepted.
    pub fn allowed_states(self) -> &'static [PackageState] {
        transitions::allowed_states(self)
    }
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an action type string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scan action: {0}")]
pub struct UnknownScanAction(pub String);

impl FromStr for ScanAction {
    type Err = UnknownScanAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| UnknownScanAction(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for action parsing.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("collect", ScanAction::Collect)]
    #[case("confirm_receipt", ScanAction::ConfirmReceipt)]
    #[case("resubmit", ScanAction::Resubmit)]
    fn parses_known_actions(#[case] raw: &str, #[case] expected: ScanAction) {
        assert_eq!(raw.parse::<ScanAction>(), Ok(expected));
    }

    #[rstest]
    #[case("Collect")]
    #[case("confirm-receipt")]
    #[case("")]
    fn rejects_unknown_actions(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<ScanAction>(),
            Err(UnknownScanAction(raw.to_owned()))
        );
    }
}
