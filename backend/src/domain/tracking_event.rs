//! Immutable audit records of executed scans.
//!
//! Exactly one [`TrackingEvent`] is written per successful scan, in the same
//! unit of work as the package state write. Events are never updated or
//! deleted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{PackageCode, PackageId, PackageState, Role, ScanAction, UserId};

/// Maximum number of metadata entries attached to one scan.
pub const METADATA_MAX_ENTRIES: usize = 32;
/// Maximum length of a metadata key.
pub const METADATA_KEY_MAX: usize = 64;
/// Maximum length of a metadata value.
pub const METADATA_VALUE_MAX: usize = 1024;

/// Validation errors returned when constructing [`ScanMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanMetadataValidationError {
    #[error("scan metadata may hold at most {max} entries")]
    TooManyEntries { max: usize },
    #[error("scan metadata keys must not be blank")]
    BlankKey,
    #[error("scan metadata key `{key}` exceeds {max} characters")]
    KeyTooLong { key: String, max: usize },
    #[error("scan metadata value for `{key}` exceeds {max} characters")]
    ValueTooLong { key: String, max: usize },
}

/// Free-form key/value context supplied with a scan (device, location note,
/// batch reference, ...).
///
/// # Examples
/// ```
/// use courier::domain::ScanMetadata;
///
/// let metadata = ScanMetadata::try_from_pairs([("device", "handheld-7")]).expect("valid");
/// assert_eq!(metadata.get("device"), Some("handheld-7"));
/// assert!(ScanMetadata::try_from_pairs([(" ", "x")]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ScanMetadata(BTreeMap<String, String>);

impl ScanMetadata {
    /// Empty metadata.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate a map of entries.
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self, ScanMetadataValidationError> {
        if entries.len() > METADATA_MAX_ENTRIES {
            return Err(ScanMetadataValidationError::TooManyEntries {
                max: METADATA_MAX_ENTRIES,
            });
        }
        for (key, value) in &entries {
            if key.trim().is_empty() {
                return Err(ScanMetadataValidationError::BlankKey);
            }
            if key.chars().count() > METADATA_KEY_MAX {
                return Err(ScanMetadataValidationError::KeyTooLong {
                    key: key.clone(),
                    max: METADATA_KEY_MAX,
                });
            }
            if value.chars().count() > METADATA_VALUE_MAX {
                return Err(ScanMetadataValidationError::ValueTooLong {
                    key: key.clone(),
                    max: METADATA_VALUE_MAX,
                });
            }
        }
        Ok(Self(entries))
    }

    /// Validate entries given as string pairs.
    pub fn try_from_pairs<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ScanMetadataValidationError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Look up one entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl TryFrom<BTreeMap<String, String>> for ScanMetadata {
    type Error = ScanMetadataValidationError;

    fn try_from(value: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScanMetadata> for BTreeMap<String, String> {
    fn from(value: ScanMetadata) -> Self {
        value.0
    }
}

/// Audit label describing who did what, e.g. `collected_by_rider`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingEventType(String);

impl TrackingEventType {
    /// Derive the event type from the action and the actor's primary role.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::{Role, ScanAction, TrackingEventType};
    ///
    /// let event = TrackingEventType::for_scan(ScanAction::Collect, Role::Rider);
    /// assert_eq!(event.as_str(), "collected_by_rider");
    /// let receipt = TrackingEventType::for_scan(ScanAction::ConfirmReceipt, Role::Client);
    /// assert_eq!(receipt.as_str(), "confirmed_by_receiver");
    /// ```
    pub fn for_scan(action: ScanAction, role: Role) -> Self {
        let label = match action {
            ScanAction::ConfirmReceipt if role != Role::Admin => "confirmed_by_receiver".to_owned(),
            ScanAction::Reject if role != Role::Admin => "rejected".to_owned(),
            ScanAction::Resubmit if role != Role::Admin => "resubmitted".to_owned(),
            _ => format!("{}_by_{}", past_tense(action), role.as_str()),
        };
        Self(label)
    }

    /// Wrap a stored label.
    pub fn from_stored(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Borrow the label.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TrackingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn past_tense(action: ScanAction) -> &'static str {
    match action {
        ScanAction::Collect => "collected",
        ScanAction::Deliver => "delivered",
        ScanAction::ConfirmReceipt => "confirmed",
        ScanAction::Print => "printed",
        ScanAction::Process => "processed",
        ScanAction::Reject => "rejected",
        ScanAction::Resubmit => "resubmitted",
    }
}

/// Append-only audit record of one executed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub id: Uuid,
    pub package_id: PackageId,
    pub package_code: PackageCode,
    pub actor_user_id: UserId,
    pub event_type: TrackingEventType,
    pub action: ScanAction,
    pub from_state: PackageState,
    pub to_state: PackageState,
    pub metadata: ScanMetadata,
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// Whether the event records a state change.
    pub fn is_transition(&self) -> bool {
        self.from_state != self.to_state
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for metadata validation and event labels.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ScanAction::Collect, Role::Agent, "collected_by_agent")]
    #[case(ScanAction::Collect, Role::Rider, "collected_by_rider")]
    #[case(ScanAction::Deliver, Role::Rider, "delivered_by_rider")]
    #[case(ScanAction::ConfirmReceipt, Role::Client, "confirmed_by_receiver")]
    #[case(ScanAction::ConfirmReceipt, Role::Admin, "confirmed_by_admin")]
    #[case(ScanAction::Print, Role::Warehouse, "printed_by_warehouse")]
    #[case(ScanAction::Process, Role::Warehouse, "processed_by_warehouse")]
    #[case(ScanAction::Reject, Role::Admin, "rejected_by_admin")]
    #[case(ScanAction::Resubmit, Role::Admin, "resubmitted_by_admin")]
    fn event_types_follow_action_and_role(
        #[case] action: ScanAction,
        #[case] role: Role,
        #[case] expected: &str,
    ) {
        assert_eq!(TrackingEventType::for_scan(action, role).as_str(), expected);
    }

    #[rstest]
    fn metadata_rejects_too_many_entries() {
        let pairs = (0..=METADATA_MAX_ENTRIES).map(|index| (format!("k{index}"), "v".to_owned()));
        assert_eq!(
            ScanMetadata::try_from_pairs(pairs),
            Err(ScanMetadataValidationError::TooManyEntries {
                max: METADATA_MAX_ENTRIES
            })
        );
    }

    #[rstest]
    fn metadata_rejects_long_keys_and_values() {
        let long_key = "k".repeat(METADATA_KEY_MAX + 1);
        assert!(matches!(
            ScanMetadata::try_from_pairs([(long_key, "v")]),
            Err(ScanMetadataValidationError::KeyTooLong { .. })
        ));

        let long_value = "v".repeat(METADATA_VALUE_MAX + 1);
        assert!(matches!(
            ScanMetadata::try_from_pairs([("note", long_value)]),
            Err(ScanMetadataValidationError::ValueTooLong { .. })
        ));
    }

    #[rstest]
    fn metadata_deserialisation_validates() {
        let ok: ScanMetadata =
            serde_json::from_str(r#"{"device":"handheld-7"}"#).expect("valid metadata");
        assert_eq!(ok.0.len(), 1);

        let blank = serde_json::from_str::<ScanMetadata>(r#"{"  ":"x"}"#);
        assert!(blank.is_err());
    }
}
