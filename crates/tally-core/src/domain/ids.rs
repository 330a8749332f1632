//! Strongly typed identifiers.
//!
//! Every id is a ULID wrapped in `Id<T>`, where `T` is a zero-sized marker.
//! ULIDs sort by creation time, which gives queued actions and alerts the
//! "monotonic-ish" ordering the queue relies on for reporting.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// Marker trait providing the display prefix of an id kind.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic id. `T` only exists at compile time.
#[repr(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

// Manual impls: derives would put bounds on `T`, which is uninhabited.
impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IdMarker> Copy for Id<T> {}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ulid == other.ulid
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ulid.hash(state);
    }
}

impl<T: IdMarker> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: IdMarker> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ulid.cmp(&other.ulid)
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Error returned when a prefixed id string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid id {value:?}: expected prefix {prefix:?} followed by a ULID")]
pub struct ParseIdError {
    value: String,
    prefix: &'static str,
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError {
            value: s.to_string(),
            prefix: T::prefix(),
        };
        let raw = s.strip_prefix(T::prefix()).ok_or_else(err)?;
        Ulid::from_string(raw).map(Self::from_ulid).map_err(|_| err())
    }
}

// Ids are persisted in their display form so the durable queue stays readable.
impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Marker for queued actions.
pub enum Action {}

impl IdMarker for Action {
    fn prefix() -> &'static str {
        "action-"
    }
}

/// Marker for emitted budget alerts.
pub enum Alert {}

impl IdMarker for Alert {
    fn prefix() -> &'static str {
        "alert-"
    }
}

/// Identifier of a queued mutation.
pub type ActionId = Id<Action>;

/// Identifier of an emitted budget alert.
pub type AlertId = Id<Alert>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_prefix() {
        let action = ActionId::from_ulid(Ulid::new());
        let alert = AlertId::from_ulid(Ulid::new());

        assert!(action.to_string().starts_with("action-"));
        assert!(alert.to_string().starts_with("alert-"));
    }

    #[test]
    fn ids_serialize_as_prefixed_strings() {
        let id = ActionId::from_ulid(Ulid::new());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: ActionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parsing_rejects_foreign_prefix() {
        let alert = AlertId::from_ulid(Ulid::new());
        let parsed = alert.to_string().parse::<ActionId>();
        assert!(parsed.is_err());
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let first = ActionId::from_ulid(Ulid::from_parts(1_000, 7));
        let second = ActionId::from_ulid(Ulid::from_parts(2_000, 3));
        assert!(first < second);
    }

    #[test]
    fn phantom_marker_costs_nothing() {
        assert_eq!(std::mem::size_of::<ActionId>(), std::mem::size_of::<Ulid>());
    }
}
