use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LoadError;

/// Only rows whose stop_id starts with this are physical stations. The same files also describe
/// stop areas and other groupings.
pub const STOP_POINT_PREFIX: &str = "StopPoint:";

pub mod orig {
    use serde::{Deserialize, Serialize};

    /// A stop_id exactly as it appears in a feed, like `StopPoint:OCETGV INOUI-87686006`.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct StopID(pub String);

    /// Only used to tell where one trip ends and the next begins.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct TripID(pub String);
}

/// The UIC code of a station. Every feed names the same physical station with a different
/// stop_id, but they all embed this code, so it's the key used for graph nodes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationKey(String);

impl StationKey {
    /// Wraps an already canonical code, as found in the frequentation table or configuration.
    pub fn new(uic: impl Into<String>) -> Self {
        Self(uic.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl orig::StopID {
    pub fn is_stop_point(&self) -> bool {
        self.0.starts_with(STOP_POINT_PREFIX)
    }

    pub fn canonical(&self) -> Result<StationKey, LoadError> {
        canonical_key(&self.0)
    }
}

/// Extracts the UIC code, the second `-`-separated segment of the raw identifier.
pub fn canonical_key(raw: &str) -> Result<StationKey, LoadError> {
    let mut segments = raw.split('-');
    segments.next();
    match segments.next().map(str::trim) {
        Some(code) if !code.is_empty() => Ok(StationKey(code.to_string())),
        _ => Err(LoadError::MalformedIdentifier(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_uic_code() {
        let key = canonical_key("StopPoint:OCETGV INOUI-87686006").unwrap();
        assert_eq!(key.as_str(), "87686006");

        let key = canonical_key("StopPoint:OCETrain TER-87394007-BV").unwrap();
        assert_eq!(key.as_str(), "87394007");
    }

    #[test]
    fn same_station_across_feeds() {
        let tgv = canonical_key("StopPoint:OCETGV INOUI-87723197").unwrap();
        let ter = canonical_key("StopPoint:OCETrain TER-87723197").unwrap();
        let other = canonical_key("StopPoint:OCETrain TER-87722025").unwrap();
        assert_eq!(tgv, ter);
        assert_ne!(tgv, other);
    }

    #[test]
    fn rejects_identifiers_without_code() {
        for raw in ["StopPoint:OCETGV INOUI", "StopPoint:OCE-", "", "-"] {
            match canonical_key(raw) {
                Err(LoadError::MalformedIdentifier(x)) => assert_eq!(x, raw),
                x => panic!("{raw:?} gave {x:?}"),
            }
        }
    }

    #[test]
    fn stop_point_prefix() {
        assert!(orig::StopID("StopPoint:OCETrain TER-87394007".to_string()).is_stop_point());
        assert!(!orig::StopID("StopArea:OCE87394007".to_string()).is_stop_point());
    }
}
