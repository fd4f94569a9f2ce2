//! ABO/Rh blood group: the partition key for stock, transactions and requests.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the eight canonical ABO/Rh blood groups.
///
/// Serialized (and displayed) as its canonical code, e.g. `"AB+"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APos,
        BloodGroup::ANeg,
        BloodGroup::BPos,
        BloodGroup::BNeg,
        BloodGroup::AbPos,
        BloodGroup::AbNeg,
        BloodGroup::OPos,
        BloodGroup::ONeg,
    ];

    /// Canonical code (`A+`, `AB-`, ...).
    pub fn code(self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
        }
    }
}

impl core::fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for BloodGroup {
    type Err = DomainError;

    /// Accepts exactly `^(A|B|AB|O)[+-]$` after trimming surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        BloodGroup::ALL
            .into_iter()
            .find(|g| g.code() == code)
            .ok_or_else(|| DomainError::invalid_argument(format!("invalid blood group: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_canonical_code() {
        for group in BloodGroup::ALL {
            assert_eq!(group.code().parse::<BloodGroup>().unwrap(), group);
        }
    }

    #[test]
    fn rejects_malformed_codes() {
        for bad in ["", "C+", "A", "ab+", "AB", "O+-", "0-"] {
            let err = bad.parse::<BloodGroup>().unwrap_err();
            assert!(matches!(err, DomainError::InvalidArgument(_)), "{bad:?}");
        }
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&BloodGroup::AbNeg).unwrap();
        assert_eq!(json, "\"AB-\"");
        let back: BloodGroup = serde_json::from_str("\"O+\"").unwrap();
        assert_eq!(back, BloodGroup::OPos);
    }
}
