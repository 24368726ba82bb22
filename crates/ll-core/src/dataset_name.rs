//! Strongly-typed dataset name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Name of a dataset tracked by the ledger.
///
/// Stored verbatim in the `table_name` column of both ledger tables, so a
/// cutoff and its lineage records are matched by this value. Never empty and
/// never padded with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetName(String);

impl DatasetName {
    /// Create a dataset name, panicking if it is invalid.
    ///
    /// Prefer [`try_new`](Self::try_new) for untrusted input.
    pub fn new(name: impl Into<String>) -> Self {
        match Self::try_new(name) {
            Some(name) => name,
            None => panic!("DatasetName must be non-empty without surrounding whitespace"),
        }
    }

    /// `None` if `name` is empty or has leading/trailing whitespace.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() || name.trim() != name {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DatasetName {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::try_new(name.clone())
            .ok_or_else(|| format!("invalid dataset name '{name}': must be non-empty and trimmed"))
    }
}

impl From<DatasetName> for String {
    fn from(name: DatasetName) -> Self {
        name.0
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for DatasetName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DatasetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DatasetName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DatasetName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name_creation() {
        let name = DatasetName::new("sampledataset");
        assert_eq!(name.as_str(), "sampledataset");
        assert_eq!(format!("{}", name), "sampledataset");
    }

    #[test]
    fn test_dataset_name_rejects_empty_and_padded() {
        assert!(DatasetName::try_new("").is_none());
        assert!(DatasetName::try_new(" payments").is_none());
        assert!(DatasetName::try_from("payments\n".to_string()).is_err());
    }

    #[test]
    #[should_panic]
    fn test_new_panics_on_empty() {
        DatasetName::new("");
    }

    #[test]
    fn test_dataset_name_equality() {
        let name = DatasetName::new("payments");
        assert_eq!(name, "payments");
        assert_eq!(name, *"payments");
    }

    #[test]
    fn test_dataset_name_deserialize_rejects_empty() {
        let ok: DatasetName = serde_yaml::from_str("payments").unwrap();
        assert_eq!(ok, "payments");

        let err = serde_yaml::from_str::<DatasetName>("''");
        assert!(err.is_err());
    }

    #[test]
    fn test_dataset_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&DatasetName::new("payments")).unwrap();
        assert_eq!(json, r#""payments""#);
    }
}
