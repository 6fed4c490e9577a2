use crate::error::{ErrorKind, Result};
use serde::Deserialize;

/// The identifying metadata embedded in a package archive.
///
/// Only the four fields that make up a fully-qualified package identifier are
/// kept; anything else the tool reports (target, checksum, dependencies...)
/// is ignored during deserialization.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PackageMetadata {
    pub origin: String,
    pub name: String,
    pub version: String,
    pub release: String,
}
impl PackageMetadata {
    pub fn new(
        origin: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            name: name.into(),
            version: version.into(),
            release: release.into(),
        }
    }

    /// Parse the JSON printed by `hab pkg info -j`.
    pub(crate) fn from_json(json: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    /// Each field becomes exactly one segment of an object key, so it must be
    /// non-empty and must not contain a separator or be a relative segment.
    pub fn validate(self) -> Result<Self> {
        for (field, value) in self.fields() {
            if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\0']) {
                exn::bail!(ErrorKind::InvalidMetadata(field));
            }
        }
        Ok(self)
    }

    fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("origin", self.origin.as_str()),
            ("name", self.name.as_str()),
            ("version", self.version.as_str()),
            ("release", self.release.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_json_ignores_extra_fields() {
        let json = br#"{
            "origin": "core",
            "name": "pkg",
            "version": "1.2.0",
            "release": "20230101000000",
            "target": "x86_64-linux",
            "checksum": "abc123",
            "deps": []
        }"#;
        let metadata = PackageMetadata::from_json(json).unwrap();
        assert_eq!(metadata, PackageMetadata::new("core", "pkg", "1.2.0", "20230101000000"));
    }

    #[test]
    fn test_from_json_missing_field() {
        let json = br#"{"origin": "core", "name": "pkg", "version": "1.2.0"}"#;
        assert!(PackageMetadata::from_json(json).is_err());
    }

    #[rstest]
    #[case(PackageMetadata::new("", "pkg", "1.0", "1"), "origin")]
    #[case(PackageMetadata::new("core", "a/b", "1.0", "1"), "name")]
    #[case(PackageMetadata::new("core", "pkg", "..", "1"), "version")]
    #[case(PackageMetadata::new("core", "pkg", "1.0", "."), "release")]
    fn test_validate_rejects(#[case] metadata: PackageMetadata, #[case] expected: &str) {
        let err = metadata.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidMetadata(field) if *field == expected));
    }

    #[test]
    fn test_validate_accepts() {
        let metadata = PackageMetadata::new("core", "pkg", "1.2.0", "20230101000000");
        assert_eq!(metadata.clone().validate().unwrap(), metadata);
    }
}
