//! Storage models.

use crate::error::{Error, ErrorKind};
use std::fmt;
use std::str::FromStr;

/// Access control applied to an uploaded object.
///
/// Only the two policies the upload tool has ever needed. `Public` maps onto
/// S3's `public-read` canned ACL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Acl {
    #[default]
    Private,
    #[cfg_attr(feature = "serde", serde(alias = "public-read"))]
    Public,
}
impl Acl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}
impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for Acl {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "public" | "public-read" => Ok(Self::Public),
            _ => exn::bail!(ErrorKind::UnknownAcl(s.to_string())),
        }
    }
}

/// Acknowledgement returned by a store after a successful put.
///
/// Opaque as far as the pipeline is concerned; only used for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PutAck {
    /// Entity tag reported by the store, if it reported one.
    pub e_tag: Option<String>,
}
impl PutAck {
    pub fn new(e_tag: Option<impl Into<String>>) -> Self {
        Self { e_tag: e_tag.map(Into::into) }
    }
}
impl fmt::Display for PutAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.e_tag {
            Some(tag) => write!(f, "ETag {tag}"),
            None => f.write_str("no ETag"),
        }
    }
}
