//! Identifiers and shared record types.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Wire timestamp, keeping the offset the server sent.
///
/// Decoding then re-encoding preserves the instant and the offset, and
/// sub-second digits are kept to millisecond, microsecond or nanosecond
/// width as needed. The text is not byte-identical in every case: an all-zero
/// fraction is dropped, so `12:54:42.000-07:00` comes back as
/// `12:54:42-07:00`, and a zero offset is written as `Z`.
pub type Timestamp = DateTime<FixedOffset>;

/// A resource addressed either by numeric id or by slug.
///
/// # Examples
///
/// ```
/// use naturalist::ResourceRef;
///
/// assert_eq!(ResourceRef::from(42).to_string(), "42");
/// assert_eq!(ResourceRef::from("the-sonoran-desert").to_string(), "the-sonoran-desert");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// Numeric database id.
    Id(i64),
    /// URL slug such as `the-sonoran-desert`.
    Slug(String),
}

impl ResourceRef {
    /// Renders the reference as a single path segment.
    ///
    /// Characters that would break out of the segment are percent-encoded.
    pub fn path_segment(&self) -> String {
        match self {
            ResourceRef::Id(id) => id.to_string(),
            ResourceRef::Slug(slug) => encode_segment(slug),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Id(id) => write!(f, "{}", id),
            ResourceRef::Slug(slug) => f.write_str(slug),
        }
    }
}

impl From<i64> for ResourceRef {
    fn from(id: i64) -> Self {
        ResourceRef::Id(id)
    }
}

impl From<&str> for ResourceRef {
    fn from(slug: &str) -> Self {
        ResourceRef::Slug(slug.to_string())
    }
}

impl From<String> for ResourceRef {
    fn from(slug: String) -> Self {
        ResourceRef::Slug(slug)
    }
}

/// Percent-encodes a value for use as one path segment.
pub(crate) fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Decodes a string field that the server may send as `null` or omit.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A user as embedded in other records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleUser {
    /// User id.
    pub id: i64,
    /// Login handle; empty if the server sent none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub login: String,
    /// Display name.
    pub name: Option<String>,
}
