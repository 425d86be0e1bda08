//! Placement types.

use serde::{Deserialize, Serialize};

use crate::file::{FileObject, Visibility};

/// How a placement resolves an identity collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Replace the existing object and retire its old bytes.
    Overwrite,
    /// Keep both objects by storing the newcomer under a suffixed name.
    #[default]
    AutoSuffix,
    /// Refuse the placement and surface a conflict to the caller.
    Reject,
}

impl CollisionPolicy {
    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::AutoSuffix => "auto_suffix",
            Self::Reject => "reject",
        }
    }

    /// Parse the wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "overwrite" => Some(Self::Overwrite),
            "auto_suffix" => Some(Self::AutoSuffix),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Outcome of a successful placement.
#[derive(Debug, Clone)]
pub struct PlacedObject {
    /// Final stored file name, after sanitizing and collision handling.
    pub file_name: String,
    /// Folder the object landed in, already sanitized.
    pub folder_path: String,
    /// Canonical object key the bytes live under.
    pub object_key: String,
    /// Store-assigned id of the uploaded object.
    pub remote_object_id: String,
    /// Size of the stored payload in bytes.
    pub size_bytes: i64,
    /// Visibility the object was stored under.
    pub visibility: Visibility,
    /// Content type the object was stored with.
    pub content_type: String,
    /// Live row this placement displaced, for `Overwrite` only. The
    /// caller retires it once the new row is in place.
    pub superseded: Option<FileObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_policy_roundtrip() {
        for policy in [
            CollisionPolicy::Overwrite,
            CollisionPolicy::AutoSuffix,
            CollisionPolicy::Reject,
        ] {
            assert_eq!(CollisionPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(CollisionPolicy::parse("rename"), None);
    }

    #[test]
    fn test_default_policy_keeps_both_objects() {
        assert_eq!(CollisionPolicy::default(), CollisionPolicy::AutoSuffix);
    }
}
