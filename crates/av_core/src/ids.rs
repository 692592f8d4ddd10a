//! crates/av_core/src/ids.rs
//! Identifier newtypes: candidate project ids, vote ids, and seal digests.
//! Deterministic, strict shapes where the id is ours; permissive where the id
//! comes from stored documents we do not control. No I/O.

use alloc::borrow::ToOwned;
use alloc::string::String;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors returned when validating or parsing IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    Empty,
    TooLong,
    BadShape,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::Empty => f.write_str("empty"),
            IdError::TooLong => f.write_str("too long"),
            IdError::BadShape => f.write_str("bad shape"),
        }
    }
}

/// Document ids are capped at 1500 bytes by the backing store.
const MAX_DOC_ID_LEN: usize = 1500;
const HEX64_LEN: usize = 64;

/// Lowercase hex (length must be exactly 64).
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN
        && s.as_bytes()
            .iter()
            .all(|&b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Document id rules: non-empty, no `/`, not `.` or `..`, bounded length.
#[inline]
fn check_doc_id(s: &str) -> Result<(), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if s.len() > MAX_DOC_ID_LEN {
        return Err(IdError::TooLong);
    }
    if s.contains('/') || s == "." || s == ".." {
        return Err(IdError::BadShape);
    }
    Ok(())
}

macro_rules! string_newtype_display {
    ($name:ident) => {
        impl $name {
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(v: $name) -> String {
                v.0
            }
        }
    };
}

// === ProjectId (candidate) ===

/// Candidate project identifier.
///
/// Accepted verbatim; ids that are not candidates are ignored by the tally.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProjectId(String);

string_newtype_display!(ProjectId);

impl From<&str> for ProjectId {
    #[inline]
    fn from(s: &str) -> Self {
        ProjectId(s.to_owned())
    }
}

impl From<String> for ProjectId {
    #[inline]
    fn from(s: String) -> Self {
        ProjectId(s)
    }
}

// === VoteId ===

/// Identifier of a vote (assembly motion / budget round). Validated.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct VoteId(String);

string_newtype_display!(VoteId);

impl FromStr for VoteId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_doc_id(s)?;
        Ok(VoteId(s.to_owned()))
    }
}

impl TryFrom<&str> for VoteId {
    type Error = IdError;
    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for VoteId {
    type Error = IdError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        check_doc_id(&value)?;
        Ok(VoteId(value))
    }
}

// === SealDigest ===

/// 64-hex lowercase SHA-256 digest produced by the result seal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct SealDigest(String);

string_newtype_display!(SealDigest);

impl SealDigest {
    #[inline]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl FromStr for SealDigest {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if !is_valid_sha256(s) {
            return Err(IdError::BadShape);
        }
        Ok(SealDigest(s.to_owned()))
    }
}

impl TryFrom<String> for SealDigest {
    type Error = IdError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !is_valid_sha256(&value) {
            return Err(IdError::BadShape);
        }
        Ok(SealDigest(value))
    }
}
