//! Compatibility Findings
//!
//! Plain data records describing one way a candidate surface falls short
//! of a reference surface. Findings are collected, never raised; a
//! verification pass reports every one it discovers.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::signature::MemberSignature;

/// What part of the reference surface a finding concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum FindingSubject {
    /// The whole type is absent from the candidate.
    Type,

    /// The recorded direct supertype differs (or is gone).
    Supertype {
        expected: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        found: Option<String>,
    },

    /// One required member is absent from the candidate type.
    Member(MemberSignature),
}

/// A single incompatibility, tied to the type it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub type_name: String,
    pub subject: FindingSubject,
}

/// Serialized as `{type_name, ...subject fields, reason}`; the reason is
/// the `Display` rendering, so machine consumers get the same text humans
/// see.
impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            type_name: &'a str,
            #[serde(flatten)]
            subject: &'a FindingSubject,
            reason: String,
        }

        Repr {
            type_name: &self.type_name,
            subject: &self.subject,
            reason: self.to_string(),
        }
        .serialize(serializer)
    }
}

impl Finding {
    pub fn missing_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            subject: FindingSubject::Type,
        }
    }

    pub fn supertype_changed(
        type_name: impl Into<String>,
        expected: impl Into<String>,
        found: Option<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            subject: FindingSubject::Supertype {
                expected: expected.into(),
                found,
            },
        }
    }

    pub fn missing_member(type_name: impl Into<String>, member: MemberSignature) -> Self {
        Self {
            type_name: type_name.into(),
            subject: FindingSubject::Member(member),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            FindingSubject::Type => write!(f, "type {} is missing", self.type_name),
            FindingSubject::Supertype { expected, found } => match found {
                Some(found) => write!(
                    f,
                    "type {}: supertype changed from {} to {}",
                    self.type_name, expected, found
                ),
                None => write!(
                    f,
                    "type {}: supertype {} no longer recorded",
                    self.type_name, expected
                ),
            },
            FindingSubject::Member(member) => {
                write!(f, "type {}: missing {}", self.type_name, member)
            }
        }
    }
}
