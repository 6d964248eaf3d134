//! Type Definition Records
//!
//! Codec for the compact binary records describing one compiled type: name,
//! visibility flags, supertype, implemented interfaces, declared nested
//! types, and the member list. The scanner consumes decoded records; the
//! encoder exists for packaging pipelines and tests.
//!
//! Format (version 1, little-endian): magic `TDEF`, version byte, name,
//! flags, optional supertype, interface list, nested-type list, then a
//! `u32`-counted member section in which every member record is prefixed
//! with its own byte length. The per-member length prefix is what lets the
//! decoder drop a single corrupt member and keep the rest of the type.

use thiserror::Error;

use crate::wire::{self, Cursor, WireError};

pub const MAGIC: [u8; 4] = *b"TDEF";
pub const VERSION: u8 = 1;

/// Decode failure for a whole type definition record.
///
/// A corrupt individual member is not an error; it is skipped and counted
/// on [`TypeDef::skipped_members`].
#[derive(Debug, Error)]
pub enum TypeDefError {
    #[error("not a type definition record (bad magic)")]
    BadMagic,

    #[error("unsupported type definition version {0}")]
    UnsupportedVersion(u8),

    #[error("corrupt type definition at byte {offset}: {context}")]
    Corrupt { offset: usize, context: &'static str },
}

impl From<WireError> for TypeDefError {
    fn from(err: WireError) -> Self {
        TypeDefError::Corrupt {
            offset: err.offset,
            context: err.context,
        }
    }
}

/// Declared visibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Visibility::Public,
            1 => Visibility::Protected,
            2 => Visibility::Package,
            _ => Visibility::Private,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Visibility::Public => 0,
            Visibility::Protected => 1,
            Visibility::Package => 2,
            Visibility::Private => 3,
        }
    }

    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }
}

fn flags_byte(visibility: Visibility, synthetic: bool) -> u8 {
    (visibility.to_bits() << 1) | u8::from(synthetic)
}

fn split_flags(byte: u8) -> Result<(Visibility, bool), WireError> {
    if byte & 0b1111_1000 != 0 {
        return Err(WireError {
            offset: 0,
            context: "invalid flags byte",
        });
    }
    Ok((Visibility::from_bits(byte >> 1), byte & 1 != 0))
}

/// A nested type declared inside another type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedRef {
    pub name: String,
    pub visibility: Visibility,
    pub synthetic: bool,
}

/// The kind-specific payload of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Constructor {
        params: Option<Vec<String>>,
        exceptions: Option<Vec<String>>,
    },
    Method {
        name: String,
        return_type: Option<String>,
        params: Option<Vec<String>>,
        exceptions: Option<Vec<String>>,
    },
    Field {
        name: String,
        type_name: String,
    },
    /// Static initializer block. Present in compiled output, never part of
    /// a surface.
    Initializer,
}

const KIND_CONSTRUCTOR: u8 = 0;
const KIND_METHOD: u8 = 1;
const KIND_FIELD: u8 = 2;
const KIND_INITIALIZER: u8 = 3;

/// One declared member with its visibility flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDef {
    pub visibility: Visibility,
    pub synthetic: bool,
    pub kind: MemberKind,
}

impl MemberDef {
    pub fn constructor(params: Option<Vec<String>>, exceptions: Option<Vec<String>>) -> Self {
        Self::public(MemberKind::Constructor { params, exceptions })
    }

    pub fn method(
        name: impl Into<String>,
        return_type: Option<String>,
        params: Option<Vec<String>>,
        exceptions: Option<Vec<String>>,
    ) -> Self {
        Self::public(MemberKind::Method {
            name: name.into(),
            return_type,
            params,
            exceptions,
        })
    }

    pub fn field(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::public(MemberKind::Field {
            name: name.into(),
            type_name: type_name.into(),
        })
    }

    pub fn initializer() -> Self {
        Self::public(MemberKind::Initializer)
    }

    fn public(kind: MemberKind) -> Self {
        Self {
            visibility: Visibility::Public,
            synthetic: false,
            kind,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    fn encode_body(&self, out: &mut Vec<u8>) {
        match &self.kind {
            MemberKind::Constructor { params, exceptions } => {
                out.push(KIND_CONSTRUCTOR);
                out.push(flags_byte(self.visibility, self.synthetic));
                wire::put_opt_list(out, params.as_deref());
                wire::put_opt_list(out, exceptions.as_deref());
            }
            MemberKind::Method {
                name,
                return_type,
                params,
                exceptions,
            } => {
                out.push(KIND_METHOD);
                out.push(flags_byte(self.visibility, self.synthetic));
                wire::put_str(out, name);
                wire::put_opt_str(out, return_type.as_deref());
                wire::put_opt_list(out, params.as_deref());
                wire::put_opt_list(out, exceptions.as_deref());
            }
            MemberKind::Field { name, type_name } => {
                out.push(KIND_FIELD);
                out.push(flags_byte(self.visibility, self.synthetic));
                wire::put_str(out, name);
                wire::put_str(out, type_name);
            }
            MemberKind::Initializer => {
                out.push(KIND_INITIALIZER);
                out.push(flags_byte(self.visibility, self.synthetic));
            }
        }
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let mut cur = Cursor::new(body);
        let kind_byte = cur.read_u8()?;
        let (visibility, synthetic) = split_flags(cur.read_u8()?)?;

        let kind = match kind_byte {
            KIND_CONSTRUCTOR => MemberKind::Constructor {
                params: cur.read_opt_list()?,
                exceptions: cur.read_opt_list()?,
            },
            KIND_METHOD => MemberKind::Method {
                name: cur.read_str()?,
                return_type: cur.read_opt_str()?,
                params: cur.read_opt_list()?,
                exceptions: cur.read_opt_list()?,
            },
            KIND_FIELD => MemberKind::Field {
                name: cur.read_str()?,
                type_name: cur.read_str()?,
            },
            KIND_INITIALIZER => MemberKind::Initializer,
            _ => {
                return Err(WireError {
                    offset: 0,
                    context: "unknown member kind",
                })
            }
        };

        if !cur.is_empty() {
            return Err(WireError {
                offset: cur.offset(),
                context: "trailing bytes in member record",
            });
        }
        Ok(Self {
            visibility,
            synthetic,
            kind,
        })
    }
}

/// One decoded compiled type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub visibility: Visibility,
    pub synthetic: bool,
    pub supertype: Option<String>,
    pub interfaces: Vec<String>,
    pub nested: Vec<NestedRef>,
    pub members: Vec<MemberDef>,
    /// Member records dropped during decode because their body was corrupt.
    pub skipped_members: usize,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            synthetic: false,
            supertype: None,
            interfaces: Vec::new(),
            nested: Vec::new(),
            members: Vec::new(),
            skipped_members: 0,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn with_supertype(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_nested(
        mut self,
        name: impl Into<String>,
        visibility: Visibility,
        synthetic: bool,
    ) -> Self {
        self.nested.push(NestedRef {
            name: name.into(),
            visibility,
            synthetic,
        });
        self
    }

    pub fn with_member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    /// Serialize to the version 1 record format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        wire::put_str(&mut out, &self.name);
        out.push(flags_byte(self.visibility, self.synthetic));
        wire::put_opt_str(&mut out, self.supertype.as_deref());

        wire::put_u16(&mut out, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            wire::put_str(&mut out, interface);
        }

        wire::put_u16(&mut out, self.nested.len() as u16);
        for nested in &self.nested {
            wire::put_str(&mut out, &nested.name);
            out.push(flags_byte(nested.visibility, nested.synthetic));
        }

        wire::put_u32(&mut out, self.members.len() as u32);
        let mut body = Vec::with_capacity(64);
        for member in &self.members {
            body.clear();
            member.encode_body(&mut body);
            wire::put_u16(&mut out, body.len() as u16);
            out.extend_from_slice(&body);
        }
        out
    }

    /// Decode a version 1 record.
    ///
    /// Structural violations (bad magic, truncation, invalid flags outside a
    /// member body, trailing bytes) fail the whole record; a corrupt member
    /// body only skips that member.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeDefError> {
        let mut cur = Cursor::new(bytes);

        if cur.take(4)? != MAGIC {
            return Err(TypeDefError::BadMagic);
        }
        let version = cur.read_u8()?;
        if version != VERSION {
            return Err(TypeDefError::UnsupportedVersion(version));
        }

        let name = cur.read_str()?;
        let flags_offset = cur.offset();
        let (visibility, synthetic) = split_flags(cur.read_u8()?).map_err(|mut e| {
            e.offset = flags_offset;
            TypeDefError::from(e)
        })?;
        let supertype = cur.read_opt_str()?;

        let interface_count = cur.read_u16()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count.min(256));
        for _ in 0..interface_count {
            interfaces.push(cur.read_str()?);
        }

        let nested_count = cur.read_u16()? as usize;
        let mut nested = Vec::with_capacity(nested_count.min(256));
        for _ in 0..nested_count {
            let nested_name = cur.read_str()?;
            let nested_flags_offset = cur.offset();
            let (nested_visibility, nested_synthetic) =
                split_flags(cur.read_u8()?).map_err(|mut e| {
                    e.offset = nested_flags_offset;
                    TypeDefError::from(e)
                })?;
            nested.push(NestedRef {
                name: nested_name,
                visibility: nested_visibility,
                synthetic: nested_synthetic,
            });
        }

        let member_count = cur.read_u32()? as usize;
        let mut members = Vec::with_capacity(member_count.min(1024));
        let mut skipped_members = 0usize;
        for _ in 0..member_count {
            let body_len = cur.read_u16()? as usize;
            let body = cur.take(body_len)?;
            match MemberDef::decode_body(body) {
                Ok(member) => members.push(member),
                Err(_) => skipped_members += 1,
            }
        }

        if !cur.is_empty() {
            return Err(TypeDefError::Corrupt {
                offset: cur.offset(),
                context: "trailing bytes after member section",
            });
        }

        Ok(Self {
            name,
            visibility,
            synthetic,
            supertype,
            interfaces,
            nested,
            members,
            skipped_members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_type() -> TypeDef {
        TypeDef::new("msg.Channel")
            .with_supertype("msg.AbstractChannel")
            .with_interface("msg.Closeable")
            .with_nested("msg.Channel$Buf", Visibility::Private, false)
            .with_member(MemberDef::constructor(Some(vec!["int".into()]), None))
            .with_member(MemberDef::method(
                "send",
                Some("boolean".into()),
                Some(vec!["string".into()]),
                Some(vec!["msg.SendFailed".into()]),
            ))
            .with_member(MemberDef::field("capacity", "int"))
            .with_member(MemberDef::initializer())
    }

    #[test]
    fn test_roundtrip() {
        let original = sample_type();
        let decoded = TypeDef::decode(&original.encode()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.skipped_members, 0);
    }

    #[test]
    fn test_roundtrip_preserves_absent_lists() {
        let original = TypeDef::new("a.B")
            .with_member(MemberDef::constructor(None, None))
            .with_member(MemberDef::constructor(Some(vec![]), Some(vec![])));
        let decoded = TypeDef::decode(&original.encode()).unwrap();
        assert_eq!(decoded.members, original.members);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_type().encode();
        bytes[0] = b'X';
        assert!(matches!(
            TypeDef::decode(&bytes),
            Err(TypeDefError::BadMagic)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = sample_type().encode();
        bytes[4] = 9;
        assert!(matches!(
            TypeDef::decode(&bytes),
            Err(TypeDefError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_record() {
        let bytes = sample_type().encode();
        let err = TypeDef::decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, TypeDefError::Corrupt { .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample_type().encode();
        bytes.push(0);
        let err = TypeDef::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            TypeDefError::Corrupt {
                context: "trailing bytes after member section",
                ..
            }
        ));
    }

    #[test]
    fn test_corrupt_member_is_skipped_not_fatal() {
        let original = TypeDef::new("a.B")
            .with_member(MemberDef::field("ok", "int"))
            .with_member(MemberDef::field("bad", "int"))
            .with_member(MemberDef::method("also_ok", None, None, None));
        let mut bytes = original.encode();

        // clobber the second member's kind byte; its length prefix keeps the
        // stream aligned
        let needle = {
            let mut body = Vec::new();
            MemberDef::field("bad", "int").encode_body(&mut body);
            body
        };
        let pos = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        bytes[pos] = 0xFF;

        let decoded = TypeDef::decode(&bytes).unwrap();
        assert_eq!(decoded.skipped_members, 1);
        assert_eq!(decoded.members.len(), 2);
        assert!(decoded.members.iter().all(|m| match &m.kind {
            MemberKind::Field { name, .. } => name == "ok",
            MemberKind::Method { name, .. } => name == "also_ok",
            _ => false,
        }));
    }

    #[test]
    fn test_flags_roundtrip() {
        let original = TypeDef::new("a.B")
            .with_visibility(Visibility::Package)
            .with_synthetic(true)
            .with_member(
                MemberDef::field("f", "int")
                    .with_visibility(Visibility::Private)
                    .with_synthetic(true),
            );
        let decoded = TypeDef::decode(&original.encode()).unwrap();

        assert_eq!(decoded.visibility, Visibility::Package);
        assert!(decoded.synthetic);
        assert_eq!(decoded.members[0].visibility, Visibility::Private);
        assert!(decoded.members[0].synthetic);
    }

    #[test]
    fn test_invalid_type_flags_fail() {
        let mut bytes = TypeDef::new("a.B").encode();
        // flags byte sits right after magic, version, and the name
        let flags_at = 4 + 1 + 2 + "a.B".len();
        bytes[flags_at] = 0b1000_0000;
        assert!(matches!(
            TypeDef::decode(&bytes),
            Err(TypeDefError::Corrupt {
                context: "invalid flags byte",
                ..
            })
        ));
    }
}
