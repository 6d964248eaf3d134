//! Snapshot Persistence
//!
//! Versioned binary format for saved library fingerprints. A snapshot is
//! the header (magic `SFPR`, version byte, creation timestamp) followed by
//! the fingerprint body; the body encoding is also what the digest hashes,
//! so the timestamp never influences equality or digests.
//!
//! Saves go through a temporary file and an atomic rename, so a crashed
//! writer never leaves a truncated snapshot at the target path. The loader
//! re-validates the sort invariants instead of trusting the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::signature::{ConstructorSignature, FieldSignature, MethodSignature, TypeFingerprint};
use crate::wire::{self, Cursor, WireError};

use super::LibraryFingerprint;

pub const MAGIC: [u8; 4] = *b"SFPR";
pub const VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot file: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a surface snapshot file (bad magic)")]
    BadMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),

    #[error("corrupt snapshot at byte {offset}: {context}")]
    Corrupt { offset: usize, context: &'static str },
}

impl From<WireError> for SnapshotError {
    fn from(err: WireError) -> Self {
        SnapshotError::Corrupt {
            offset: err.offset,
            context: err.context,
        }
    }
}

/// A library fingerprint together with when it was taken. The timestamp is
/// file metadata only; structural comparison and digests see just the
/// fingerprint.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fingerprint: LibraryFingerprint,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(fingerprint: LibraryFingerprint) -> Self {
        Self {
            fingerprint,
            created_at: Utc::now(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        wire::put_i64(&mut out, self.created_at.timestamp());
        out.extend_from_slice(&encode_body(&self.fingerprint));
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let mut cur = Cursor::new(bytes);

        if cur.take(4)? != MAGIC {
            return Err(SnapshotError::BadMagic);
        }
        let version = cur.read_u8()?;
        if version != VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let created_offset = cur.offset();
        let seconds = cur.read_i64()?;
        let created_at =
            Utc.timestamp_opt(seconds, 0)
                .single()
                .ok_or(SnapshotError::Corrupt {
                    offset: created_offset,
                    context: "timestamp out of range",
                })?;

        let fingerprint = decode_body(&mut cur)?;
        if !cur.is_empty() {
            return Err(SnapshotError::Corrupt {
                offset: cur.offset(),
                context: "trailing bytes after snapshot body",
            });
        }

        Ok(Self {
            fingerprint,
            created_at,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Write to `<path>.tmp`, then rename over the target.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, self.encode()).map_err(|source| SnapshotError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// Canonical body encoding: type count, then each type in name order. This
/// is the digest input as well as the snapshot payload.
pub(crate) fn encode_body(lib: &LibraryFingerprint) -> Vec<u8> {
    let mut out = Vec::new();
    wire::put_u32(&mut out, lib.len() as u32);
    for fp in lib.types() {
        wire::put_str(&mut out, &fp.name);
        wire::put_opt_str(&mut out, fp.supertype.as_deref());
        put_array(&mut out, fp.constructors.as_deref(), put_constructor);
        put_array(&mut out, fp.methods.as_deref(), put_method);
        put_array(&mut out, fp.fields.as_deref(), put_field);
    }
    out
}

fn decode_body(cur: &mut Cursor<'_>) -> Result<LibraryFingerprint, SnapshotError> {
    let count = cur.read_u32()? as usize;
    let mut types: Vec<TypeFingerprint> = Vec::with_capacity(count.min(4096));

    for _ in 0..count {
        let start = cur.offset();
        let fp = TypeFingerprint {
            name: cur.read_str()?,
            supertype: cur.read_opt_str()?,
            constructors: read_array(cur, read_constructor)?,
            methods: read_array(cur, read_method)?,
            fields: read_array(cur, read_field)?,
        };
        if let Some(prev) = types.last() {
            if prev.name >= fp.name {
                return Err(SnapshotError::Corrupt {
                    offset: start,
                    context: "types out of order",
                });
            }
        }
        types.push(fp);
    }

    Ok(LibraryFingerprint::from_sorted(types))
}

fn put_array<T>(out: &mut Vec<u8>, items: Option<&[T]>, put_one: fn(&mut Vec<u8>, &T)) {
    match items {
        Some(items) => {
            out.push(1);
            wire::put_u32(out, items.len() as u32);
            for item in items {
                put_one(out, item);
            }
        }
        None => out.push(0),
    }
}

/// Read an optional signature array, enforcing strictly ascending order
/// (sorted and free of duplicates).
fn read_array<T: Ord>(
    cur: &mut Cursor<'_>,
    read_one: fn(&mut Cursor<'_>) -> Result<T, WireError>,
) -> Result<Option<Vec<T>>, SnapshotError> {
    if !cur.read_presence()? {
        return Ok(None);
    }
    let count = cur.read_u32()? as usize;
    let mut items: Vec<T> = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let start = cur.offset();
        let item = read_one(cur)?;
        if let Some(prev) = items.last() {
            if *prev >= item {
                return Err(SnapshotError::Corrupt {
                    offset: start,
                    context: "signature array out of order",
                });
            }
        }
        items.push(item);
    }
    Ok(Some(items))
}

fn put_constructor(out: &mut Vec<u8>, sig: &ConstructorSignature) {
    wire::put_opt_list(out, sig.params.as_deref());
    wire::put_opt_list(out, sig.exceptions.as_deref());
}

fn read_constructor(cur: &mut Cursor<'_>) -> Result<ConstructorSignature, WireError> {
    Ok(ConstructorSignature {
        params: cur.read_opt_list()?,
        exceptions: cur.read_opt_list()?,
    })
}

fn put_method(out: &mut Vec<u8>, sig: &MethodSignature) {
    wire::put_str(out, &sig.name);
    wire::put_opt_str(out, sig.return_type.as_deref());
    wire::put_opt_list(out, sig.params.as_deref());
    wire::put_opt_list(out, sig.exceptions.as_deref());
}

fn read_method(cur: &mut Cursor<'_>) -> Result<MethodSignature, WireError> {
    Ok(MethodSignature {
        name: cur.read_str()?,
        return_type: cur.read_opt_str()?,
        params: cur.read_opt_list()?,
        exceptions: cur.read_opt_list()?,
    })
}

fn put_field(out: &mut Vec<u8>, sig: &FieldSignature) {
    wire::put_str(out, &sig.name);
    wire::put_str(out, &sig.type_name);
}

fn read_field(cur: &mut Cursor<'_>) -> Result<FieldSignature, WireError> {
    Ok(FieldSignature {
        name: cur.read_str()?,
        type_name: cur.read_str()?,
    })
}
