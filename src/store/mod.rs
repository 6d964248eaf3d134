//! Library Fingerprint Store
//!
//! Aggregates per-type fingerprints into the final library fingerprint (one
//! sorted, name-deduplicated collection per scanned module), computes the
//! shared surface between two fingerprints via sorted-merge intersection,
//! and persists snapshots (see [`snapshot`]).

pub mod snapshot;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::signature::TypeFingerprint;

pub use snapshot::{Snapshot, SnapshotError};

/// Sorted intersection of two sorted, deduplicated arrays.
///
/// Single forward scan advancing the smaller head; no hashing, no nested
/// loops. Absent inputs and empty intersections both yield `None`.
pub fn retain_sorted<T: Ord + Clone>(a: Option<&[T]>, b: Option<&[T]>) -> Option<Vec<T>> {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return None,
    };

    let mut shared = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                shared.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }

    if shared.is_empty() {
        None
    } else {
        Some(shared)
    }
}

/// The structural surface of one module: type fingerprints sorted by name
/// and deduplicated. Construction is the only producer; instances are
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryFingerprint {
    types: Vec<TypeFingerprint>,
}

impl LibraryFingerprint {
    /// Build from scanner output: drop excluded names, keep the first
    /// occurrence of each type name, sort by name.
    pub fn from_types(types: Vec<TypeFingerprint>, excludes: &BTreeSet<String>) -> Self {
        let mut kept: Vec<TypeFingerprint> = Vec::with_capacity(types.len());
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for fingerprint in types {
            if excludes.contains(&fingerprint.name) {
                tracing::debug!("excluding implementation type {}", fingerprint.name);
                continue;
            }
            if !seen.insert(fingerprint.name.clone()) {
                tracing::debug!("duplicate type {} dropped", fingerprint.name);
                continue;
            }
            kept.push(fingerprint);
        }

        kept.sort_by(|a, b| a.name.cmp(&b.name));
        Self { types: kept }
    }

    /// Wrap an already-sorted, deduplicated type list.
    pub(crate) fn from_sorted(types: Vec<TypeFingerprint>) -> Self {
        debug_assert!(types.windows(2).all(|w| w[0].name < w[1].name));
        Self { types }
    }

    pub fn types(&self) -> &[TypeFingerprint] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up a type by canonical name.
    pub fn get(&self, name: &str) -> Option<&TypeFingerprint> {
        self.types
            .binary_search_by(|fp| fp.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.types[idx])
    }

    pub fn total_members(&self) -> usize {
        self.types.iter().map(TypeFingerprint::member_count).sum()
    }

    /// The surface present in both fingerprints: name-matched types with
    /// per-kind sorted-merge intersection of their member arrays. A type
    /// whose recorded supertypes disagree keeps no supertype.
    pub fn common_surface(&self, other: &Self) -> Self {
        let mut common = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.types.len() && j < other.types.len() {
            let (a, b) = (&self.types[i], &other.types[j]);
            match a.name.cmp(&b.name) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let mut shared = TypeFingerprint::new(&a.name);
                    if a.supertype == b.supertype {
                        shared.supertype = a.supertype.clone();
                    }
                    shared.constructors =
                        retain_sorted(a.constructors.as_deref(), b.constructors.as_deref());
                    shared.methods = retain_sorted(a.methods.as_deref(), b.methods.as_deref());
                    shared.fields = retain_sorted(a.fields.as_deref(), b.fields.as_deref());
                    common.push(shared);
                    i += 1;
                    j += 1;
                }
            }
        }

        Self { types: common }
    }

    /// SHA-256 of the canonical body encoding, as lowercase hex. Stable
    /// across structurally equal fingerprints; snapshot metadata does not
    /// participate.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(snapshot::encode_body(self));
        format!("{:x}", hasher.finalize())
    }

    /// First 16 hex characters of the digest, for display.
    pub fn short_digest(&self) -> String {
        let digest = self.digest();
        digest[..16.min(digest.len())].to_string()
    }

    /// Deterministic human-readable listing, one type per block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for fp in &self.types {
            match &fp.supertype {
                Some(supertype) => out.push_str(&format!("type {} : {}\n", fp.name, supertype)),
                None => out.push_str(&format!("type {}\n", fp.name)),
            }
            for ctor in fp.constructors.as_deref().unwrap_or(&[]) {
                out.push_str(&format!("  {ctor}\n"));
            }
            for method in fp.methods.as_deref().unwrap_or(&[]) {
                out.push_str(&format!("  method {method}\n"));
            }
            for field in fp.fields.as_deref().unwrap_or(&[]) {
                out.push_str(&format!("  field {field}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::MethodSignature;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn named(name: &str) -> TypeFingerprint {
        TypeFingerprint::new(name)
    }

    fn with_methods(name: &str, methods: &[&str]) -> TypeFingerprint {
        TypeFingerprint::new(name).with_methods(
            methods
                .iter()
                .map(|m| MethodSignature::new(*m, None, None, None))
                .collect(),
        )
    }

    #[test]
    fn test_retain_identical() {
        let a = strs(&["a", "b", "c", "d"]);
        assert_eq!(
            retain_sorted(Some(&a), Some(&a)),
            Some(strs(&["a", "b", "c", "d"]))
        );
    }

    #[test]
    fn test_retain_subset() {
        let a = strs(&["a", "b", "c", "d"]);
        let b = strs(&["b", "c", "d"]);
        assert_eq!(retain_sorted(Some(&a), Some(&b)), Some(strs(&["b", "c", "d"])));
        assert_eq!(retain_sorted(Some(&b), Some(&a)), Some(strs(&["b", "c", "d"])));
    }

    #[test]
    fn test_retain_interleaved() {
        let a = strs(&["a", "c", "d"]);
        let b = strs(&["a", "b", "d"]);
        assert_eq!(retain_sorted(Some(&a), Some(&b)), Some(strs(&["a", "d"])));
    }

    #[test]
    fn test_retain_disjoint_and_empty() {
        let a = strs(&["a", "b"]);
        let b = strs(&["c", "d"]);
        let empty: Vec<String> = vec![];

        assert_eq!(retain_sorted(Some(&a), Some(&b)), None);
        assert_eq!(retain_sorted(Some(&a), Some(&empty)), None);
        assert_eq!(retain_sorted::<String>(None, Some(&b)), None);
        assert_eq!(retain_sorted::<String>(None, None), None);
    }

    #[test]
    fn test_from_types_sorts_and_dedups() {
        let types = vec![named("z.Z"), named("a.A"), named("m.M"), named("a.A")];
        let lib = LibraryFingerprint::from_types(types, &BTreeSet::new());

        let names: Vec<&str> = lib.types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a.A", "m.M", "z.Z"]);
    }

    #[test]
    fn test_from_types_first_occurrence_wins() {
        let first = with_methods("a.A", &["keep"]);
        let second = with_methods("a.A", &["drop"]);
        let lib = LibraryFingerprint::from_types(vec![first.clone(), second], &BTreeSet::new());

        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get("a.A"), Some(&first));
    }

    #[test]
    fn test_from_types_strips_excluded() {
        let mut excludes = BTreeSet::new();
        excludes.insert("a.Outer.Buf".to_string());

        let lib = LibraryFingerprint::from_types(
            vec![named("a.Outer"), named("a.Outer.Buf")],
            &excludes,
        );
        assert_eq!(lib.len(), 1);
        assert!(lib.get("a.Outer.Buf").is_none());
    }

    #[test]
    fn test_get_by_name() {
        let lib = LibraryFingerprint::from_types(
            vec![named("a.A"), named("b.B"), named("c.C")],
            &BTreeSet::new(),
        );
        assert!(lib.get("b.B").is_some());
        assert!(lib.get("b.Missing").is_none());
    }

    #[test]
    fn test_common_surface() {
        let old = LibraryFingerprint::from_types(
            vec![
                with_methods("a.Shared", &["both", "old_only"]).with_supertype("a.Base"),
                with_methods("a.OldOnly", &["x"]),
            ],
            &BTreeSet::new(),
        );
        let new = LibraryFingerprint::from_types(
            vec![
                with_methods("a.Shared", &["both", "new_only"]).with_supertype("a.Base"),
                with_methods("a.NewOnly", &["y"]),
            ],
            &BTreeSet::new(),
        );

        let common = old.common_surface(&new);
        assert_eq!(common.len(), 1);

        let shared = common.get("a.Shared").unwrap();
        assert_eq!(shared.supertype.as_deref(), Some("a.Base"));
        let names: Vec<&str> = shared
            .methods
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["both"]);
        assert_eq!(shared.constructors, None);
    }

    #[test]
    fn test_common_surface_supertype_disagreement() {
        let a = LibraryFingerprint::from_types(
            vec![named("x.T").with_supertype("x.Base")],
            &BTreeSet::new(),
        );
        let b = LibraryFingerprint::from_types(
            vec![named("x.T").with_supertype("x.Other")],
            &BTreeSet::new(),
        );

        let common = a.common_surface(&b);
        assert_eq!(common.get("x.T").unwrap().supertype, None);
    }

    #[test]
    fn test_digest_tracks_structure() {
        let a = LibraryFingerprint::from_types(
            vec![with_methods("a.A", &["m", "n"])],
            &BTreeSet::new(),
        );
        let b = LibraryFingerprint::from_types(
            vec![with_methods("a.A", &["m", "n"])],
            &BTreeSet::new(),
        );
        let c = LibraryFingerprint::from_types(vec![with_methods("a.A", &["m"])], &BTreeSet::new());

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
        assert_eq!(a.short_digest().len(), 16);
    }

    #[test]
    fn test_render_lists_members_in_order() {
        let lib = LibraryFingerprint::from_types(
            vec![with_methods("a.A", &["z", "a"]).with_supertype("a.Base")],
            &BTreeSet::new(),
        );
        let rendered = lib.render();

        assert!(rendered.contains("type a.A : a.Base"));
        let a_pos = rendered.find("method a").unwrap();
        let z_pos = rendered.find("method z").unwrap();
        assert!(a_pos < z_pos);
    }
}
