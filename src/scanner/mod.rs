//! Surface Scanner
//!
//! Walks a module's compiled type definitions and produces one structural
//! fingerprint per externally visible type: the type's own non-private,
//! non-synthetic members plus everything flattened in from its supertype
//! chain and implemented interfaces. The scan policy decides which
//! referenced namespaces are walkable at all; nested types that turn out to
//! be private or synthetic are collected into a per-scan exclude set and
//! stripped from the final library fingerprint.
//!
//! All traversal is iterative (explicit work lists, no recursion) and all
//! scan state is local to one `scan_module` call, so independent scans can
//! run concurrently without sharing anything.

pub mod policy;
pub mod source;
pub mod typedef;

use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::signature::{
    canonical_type_name, ConstructorSignature, FieldSignature, MethodSignature, TypeFingerprint,
};
use crate::store::LibraryFingerprint;

pub use policy::{PolicyError, ScanPolicy, DEFAULT_POLICY_TOML};
pub use source::{DirSource, MemorySource, ModuleSource, SourceError};
pub use typedef::{MemberDef, MemberKind, TypeDef, TypeDefError, Visibility};

/// Fatal scan failure. Everything recoverable (unparsable type, missing
/// ancestor, out-of-policy reference) is a skip, not an error.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Counters describing one module scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Type names the source enumerated.
    pub types_listed: usize,
    /// Types that produced a fingerprint.
    pub types_fingerprinted: usize,
    /// Types skipped because they were missing, unparsable, private, or
    /// synthetic.
    pub types_skipped: usize,
    /// Types not scanned because policy excludes their namespace.
    pub types_out_of_policy: usize,
    /// Fingerprinted types dropped by the nested-type exclude set.
    pub types_excluded: usize,
    /// Corrupt member records dropped while decoding.
    pub members_skipped: usize,
    pub duration_ms: u64,
}

/// Result of scanning one module.
#[derive(Debug)]
pub struct ScanOutcome {
    pub fingerprint: LibraryFingerprint,
    pub stats: ScanStats,
}

struct ScannedType {
    fingerprint: TypeFingerprint,
    corrupt_members: usize,
}

/// The scanner: a scan policy applied to one module source at a time.
pub struct SurfaceScanner {
    policy: ScanPolicy,
}

impl SurfaceScanner {
    pub fn new(policy: ScanPolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self::new(ScanPolicy::default())
    }

    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    /// Scan every type the source provides and aggregate the surviving
    /// fingerprints into a library fingerprint.
    pub fn scan_module(&self, source: &dyn ModuleSource) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let names = source.type_names()?;

        let mut stats = ScanStats {
            types_listed: names.len(),
            ..Default::default()
        };
        let mut excludes: BTreeSet<String> = BTreeSet::new();
        let mut types: Vec<TypeFingerprint> = Vec::with_capacity(names.len());

        for name in &names {
            let canonical = canonical_type_name(name);
            if !self.policy.should_scan(&canonical) || self.policy.is_root(&canonical) {
                tracing::debug!("policy excludes {canonical}, not scanning");
                stats.types_out_of_policy += 1;
                continue;
            }
            match self.scan_type(source, name, &mut excludes)? {
                Some(scanned) => {
                    stats.types_fingerprinted += 1;
                    stats.members_skipped += scanned.corrupt_members;
                    types.push(scanned.fingerprint);
                }
                None => stats.types_skipped += 1,
            }
        }

        let before = types.len();
        let fingerprint = LibraryFingerprint::from_types(types, &excludes);
        stats.types_excluded = before - fingerprint.len();
        stats.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "scanned {}: {} of {} types fingerprinted ({} skipped, {} out of policy, {} excluded)",
            source.describe(),
            fingerprint.len(),
            stats.types_listed,
            stats.types_skipped,
            stats.types_out_of_policy,
            stats.types_excluded,
        );
        Ok(ScanOutcome { fingerprint, stats })
    }

    /// Fingerprint a single type, flattening inherited members.
    ///
    /// `Ok(None)` means the type was skipped: out of policy, missing,
    /// unparsable, private, or synthetic. Nested types discovered to be
    /// private or synthetic are added to `excludes`.
    pub fn fingerprint_type(
        &self,
        source: &dyn ModuleSource,
        type_name: &str,
        excludes: &mut BTreeSet<String>,
    ) -> Result<Option<TypeFingerprint>, ScanError> {
        Ok(self
            .scan_type(source, type_name, excludes)?
            .map(|scanned| scanned.fingerprint))
    }

    fn scan_type(
        &self,
        source: &dyn ModuleSource,
        type_name: &str,
        excludes: &mut BTreeSet<String>,
    ) -> Result<Option<ScannedType>, ScanError> {
        let canonical = canonical_type_name(type_name);
        if !self.policy.should_scan(&canonical) || self.policy.is_root(&canonical) {
            tracing::debug!("policy excludes {canonical}, not scanning");
            return Ok(None);
        }

        let def = match self.load_def(source, type_name)? {
            Some(def) => def,
            None => return Ok(None),
        };
        if def.visibility.is_private() || def.synthetic {
            tracing::debug!("{canonical} is private or synthetic, not emitted");
            return Ok(None);
        }

        let mut corrupt_members = def.skipped_members;
        let mut constructors: Vec<ConstructorSignature> = Vec::new();
        let mut methods: Vec<MethodSignature> = Vec::new();
        let mut fields: Vec<FieldSignature> = Vec::new();

        note_nested(&def, excludes);
        append_members(&def, &mut constructors, &mut methods, &mut fields);

        // one seen-set per fingerprint computation guards both walks
        let mut seen: BTreeSet<String> = BTreeSet::new();
        seen.insert(canonical.clone());
        let mut interface_queue: VecDeque<String> = def.interfaces.iter().cloned().collect();

        // supertype chain, bottom up; stops at the root, at an
        // out-of-policy namespace, or at an unresolvable ancestor
        let mut current_super = def.supertype.clone();
        while let Some(raw_super) = current_super {
            let super_canonical = canonical_type_name(&raw_super);
            if self.policy.is_root(&super_canonical) {
                break;
            }
            if !self.policy.should_scan(&super_canonical) {
                tracing::debug!("{canonical}: ancestor {super_canonical} is out of policy");
                break;
            }
            if !seen.insert(super_canonical.clone()) {
                tracing::debug!("{canonical}: ancestor cycle at {super_canonical}");
                break;
            }
            let ancestor = match self.load_def(source, &raw_super)? {
                Some(ancestor) => ancestor,
                None => break,
            };
            corrupt_members += ancestor.skipped_members;
            note_nested(&ancestor, excludes);
            append_members(&ancestor, &mut constructors, &mut methods, &mut fields);
            interface_queue.extend(ancestor.interfaces.iter().cloned());
            current_super = ancestor.supertype.clone();
        }

        // interface closure, including interfaces of interfaces; each
        // interface is independent, so skipping one does not stop the rest
        while let Some(raw_iface) = interface_queue.pop_front() {
            let iface_canonical = canonical_type_name(&raw_iface);
            if self.policy.is_root(&iface_canonical) || !self.policy.should_scan(&iface_canonical)
            {
                continue;
            }
            if !seen.insert(iface_canonical) {
                continue;
            }
            let iface = match self.load_def(source, &raw_iface)? {
                Some(iface) => iface,
                None => continue,
            };
            corrupt_members += iface.skipped_members;
            note_nested(&iface, excludes);
            append_members(&iface, &mut constructors, &mut methods, &mut fields);
            interface_queue.extend(iface.interfaces.iter().cloned());
        }

        if corrupt_members > 0 {
            tracing::warn!("{canonical}: {corrupt_members} unreadable member records dropped");
        }

        let mut fingerprint = TypeFingerprint::new(&def.name);
        if let Some(raw_super) = &def.supertype {
            // recorded whenever meaningful, independent of walkability
            if !self.policy.is_root(&canonical_type_name(raw_super)) {
                fingerprint = fingerprint.with_supertype(raw_super);
            }
        }
        if !constructors.is_empty() {
            fingerprint = fingerprint.with_constructors(constructors);
        }
        if !methods.is_empty() {
            fingerprint = fingerprint.with_methods(methods);
        }
        if !fields.is_empty() {
            fingerprint = fingerprint.with_fields(fields);
        }

        Ok(Some(ScannedType {
            fingerprint,
            corrupt_members,
        }))
    }

    /// Resolve and decode one type definition. `Ok(None)` covers "not
    /// found" and "unparsable", both recoverable; I/O failures propagate.
    fn load_def(
        &self,
        source: &dyn ModuleSource,
        type_name: &str,
    ) -> Result<Option<TypeDef>, ScanError> {
        let bytes = match source.resolve(type_name)? {
            Some(bytes) => bytes,
            None => {
                tracing::warn!("type {type_name} not found in {}", source.describe());
                return Ok(None);
            }
        };
        match TypeDef::decode(&bytes) {
            Ok(def) => Ok(Some(def)),
            Err(err) => {
                tracing::warn!("skipping unparsable type {type_name}: {err}");
                Ok(None)
            }
        }
    }
}

fn note_nested(def: &TypeDef, excludes: &mut BTreeSet<String>) {
    for nested in &def.nested {
        if nested.visibility.is_private() || nested.synthetic {
            excludes.insert(canonical_type_name(&nested.name));
        }
    }
}

fn append_members(
    def: &TypeDef,
    constructors: &mut Vec<ConstructorSignature>,
    methods: &mut Vec<MethodSignature>,
    fields: &mut Vec<FieldSignature>,
) {
    for member in &def.members {
        if member.visibility.is_private() || member.synthetic {
            continue;
        }
        match &member.kind {
            MemberKind::Constructor { params, exceptions } => constructors.push(
                ConstructorSignature::new(params.clone(), exceptions.clone()),
            ),
            MemberKind::Method {
                name,
                return_type,
                params,
                exceptions,
            } => methods.push(MethodSignature::new(
                name,
                return_type.clone(),
                params.clone(),
                exceptions.clone(),
            )),
            MemberKind::Field { name, type_name } => {
                fields.push(FieldSignature::new(name, type_name))
            }
            MemberKind::Initializer => {}
        }
    }
}
