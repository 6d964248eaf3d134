//! Compatibility Verifier
//!
//! Compares a candidate surface against a reference surface (usually a
//! saved snapshot) and reports every shortfall as a finding. The check is
//! one-directional: the candidate must provide everything the reference
//! records, and anything extra in the candidate is compatible by
//! definition. A full pass always collects all findings; nothing stops at
//! the first one.

pub mod finding;

use serde::Serialize;
use thiserror::Error;

use crate::scanner::{ModuleSource, ScanError, ScanPolicy, ScanStats, SurfaceScanner};
use crate::signature::MemberSignature;
use crate::store::LibraryFingerprint;

pub use finding::{Finding, FindingSubject};

/// Fatal verification failure. An incompatible surface is not an error;
/// it is a [`Verdict`].
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Outcome of one comparison. `Incompatible` always carries at least one
/// finding; [`Verdict::from_findings`] is the only producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Compatible,
    Incompatible { findings: Vec<Finding> },
}

impl Verdict {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        if findings.is_empty() {
            Verdict::Compatible
        } else {
            Verdict::Incompatible { findings }
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Verdict::Compatible)
    }

    pub fn findings(&self) -> &[Finding] {
        match self {
            Verdict::Compatible => &[],
            Verdict::Incompatible { findings } => findings,
        }
    }
}

/// Verdict plus the scan counters for the candidate module.
#[derive(Debug)]
pub struct VerifyOutcome {
    pub verdict: Verdict,
    pub stats: ScanStats,
}

/// Compute every finding for `candidate` measured against `reference`.
///
/// Findings come out in reference order: types in name order, and within
/// a type the supertype first, then constructors, methods, and fields in
/// array order.
pub fn diff_fingerprints(
    reference: &LibraryFingerprint,
    candidate: &LibraryFingerprint,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for expected in reference.types() {
        let Some(actual) = candidate.get(&expected.name) else {
            findings.push(Finding::missing_type(&expected.name));
            continue;
        };

        // a supertype the reference never recorded is not required
        if let Some(expected_super) = expected.supertype.as_deref() {
            if actual.supertype.as_deref() != Some(expected_super) {
                findings.push(Finding::supertype_changed(
                    &expected.name,
                    expected_super,
                    actual.supertype.clone(),
                ));
            }
        }

        require_members(
            &mut findings,
            &expected.name,
            expected.constructors.as_deref(),
            actual.constructors.as_deref(),
            MemberSignature::Constructor,
        );
        require_members(
            &mut findings,
            &expected.name,
            expected.methods.as_deref(),
            actual.methods.as_deref(),
            MemberSignature::Method,
        );
        require_members(
            &mut findings,
            &expected.name,
            expected.fields.as_deref(),
            actual.fields.as_deref(),
            MemberSignature::Field,
        );
    }

    findings
}

fn require_members<T: Ord + Clone>(
    findings: &mut Vec<Finding>,
    type_name: &str,
    expected: Option<&[T]>,
    actual: Option<&[T]>,
    wrap: fn(T) -> MemberSignature,
) {
    let Some(expected) = expected else { return };
    for member in expected {
        let present = actual.is_some_and(|items| items.binary_search(member).is_ok());
        if !present {
            findings.push(Finding::missing_member(type_name, wrap(member.clone())));
        }
    }
}

/// Scans candidate modules and measures them against a reference
/// fingerprint.
pub struct Verifier {
    scanner: SurfaceScanner,
}

impl Verifier {
    pub fn new(policy: ScanPolicy) -> Self {
        Self {
            scanner: SurfaceScanner::new(policy),
        }
    }

    pub fn with_default_policy() -> Self {
        Self::new(ScanPolicy::default())
    }

    /// Scan the candidate module and compare it to the reference. Scan
    /// failures (I/O) are fatal; an incompatible surface is a verdict.
    pub fn verify(
        &self,
        reference: &LibraryFingerprint,
        source: &dyn ModuleSource,
    ) -> Result<VerifyOutcome, VerifyError> {
        let scan = self.scanner.scan_module(source)?;
        let verdict = Verdict::from_findings(diff_fingerprints(reference, &scan.fingerprint));

        if let Verdict::Incompatible { findings } = &verdict {
            tracing::info!(
                "candidate {} is incompatible: {} findings",
                source.describe(),
                findings.len()
            );
        }
        Ok(VerifyOutcome {
            verdict,
            stats: scan.stats,
        })
    }
}
