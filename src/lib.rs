//! Surfprint - Library Surface Fingerprinting and Compatibility Verification
//!
//! Computes structural fingerprints of compiled library surfaces and checks
//! later builds against a saved fingerprint: every type, constructor,
//! method, and field the old surface exposed must still be present, while
//! anything added on top is compatible by definition.
//!
//! # Modules
//!
//! - `signature` - canonical member signatures and per-type fingerprints
//! - `scanner` - walks compiled type definitions into surface fingerprints
//! - `store` - library fingerprints, digests, and snapshot persistence
//! - `verifier` - one-directional compatibility comparison
//! - `graph` - module dependency graph with topological ordering
//!
//! # Example
//!
//! ```rust,ignore
//! use surfprint::scanner::{DirSource, SurfaceScanner};
//! use surfprint::store::Snapshot;
//!
//! // Fingerprint a directory of compiled type definitions
//! let scanner = SurfaceScanner::with_default_policy();
//! let outcome = scanner.scan_module(&DirSource::new("build/types"))?;
//!
//! // Persist the surface for later verification
//! Snapshot::new(outcome.fingerprint).save("surface.sfp")?;
//! ```

pub mod graph;
pub mod scanner;
pub mod signature;
pub mod store;
pub mod verifier;

pub(crate) mod wire;

// Re-export commonly used types
pub use scanner::{ScanPolicy, SurfaceScanner};
pub use store::{LibraryFingerprint, Snapshot};
pub use verifier::{Verdict, Verifier};
