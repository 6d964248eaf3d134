//! CLI Diagnostics
//!
//! Rich error types for the command line front end: diagnostic codes,
//! source spans for policy files, and actionable suggestions. Library
//! errors stay plain enums; this layer dresses them up for humans.

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::scanner::PolicyError;
use crate::store::SnapshotError;

#[derive(Error, Debug, Diagnostic)]
pub enum SurfprintError {
    #[error("cannot read snapshot: {path}")]
    #[diagnostic(code(surfprint::snapshot::unreadable), help("{suggestion}"))]
    BadSnapshot { path: String, suggestion: String },

    #[error("invalid scan policy: {advice}")]
    #[diagnostic(code(surfprint::policy::invalid))]
    InvalidPolicy {
        #[source_code]
        src: NamedSource<String>,
        #[label("error here")]
        span: SourceSpan,
        advice: String,
    },

    #[error("failed to read policy file: {path}")]
    #[diagnostic(
        code(surfprint::policy::unreadable),
        help("Check the path, or generate a fresh policy with: surfprint init")
    )]
    PolicyNotFound { path: String },

    #[error("module directory not found: {path}")]
    #[diagnostic(
        code(surfprint::module::not_found),
        help("The module must be a directory of .tdef type definition records")
    )]
    ModuleNotFound { path: String },
}

impl SurfprintError {
    /// Wrap a snapshot load failure with a suggestion matched to the cause.
    pub fn bad_snapshot(path: &Path, err: &SnapshotError) -> Self {
        let suggestion = match err {
            SnapshotError::Io { .. } => "Check that the file exists and is readable.\n\
                 Take a snapshot first: surfprint snapshot <module> -o <file>"
                .to_string(),
            SnapshotError::BadMagic => "The file is not a surfprint snapshot.\n\
                 Take one with: surfprint snapshot <module> -o <file>"
                .to_string(),
            SnapshotError::UnsupportedVersion(version) => format!(
                "The snapshot uses format version {version}, which this build cannot read.\n\
                 Re-take the snapshot with this version of surfprint."
            ),
            SnapshotError::Corrupt { .. } => format!(
                "The file is damaged ({err}).\n\
                 Re-take the snapshot from a known-good build."
            ),
        };

        Self::BadSnapshot {
            path: path.display().to_string(),
            suggestion,
        }
    }

    /// Turn a policy failure into a diagnostic, with a source span pointing
    /// into the TOML when the parser provides one.
    pub fn from_policy(err: PolicyError) -> Self {
        match err {
            PolicyError::Io { path, .. } => Self::PolicyNotFound {
                path: path.display().to_string(),
            },
            PolicyError::Parse { path, source } => {
                let text = std::fs::read_to_string(&path).unwrap_or_default();
                let span = source
                    .span()
                    .map(SourceSpan::from)
                    .unwrap_or_else(|| SourceSpan::from(0..0));
                Self::InvalidPolicy {
                    src: NamedSource::new(path.display().to_string(), text),
                    span,
                    advice: source.message().to_string(),
                }
            }
        }
    }

    pub fn module_not_found(path: &Path) -> Self {
        Self::ModuleNotFound {
            path: path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use crate::scanner::ScanPolicy;

    #[test]
    fn bad_magic_suggests_taking_a_snapshot() {
        let err = SurfprintError::bad_snapshot(Path::new("x.sfp"), &SnapshotError::BadMagic);
        if let SurfprintError::BadSnapshot { suggestion, .. } = err {
            assert!(suggestion.contains("surfprint snapshot"));
        } else {
            panic!("expected BadSnapshot");
        }
    }

    #[test]
    fn version_mismatch_names_the_version() {
        let err = SurfprintError::bad_snapshot(
            Path::new("x.sfp"),
            &SnapshotError::UnsupportedVersion(9),
        );
        if let SurfprintError::BadSnapshot { suggestion, .. } = err {
            assert!(suggestion.contains("version 9"));
        } else {
            panic!("expected BadSnapshot");
        }
    }

    #[test]
    fn policy_parse_error_carries_span() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "deny_prefixes = \"not-a-list\"\n").unwrap();

        let err = ScanPolicy::load(file.path()).unwrap_err();
        match SurfprintError::from_policy(err) {
            SurfprintError::InvalidPolicy { advice, .. } => assert!(!advice.is_empty()),
            other => panic!("expected InvalidPolicy, got {other:?}"),
        }
    }

    #[test]
    fn missing_policy_file_maps_to_not_found() {
        let err = ScanPolicy::load(PathBuf::from("/nonexistent/policy.toml")).unwrap_err();
        assert!(matches!(
            SurfprintError::from_policy(err),
            SurfprintError::PolicyNotFound { .. }
        ));
    }
}
