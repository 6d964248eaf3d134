//! Scan Policy
//!
//! Injectable namespace policy deciding which referenced types the scanner
//! will walk at all. A name matching a deny prefix is invisible to scanning
//! (not a scan target, not a walkable ancestor or interface) unless an
//! allow prefix also matches; allow always wins. The policy also names the
//! universal root type, which ends every supertype chain.
//!
//! Policies are plain values passed into the scanner, never global state,
//! so concurrent scans with different policies cannot interfere.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default policy file contents written by `surfprint init`.
pub const DEFAULT_POLICY_TOML: &str = r#"# surfprint scan policy
#
# Types whose names match a deny prefix are excluded from scanning, both as
# scan targets and as resolved ancestor/interface types. An allow prefix
# overrides a deny prefix for the namespaces whose shapes matter to
# compatibility checks.

deny_prefixes = [
    "surfprint.",
    "runtime.",
]

allow_prefixes = [
    "runtime.msg.",
]

# Universal root type: ends every supertype chain and is never recorded.
root_type = "runtime.Any"
"#;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Allow/deny namespace prefix configuration for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanPolicy {
    /// Name prefixes excluded from scanning.
    pub deny_prefixes: Vec<String>,

    /// Name prefixes scanned even when a deny prefix matches.
    pub allow_prefixes: Vec<String>,

    /// The platform's universal root type.
    pub root_type: String,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            deny_prefixes: vec!["surfprint.".to_string(), "runtime.".to_string()],
            allow_prefixes: vec!["runtime.msg.".to_string()],
            root_type: "runtime.Any".to_string(),
        }
    }
}

impl ScanPolicy {
    /// A policy that scans everything. Useful for tests and for callers
    /// that filter upstream.
    pub fn permissive() -> Self {
        Self {
            deny_prefixes: Vec::new(),
            allow_prefixes: Vec::new(),
            root_type: "runtime.Any".to_string(),
        }
    }

    /// Load a policy from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| PolicyError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether a type name is in scope for scanning and walking.
    pub fn should_scan(&self, type_name: &str) -> bool {
        if self
            .allow_prefixes
            .iter()
            .any(|p| type_name.starts_with(p.as_str()))
        {
            return true;
        }
        !self
            .deny_prefixes
            .iter()
            .any(|p| type_name.starts_with(p.as_str()))
    }

    /// Whether a name is the universal root type.
    pub fn is_root(&self, type_name: &str) -> bool {
        type_name == self.root_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_denies_runtime_allows_messaging() {
        let policy = ScanPolicy::default();

        assert!(policy.should_scan("http.Client"));
        assert!(!policy.should_scan("runtime.List"));
        assert!(!policy.should_scan("surfprint.internal.Hook"));
        assert!(policy.should_scan("runtime.msg.Listener"));
        assert!(policy.is_root("runtime.Any"));
        assert!(!policy.is_root("runtime.AnyValue"));
    }

    #[test]
    fn test_permissive_scans_everything() {
        let policy = ScanPolicy::permissive();
        assert!(policy.should_scan("runtime.List"));
        assert!(policy.should_scan("surfprint.internal.Hook"));
    }

    #[test]
    fn test_default_toml_matches_default_policy() {
        let parsed: ScanPolicy = toml::from_str(DEFAULT_POLICY_TOML).unwrap();
        assert_eq!(parsed, ScanPolicy::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "deny_prefixes = [\"vendor.\"]\nroot_type = \"vendor.Base\"\n"
        )
        .unwrap();

        let policy = ScanPolicy::load(file.path()).unwrap();
        assert!(!policy.should_scan("vendor.Thing"));
        assert!(policy.is_root("vendor.Base"));
        // missing field falls back to the default allow list
        assert_eq!(policy.allow_prefixes, vec!["runtime.msg.".to_string()]);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "deny_prefixes = []\ntypo_field = 1\n").unwrap();

        assert!(matches!(
            ScanPolicy::load(file.path()),
            Err(PolicyError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ScanPolicy::load("/nonexistent/policy.toml"),
            Err(PolicyError::Io { .. })
        ));
    }
}
