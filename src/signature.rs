//! Signature Model
//!
//! Value types describing the externally visible surface of a compiled type:
//! constructor, method, and field signatures, and the per-type fingerprint
//! aggregating them. Equality is purely structural and every collection is
//! kept in a deterministic total order, so two independently produced
//! fingerprints of the same surface compare (and serialize) identically.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonicalize a type name to its single stable spelling.
///
/// - nested-type separator `$` becomes `.`
/// - array suffixes (including varargs `...`) normalize to one `[]` per
///   dimension
/// - primitive aliases fold to one spelling (`boolean` -> `bool`,
///   `int`/`integer` -> `int32`, `double` -> `float64`, ...)
///
/// Idempotent: canonical names map to themselves.
pub fn canonical_type_name(raw: &str) -> String {
    let mut base = raw.trim();
    let mut dims = 0usize;

    if let Some(stripped) = base.strip_suffix("...") {
        base = stripped.trim_end();
        dims += 1;
    }
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped.trim_end();
        dims += 1;
    }

    let mut name = if base.contains('.') || base.contains('$') {
        base.replace('$', ".")
    } else {
        canonical_primitive(base).to_string()
    };

    for _ in 0..dims {
        name.push_str("[]");
    }
    name
}

fn canonical_primitive(base: &str) -> &str {
    match base {
        "boolean" | "bool" => "bool",
        "byte" | "int8" => "int8",
        "short" | "int16" => "int16",
        "int" | "integer" | "int32" => "int32",
        "long" | "int64" => "int64",
        "character" | "char" => "char",
        "float" | "float32" => "float32",
        "double" | "float64" => "float64",
        "str" | "text" | "string" => "string",
        other => other,
    }
}

/// Sort by the signature total order and drop structurally equal neighbors.
pub fn sort_dedup<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items.dedup();
    items
}

fn canonical_names(names: Vec<String>) -> Vec<String> {
    names.iter().map(|n| canonical_type_name(n)).collect()
}

/// Constructor signature: the ordered parameter list and the declared
/// exception names. Either list may be absent, which is distinct from
/// present-but-empty and survives serialization as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorSignature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<String>>,
}

impl ConstructorSignature {
    /// Create a constructor signature. Parameter names are canonicalized in
    /// place; exception names are canonicalized, sorted, and deduplicated.
    pub fn new(params: Option<Vec<String>>, exceptions: Option<Vec<String>>) -> Self {
        Self {
            params: params.map(canonical_names),
            exceptions: exceptions.map(|e| sort_dedup(canonical_names(e))),
        }
    }
}

impl Ord for ConstructorSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.params
            .cmp(&other.params)
            .then_with(|| self.exceptions.cmp(&other.exceptions))
    }
}

impl PartialOrd for ConstructorSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ConstructorSignature {
    /// Renders as `constructor(p1, p2) raises e1, e2`. An absent parameter
    /// list renders without parentheses, distinguishing it from `()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constructor")?;
        fmt_params(f, self.params.as_deref())?;
        fmt_raises(f, self.exceptions.as_deref())
    }
}

/// Method signature. An absent return type means void.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<String>>,
}

impl MethodSignature {
    pub fn new(
        name: impl Into<String>,
        return_type: Option<String>,
        params: Option<Vec<String>>,
        exceptions: Option<Vec<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.map(|t| canonical_type_name(&t)),
            params: params.map(canonical_names),
            exceptions: exceptions.map(|e| sort_dedup(canonical_names(e))),
        }
    }
}

impl Ord for MethodSignature {
    /// Total order: name, then parameter list, then exception list, then
    /// return type as the final tie-break.
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.params.cmp(&other.params))
            .then_with(|| self.exceptions.cmp(&other.exceptions))
            .then_with(|| self.return_type.cmp(&other.return_type))
    }
}

impl PartialOrd for MethodSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        fmt_params(f, self.params.as_deref())?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {ret}")?;
        }
        fmt_raises(f, self.exceptions.as_deref())
    }
}

/// Field signature: name and declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSignature {
    pub name: String,
    pub type_name: String,
}

impl FieldSignature {
    pub fn new(name: impl Into<String>, type_name: &str) -> Self {
        Self {
            name: name.into(),
            type_name: canonical_type_name(type_name),
        }
    }
}

impl Ord for FieldSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.type_name.cmp(&other.type_name))
    }
}

impl PartialOrd for FieldSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_name)
    }
}

fn fmt_params(f: &mut fmt::Formatter<'_>, params: Option<&[String]>) -> fmt::Result {
    if let Some(params) = params {
        write!(f, "({})", params.join(", "))?;
    }
    Ok(())
}

fn fmt_raises(f: &mut fmt::Formatter<'_>, exceptions: Option<&[String]>) -> fmt::Result {
    if let Some(exceptions) = exceptions {
        if !exceptions.is_empty() {
            write!(f, " raises {}", exceptions.join(", "))?;
        }
    }
    Ok(())
}

/// One member of a type surface.
///
/// A closed set of three kinds; everything that consumes members matches
/// exhaustively over this union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberSignature {
    Constructor(ConstructorSignature),
    Method(MethodSignature),
    Field(FieldSignature),
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberSignature::Constructor(c) => write!(f, "{c}"),
            MemberSignature::Method(m) => write!(f, "method {m}"),
            MemberSignature::Field(fd) => write!(f, "field {fd}"),
        }
    }
}

/// Structural fingerprint of one type: its name, direct supertype, and the
/// flattened member surface, each member array sorted and deduplicated.
///
/// Any member array may be absent rather than present-but-empty; the
/// distinction is meaningful and preserved through persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFingerprint {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructors: Option<Vec<ConstructorSignature>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<MethodSignature>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldSignature>>,
}

impl TypeFingerprint {
    /// Create an empty fingerprint for the named type.
    pub fn new(name: &str) -> Self {
        Self {
            name: canonical_type_name(name),
            supertype: None,
            constructors: None,
            methods: None,
            fields: None,
        }
    }

    /// Set the direct supertype name.
    pub fn with_supertype(mut self, supertype: &str) -> Self {
        self.supertype = Some(canonical_type_name(supertype));
        self
    }

    /// Set the constructor array (sorted and deduplicated on the way in).
    pub fn with_constructors(mut self, constructors: Vec<ConstructorSignature>) -> Self {
        self.constructors = Some(sort_dedup(constructors));
        self
    }

    /// Set the method array (sorted and deduplicated on the way in).
    pub fn with_methods(mut self, methods: Vec<MethodSignature>) -> Self {
        self.methods = Some(sort_dedup(methods));
        self
    }

    /// Set the field array (sorted and deduplicated on the way in).
    pub fn with_fields(mut self, fields: Vec<FieldSignature>) -> Self {
        self.fields = Some(sort_dedup(fields));
        self
    }

    /// Total member count across all present arrays.
    pub fn member_count(&self) -> usize {
        self.constructors.as_ref().map_or(0, Vec::len)
            + self.methods.as_ref().map_or(0, Vec::len)
            + self.fields.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_primitives() {
        assert_eq!(canonical_type_name("boolean"), "bool");
        assert_eq!(canonical_type_name("int"), "int32");
        assert_eq!(canonical_type_name("integer"), "int32");
        assert_eq!(canonical_type_name("long"), "int64");
        assert_eq!(canonical_type_name("double"), "float64");
        assert_eq!(canonical_type_name("str"), "string");
        assert_eq!(canonical_type_name("net.Socket"), "net.Socket");
    }

    #[test]
    fn test_canonical_arrays_and_varargs() {
        assert_eq!(canonical_type_name("int[]"), "int32[]");
        assert_eq!(canonical_type_name("byte[][]"), "int8[][]");
        assert_eq!(canonical_type_name("string..."), "string[]");
        assert_eq!(canonical_type_name("net.Socket[]"), "net.Socket[]");
    }

    #[test]
    fn test_canonical_nested_names() {
        assert_eq!(canonical_type_name("pkg.Outer$Inner"), "pkg.Outer.Inner");
        assert_eq!(
            canonical_type_name("pkg.Outer$Inner$Deep[]"),
            "pkg.Outer.Inner.Deep[]"
        );
    }

    #[test]
    fn test_canonical_idempotent() {
        for raw in ["boolean", "int[]", "pkg.Outer$Inner", "string...", "char"] {
            let once = canonical_type_name(raw);
            assert_eq!(canonical_type_name(&once), once);
        }
    }

    #[test]
    fn test_method_ordering_by_name_then_params() {
        let a = MethodSignature::new("get", None, Some(vec![]), None);
        let b = MethodSignature::new("get", None, Some(vec!["int".into()]), None);
        let c = MethodSignature::new("put", None, None, None);
        let absent = MethodSignature::new("get", None, None, None);

        let sorted = sort_dedup(vec![c.clone(), b.clone(), a.clone(), absent.clone()]);
        assert_eq!(sorted, vec![absent, a, b, c]);
    }

    #[test]
    fn test_overloads_are_distinct() {
        let a = MethodSignature::new("send", None, Some(vec!["string".into()]), None);
        let b = MethodSignature::new(
            "send",
            None,
            Some(vec!["string".into(), "int".into()]),
            None,
        );
        assert_ne!(a, b);
        assert_eq!(sort_dedup(vec![a.clone(), b.clone(), a.clone()]).len(), 2);
    }

    #[test]
    fn test_constructor_exceptions_sorted() {
        let c = ConstructorSignature::new(
            Some(vec!["int".into()]),
            Some(vec!["z.Err".into(), "a.Err".into(), "z.Err".into()]),
        );
        assert_eq!(
            c.exceptions,
            Some(vec!["a.Err".to_string(), "z.Err".to_string()])
        );
    }

    #[test]
    fn test_display_forms() {
        let m = MethodSignature::new(
            "poll",
            Some("boolean".into()),
            Some(vec!["long".into()]),
            Some(vec!["io.Timeout".into()]),
        );
        assert_eq!(m.to_string(), "poll(int64) -> bool raises io.Timeout");

        let no_params = MethodSignature::new("close", None, None, None);
        assert_eq!(no_params.to_string(), "close");

        let empty_params = MethodSignature::new("close", None, Some(vec![]), None);
        assert_eq!(empty_params.to_string(), "close()");

        let f = FieldSignature::new("capacity", "int");
        assert_eq!(
            MemberSignature::Field(f).to_string(),
            "field capacity: int32"
        );
    }

    #[test]
    fn test_member_signature_json_tag() {
        let m = MemberSignature::Method(MethodSignature::new("run", None, Some(vec![]), None));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["kind"], "method");
        assert_eq!(json["name"], "run");
        assert!(json.get("return_type").is_none());

        let back: MemberSignature = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_fingerprint_builder_sorts_members() {
        let fp = TypeFingerprint::new("msg.Channel$Builder")
            .with_supertype("runtime.Any")
            .with_methods(vec![
                MethodSignature::new("z", None, None, None),
                MethodSignature::new("a", None, None, None),
                MethodSignature::new("a", None, None, None),
            ]);

        assert_eq!(fp.name, "msg.Channel.Builder");
        let names: Vec<&str> = fp
            .methods
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "z"]);
        assert_eq!(fp.member_count(), 2);
    }

    #[test]
    fn test_absent_arrays_skip_serialization() {
        let fp = TypeFingerprint::new("msg.Channel").with_methods(vec![]);
        let json = serde_json::to_value(&fp).unwrap();

        assert!(json.get("constructors").is_none());
        assert_eq!(json["methods"], serde_json::json!([]));
    }
}
