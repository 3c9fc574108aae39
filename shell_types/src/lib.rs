//! Shell Types - Level 1 Foundation Types
//!
//! This crate contains the data structures that describe a command set: the dynamic
//! [`Value`] exchanged between the shell and its host, the [`Signature`] every command
//! declares, and the [`Annotation`] attached to a parameter.
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! `class-shell` depends on this crate; this crate depends on nothing in the workspace.
//!
//! ## Contents
//!
//! - Dynamic values and their textual form
//! - Parameter and signature descriptors (explicit builders, compared structurally)
//! - Annotations: scalar coercions and choice sets
//!
//! ## Rules
//!
//! 1. **NO SESSION LOGIC** - Only descriptors and the coercion they carry
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **VALUES ARE SERIALIZABLE** - `Value` round-trips through serde

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// VALUES
// ============================================================================

/// Dynamic value passed to and returned from command bodies.
///
/// The `Display` form is the textual form used for choice matching, completion
/// candidates and `name=value` listings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in messages and status labels
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(map: BTreeMap<String, V>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(Value::None)
    }
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

/// Conversion function applied to a raw token
pub type ConvertFn = fn(&str) -> Result<Value, String>;

/// Named scalar coercion. Two coercions are equal when their names are.
#[derive(Clone)]
pub struct Coercion {
    name: String,
    convert: ConvertFn,
}

impl Coercion {
    pub fn new(name: impl Into<String>, convert: ConvertFn) -> Self {
        Self {
            name: name.into(),
            convert,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, text: &str) -> Result<Value, String> {
        (self.convert)(text)
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Coercion").field(&self.name).finish()
    }
}

impl PartialEq for Coercion {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

fn convert_text(text: &str) -> Result<Value, String> {
    Ok(Value::Str(text.to_string()))
}

fn convert_int(text: &str) -> Result<Value, String> {
    text.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| format!("invalid literal for int: '{}'", text))
}

fn convert_float(text: &str) -> Result<Value, String> {
    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| format!("invalid literal for float: '{}'", text))
}

fn convert_bool(text: &str) -> Result<Value, String> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
        _ => Err(format!("'{}' is not a boolean", text)),
    }
}

/// Parameter annotation: how a raw token becomes a [`Value`] and which
/// candidates it offers for completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Apply a conversion to the token
    Scalar(Coercion),
    /// Token must equal the textual form of one member; yields the member
    Sequence(Vec<Value>),
    /// Token must equal the textual form of one key; yields the associated value
    Mapping(Vec<(Value, Value)>),
}

impl Annotation {
    pub fn text() -> Self {
        Annotation::Scalar(Coercion::new("str", convert_text))
    }

    pub fn int() -> Self {
        Annotation::Scalar(Coercion::new("int", convert_int))
    }

    pub fn float() -> Self {
        Annotation::Scalar(Coercion::new("float", convert_float))
    }

    pub fn boolean() -> Self {
        Annotation::Scalar(Coercion::new("bool", convert_bool))
    }

    pub fn custom(name: impl Into<String>, convert: ConvertFn) -> Self {
        Annotation::Scalar(Coercion::new(name, convert))
    }

    pub fn choices<I, V>(members: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Annotation::Sequence(members.into_iter().map(Into::into).collect())
    }

    /// Integers `0..end`
    pub fn range(end: i64) -> Self {
        Annotation::Sequence((0..end).map(Value::Int).collect())
    }

    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Annotation::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_choice(&self) -> bool {
        !matches!(self, Annotation::Scalar(_))
    }

    /// Convert a raw token
    pub fn coerce(&self, text: &str) -> Result<Value, String> {
        match self {
            Annotation::Scalar(coercion) => coercion.apply(text),
            Annotation::Sequence(members) => members
                .iter()
                .find(|member| member.to_string() == text)
                .cloned()
                .ok_or_else(|| format!("'{}' is not a valid option", text)),
            Annotation::Mapping(pairs) => pairs
                .iter()
                .find(|(key, _)| key.to_string() == text)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| format!("'{}' is not a valid option", text)),
        }
    }

    /// Choice members whose textual form starts with `prefix`, ignoring case.
    /// Scalars offer nothing.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.members()
            .into_iter()
            .filter(|member| member.to_lowercase().starts_with(&prefix))
            .collect()
    }

    /// Textual forms of the choice members in declaration order
    pub fn members(&self) -> Vec<String> {
        match self {
            Annotation::Scalar(_) => Vec::new(),
            Annotation::Sequence(members) => members.iter().map(ToString::to_string).collect(),
            Annotation::Mapping(pairs) => pairs.iter().map(|(k, _)| k.to_string()).collect(),
        }
    }

    /// Label shown in help and in the status bar
    pub fn label(&self) -> String {
        match self {
            Annotation::Scalar(coercion) => coercion.name().to_string(),
            _ => format!("value from: {}", self.members().join(", ")),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// SIGNATURES
// ============================================================================

/// One fixed parameter of a command
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    /// `None` is the "no default" sentinel
    pub default: Option<Value>,
    /// `None` means the raw text is passed through
    pub annotation: Option<Annotation>,
    /// Help line
    pub doc: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            annotation: None,
            doc: None,
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// `name`, or `name[=default]` when a default exists
    pub fn label(&self) -> String {
        match &self.default {
            Some(default) => format!("{}[={}]", self.name, default),
            None => self.name.clone(),
        }
    }

    pub fn type_label(&self) -> String {
        self.annotation
            .as_ref()
            .map(Annotation::label)
            .unwrap_or_else(|| "str".to_string())
    }
}

/// Structural problems in a signature, detected at registration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("parameter '{param}' without default follows a parameter with a default")]
    NonDefaultAfterDefault { param: String },

    #[error("parameter '{param}' is declared more than once")]
    DuplicateParameter { param: String },
}

/// Parameter structure of a command: fixed parameters in order, then the
/// optional variadic-positional and variadic-keyword forms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    params: Vec<Param>,
    varargs: Option<String>,
    varkw: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain parameter (no default, no annotation)
    pub fn arg(self, name: impl Into<String>) -> Self {
        self.with(Param::new(name))
    }

    pub fn with(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self
    }

    pub fn varkw(mut self, name: impl Into<String>) -> Self {
        self.varkw = Some(name.into());
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn varargs_name(&self) -> Option<&str> {
        self.varargs.as_deref()
    }

    pub fn varkw_name(&self) -> Option<&str> {
        self.varkw.as_deref()
    }

    pub fn fixed_count(&self) -> usize {
        self.params.len()
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.has_default()).count()
    }

    pub fn has_variadic(&self) -> bool {
        self.varargs.is_some() || self.varkw.is_some()
    }

    /// No parameters of any form
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && !self.has_variadic()
    }

    /// Defaults must align to a suffix and names must be unique.
    pub fn check(&self) -> Result<(), SignatureError> {
        let mut seen_default = false;
        let mut names: Vec<&str> = Vec::with_capacity(self.params.len() + 2);
        for param in &self.params {
            if param.has_default() {
                seen_default = true;
            } else if seen_default {
                return Err(SignatureError::NonDefaultAfterDefault {
                    param: param.name.clone(),
                });
            }
            names.push(&param.name);
        }
        names.extend(self.varargs.as_deref());
        names.extend(self.varkw.as_deref());

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(SignatureError::DuplicateParameter {
                    param: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_textual_form() {
        assert_eq!(Value::None.to_string(), "none");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-3).to_string(), "-3");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "1");
        assert_eq!(Value::from(map).to_string(), "{a: 1}");
    }

    #[test]
    fn test_value_serde_untagged() {
        let value: Value = serde_json::from_str(r#"{"n": 1, "items": ["x", true, null]}"#).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["n"], Value::Int(1));
        assert_eq!(
            map["items"],
            Value::List(vec![
                Value::Str("x".into()),
                Value::Bool(true),
                Value::None
            ])
        );

        let yaml: Value = serde_yaml::from_str("2.5").unwrap();
        assert_eq!(yaml, Value::Float(2.5));
    }

    #[test]
    fn test_scalar_coercions() {
        assert_eq!(Annotation::int().coerce("42"), Ok(Value::Int(42)));
        assert!(Annotation::int().coerce("-").is_err());
        assert_eq!(Annotation::float().coerce("0.5"), Ok(Value::Float(0.5)));
        assert_eq!(Annotation::boolean().coerce("True"), Ok(Value::Bool(true)));
        assert_eq!(Annotation::text().coerce("x y"), Ok(Value::Str("x y".into())));
    }

    #[test]
    fn test_sequence_choice() {
        let choice = Annotation::choices(["aa", "ab", "bb"]);
        assert_eq!(choice.coerce("ab"), Ok(Value::Str("ab".into())));
        assert_eq!(
            choice.coerce("cc"),
            Err("'cc' is not a valid option".to_string())
        );
        assert_eq!(choice.complete("A"), vec!["aa", "ab"]);
        assert_eq!(choice.complete(""), vec!["aa", "ab", "bb"]);
        assert_eq!(choice.label(), "value from: aa, ab, bb");
    }

    #[test]
    fn test_range_choice_yields_members() {
        let choice = Annotation::range(2);
        assert_eq!(choice.coerce("1"), Ok(Value::Int(1)));
        assert!(choice.coerce("2").is_err());
    }

    #[test]
    fn test_mapping_choice_yields_associated_value() {
        let choice = Annotation::mapping([(11, "eleven"), (12, "twelve"), (22, "")]);
        assert_eq!(choice.coerce("11"), Ok(Value::Str("eleven".into())));
        assert_eq!(
            choice.coerce("13"),
            Err("'13' is not a valid option".to_string())
        );
        assert_eq!(choice.complete("1"), vec!["11", "12"]);
    }

    #[test]
    fn test_coercions_compare_by_name() {
        assert_eq!(Annotation::int(), Annotation::int());
        assert_ne!(Annotation::int(), Annotation::float());
        assert_ne!(Annotation::int(), Annotation::range(3));
    }

    #[test]
    fn test_param_labels() {
        let param = Param::new("val2").default(Value::None);
        assert_eq!(param.label(), "val2[=none]");
        assert_eq!(param.type_label(), "str");

        let typed = Param::new("count").annotated(Annotation::int());
        assert_eq!(typed.label(), "count");
        assert_eq!(typed.type_label(), "int");
    }

    #[test]
    fn test_signature_defaults_must_be_suffix() {
        let ok = Signature::new().arg("a").with(Param::new("b").default(1));
        assert!(ok.check().is_ok());
        assert_eq!(ok.required_count(), 1);

        let bad = Signature::new().with(Param::new("a").default(1)).arg("b");
        assert_eq!(
            bad.check(),
            Err(SignatureError::NonDefaultAfterDefault {
                param: "b".to_string()
            })
        );
    }

    #[test]
    fn test_signature_duplicate_names() {
        let bad = Signature::new().arg("a").varargs("a");
        assert!(matches!(
            bad.check(),
            Err(SignatureError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_empty_signature() {
        assert!(Signature::new().is_empty());
        assert!(!Signature::new().varkw("options").is_empty());
        assert!(Signature::new().varargs("values").has_variadic());
    }
}
