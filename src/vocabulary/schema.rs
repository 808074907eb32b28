//! Shape of a vocabulary write payload and the check that enforces it.
//!
//! The shape is plain data ([`VOCABULARY_SHAPE`]); [`validate`] walks it
//! against an untyped JSON body and either yields a [`NewVocabulary`] or
//! every violation it found.

use std::{collections::HashMap, fmt};

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::repo_types::NewVocabulary;

pub const MAX_TEXT_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Anything; stored as its `String(value)` rendering.
    TagList,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub max_len: Option<usize>,
}

const fn field(name: &'static str, kind: FieldKind, required: bool, max_len: Option<usize>) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
        max_len,
    }
}

pub const VOCABULARY_SHAPE: &[FieldSpec] = &[
    field("original", FieldKind::Text, true, Some(MAX_TEXT_LEN)),
    field("translation", FieldKind::Text, true, Some(MAX_TEXT_LEN)),
    field("phonetic", FieldKind::Text, false, Some(MAX_TEXT_LEN)),
    field("tags", FieldKind::TagList, false, Some(MAX_TEXT_LEN)),
    field("level", FieldKind::Integer, false, None),
    field("created_at", FieldKind::Integer, false, None),
    field("updated_at", FieldKind::Integer, false, None),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    NotAnObject,
    Missing,
    Empty,
    WrongType { expected: &'static str },
    TooLong { max: usize, actual: usize },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::NotAnObject => f.write_str("body must be a JSON object"),
            Problem::Missing => f.write_str("is required"),
            Problem::Empty => f.write_str("must not be empty"),
            Problem::WrongType { expected } => write!(f, "must be {expected}"),
            Problem::TooLong { max, actual } => {
                write!(f, "is {actual} characters, at most {max} allowed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub problem: Problem,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.problem)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid vocabulary: {}", join(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

enum Coerced {
    Text(String),
    Int(i64),
}

/// Check `payload` against [`VOCABULARY_SHAPE`]. Unknown keys (`id`,
/// `example`, ...) are ignored.
pub fn validate(payload: &Value) -> Result<NewVocabulary, ValidationError> {
    let Some(obj) = payload.as_object() else {
        return Err(ValidationError {
            violations: vec![FieldViolation {
                field: "body",
                problem: Problem::NotAnObject,
            }],
        });
    };

    let mut values = HashMap::new();
    let mut violations = Vec::new();
    for spec in VOCABULARY_SHAPE {
        match check_field(spec, obj) {
            Ok(Some(v)) => {
                values.insert(spec.name, v);
            }
            Ok(None) => {}
            Err(problem) => violations.push(FieldViolation {
                field: spec.name,
                problem,
            }),
        }
    }
    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    Ok(NewVocabulary {
        original: take_text(&mut values, "original").unwrap_or_default(),
        translation: take_text(&mut values, "translation").unwrap_or_default(),
        phonetic: take_text(&mut values, "phonetic"),
        tags: take_text(&mut values, "tags"),
        level: take_int(&mut values, "level"),
        created_at: take_int(&mut values, "created_at"),
        updated_at: take_int(&mut values, "updated_at"),
    })
}

fn check_field(spec: &FieldSpec, obj: &Map<String, Value>) -> Result<Option<Coerced>, Problem> {
    let value = match obj.get(spec.name) {
        None | Some(Value::Null) if spec.required => return Err(Problem::Missing),
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    match spec.kind {
        FieldKind::Integer => coerce_int(value)
            .map(|n| Some(Coerced::Int(n)))
            .ok_or(Problem::WrongType {
                expected: "an integer",
            }),
        FieldKind::Text | FieldKind::TagList => {
            let text = match (spec.kind, value) {
                (FieldKind::TagList, v) => stringify_tags(v),
                (_, Value::String(s)) => s.clone(),
                _ => {
                    return Err(Problem::WrongType {
                        expected: "a string",
                    })
                }
            };
            if spec.required && text.is_empty() {
                return Err(Problem::Empty);
            }
            let len = text.chars().count();
            match spec.max_len {
                Some(max) if len > max => Err(Problem::TooLong { max, actual: len }),
                _ => Ok(Some(Coerced::Text(text))),
            }
        }
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render tags the way `String(tags)` does in a browser: arrays are joined
/// with `,` (nested ones flattened, `null` entries empty) and objects
/// collapse to `[object Object]`.
pub fn stringify_tags(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => js_number(n),
        Value::Array(items) => items
            .iter()
            .map(stringify_tags)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Whole floats print without a fraction; 1e21 and up switch to exponent form.
fn js_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() >= 1e21 => {
            let exp = format!("{f:e}");
            match exp.split_once('e') {
                Some((mantissa, power)) if !power.starts_with('-') => {
                    format!("{mantissa}e+{power}")
                }
                _ => exp,
            }
        }
        Some(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn take_text(values: &mut HashMap<&'static str, Coerced>, name: &str) -> Option<String> {
    match values.remove(name) {
        Some(Coerced::Text(s)) => Some(s),
        _ => None,
    }
}

fn take_int(values: &mut HashMap<&'static str, Coerced>, name: &str) -> Option<i64> {
    match values.remove(name) {
        Some(Coerced::Int(n)) => Some(n),
        _ => None,
    }
}
