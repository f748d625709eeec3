//! Predicate wire format
//!
//! ```json
//! {"type": "Eq", "args": ["genre", "jazz"]}
//! {"type": "And", "args": [{"type": "Eq", ...}, {"type": "Not", "args": [{...}]}]}
//! ```
//!
//! `Eq` takes two strings, `And`/`Or` two predicate objects, `Not` one.
//! Anything else (unknown type, wrong arity, non-string leaf, extra fields,
//! nesting past the depth limit) is `MalformedPredicate`.

use haystack_core::{HaystackError, HaystackResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::Predicate;

/// Depth limit applied when no store limit is at hand
pub const DEFAULT_MAX_DEPTH: usize = 64;

impl Predicate {
    /// Parse a JSON predicate with the default depth limit
    pub fn parse(json: &str) -> HaystackResult<Self> {
        Self::parse_with_depth(json, DEFAULT_MAX_DEPTH)
    }

    /// Parse a JSON predicate, rejecting trees deeper than `max_depth`
    pub fn parse_with_depth(json: &str, max_depth: usize) -> HaystackResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| HaystackError::malformed(format!("invalid JSON: {}", e)))?;
        Self::from_value(&value, max_depth)
    }

    /// Build a predicate from an already-parsed JSON value
    pub fn from_value(value: &Value, max_depth: usize) -> HaystackResult<Self> {
        parse_node(value, 1, max_depth)
    }

    /// Wire form of this predicate; `parse` is its inverse
    pub fn to_value(&self) -> Value {
        match self {
            Predicate::Eq { key, value } => json!({"type": "Eq", "args": [key, value]}),
            Predicate::And(a, b) => json!({"type": "And", "args": [a.to_value(), b.to_value()]}),
            Predicate::Or(a, b) => json!({"type": "Or", "args": [a.to_value(), b.to_value()]}),
            Predicate::Not(p) => json!({"type": "Not", "args": [p.to_value()]}),
        }
    }

    /// Wire form as a JSON string
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

fn parse_node(value: &Value, depth: usize, max_depth: usize) -> HaystackResult<Predicate> {
    if depth > max_depth {
        return Err(HaystackError::malformed(format!(
            "nesting deeper than {}",
            max_depth
        )));
    }
    let object = value
        .as_object()
        .ok_or_else(|| HaystackError::malformed("predicate must be a JSON object"))?;
    check_fields(object)?;

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| HaystackError::malformed("\"type\" must be a string"))?;
    let args = object
        .get("args")
        .and_then(Value::as_array)
        .ok_or_else(|| HaystackError::malformed("\"args\" must be an array"))?;

    match kind {
        "Eq" => {
            let [key, value] = expect_args::<2>(kind, args)?;
            let key = key
                .as_str()
                .ok_or_else(|| HaystackError::malformed("Eq key must be a string"))?;
            let value = value
                .as_str()
                .ok_or_else(|| HaystackError::malformed("Eq value must be a string"))?;
            Ok(Predicate::eq(key, value))
        }
        "And" => {
            let [a, b] = expect_args::<2>(kind, args)?;
            Ok(Predicate::And(
                Box::new(parse_node(a, depth + 1, max_depth)?),
                Box::new(parse_node(b, depth + 1, max_depth)?),
            ))
        }
        "Or" => {
            let [a, b] = expect_args::<2>(kind, args)?;
            Ok(Predicate::Or(
                Box::new(parse_node(a, depth + 1, max_depth)?),
                Box::new(parse_node(b, depth + 1, max_depth)?),
            ))
        }
        "Not" => {
            let [p] = expect_args::<1>(kind, args)?;
            Ok(Predicate::Not(Box::new(parse_node(p, depth + 1, max_depth)?)))
        }
        other => Err(HaystackError::malformed(format!(
            "unknown predicate type '{}'",
            other
        ))),
    }
}

fn check_fields(object: &Map<String, Value>) -> HaystackResult<()> {
    match object.keys().find(|k| *k != "type" && *k != "args") {
        Some(extra) => Err(HaystackError::malformed(format!(
            "unexpected field '{}'",
            extra
        ))),
        None => Ok(()),
    }
}

fn expect_args<'a, const N: usize>(
    kind: &str,
    args: &'a [Value],
) -> HaystackResult<[&'a Value; N]> {
    if args.len() != N {
        return Err(HaystackError::malformed(format!(
            "{} takes {} argument(s), got {}",
            kind,
            N,
            args.len()
        )));
    }
    Ok(std::array::from_fn(|i| &args[i]))
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Predicate::from_value(&value, DEFAULT_MAX_DEPTH).map_err(D::Error::custom)
    }
}
