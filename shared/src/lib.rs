use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Number of entries a board keeps unless configured otherwise.
pub const MAX_ENTRIES: usize = 10;
/// Name recorded for submissions that do not carry one.
pub const DEFAULT_NAME: &str = "Anonymous";

/// One ranked leaderboard record, exactly as it is persisted and returned to callers.
///
/// Older boards may hold `"name": null` or no name at all; both read back as
/// [`DEFAULT_NAME`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Entry {
    #[serde(default = "default_name", deserialize_with = "name_or_default")]
    pub name: String,
    pub score: i64,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn name_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_name))
}

impl Entry {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Loosely typed submission as it arrives from a collaborator (JSON body, CLI args).
///
/// Both fields are optional; [`Submission::into_entry`] applies the defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Submission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
}

impl Submission {
    pub fn into_entry(self) -> Entry {
        let score = self.score.as_ref().map(coerce_score).unwrap_or(0);
        Entry {
            name: normalize_name(self.name.as_deref()),
            score,
        }
    }
}

/// Envelope returned to the caller of a board operation.
///
/// Serializes as `{"status":"ok","leaderboard":[...]}` or
/// `{"status":"error","message":"..."}` so a rejected submission is never
/// mistaken for an accepted one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok { leaderboard: Vec<Entry> },
    Error { message: String },
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}

/// Substitutes [`DEFAULT_NAME`] for missing or blank names; any other name is kept verbatim.
pub fn normalize_name(name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => default_name(),
    }
}

/// Coerces an arbitrary JSON value into a score, falling back to 0.
pub fn coerce_score(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate_float))
            .unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => parse_score(s),
        _ => 0,
    }
}

/// Parses textual score input. Integers are taken as-is, finite decimals are
/// truncated toward zero, everything else is 0.
pub fn parse_score(input: &str) -> i64 {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_float))
        .unwrap_or(0)
}

fn truncate_float(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}
