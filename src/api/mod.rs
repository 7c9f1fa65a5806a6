//! Typed API modules: one function per backend command.
//!
//! Inputs serialize camelCase and omit absent optional fields. Outputs decode
//! into typed structs; fields the backend may leave out fall back to defaults
//! rather than failing the whole response.

pub mod ideas;
pub mod logs;
pub mod news;
pub mod settings;
pub mod storage;
pub mod tasks;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{ id }` payload shared by the get/delete style commands.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct IdInput {
    pub id: i64,
}

/// `{ backupPath }` / `{ importPath }` style payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackupPathInput<'a> {
    pub backup_path: &'a str,
}

/// Decode a flag the backend may send as a bool, a 0/1 integer, a string, or not at all.
///
/// | wire value | result |
/// |---|---|
/// | `true` / `false` | as is |
/// | number | `!= 0` |
/// | `"true"`, `"1"`, `"yes"` | `true` |
/// | other string, `null` | `false` |
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

/// Decode a count that may be missing, `null`, or negative (clamped to zero).
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: bool,
        #[serde(default, deserialize_with = "lenient_count")]
        count: u64,
    }

    fn decode(v: Value) -> Flags {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn lenient_bool_accepts_backend_encodings() {
        assert!(decode(json!({"flag": true})).flag);
        assert!(decode(json!({"flag": 1})).flag);
        assert!(decode(json!({"flag": "yes"})).flag);
        assert!(!decode(json!({"flag": 0})).flag);
        assert!(!decode(json!({"flag": null})).flag);
        assert!(!decode(json!({})).flag);
    }

    #[test]
    fn lenient_count_defaults_and_clamps() {
        assert_eq!(decode(json!({})).count, 0);
        assert_eq!(decode(json!({"count": null})).count, 0);
        assert_eq!(decode(json!({"count": 12})).count, 12);
        assert_eq!(decode(json!({"count": -4})).count, 0);
        assert_eq!(decode(json!({"count": "7"})).count, 7);
    }
}
