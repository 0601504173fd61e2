//! Common types used across regionflow modules.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Read an integer out of a JSON value.
///
/// Declarative configs often carry numbers as floats (`30.0`), so integral
/// floats are accepted as well.
pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

/// Deserialize a non-negative integer that may be encoded as an integral float.
pub fn loose_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(0);
    }
    int_from_value(&value)
        .and_then(|i| u64::try_from(i).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("expected non-negative integer, got {}", value)))
}

/// Deserialize a `u32` that may be encoded as an integral float.
pub fn loose_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = loose_u64(deserializer)?;
    u32::try_from(n).map_err(|_| serde::de::Error::custom(format!("integer {} out of range", n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_from_value() {
        assert_eq!(int_from_value(&json!(30)), Some(30));
        assert_eq!(int_from_value(&json!(30.0)), Some(30));
        assert_eq!(int_from_value(&json!(-1)), Some(-1));
        assert_eq!(int_from_value(&json!(2.5)), None);
        assert_eq!(int_from_value(&json!("30")), None);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "loose_u32")]
        interval: u32,
    }

    #[test]
    fn test_loose_u32_accepts_floats() {
        let probe: Probe = serde_json::from_value(json!({"interval": 60.0})).unwrap();
        assert_eq!(probe.interval, 60);
    }

    #[test]
    fn test_loose_u32_rejects_negative() {
        let result: std::result::Result<Probe, _> = serde_json::from_value(json!({"interval": -5}));
        assert!(result.is_err());
    }
}
