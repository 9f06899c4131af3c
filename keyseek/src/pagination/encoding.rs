//! Token wire format.
//!
//! A token is URL-safe base64 (no padding) of a compact JSON payload:
//!
//! ```json
//! {"v":1,"keys":[{"f":"created_at","d":"desc","t":"ts","v":"2024-01-15T10:00:00.123Z"},
//!                {"f":"id","d":"asc","t":"int","v":"42"}]}
//! ```
//!
//! Every non-null value travels as text so integers beyond 2^53, exact decimals and
//! nanosecond timestamps survive any JSON consumer. `n: true` marks a nullable key and is
//! omitted otherwise.

use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::builder::{SortDir, SortKey, Value};

/// Current payload version.
pub(super) const TOKEN_VERSION: u64 = 1;

/// RFC 3339 in UTC for years 0000-9999. `%Y` signs any other year, so the whole
/// chrono range round-trips.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct Payload {
    pub(super) v: u64,
    pub(super) keys: Vec<WireKey>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct WireKey {
    pub(super) f: String,
    pub(super) d: WireDir,
    #[serde(default, skip_serializing_if = "is_false")]
    pub(super) n: bool,
    pub(super) t: WireKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) v: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip_serializing_if signature
const fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum WireDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(super) enum WireKind {
    Null,
    Bool,
    Int,
    Dec,
    Ts,
    Text,
}

impl From<SortDir> for WireDir {
    fn from(dir: SortDir) -> Self {
        match dir {
            SortDir::Asc => Self::Asc,
            SortDir::Desc => Self::Desc,
        }
    }
}

impl From<WireDir> for SortDir {
    fn from(dir: WireDir) -> Self {
        match dir {
            WireDir::Asc => Self::Asc,
            WireDir::Desc => Self::Desc,
        }
    }
}

impl WireKey {
    pub(super) fn new(key: &SortKey, value: &Value) -> Self {
        let (t, v) = value_to_wire(value);
        Self {
            f: key.field.clone(),
            d: key.dir.into(),
            n: key.nullable,
            t,
            v,
        }
    }

    pub(super) fn sort_key(&self) -> SortKey {
        let key = SortKey::new(self.f.clone(), self.d.into());
        if self.n { key.nullable() } else { key }
    }
}

/// Lossless text form of a value.
pub(super) fn value_to_wire(value: &Value) -> (WireKind, Option<String>) {
    match value {
        Value::Null => (WireKind::Null, None),
        Value::Bool(b) => (WireKind::Bool, Some(b.to_string())),
        Value::Int(i) => (WireKind::Int, Some(i.to_string())),
        Value::Decimal(d) => (WireKind::Dec, Some(d.to_string())),
        Value::Timestamp(t) => (
            WireKind::Ts,
            Some(t.format(TIMESTAMP_FORMAT).to_string()),
        ),
        Value::Text(s) => (WireKind::Text, Some(s.clone())),
    }
}

/// Parse a wire value back; the error string says what was wrong.
pub(super) fn value_from_wire(kind: WireKind, text: Option<&str>) -> Result<Value, String> {
    let text = match (kind, text) {
        (WireKind::Null, None) => return Ok(Value::Null),
        (WireKind::Null, Some(_)) => return Err("null value must not carry text".to_string()),
        (_, None) => return Err("missing value text".to_string()),
        (_, Some(text)) => text,
    };

    match kind {
        WireKind::Bool => text
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| e.to_string()),
        WireKind::Int => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| e.to_string()),
        WireKind::Dec => Decimal::from_str(text)
            .map(Value::Decimal)
            .map_err(|e| e.to_string()),
        WireKind::Ts => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .map(|t| Value::Timestamp(t.and_utc()))
            .map_err(|e| e.to_string()),
        WireKind::Text => Ok(Value::Text(text.to_string())),
        WireKind::Null => Ok(Value::Null),
    }
}

#[allow(clippy::expect_used)]
pub(super) fn encode_payload(payload: &Payload) -> String {
    // Plain structs of strings, bools and integers always serialize.
    let json = serde_json::to_vec(payload).expect("payload serialization is infallible");
    URL_SAFE_NO_PAD.encode(json)
}

pub(super) fn decode_base64(token: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Timelike, Utc};

    #[test]
    fn test_payload_shape() {
        let payload = Payload {
            v: TOKEN_VERSION,
            keys: vec![
                WireKey::new(&SortKey::desc("created_at"), &Value::Null),
                WireKey::new(&SortKey::asc("id").nullable(), &Value::Int(42)),
            ],
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"v":1,"keys":[{"f":"created_at","d":"desc","t":"null"},{"f":"id","d":"asc","n":true,"t":"int","v":"42"}]}"#
        );
    }

    #[test]
    fn test_encode_payload_carries_full_json() {
        let payload = Payload {
            v: TOKEN_VERSION,
            keys: Vec::new(),
        };
        let token = encode_payload(&payload);
        assert!(!token.is_empty());
        assert_eq!(decode_base64(&token).unwrap(), br#"{"v":1,"keys":[]}"#);
    }

    #[test]
    fn test_timestamp_keeps_nanoseconds() {
        let ts = Utc
            .with_ymd_and_hms(2024, 1, 15, 10, 0, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        let (kind, text) = value_to_wire(&Value::Timestamp(ts));
        assert_eq!(text.as_deref(), Some("2024-01-15T10:00:00.123456789Z"));
        assert_eq!(
            value_from_wire(kind, text.as_deref()).unwrap(),
            Value::Timestamp(ts)
        );
    }

    #[test]
    fn test_timestamp_years_outside_four_digits() {
        let cases = [
            (Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap(), "+10000-01-01T00:00:00Z"),
            (Utc.with_ymd_and_hms(-1, 6, 30, 12, 0, 0).unwrap(), "-0001-06-30T12:00:00Z"),
            (Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap(), "0001-01-01T00:00:00Z"),
        ];
        for (ts, expected) in cases {
            let (kind, text) = value_to_wire(&Value::Timestamp(ts));
            assert_eq!(text.as_deref(), Some(expected));
            assert_eq!(
                value_from_wire(kind, text.as_deref()).unwrap(),
                Value::Timestamp(ts)
            );
        }

        for ts in [DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC] {
            let (kind, text) = value_to_wire(&Value::Timestamp(ts));
            assert_eq!(
                value_from_wire(kind, text.as_deref()).unwrap(),
                Value::Timestamp(ts)
            );
        }
    }

    #[test]
    fn test_timestamp_requires_utc_designator() {
        assert!(value_from_wire(WireKind::Ts, Some("2024-01-15T10:00:00+01:00")).is_err());
        assert!(value_from_wire(WireKind::Ts, Some("2024-01-15T10:00:00")).is_err());
        assert_eq!(
            value_from_wire(WireKind::Ts, Some("2024-01-15T10:00:00.5Z")).unwrap(),
            Value::Timestamp(
                Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0)
                    .unwrap()
                    .with_nanosecond(500_000_000)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let d = Decimal::new(1050, 2); // 10.50
        let (kind, text) = value_to_wire(&Value::Decimal(d));
        assert_eq!(text.as_deref(), Some("10.50"));
        let Value::Decimal(back) = value_from_wire(kind, text.as_deref()).unwrap() else {
            panic!("expected decimal")
        };
        assert_eq!(back.scale(), 2);
    }

    #[test]
    fn test_large_int_as_text() {
        let (kind, text) = value_to_wire(&Value::Int(i64::MIN));
        assert_eq!(kind, WireKind::Int);
        assert_eq!(text.as_deref(), Some("-9223372036854775808"));
    }

    #[test]
    fn test_value_from_wire_rejects_bad_text() {
        assert!(value_from_wire(WireKind::Int, Some("12x")).is_err());
        assert!(value_from_wire(WireKind::Int, Some("99999999999999999999")).is_err());
        assert!(value_from_wire(WireKind::Ts, Some("yesterday")).is_err());
        assert!(value_from_wire(WireKind::Bool, Some("yes")).is_err());
        assert!(value_from_wire(WireKind::Dec, Some("1.2.3")).is_err());
        assert!(value_from_wire(WireKind::Text, None).is_err());
        assert!(value_from_wire(WireKind::Null, Some("x")).is_err());
    }
}
