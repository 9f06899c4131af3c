//! Continuation token codec.

use std::fmt;

use serde::Serialize;

use super::cursor::{CursorData, CursorError};
use super::encoding::{
    Payload, TOKEN_VERSION, WireKey, decode_base64, encode_payload, value_from_wire,
};
use crate::builder::{SortSpec, Value};

/// Maximum accepted token length in bytes (4KB).
const MAX_TOKEN_SIZE: usize = 4 * 1024;

/// Maximum number of sort keys a token may carry.
const MAX_TOKEN_KEYS: usize = 16;

/// An opaque, URL-safe continuation token.
///
/// Tokens are deterministic: the same cursor and sort specification always produce the same
/// token. They are base64, **not encryption**; clients can read them, and nothing sensitive
/// should be used as a sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// The token text, as sent to clients.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContinuationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ContinuationToken> for String {
    fn from(token: ContinuationToken) -> Self {
        token.0
    }
}

/// A parsed token: the cursor values and the sort specification they were issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecodedToken {
    /// Sort-key values of the row the token resumes after.
    pub cursor: CursorData,
    /// The sort specification embedded in the token.
    pub spec: SortSpec,
}

/// Encode cursor data into a continuation token.
///
/// `cursor` must carry exactly one value per field of `spec`.
///
/// # Example
///
/// ```
/// use keyseek::{CursorData, SortSpec, decode_token, encode_token};
///
/// let spec = SortSpec::parse("-created_at,id", &[]).unwrap();
/// let cursor = CursorData::new().text("created_at", "2024-01-15").int("id", 42);
///
/// let token = encode_token(&cursor, &spec).unwrap();
/// let decoded = decode_token(token.as_str(), &spec).unwrap();
/// assert_eq!(decoded, Some(cursor));
/// ```
#[doc(alias = "encodeToken")]
pub fn encode_token(cursor: &CursorData, spec: &SortSpec) -> Result<ContinuationToken, CursorError> {
    let values = cursor.values_for(spec)?;
    let keys = spec
        .keys()
        .iter()
        .zip(values)
        .map(|(key, value)| WireKey::new(key, value))
        .collect();

    let payload = Payload {
        v: TOKEN_VERSION,
        keys,
    };
    Ok(ContinuationToken(encode_payload(&payload)))
}

/// Parse a token without checking it against an expected sort specification.
///
/// An absent or empty token means "first page" and yields `Ok(None)`. Anything else must be a
/// well-formed token; malformed input is an error, never a first-page fallback.
pub fn parse_token<'a>(
    token: impl Into<Option<&'a str>>,
) -> Result<Option<DecodedToken>, TokenError> {
    let token = match token.into() {
        None | Some("") => return Ok(None),
        Some(token) => token,
    };

    if token.len() > MAX_TOKEN_SIZE {
        return Err(TokenError::TooLarge { len: token.len() });
    }

    let bytes = decode_base64(token).map_err(|_| TokenError::InvalidBase64)?;
    let raw: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| TokenError::format(e.to_string()))?;

    // Check the version before the shape so a newer layout reports as unsupported.
    match raw.get("v").and_then(serde_json::Value::as_u64) {
        Some(TOKEN_VERSION) => {},
        Some(found) => return Err(TokenError::UnsupportedVersion { found }),
        None => return Err(TokenError::format("missing or non-numeric version")),
    }

    let payload: Payload =
        serde_json::from_value(raw).map_err(|e| TokenError::format(e.to_string()))?;

    if payload.keys.len() > MAX_TOKEN_KEYS {
        return Err(TokenError::TooManyFields {
            count: payload.keys.len(),
        });
    }

    let spec = SortSpec::new(payload.keys.iter().map(WireKey::sort_key))
        .map_err(|e| TokenError::format(e.to_string()))?;

    let mut cursor = CursorData::new();
    for key in payload.keys {
        let value: Value =
            value_from_wire(key.t, key.v.as_deref()).map_err(|reason| TokenError::InvalidValue {
                field: key.f.clone(),
                reason,
            })?;
        if value.is_null() && !key.n {
            return Err(TokenError::InvalidValue {
                field: key.f,
                reason: "null value for a key not marked nullable".to_string(),
            });
        }
        cursor = cursor.field(key.f, value);
    }

    Ok(Some(DecodedToken { cursor, spec }))
}

/// Decode a token issued for `spec`.
///
/// Returns `Ok(None)` for an absent or empty token (first page). A token issued for any
/// other sort specification is rejected with [`TokenError::SpecMismatch`].
#[doc(alias = "decodeToken")]
pub fn decode_token<'a>(
    token: impl Into<Option<&'a str>>,
    spec: &SortSpec,
) -> Result<Option<CursorData>, TokenError> {
    let Some(decoded) = parse_token(token)? else {
        return Ok(None);
    };

    if decoded.spec != *spec {
        return Err(TokenError::SpecMismatch {
            expected: spec.to_string(),
            found: decoded.spec.to_string(),
        });
    }

    Ok(Some(decoded.cursor))
}

/// Errors from decoding a continuation token.
///
/// Every variant is a client input error and should surface as a 400-class response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
#[doc(alias = "InvalidTokenError")]
pub enum TokenError {
    /// The token exceeds the maximum allowed size.
    TooLarge {
        /// Length of the rejected token
        len: usize,
    },
    /// The base64 encoding is invalid.
    InvalidBase64,
    /// The payload is not the expected structure.
    InvalidFormat {
        /// What was wrong
        reason: String,
    },
    /// The payload has a version this build does not understand.
    UnsupportedVersion {
        /// The version found in the token
        found: u64,
    },
    /// The token carries more sort keys than allowed.
    TooManyFields {
        /// Number of keys in the token
        count: usize,
    },
    /// A value could not be parsed as its declared kind.
    InvalidValue {
        /// The field whose value is bad
        field: String,
        /// What was wrong
        reason: String,
    },
    /// The token was issued for a different sort specification.
    SpecMismatch {
        /// The sort specification the caller expected
        expected: String,
        /// The sort specification embedded in the token
        found: String,
    },
}

impl TokenError {
    fn format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Always `true`: a bad token is the client's fault.
    #[inline]
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        true
    }

    /// Returns `true` if the token is well-formed but belongs to another sort order.
    #[inline]
    #[must_use]
    pub const fn is_spec_mismatch(&self) -> bool {
        matches!(self, Self::SpecMismatch { .. })
    }

    /// Returns `true` if this is a size/limit error.
    #[inline]
    #[must_use]
    pub const fn is_limit_error(&self) -> bool {
        matches!(self, Self::TooLarge { .. } | Self::TooManyFields { .. })
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { len } => write!(
                f,
                "cursor token is {len} bytes, exceeds maximum size ({}KB limit)",
                MAX_TOKEN_SIZE / 1024
            ),
            Self::InvalidBase64 => write!(f, "invalid base64 encoding in cursor token"),
            Self::InvalidFormat { reason } => write!(f, "invalid cursor token format: {reason}"),
            Self::UnsupportedVersion { found } => write!(
                f,
                "unsupported cursor token version {found} (expected {TOKEN_VERSION})"
            ),
            Self::TooManyFields { count } => write!(
                f,
                "cursor token has {count} sort keys (max {MAX_TOKEN_KEYS})"
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid cursor value for '{field}': {reason}")
            },
            Self::SpecMismatch { expected, found } => write!(
                f,
                "cursor token was issued for sort '{found}', not '{expected}'"
            ),
        }
    }
}

impl std::error::Error for TokenError {}
