//! Token claims.

use crate::error::{JwtError, Result};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seconds added on top of a token's remaining lifetime.
pub const EXPIRE_OFFSET_SECS: i64 = 3600;

/// Registered claims carried by Burnell tokens.
///
/// Field names are fixed by the `pulsar tokens` convention and must not be
/// renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, usually a service or tenant identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued-at, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Claims with a subject and no timestamps.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            sub: Some(subject.into()),
            iat: None,
            exp: None,
        }
    }

    /// Claims for a token issued now.
    ///
    /// A positive `expires_in` stamps `iat` and `exp`; zero or negative
    /// durations produce a non-expiring token with only `sub`. An expiry past
    /// the representable date range is [`JwtError::InvalidDuration`].
    pub fn issued_now(subject: impl Into<String>, expires_in: Duration) -> Result<Self> {
        let mut claims = Self::new(subject);
        if expires_in > Duration::zero() {
            let now = Utc::now();
            let exp = now
                .checked_add_signed(expires_in)
                .ok_or_else(|| JwtError::InvalidDuration(format!("{expires_in}")))?;
            claims.iat = Some(now.timestamp());
            claims.exp = Some(exp.timestamp());
        }
        Ok(claims)
    }

    /// Decode claims from a JSON payload, checking registered claim types.
    ///
    /// Unknown claims are ignored. Numeric timestamps with a fractional part
    /// are truncated to whole seconds.
    pub fn from_json(payload: &Map<String, Value>) -> Result<Self> {
        let sub = match payload.get("sub") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(JwtError::ClaimType {
                    claim: "sub",
                    expected: "a string",
                });
            }
        };

        Ok(Self {
            sub,
            iat: numeric_claim(payload, "iat")?,
            exp: numeric_claim(payload, "exp")?,
        })
    }

    /// Subject claim, required.
    pub fn subject(&self) -> Result<&str> {
        self.sub.as_deref().ok_or(JwtError::MissingSubject)
    }

    /// Whether `exp` is set and already in the past.
    pub fn is_expired(&self) -> bool {
        self.exp
            .is_some_and(|exp| exp < Utc::now().timestamp())
    }

    /// Seconds of validity left, see [`remaining_validity`].
    pub fn remaining_validity(&self) -> i64 {
        match self.exp {
            Some(exp) => remaining_validity(&Value::from(exp)),
            None => EXPIRE_OFFSET_SECS,
        }
    }
}

fn numeric_claim(payload: &Map<String, Value>, claim: &'static str) -> Result<Option<i64>> {
    match payload.get(claim) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or(JwtError::ClaimType {
                claim,
                expected: "a number",
            }),
        Some(_) => Err(JwtError::ClaimType {
            claim,
            expected: "a number",
        }),
    }
}

/// Seconds until the raw `exp` claim value, plus [`EXPIRE_OFFSET_SECS`].
///
/// Missing, non-numeric and past values all yield exactly
/// `EXPIRE_OFFSET_SECS`, never less. A return value alone does not tell
/// whether a token has expired.
pub fn remaining_validity(exp: &Value) -> i64 {
    let Some(exp) = exp.as_f64() else {
        return EXPIRE_OFFSET_SECS;
    };

    let now = Utc::now().timestamp();
    if exp <= now as f64 {
        return EXPIRE_OFFSET_SECS;
    }

    // Float to int casts saturate.
    let remaining = (exp as i64).saturating_sub(now);
    if remaining > 0 {
        remaining.saturating_add(EXPIRE_OFFSET_SECS)
    } else {
        EXPIRE_OFFSET_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_issued_now_with_expiry() {
        let claims = Claims::issued_now("svc1", Duration::hours(1)).unwrap();
        let iat = claims.iat.unwrap();
        assert_eq!(claims.exp.unwrap() - iat, 3600);
        assert_eq!(claims.sub.as_deref(), Some("svc1"));
    }

    #[test]
    fn test_issued_now_without_expiry() {
        assert_eq!(
            Claims::issued_now("svc1", Duration::zero()).unwrap(),
            Claims::new("svc1")
        );
        assert_eq!(
            Claims::issued_now("svc1", Duration::seconds(-5)).unwrap(),
            Claims::new("svc1")
        );
    }

    #[test]
    fn test_issued_now_beyond_date_range() {
        let err = Claims::issued_now("svc1", Duration::MAX).unwrap_err();
        assert!(matches!(err, JwtError::InvalidDuration(_)));
    }

    #[test]
    fn test_issued_now_with_longest_expiry() {
        let longest = crate::duration::parse_expiry("292y").unwrap();
        let claims = Claims::issued_now("svc1", longest).unwrap();
        assert_eq!(
            claims.exp.unwrap() - claims.iat.unwrap(),
            longest.num_seconds()
        );
    }

    #[test]
    fn test_serialize_omits_missing_timestamps() {
        let json = serde_json::to_string(&Claims::new("svc1")).unwrap();
        assert_eq!(json, r#"{"sub":"svc1"}"#);
    }

    #[test]
    fn test_from_json_typed() {
        let claims =
            Claims::from_json(&object(json!({"sub": "a", "iat": 10, "exp": 20.7, "x": true})))
                .unwrap();
        assert_eq!(claims.sub.as_deref(), Some("a"));
        assert_eq!(claims.iat, Some(10));
        assert_eq!(claims.exp, Some(20));
    }

    #[test]
    fn test_from_json_claim_type_errors() {
        let err = Claims::from_json(&object(json!({"sub": 42}))).unwrap_err();
        assert!(matches!(err, JwtError::ClaimType { claim: "sub", .. }));

        let err = Claims::from_json(&object(json!({"sub": "a", "exp": "soon"}))).unwrap_err();
        assert!(matches!(err, JwtError::ClaimType { claim: "exp", .. }));
    }

    #[test]
    fn test_missing_subject() {
        let claims = Claims::from_json(&object(json!({"exp": 20}))).unwrap();
        assert!(matches!(claims.subject(), Err(JwtError::MissingSubject)));
    }

    #[test]
    fn test_remaining_validity_future() {
        let exp = Utc::now().timestamp() + 100;
        let remaining = remaining_validity(&json!(exp));
        assert!((3698..=3700).contains(&remaining), "got {remaining}");
    }

    #[test]
    fn test_remaining_validity_is_lenient() {
        let past = Utc::now().timestamp() - 100;
        assert_eq!(remaining_validity(&json!(past)), EXPIRE_OFFSET_SECS);
        assert_eq!(remaining_validity(&json!("tomorrow")), EXPIRE_OFFSET_SECS);
        assert_eq!(remaining_validity(&Value::Null), EXPIRE_OFFSET_SECS);
        assert_eq!(Claims::new("svc1").remaining_validity(), EXPIRE_OFFSET_SECS);
    }

    #[test]
    fn test_remaining_validity_extreme_values() {
        assert_eq!(remaining_validity(&json!(-1.0e19)), EXPIRE_OFFSET_SECS);
        assert_eq!(remaining_validity(&json!(i64::MIN)), EXPIRE_OFFSET_SECS);
        assert!(remaining_validity(&json!(1.0e19)) > EXPIRE_OFFSET_SECS);

        let claims = Claims {
            exp: Some(i64::MIN),
            ..Claims::new("svc1")
        };
        assert_eq!(claims.remaining_validity(), EXPIRE_OFFSET_SECS);
    }

    #[test]
    fn test_is_expired() {
        let mut claims = Claims::new("svc1");
        assert!(!claims.is_expired());
        claims.exp = Some(Utc::now().timestamp() - 1);
        assert!(claims.is_expired());
    }
}
