//! Decoding and expiry checks for the session token.
//!
//! The backend issues JWTs, but the client never holds the signing key:
//! tokens are decoded without signature verification, exactly as the
//! server-side gateway that *does* verify them expects clients to. Only
//! the claims payload matters here, and the one check the client owns
//! is expiry.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried in a session token.
///
/// Everything beyond `sub` is optional: tokens from older backend
/// versions omit profile fields, and a missing `exp` is treated as
/// already expired rather than immortal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / account identifier.
    pub sub: String,

    /// Display name of the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Account email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Role granted to the account, e.g. "admin".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Issued-at, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Token decode errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Decode a token's claims without verifying its signature.
///
/// The algorithm is taken from the token's own header, so tokens signed
/// with any supported algorithm decode. Structure still matters: a
/// token that is not three base64 segments of valid JSON is rejected.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let header =
        jsonwebtoken::decode_header(token).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Ok(data.claims)
}

impl Claims {
    /// Whether the token is expired at the given instant.
    ///
    /// A token without an `exp` claim counts as expired: the client
    /// would otherwise treat it as valid forever.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => now.timestamp() >= exp,
            None => true,
        }
    }

    /// Expiration instant, if the token carries one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// True when the token grants the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    fn mint(claims: &impl serde::Serialize) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"test-secret-nobody-checks"),
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn decodes_full_claims() {
        let token = mint(&Claims {
            sub: "1234567890".into(),
            name: Some("Admin User".into()),
            email: Some("admin@example.com".into()),
            role: Some("admin".into()),
            iat: Some(1_516_239_022),
            exp: Some(1_916_239_022),
        });

        let claims = decode(&token).unwrap();
        assert_eq!(claims.sub, "1234567890");
        assert_eq!(claims.email.as_deref(), Some("admin@example.com"));
        assert!(claims.is_admin());
        assert!(!claims.is_expired(now()));
    }

    #[test]
    fn signature_is_not_verified() {
        // Two tokens with identical claims but different secrets must
        // both decode; the client never holds the signing key.
        let claims = serde_json::json!({ "sub": "s", "exp": 2_000_000_000i64 });
        let a = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"one"),
        )
        .unwrap();
        let b = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"two"),
        )
        .unwrap();

        assert_eq!(decode(&a).unwrap(), decode(&b).unwrap());
    }

    #[test]
    fn past_exp_is_expired() {
        let token = mint(&serde_json::json!({ "sub": "s", "exp": now().timestamp() - 1 }));
        assert!(decode(&token).unwrap().is_expired(now()));
    }

    #[test]
    fn exp_boundary_counts_as_expired() {
        let token = mint(&serde_json::json!({ "sub": "s", "exp": now().timestamp() }));
        assert!(decode(&token).unwrap().is_expired(now()));
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        let token = mint(&serde_json::json!({ "sub": "s" }));
        let claims = decode(&token).unwrap();
        assert_eq!(claims.exp, None);
        assert!(claims.is_expired(now()));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(decode("not-a-token"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(""), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("a.b.c"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn truncated_token_is_malformed() {
        let token = mint(&serde_json::json!({ "sub": "s", "exp": 2_000_000_000i64 }));
        let cut = &token[..token.len() / 2];
        assert!(decode(cut).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn expiry_agrees_with_timestamp_order(offset in -86_400i64..86_400) {
                let exp = now().timestamp() + offset;
                let token = mint(&serde_json::json!({ "sub": "s", "exp": exp }));
                let claims = decode(&token).unwrap();
                prop_assert_eq!(claims.is_expired(now()), now().timestamp() >= exp);
            }

            #[test]
            fn arbitrary_subjects_round_trip(sub in "[a-zA-Z0-9_-]{1,64}") {
                let token = mint(&serde_json::json!({ "sub": sub.clone() }));
                prop_assert_eq!(decode(&token).unwrap().sub, sub);
            }
        }
    }
}
