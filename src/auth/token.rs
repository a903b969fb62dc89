//! Signed session tokens (HS256 JWTs).
use crate::remote::structs::UserId;
use crate::twoface::{Cause, DescribeErr, ExternalError, Fallible, TfError};
use chrono::{offset::Utc, DateTime, TimeZone};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user's id, as a string
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token, so a single token can be revoked.
    pub jti: Uuid,
}

impl Claims {
    pub fn user_id(&self) -> Fallible<UserId> {
        self.sub
            .parse()
            .describe_err(ExternalError::new(Cause::UserBadAuth, "Invalid token"))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Issues and checks tokens with one secret.
#[derive(Clone)]
pub struct Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl Tokens {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// How long a fresh token lasts.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user_id: UserId) -> Fallible<(String, Claims)> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    /// Check the signature and expiry. Revocation is the caller's business.
    pub fn verify(&self, token: &str) -> Fallible<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).describe_err(
            ExternalError::new(Cause::UserBadAuth, "Invalid or expired token"),
        )?;
        if data.claims.user_id().is_err() {
            return Err(TfError::user(Cause::UserBadAuth, "Invalid token"));
        }
        Ok(data.claims)
    }
}
