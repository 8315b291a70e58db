use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Role,
};

/// Claims
///
/// The payload structure signed into every JSON Web Token (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the credential's UUID.
    pub sub: Uuid,
    /// The role at issue time. Role changes take effect on the next login.
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
}

/// TokenPayload
///
/// Decoded, verified claims. Immutable once issued and never stored server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub subject: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// TokenService
///
/// Issues and verifies signed, time-bound identity tokens with a symmetric key.
/// Verification is stateless: it reads neither a store nor the network, so a token
/// stays valid until it expires (there is no revocation list).
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `verify_at`,
        // which keeps verification a pure function of (token, key, now).
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: Uuid, role: Role) -> AppResult<String> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, subject: Uuid, role: Role, now: DateTime<Utc>) -> AppResult<String> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: subject,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> AppResult<TokenPayload> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies signature, structure and expiry relative to `now`.
    ///
    /// Errors: `TokenMalformed` when the string does not parse, `SignatureInvalid`
    /// when the signature (or algorithm) does not match the key, `TokenExpired`
    /// when `now` is past `exp`. The signature is checked before expiry.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<TokenPayload> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AppError::SignatureInvalid
                }
                _ => AppError::TokenMalformed,
            }
        })?;
        let claims = data.claims;

        let issued_at = timestamp(claims.iat)?;
        let expires_at = timestamp(claims.exp)?;

        if now > expires_at {
            return Err(AppError::TokenExpired);
        }

        Ok(TokenPayload {
            subject: claims.sub,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(AppError::TokenMalformed)
}
