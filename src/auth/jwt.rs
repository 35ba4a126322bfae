use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{SessionClaims, TokenSubject};
use super::{password, CredentialError};
use crate::config::SecurityConfig;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Hashes passwords and issues/validates HMAC-signed session tokens.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    config: SecurityConfig,
}

impl CredentialManager {
    pub fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    pub fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        password::hash_password(plain)
    }

    pub fn verify(&self, plain: &str, secret: &str) -> Result<bool, CredentialError> {
        password::verify_password(plain, secret)
    }

    /// Signs a token for `subject` expiring `ttl_minutes` from now.
    pub fn issue_token(
        &self,
        subject: &TokenSubject,
        ttl_minutes: i64,
    ) -> Result<String, CredentialError> {
        if ttl_minutes <= 0 {
            return Err(CredentialError::Config(format!(
                "token ttl must be positive, got {ttl_minutes}"
            )));
        }
        let now = OffsetDateTime::now_utc();
        self.sign(subject, now, now + TimeDuration::minutes(ttl_minutes))
    }

    /// Signs a token with the configured session ttl.
    pub fn issue_session_token(&self, subject: &TokenSubject) -> Result<String, CredentialError> {
        self.issue_token(subject, self.config.ttl_minutes)
    }

    fn sign(
        &self,
        subject: &TokenSubject,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<String, CredentialError> {
        let key = self.signing_key()?;
        let claims = SessionClaims {
            id: subject.id,
            email: subject.email.clone(),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(key),
        )
        .map_err(|e| CredentialError::InvalidToken(e.to_string()))?;
        debug!(user_id = subject.id, "session token signed");
        Ok(token)
    }

    /// Only HS256 tokens signed with the configured key are accepted.
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, CredentialError> {
        let key = self.signing_key()?;
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(key), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::ExpiredToken,
                _ => CredentialError::InvalidToken(e.to_string()),
            })?;
        debug!(user_id = data.claims.id, "session token verified");
        Ok(data.claims)
    }

    /// Configuration check for liveness probes; performs no I/O.
    pub fn health(&self) -> Result<(), CredentialError> {
        self.signing_key()?;
        if self.config.ttl_minutes <= 0 {
            return Err(CredentialError::Config(
                "token ttl must be positive".into(),
            ));
        }
        Ok(())
    }

    fn signing_key(&self) -> Result<&[u8], CredentialError> {
        if self.config.signing_key.is_empty() {
            return Err(CredentialError::Config("signing key is not configured".into()));
        }
        Ok(self.config.signing_key.as_bytes())
    }
}
