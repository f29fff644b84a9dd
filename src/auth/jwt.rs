use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::auth::{AuthConfig, AuthError, AuthResult};

/// Claims carried by an access token. Field names match the payload the
/// service has always signed, so previously issued tokens keep verifying.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    pub id: i32,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated identity a token is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: i32,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
}

impl TokenService {
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret_bytes = config.jwt_secret.as_bytes();
        let encoding_key = EncodingKey::from_secret(secret_bytes);
        let decoding_key = DecodingKey::from_secret(secret_bytes);

        // Expiry is checked against an explicit clock in `verify_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            encoding_key,
            decoding_key,
            validation,
            access_token_ttl: Duration::seconds(config.access_token_ttl_secs),
        }
    }

    /// Issue a token with the configured lifetime.
    pub fn issue_access_token(&self, identity: &TokenIdentity) -> AuthResult<SignedAccessToken> {
        self.issue(identity, self.access_token_ttl)
    }

    pub fn issue(&self, identity: &TokenIdentity, ttl: Duration) -> AuthResult<SignedAccessToken> {
        self.issue_at(identity, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &TokenIdentity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<SignedAccessToken> {
        let expires_at = now + ttl;
        let claims = AccessTokenClaims {
            id: identity.user_id,
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SignedAccessToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> AuthResult<TokenIdentity> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature, structure and expiry of `token` as of `now`.
    ///
    /// The token is valid only while `now < exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenIdentity> {
        let claims = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenMalformed,
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(TokenIdentity {
            user_id: claims.id,
            email: claims.email,
        })
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TEST_JWT_SECRET: &str = "c3VwZXItc2VjcmV0LXRlc3Qta2V5";

    fn service() -> TokenService {
        TokenService::from_config(&AuthConfig::new(TEST_JWT_SECRET))
    }

    fn identity() -> TokenIdentity {
        TokenIdentity {
            user_id: 42,
            email: "user@example.com".into(),
        }
    }

    #[test]
    fn issues_and_verifies_access_tokens() {
        let service = service();
        let token = service.issue_access_token(&identity()).expect("issue token");

        let decoded = service.verify(&token.token).expect("verify token");

        assert_eq!(decoded, identity());
        assert!(token.expires_at > Utc::now());
    }

    #[test]
    fn access_tokens_last_one_hour() {
        assert_eq!(service().access_token_ttl(), Duration::hours(1));
    }

    #[test]
    fn rejects_tokens_at_and_after_expiry() {
        let service = service();
        let issued_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let token = service
            .issue_at(&identity(), Duration::seconds(60), issued_at)
            .expect("issue token");

        let before = issued_at + Duration::seconds(59);
        assert_eq!(
            service.verify_at(&token.token, before).expect("still valid"),
            identity()
        );

        let at_expiry = issued_at + Duration::seconds(60);
        assert!(matches!(
            service.verify_at(&token.token, at_expiry),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            service.verify_at(&token.token, at_expiry + Duration::hours(1)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let service = service();
        let token = service.issue_access_token(&identity()).expect("issue token").token;

        let signature_start = token.rfind('.').expect("three segments") + 1;
        let mut tampered: Vec<char> = token.chars().collect();
        tampered[signature_start] = if tampered[signature_start] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        assert!(matches!(
            service.verify(&tampered),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = TokenService::from_config(&AuthConfig::new("b3RoZXItc2VjcmV0"));
        let token = other.issue_access_token(&identity()).expect("issue token").token;

        assert!(matches!(
            service().verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let service = service();
        for token in ["", "not-a-token", "a.b", "a.b.c.d"] {
            assert!(
                matches!(service.verify(token), Err(AuthError::TokenMalformed)),
                "{token:?} should be malformed"
            );
        }
    }
}
