//! `TokenService` issuing HS256 JSON Web Tokens.
//!
//! Claims: `sub` (user id), `tid` (tenant id), `role`, `iat` and `exp` as
//! Unix seconds. Expiry is checked by `jsonwebtoken` against the system
//! clock with no leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{CredentialError, TokenService};
use crate::domain::{AccessToken, Principal, Role, TenantId, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    tid: Uuid,
    role: String,
    iat: i64,
    exp: i64,
}

/// HS256 token issuer and validator.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    /// Sign with `secret`; tokens live for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        principal: &Principal,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, CredentialError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: *principal.user_id.as_uuid(),
            tid: *principal.tenant_id.as_uuid(),
            role: principal.role.as_str().to_owned(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| CredentialError::signing(err.to_string()))?;
        Ok(AccessToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<Principal, CredentialError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Self::validation())
            .map_err(|err| CredentialError::invalid_token(err.to_string()))?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|err| CredentialError::invalid_token(err.to_string()))?;
        Ok(Principal {
            user_id: UserId::from_uuid(data.claims.sub),
            tenant_id: TenantId::from_uuid(data.claims.tid),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tokens() -> JwtTokenService {
        JwtTokenService::new(b"test-secret-with-enough-entropy", Duration::minutes(30))
    }

    fn principal() -> Principal {
        Principal {
            user_id: UserId::random(),
            tenant_id: TenantId::random(),
            role: Role::Technician,
        }
    }

    #[rstest]
    fn issued_tokens_verify(tokens: JwtTokenService) {
        let who = principal();
        let now = Utc::now();
        let issued = tokens.issue(&who, now).expect("issue");
        assert_eq!(issued.expires_at, now + Duration::minutes(30));
        assert_eq!(tokens.verify(&issued.token), Ok(who));
    }

    #[rstest]
    fn expired_tokens_are_rejected(tokens: JwtTokenService) {
        let issued = tokens
            .issue(&principal(), Utc::now() - Duration::hours(2))
            .expect("issue");
        let err = tokens.verify(&issued.token).expect_err("expired");
        assert!(matches!(err, CredentialError::InvalidToken { .. }));
    }

    #[rstest]
    fn tokens_from_another_secret_are_rejected(tokens: JwtTokenService) {
        let other = JwtTokenService::new(b"a-different-secret", Duration::minutes(30));
        let issued = other.issue(&principal(), Utc::now()).expect("issue");
        assert!(tokens.verify(&issued.token).is_err());
    }

    #[rstest]
    #[case("")]
    #[case("not.a.token")]
    fn garbage_is_rejected(tokens: JwtTokenService, #[case] token: &str) {
        assert!(matches!(
            tokens.verify(token),
            Err(CredentialError::InvalidToken { .. })
        ));
    }
}
