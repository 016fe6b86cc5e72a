use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use plexguard_shared::PrincipalRole;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Claims minted by the external auth collaborator (spec non-goal: the core
/// never issues tokens, only verifies them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: PrincipalRole,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.len() < 32 {
            return Err(AppError::Internal(
                "jwt secret must be at least 32 characters long".to_string(),
            ));
        }

        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 30;

        Ok(Self { decoding_key, validation })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("token has expired".to_string())
                }
                _ => AppError::Authentication(format!("invalid token: {e}")),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(role: PrincipalRole, secret: &str, exp_offset_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "admin-1".to_string(),
            role,
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn validates_a_well_formed_token() {
        let secret = "a-secret-that-is-long-enough-for-hs256";
        let service = JwtService::new(secret).unwrap();
        let token = token_for(PrincipalRole::Admin, secret, 3600);

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin-1");
        assert_eq!(claims.role, PrincipalRole::Admin);
    }

    #[test]
    fn rejects_an_expired_token() {
        let secret = "a-secret-that-is-long-enough-for-hs256";
        let service = JwtService::new(secret).unwrap();
        let token = token_for(PrincipalRole::PortalUser, secret, -3600);

        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn rejects_a_short_secret() {
        assert!(JwtService::new("too-short").is_err());
    }
}
