//! Bearer token identity for HTTP callers.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::catalog::{Actor, Role};
use crate::error::{CatalogError, Result};
use crate::records::ClassTag;

/// Claims carried by portal session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassTag>,
    pub exp: u64,
}

/// HS256 verifier for session tokens issued with a shared secret.
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Actor> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|err| CatalogError::Unauthorized(format!("invalid token: {}", err)))?;
        let claims = data.claims;
        Ok(Actor {
            user_id: claims.user_id,
            role: claims.role,
            class: claims.class,
        })
    }

    /// Resolve an `Authorization: Bearer <token>` header value.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Actor> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| CatalogError::Unauthorized("missing bearer token".to_string()))?;
        self.verify(token)
    }
}
