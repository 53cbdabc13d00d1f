//! Caller identity as asserted by the identity service

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Platform role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Athlete,
    Coach,
    Admin,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Opaque user id
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    pub fn require_coach(&self) -> Result<(), AppError> {
        match self.role {
            Role::Coach | Role::Admin => Ok(()),
            Role::Athlete => Err(AppError::Authorization("Coach account required".to_string())),
        }
    }

    /// Caller must be the given coach, or an admin
    pub fn require_coach_owner(&self, coach_id: &str) -> Result<(), AppError> {
        if self.is_admin() || (self.role == Role::Coach && self.sub == coach_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only the owning coach can manage this resource".to_string(),
            ))
        }
    }

    /// Coach id to act on: admins may name any coach, coaches only themselves
    pub fn resolve_coach_id(&self, requested: Option<&str>) -> Result<String, AppError> {
        match requested {
            Some(id) => {
                self.require_coach_owner(id)?;
                Ok(id.to_string())
            }
            None => {
                self.require_coach()?;
                Ok(self.sub.clone())
            }
        }
    }
}
