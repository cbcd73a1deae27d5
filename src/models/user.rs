//! Acting user identity and capabilities

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Named permission checked before privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Librarian permission: renew loans and see every loan
    CanMarkReturned,
    /// Create, update and delete catalog records
    CanManageCatalog,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanMarkReturned => "can_mark_returned",
            Capability::CanManageCatalog => "can_manage_catalog",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authorization provider: answers whether an identity holds a capability
pub trait Capabilities: Send + Sync {
    fn user_id(&self) -> i32;

    fn has_capability(&self, capability: Capability) -> bool;

    fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(format!(
                "Missing capability {}",
                capability
            )))
        }
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    #[serde(default)]
    pub permissions: Vec<Capability>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Claims valid for `ttl_hours` from now
    pub fn new(user_id: i32, login: &str, permissions: Vec<Capability>, ttl_hours: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: login.to_string(),
            user_id,
            permissions,
            exp: now + ttl_hours * 3600,
            iat: now,
        }
    }

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
}

impl Capabilities for UserClaims {
    fn user_id(&self) -> i32 {
        self.user_id
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.permissions.contains(&capability)
    }
}
