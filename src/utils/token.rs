// src/utils/token.rs

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind as JwtErrorKind};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Claims the client cares about. The backend may carry more.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Claims {
    /// Subject - the user id, when present.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiration time as Unix timestamp.
    #[serde(default)]
    pub exp: Option<usize>,
}

/// Reads the claims of a JWT without verifying its signature.
///
/// The client does not hold the signing secret; this is only used to notice an
/// expired session before a request is sent. The backend still verifies.
pub fn peek_claims(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).map(|data| data.claims)
}

/// Rejects tokens that are JWTs with a past `exp`. Opaque tokens pass through.
pub fn ensure_not_expired(token: &str) -> Result<(), AppError> {
    match peek_claims(token) {
        Err(e) if matches!(e.kind(), JwtErrorKind::ExpiredSignature) => Err(AppError::AuthError(
            "Session expired. Please log in again.".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Persistent storage for the bearer token, one file holding the raw token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token, `None` when no token (or only whitespace) is stored.
    pub fn load(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The stored token, or `MissingToken` / `AuthError` when it cannot be used.
    pub fn require(&self) -> Result<String, AppError> {
        let token = self.load()?.ok_or(AppError::MissingToken)?;
        ensure_not_expired(&token)?;
        Ok(token)
    }

    pub fn save(&self, token: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.trim())?;
        Ok(())
    }

    /// Removes the stored token (logout). Missing files are not an error.
    pub fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
