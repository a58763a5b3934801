// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MIN_PASSWORD_LENGTH;

/// Avatar keys the backend accepts; the client maps them to bundled images.
pub const AVAILABLE_PHOTOS: [&str; 3] = ["foto1", "foto2", "foto3"];

/// Current user as returned by `GET /user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,

    /// Avatar key such as "foto2".
    #[serde(default)]
    pub foto: Option<String>,
}

impl UserProfile {
    /// Avatar key if it is one the client knows about.
    pub fn avatar(&self) -> Option<&str> {
        self.foto
            .as_deref()
            .filter(|key| AVAILABLE_PHOTOS.contains(key))
    }
}

/// DTO for user registration.
#[derive(Debug, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Email is not valid."))]
    pub email: String,
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        max = 128,
        message = "Password length must be at least 8 characters."
    ))]
    pub password: String,
}

/// DTO for `PATCH /user/foto`.
#[derive(Debug, Serialize, Validate)]
pub struct UpdatePhotoRequest {
    #[validate(custom(function = validate_photo_key))]
    pub foto: String,
}

/// DTO for `PATCH /user/verify-code`.
#[derive(Debug, Serialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[serde(rename = "newPassword")]
    #[validate(length(min = MIN_PASSWORD_LENGTH, max = 128))]
    pub new_password: String,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

fn validate_photo_key(key: &str) -> Result<(), validator::ValidationError> {
    if AVAILABLE_PHOTOS.contains(&key) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_photo_key"))
    }
}
