// src/api/profile.rs

use std::time::{Duration, Instant};

use reqwest::Method;
use validator::Validate;

use crate::{
    api::ApiClient,
    config::RESEND_COOLDOWN_SECS,
    error::AppError,
    models::user::{
        MessageResponse, RegisterRequest, UpdatePhotoRequest, UserProfile, VerifyCodeRequest,
    },
};

/// Gate for re-sending the password verification code.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResendCooldown {
    last_sent: Option<Instant>,
}

impl ResendCooldown {
    /// Whole seconds until another code may be requested.
    pub fn remaining(&self, now: Instant) -> u64 {
        let Some(sent) = self.last_sent else {
            return 0;
        };
        let cooldown = Duration::from_secs(RESEND_COOLDOWN_SECS);
        let elapsed = now.saturating_duration_since(sent);
        cooldown.saturating_sub(elapsed).as_secs_f64().ceil() as u64
    }

    pub fn can_send(&self, now: Instant) -> bool {
        self.remaining(now) == 0
    }

    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

impl ApiClient {
    /// Registers a new account. Validates locally before sending.
    pub async fn register(&self, req: &RegisterRequest) -> Result<MessageResponse, AppError> {
        req.validate()?;
        let url = self.endpoint(&["register"]);
        self.send_json(self.request(Method::POST, url).json(req)).await
    }

    /// `GET /user`
    pub async fn get_profile(&self) -> Result<UserProfile, AppError> {
        let url = self.endpoint(&["user"]);
        self.send_json(self.authed(Method::GET, url)?).await
    }

    /// Changes the avatar. Only the known photo keys are accepted.
    pub async fn update_photo(&self, foto: &str) -> Result<(), AppError> {
        let req = UpdatePhotoRequest {
            foto: foto.to_string(),
        };
        req.validate()?;

        let url = self.endpoint(&["user", "foto"]);
        self.send(self.authed(Method::PATCH, url)?.json(&req)).await?;
        tracing::info!("Profile photo updated to {}", foto);
        Ok(())
    }

    /// Asks the backend to email a password verification code.
    ///
    /// Refused with `Validation` while the resend cooldown is running.
    pub async fn send_password_code(&self, cooldown: &mut ResendCooldown) -> Result<(), AppError> {
        let now = Instant::now();
        if !cooldown.can_send(now) {
            return Err(AppError::Validation(format!(
                "wait {} seconds before requesting another code",
                cooldown.remaining(now)
            )));
        }

        let url = self.endpoint(&["user", "send-code"]);
        self.send(self.authed(Method::POST, url)?).await?;
        cooldown.mark_sent(now);
        Ok(())
    }

    /// Confirms a password change with the emailed code.
    pub async fn verify_password_code(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<MessageResponse, AppError> {
        let req = VerifyCodeRequest {
            code: code.trim().to_string(),
            new_password: new_password.to_string(),
        };
        req.validate()?;

        let url = self.endpoint(&["user", "verify-code"]);
        self.send_json(self.authed(Method::PATCH, url)?.json(&req))
            .await
    }

    /// Forgets the stored token.
    pub fn logout(&self) -> Result<(), AppError> {
        self.tokens().clear()
    }
}
