// src/api/attempts.rs

use reqwest::Method;

use crate::{
    api::{ApiClient, require_tryout_id},
    error::AppError,
    models::attempt::{Attempt, AttemptPatch, StartAttemptRequest},
};

impl ApiClient {
    /// Starts a new attempt for a tryout.
    ///
    /// `POST /quizattempt/start` with `{ tryout_id }`.
    pub async fn start_attempt(&self, tryout_id: &str) -> Result<Attempt, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let url = self.endpoint(&["quizattempt", "start"]);
        let req = self
            .authed(Method::POST, url)?
            .json(&StartAttemptRequest { tryout_id });

        let attempt: Attempt = self.send_json(req).await?;
        tracing::info!(
            "Started attempt #{} for tryout {}",
            attempt.attempt_number,
            attempt.tryout_id
        );
        Ok(attempt)
    }

    /// `GET /quizattempt/{tryoutId}/{attemptNumber}`
    pub async fn get_attempt(&self, tryout_id: &str, attempt_number: i64) -> Result<Attempt, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let number = attempt_number.to_string();
        let url = self.endpoint(&["quizattempt", tryout_id, &number]);
        self.send_json(self.authed(Method::GET, url)?).await
    }

    /// All attempts of the current user for a tryout.
    ///
    /// `GET /quizattempt/{tryoutId}`
    pub async fn list_attempts(&self, tryout_id: &str) -> Result<Vec<Attempt>, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let url = self.endpoint(&["quizattempt", tryout_id]);
        self.send_json(self.authed(Method::GET, url)?).await
    }

    /// Partial update; the backend echoes the updated record.
    ///
    /// `PATCH /quizattempt/{tryoutId}/{attemptNumber}`
    pub async fn update_attempt(
        &self,
        tryout_id: &str,
        attempt_number: i64,
        patch: &AttemptPatch,
    ) -> Result<Attempt, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let number = attempt_number.to_string();
        let url = self.endpoint(&["quizattempt", tryout_id, &number]);
        let req = self.authed(Method::PATCH, url)?.json(patch);
        self.send_json(req).await
    }
}
