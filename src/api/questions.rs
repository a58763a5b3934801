// src/api/questions.rs

use reqwest::Method;

use crate::{
    api::{ApiClient, require_tryout_id},
    error::AppError,
    models::question::{Question, ServerQuestion},
};

impl ApiClient {
    /// Raw question rows for a tryout.
    ///
    /// `GET /questions?tryoutId=...`. Answer keys are only present when the
    /// backend allows the caller to see them.
    pub async fn list_questions(&self, tryout_id: &str) -> Result<Vec<ServerQuestion>, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let url = self.endpoint_with_query(&["questions"], "tryoutId", tryout_id);
        self.send_json(self.authed(Method::GET, url)?).await
    }

    /// Questions of a tryout mapped to view models.
    pub async fn fetch_questions(&self, tryout_id: &str) -> Result<Vec<Question>, AppError> {
        let rows = self.list_questions(tryout_id).await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }
}
