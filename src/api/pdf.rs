// src/api/pdf.rs

use reqwest::Method;

use crate::{
    api::{ApiClient, require_tryout_id},
    error::AppError,
};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Whether the bytes start with a PDF header.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

impl ApiClient {
    /// Downloads the tryout's PDF through the backend proxy.
    ///
    /// `GET /pdf-proxy?tryoutId=...`
    pub async fn fetch_pdf(&self, tryout_id: &str) -> Result<Vec<u8>, AppError> {
        let tryout_id = require_tryout_id(tryout_id)?;
        let url = self.endpoint_with_query(&["pdf-proxy"], "tryoutId", tryout_id);
        let res = self.send(self.authed(Method::GET, url)?).await?;
        let bytes = res.bytes().await?;

        if !looks_like_pdf(&bytes) {
            tracing::error!("pdf-proxy returned {} bytes without a PDF header", bytes.len());
            return Err(AppError::Decode("response is not a PDF document".to_string()));
        }

        tracing::info!("Fetched PDF for tryout {} ({} bytes)", tryout_id, bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(!looks_like_pdf(b"<html>"));
        assert!(!looks_like_pdf(b""));
    }
}
