use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;
use crate::models::{AnalysisResult, AnalyzeRequest, UploadResponse, UploadedFile};
use crate::services::ingest::CsvBatch;

pub const UPLOAD_FAILED: &str = "Error uploading files";
pub const ANALYZE_FAILED: &str = "Error analyzing data";

/// The statistics service the dashboard delegates all computation to.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn upload(&self, batch: CsvBatch) -> Result<Vec<UploadedFile>, AppError>;

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AppError>;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, batch: CsvBatch) -> Result<Vec<UploadedFile>, AppError> {
        let start = Instant::now();
        let count = batch.len();
        tracing::info!("Uploading {} files ({} bytes)", count, batch.total_bytes());

        let form = batch.into_form()?;
        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Upload request failed: {}", e);
                AppError::transport(UPLOAD_FAILED, e)
            })?;

        let reply: UploadResponse = decode_reply(response, UPLOAD_FAILED).await?;
        tracing::info!(
            "Upload of {} files completed in {:?}, backend returned {}",
            count,
            start.elapsed(),
            reply.files.len()
        );
        Ok(reply.files)
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, AppError> {
        let start = Instant::now();
        tracing::info!(
            "Requesting analysis of {} columns across {} files",
            request.columns.len(),
            request.files.len()
        );

        let response = self
            .client
            .post(self.endpoint("/analyze"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Analyze request failed: {}", e);
                AppError::transport(ANALYZE_FAILED, e)
            })?;

        let result: AnalysisResult = decode_reply(response, ANALYZE_FAILED).await?;
        tracing::info!(
            "Analysis completed in {:?}: {} numeric, {} categorical",
            start.elapsed(),
            result.numeric_cols.len(),
            result.cat_cols.len()
        );
        Ok(result)
    }
}

/// An `error` field wins over the HTTP status; anything else that fails to
/// decode counts as a transport failure.
async fn decode_reply<T: DeserializeOwned>(
    response: reqwest::Response,
    failure: &str,
) -> Result<T, AppError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::transport(failure, e))?;

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Backend returned non-JSON body (status {}): {}", status, e);
        AppError::transport(failure, e)
    })?;

    if let Some(error) = value.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        tracing::warn!("Backend reported error (status {}): {}", status, message);
        return Err(AppError::Backend(message));
    }

    if !status.is_success() {
        return Err(AppError::transport(
            failure,
            format!("backend responded with status {}", status),
        ));
    }

    // Typed decode straight from the body so map keys keep backend order.
    serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Backend response did not match the expected shape: {}", e);
        AppError::transport(failure, e)
    })
}
