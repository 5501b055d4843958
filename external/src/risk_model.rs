//! The risk-model endpoint contract (§6 "Risk-model endpoint"):
//! JSON-over-HTTP with three calls, all wrapped in the same
//! `{success, data, error, timestamp}` envelope.
//!
//! The optimizer crate never computes Σ itself (§4.2 "Covariance"); it
//! consumes whatever shrinkage estimator this endpoint applies and only
//! validates the shape (symmetry, PSD) on the way in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ResponseEnvelope<T> {
    /// `success=false` surfaces as a typed failure (§6), never a silent
    /// `None`.
    pub fn into_result(self) -> Result<T, RiskModelError> {
        if self.success {
            self.data.ok_or_else(|| {
                RiskModelError::MalformedResponse("success=true but data was absent".to_string())
            })
        } else {
            Err(RiskModelError::Rejected(
                self.error.unwrap_or_else(|| "unspecified risk-model error".to_string()),
            ))
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskModelError {
    #[error("risk model unavailable: {0}")]
    Unavailable(String),
    #[error("risk model rejected the request: {0}")]
    Rejected(String),
    #[error("malformed risk model response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProgressiveOptimizeRequest {
    pub isins: Vec<String>,
    pub expected_returns: Vec<f64>,
    pub target_return: f64,
    pub blend: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProgressiveOptimizeResponse {
    pub weights: Vec<(String, f64)>,
    pub fallback_used: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HrpRequest {
    pub isins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HrpResponse {
    pub weights: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CovarianceRequest {
    pub dates: Vec<String>,
    pub prices_by_symbol: Vec<(String, Vec<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CovarianceResponse {
    pub symbols_in_order: Vec<String>,
    pub covariance: Vec<Vec<f64>>,
}

#[async_trait]
pub trait RiskModelClient: Send + Sync {
    async fn optimize_progressive(
        &self,
        request: ProgressiveOptimizeRequest,
    ) -> Result<ProgressiveOptimizeResponse, RiskModelError>;

    async fn optimize_hrp(&self, request: HrpRequest) -> Result<HrpResponse, RiskModelError>;

    async fn covariance(&self, request: CovarianceRequest) -> Result<CovarianceResponse, RiskModelError>;
}
