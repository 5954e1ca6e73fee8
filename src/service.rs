//! Risk scoring service.
//!
//! Loads the artifact triple once at startup (failing fast if it is absent)
//! and serves a synchronous scoring endpoint plus a health check. The loaded
//! context is immutable and shared read-only across requests; each request
//! works on its own row. Any failure inside the per-request pipeline is
//! returned as a structured error response, never a crash.

use crate::align::{FeatureValue, InferenceAligner};
use crate::artifacts::ModelArtifacts;
use crate::config::AppConfig;
use crate::encoding::encode_row;
use crate::error::Result;
use crate::model::Scorer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// The single probability cutoff separating approval from rejection.
/// Crossing it flips both the decision and the risk tier.
pub const DECISION_THRESHOLD: f64 = 0.50;

/// Immutable per-process state: the artifact triple, loaded once.
#[derive(Clone)]
pub struct ServiceContext {
    artifacts: Arc<ModelArtifacts>,
}

impl ServiceContext {
    /// Load artifacts from disk. Absence is fatal: the service must refuse
    /// to start rather than accept traffic it cannot score.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let artifacts = ModelArtifacts::load(&config.data.artifacts_dir)?;
        Ok(Self::from_artifacts(artifacts))
    }

    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        Self {
            artifacts: Arc::new(artifacts),
        }
    }

    /// The full per-request pipeline: align, encode, score, decide.
    pub fn assess(&self, features: &HashMap<String, FeatureValue>) -> Result<RiskAssessment> {
        let aligned = InferenceAligner::align(&self.artifacts.schema, features);
        let row = encode_row(&self.artifacts.encodings, &self.artifacts.schema, &aligned)?;
        let probability = self.artifacts.model.predict_proba_one(&row);
        Ok(RiskAssessment::from_probability(probability))
    }
}

/// Request body: an arbitrary mapping of feature names to scalar values.
#[derive(Debug, Deserialize)]
pub struct ClientData {
    pub features: HashMap<String, FeatureValue>,
}

/// Structured scoring decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub decision: String,
    pub probabilidad_default: f64,
    pub riesgo: String,
    pub mensaje: String,
}

impl RiskAssessment {
    /// Apply the decision threshold. Rejection requires the probability to be
    /// strictly greater than the threshold: exactly 0.50 approves.
    pub fn from_probability(probability: f64) -> Self {
        let reject = probability > DECISION_THRESHOLD;
        Self {
            decision: if reject { "RECHAZAR" } else { "APROBAR" }.to_string(),
            probabilidad_default: (probability * 10_000.0).round() / 10_000.0,
            riesgo: if reject { "ALTO" } else { "BAJO" }.to_string(),
            mensaje: "Evaluación completada exitosamente".to_string(),
        }
    }
}

/// Error body mirrored to the client on request-stage failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub fn router(ctx: ServiceContext) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/evaluate_risk", post(evaluate_risk))
        .with_state(ctx)
}

/// Health/readiness probe, independent of the scoring path.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "Credit Risk API running"
    }))
}

/// Synchronous scoring endpoint.
pub async fn evaluate_risk(
    State(ctx): State<ServiceContext>,
    Json(data): Json<ClientData>,
) -> std::result::Result<Json<RiskAssessment>, (StatusCode, Json<ErrorBody>)> {
    match ctx.assess(&data.features) {
        Ok(assessment) => {
            info!(
                decision = %assessment.decision,
                probability = assessment.probabilidad_default,
                "request scored"
            );
            Ok(Json(assessment))
        }
        Err(e) => {
            // Isolated per request: surface the failure, keep serving.
            error!(error = %e, "request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: format!("Error procesando solicitud: {e}"),
                }),
            ))
        }
    }
}

/// Start the HTTP server. Artifact loading happens before the socket binds,
/// so a missing triple terminates the process at startup, not per request.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let ctx = ServiceContext::load(config)?;
    info!(
        features = ctx.artifacts.schema.len(),
        trees = ctx.artifacts.model.trees.len(),
        "service ready"
    );

    let listener = tokio::net::TcpListener::bind(&config.service.bind_addr).await?;
    info!(addr = %config.service.bind_addr, "listening");
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}
