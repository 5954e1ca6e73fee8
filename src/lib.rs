//! Credit Risk Pipeline Library
//!
//! An end-to-end credit default risk pipeline: bureau feature engineering,
//! deterministic gradient-boosted training, offline evaluation, and an HTTP
//! scoring service that is guaranteed to see features the exact same way the
//! training stage did.

pub mod align;
pub mod artifacts;
pub mod config;
pub mod encoding;
pub mod error;
pub mod evaluate;
pub mod explore;
pub mod features;
pub mod metrics;
pub mod model;
pub mod prepare;
pub mod service;
pub mod split;
pub mod table;
pub mod train;

pub use align::{FeatureValue, InferenceAligner};
pub use artifacts::ModelArtifacts;
pub use config::AppConfig;
pub use encoding::{CategoricalEncoder, EncodingTable};
pub use error::{PipelineError, Result};
pub use features::{BureauAggregator, FeatureJoiner};
pub use model::{GbdtTrainer, ModelSchema, Scorer};
pub use service::{RiskAssessment, ServiceContext};
pub use table::{Column, Table};
