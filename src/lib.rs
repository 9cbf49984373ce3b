//! NEO risk pipeline: close-approach records in, classified table out.
//!
//! Modular structure:
//! - [`schema`]: Raw feed records and field normalization
//! - [`features`]: Time to approach, risk category, min-max scaling
//! - [`risk`]: Fixed distance and diameter thresholds
//! - [`model`]: Hazard classifiers (artifact-backed model or rule)
//! - [`dataset`]: Batch assembly, metadata, snapshot export
//! - [`fetch`]: Close-approach catalog client
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod risk;
pub mod schema;

pub use config::PipelineConfig;
pub use dataset::{assemble, Assembler, ClassifiedDataset, DatasetMetadata};
pub use error::{BatchError, ClassifierError, ParseError, ScalerFitError, SchemaError};
pub use features::{FeatureDeriver, FeatureRecord, FeatureVector, ScalerMode, ScalerState};
pub use logging::StructuredLogger;
pub use model::{classify, Classifier, ClassifiedRecord, HazardModel, ModelClassifier, RuleClassifier};
pub use risk::RiskCategory;
pub use schema::{normalize, CanonicalRecord, RawRecord, RawValue};
