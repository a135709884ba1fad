//! Dermatology model-card generator.
//!
//! Searches CrossRef, GitHub, Hugging Face and an optional website for a
//! model, extracts metrics and documentation heuristically, merges them under
//! a fixed source priority, scores the result against the HTI-1 and OCR
//! checklists and renders a Markdown model card.

pub mod app_state;
pub mod compliance;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod lookups;
pub mod merge;
pub mod middleware;
pub mod model_cards;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod session;
pub mod sources;
pub mod telemetry;

pub use pipeline::{GeneratedCard, ModelCardPipeline, PipelineError};
pub use render::{is_valid_document, prepare_export, validate_document};
