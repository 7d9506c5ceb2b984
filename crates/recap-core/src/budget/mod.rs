//! Token budget management for model requests.
//!
//! Long source text has to fit a fixed context window next to an instruction
//! prompt, and every request has a price that must stay under a ceiling.
//!
//! # Key Components
//!
//! - [`chunker`]: Splits a token stream into prompt-sized pieces
//! - [`cost`]: Price table and cost ceiling enforcement
//! - [`limits`]: Context window sizes of known models

pub mod chunker;
pub mod cost;
pub mod limits;

pub use chunker::{TextChunk, TextChunker};
pub use cost::{CostEstimate, CostEstimator, PriceTable, DEFAULT_COST_CEILING, DEFAULT_SURCHARGE};
pub use limits::ModelLimitsRegistry;
