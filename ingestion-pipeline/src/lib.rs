#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod filter;
pub mod normalizer;
pub mod parser;
pub mod pipeline;

pub use pipeline::{
    DefaultPipelineServices, IngestionConfig, IngestionPipeline, IngestionReport, IngestionTuning,
    PipelineServices,
};
