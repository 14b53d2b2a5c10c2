//! Core library functions for the procurement biSBM pipeline

pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod cluster;
pub mod pipeline;
pub mod storage;

pub use anyhow::{Result, anyhow};
pub use error::{NodeClass, PipelineError};
