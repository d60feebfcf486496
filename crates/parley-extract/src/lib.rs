//! # parley-extract
//!
//! Attachment content extraction pipeline for parley.
//!
//! This crate provides:
//! - Per-format content extractors behind the `ContentExtractor` trait
//! - The `ExtractionPipeline` coordinator (`process_file` never errors past
//!   its boundary — failures become terminal `failed` outcomes)
//! - A bounded in-process worker pool that runs extraction off the request
//!   cycle
//! - A reconciliation sweep that re-queues attachments stuck in
//!   `processing`
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use parley_extract::{
//!     AttachmentJobHandler, ExtractionPipeline, SweepConfig, WorkerConfig, WorkerPool,
//! };
//!
//! let pipeline = Arc::new(ExtractionPipeline::from_env());
//! let handler = Arc::new(AttachmentJobHandler::new(db.clone(), pipeline));
//! let (queue, handle) = WorkerPool::new(handler, WorkerConfig::from_env()).start();
//! let sweep = parley_extract::start_sweep(db, queue.clone(), SweepConfig::from_env());
//! ```

pub mod extractors;
pub mod handler;
pub mod pipeline;
pub mod registry;
pub mod sweep;
pub mod worker;

// Re-export core types
pub use parley_core::*;

pub use extractors::{
    normalize_text, AudioExtractor, DocumentExtractor, ImageExtractor, PdfExtractor,
    TextExtractor, VideoExtractor,
};
pub use handler::{AttachmentJobHandler, ExtractionJob, JobHandler, JobResult};
pub use pipeline::ExtractionPipeline;
pub use registry::ExtractorRegistry;
pub use sweep::{run_sweep_once, start_sweep, sweep_action, SweepAction, SweepConfig, SweepHandle};
pub use worker::{ExtractionQueue, WorkerConfig, WorkerEvent, WorkerHandle, WorkerPool};
