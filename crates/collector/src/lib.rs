//! Concurrent multi-source price collection
//!
//! Features:
//! - One fetch task per registered source per product
//! - Semaphore-bounded fan-out with per-fetch timeouts
//! - Timeouts and failures become outcome records, never faults
//! - Every outcome feeds the health tracker before a batch returns

pub mod adapter;
pub mod orchestrator;

pub use adapter::{SourceAdapter, StaticAdapter};
pub use orchestrator::{CollectedBatch, CollectionOrchestrator};
