//! Media processing pipeline.
//!
//! This module provides the [`ProcessingPipeline`] which runs the two
//! processing stages of a focus session in a fixed order:
//! - Compression: sets `media.compressed`
//! - Audio extraction: sets `media.audioExtracted`
//!
//! Stages are [`MediaStage`] trait objects. The bundled [`SimulatedStage`]
//! only sleeps; a real transcoder plugs in by implementing the same trait.
//!
//! # Example
//!
//! ```ignore
//! use focus_core::pipeline::{ProcessingConfig, ProcessingPipeline};
//! use focus_core::session::{MediaStatus, SessionId};
//!
//! let pipeline = ProcessingPipeline::from_config(&ProcessingConfig::default());
//!
//! match pipeline.run(&SessionId::generate(), MediaStatus::default()).await {
//!     Ok(status) => assert!(status.is_fully_processed()),
//!     Err(e) => println!("Stopped at {} with {:?}", e.stage, e.status),
//! }
//! ```

mod config;
mod error;
mod runner;
mod simulated;
mod traits;

pub use config::ProcessingConfig;
pub use error::{ProcessingError, StageError};
pub use runner::ProcessingPipeline;
pub use simulated::SimulatedStage;
pub use traits::MediaStage;
