//! Session intake: the validate → process → persist flow.
//!
//! ```text
//! Received ──validate──▶ Validated ──assign id──▶ Processing ──save──▶ Persisted
//!     │                                              │          │
//!     ▼                                              ▼          ▼
//!  Rejected                              ProcessingFailed  PersistenceFailed
//! ```
//!
//! Any unexpected fault along the way ends in `InternalFailure`.

mod orchestrator;
mod types;

pub use orchestrator::IntakeOrchestrator;
pub use types::{IntakeError, IntakeState, IntakeSuccess};
