//! Session progression and scoring for rehearse case simulations.
//!
//! This crate provides:
//! - The case and agent-state schemas
//! - The scoring engine (event sequencer, score aggregator, history recorder)
//! - A session controller that drives one run-through of a case
//! - HTTP clients for the agent service and the case/history store
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  SessionController                    │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────┐  │
//! │  │   Event     │  │    Score     │  │   History    │  │
//! │  │  Sequencer  │─▶│  Aggregator  │─▶│   Recorder   │  │
//! │  └─────────────┘  └──────────────┘  └──────────────┘  │
//! └──────────────────────────────────────────────────────┘
//!        │                  │                   │
//!        ▼                  ▼                   ▼
//!   AgentService        CaseStore          HistorySink
//! ```

mod error;
mod lenient;

pub mod auth;
pub mod case;
pub mod client;
pub mod engine;
pub mod history;
pub mod session;
pub mod state;
pub mod traits;
pub mod transcript;

pub use auth::Credential;
pub use case::{CanonEvent, CaseBundle, CaseSummary, Persona, Skeleton};
pub use engine::{EventScoreRecord, SessionResult, Termination};
pub use error::{Error, Result};
pub use history::{HistoryRecord, StoredHistory};
pub use session::{SessionController, StartOptions, TurnOutcome, TurnReport};
pub use state::SessionState;
pub use traits::{AgentService, CaseStore, HistoryReader, HistorySink};
pub use transcript::{ChatMessage, Sender, Transcript};
