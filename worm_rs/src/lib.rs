//! # worm
//!
//! **Procedural automaton puzzles.** Each session hides a random directed
//! graph over a small alphabet. Players explore it by walking inputs through
//! it, then submit five answers: the shortest path length to the target,
//! bipartiteness, a node's value and indegree, and a depth-first position.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use worm::{ManualClock, RecordingScheduler, SessionOwner, WormApi, WormConfig};
//!
//! let clock = ManualClock::new(0);
//! let mut api = WormApi::new(
//!     WormConfig::default(),
//!     Arc::new(clock.clone()),
//!     Arc::new(RecordingScheduler::advancing(clock)),
//! );
//!
//! let id = api.create_session(SessionOwner::Manual).unwrap().unwrap();
//! let states = api.session_states(id).unwrap();
//! let reached = futures::executor::block_on(api.test_input(id, "", 1)).unwrap();
//! assert_eq!(reached, states[0]);
//! ```

// ============================================================================
// Core Modules
// ============================================================================

/// States, alphabet, transitions and sizing.
pub mod automaton;

/// Random graph construction with a guaranteed start-to-target path.
pub mod generator;

/// Bipartiteness, shortest input, node value/indegree, DFS order.
pub mod analysis;

/// One puzzle session: guess, checks and reward.
pub mod session;

/// Creation and solve gates, history and idle sweep.
pub mod registry;

/// Time source and delay scheduler.
pub mod clock;

/// Bonus table, completions and the reward sink.
pub mod bonus;

/// The facade scripts call.
pub mod api;

/// `.worm/config.toml` loading.
pub mod config;

pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use api::WormApi;
pub use automaton::{AutomataData, NULL_STATE, Properties, StateId, Transitions, WormSize};
pub use bonus::{Bonus, BonusTable, RewardSink, Worm};
pub use clock::{Clock, ManualClock, RecordingScheduler, Scheduler, SystemClock, TokioScheduler};
pub use config::WormConfig;
pub use error::{GenerationError, WormError};
pub use registry::{Limits, ProcessTable, SessionRegistry};
pub use session::{
    Expected, Guess, GuessField, Params, PuzzleSession, Scoring, SessionId, SessionOwner,
    SessionSnapshot,
};
