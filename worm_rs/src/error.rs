//! Error types for graph generation and the session API.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionId;

/// Invariant violations while building a graph.
///
/// Never retried in place: the caller throws the half-built graph away and
/// starts over with fresh randomness.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("couldn't generate worm graph: no vertex with open edges left")]
    NoOpenEdges,

    #[error("couldn't generate worm graph: no unused states left")]
    NoUnusedStates,

    #[error("couldn't generate worm graph: state {from} has no free symbol")]
    VertexFull { from: usize },

    #[error("couldn't generate worm graph: tried to connect states {from} and {to} from the same set")]
    SameSide { from: usize, to: usize },

    #[error("couldn't generate worm graph: state {state} has no associated set")]
    NoSide { state: usize },
}

/// Errors surfaced by the registry and the [`crate::api::WormApi`] facade.
#[derive(Debug, Error)]
pub enum WormError {
    #[error("worm session {0} does not exist")]
    UnknownSession(SessionId),

    #[error("value \"{id}\" is not a valid bonus. Valid: {}", valid.join(", "))]
    UnknownBonus { id: u32, valid: Vec<String> },

    #[error("solve is on cooldown for another {remaining_ms} ms")]
    SolveCooldown { remaining_ms: u64 },

    #[error("worm session {0} was already solved")]
    AlreadySolved(SessionId),

    #[error("graph generation failed {attempts} times in a row, last error: {last}")]
    GenerationExhausted {
        attempts: u32,
        last: GenerationError,
    },

    #[error("failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T, E = WormError> = std::result::Result<T, E>;
