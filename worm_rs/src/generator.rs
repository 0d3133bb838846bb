//! Random automaton construction.
//!
//! 1. A random path from the start to the target using 40-60% of the states.
//! 2. Detours (tails that reconnect to the graph) and kites (tails that just
//!    end) until every state is used. Each step takes 10-30% of what is left.
//! 3. Entangling: extra edges per state up to a random share of the alphabet,
//!    skewed towards sparse graphs.
//!
//! In bipartite mode every state is assigned a side when it is first used and
//! edges only ever join opposite sides.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::automaton::{StateId, Transitions};
use crate::error::GenerationError;

/// A finished graph and the mode it was built in.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedGraph {
    pub transitions: Transitions,
    pub bipartite: bool,
}

/// Build a graph over `states` states with a coin flip for bipartite mode.
pub fn generate_graph<R: Rng + ?Sized>(
    states: usize,
    symbols: &[char],
    rng: &mut R,
) -> Result<GeneratedGraph, GenerationError> {
    let bipartite = rng.gen_bool(0.5);
    GraphGenerator::new(states, symbols, bipartite, rng)?.generate()
}

pub struct GraphGenerator<'a, R: Rng + ?Sized> {
    transitions: Transitions,
    side: Vec<Option<bool>>,
    unused: Vec<StateId>,
    symbols: &'a [char],
    bipartite: bool,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> GraphGenerator<'a, R> {
    /// Reserve the start and target states and lay the initial path.
    pub fn new(
        states: usize,
        symbols: &'a [char],
        bipartite: bool,
        rng: &'a mut R,
    ) -> Result<Self, GenerationError> {
        if states < 2 {
            return Err(GenerationError::NoUnusedStates);
        }
        let mut side = vec![None; states];
        side[0] = Some(false);

        let mut generator = Self {
            transitions: Transitions::new(states),
            side,
            unused: (1..states - 1).collect(),
            symbols,
            bipartite,
            rng,
        };

        let share = generator.rng.gen_range(0.4..0.6);
        let length = (states as f64 * share).ceil() as usize;
        generator.random_path(0, states - 1, length)?;
        Ok(generator)
    }

    /// Consume the remaining states, entangle, and hand the graph out.
    pub fn generate(mut self) -> Result<GeneratedGraph, GenerationError> {
        while !self.unused.is_empty() {
            let share = self.rng.gen_range(0.1..0.3);
            let count = (share * self.unused.len() as f64).ceil() as usize;
            if self.rng.gen_bool(0.5) {
                self.add_detour(count)?;
            } else {
                self.add_kite(count)?;
            }
        }
        self.entangle()?;

        debug!(
            states = self.transitions.len(),
            edges = self.transitions.iter().count(),
            bipartite = self.bipartite,
            "generated worm graph"
        );
        Ok(GeneratedGraph {
            transitions: self.transitions,
            bipartite: self.bipartite,
        })
    }

    fn has_open_edges(&self, state: StateId) -> bool {
        self.transitions.out_degree(state) < self.symbols.len()
    }

    fn opposite(&self, a: StateId, b: StateId) -> bool {
        !self.bipartite || self.side[a] != self.side[b]
    }

    /// A random state that is already part of the graph and passes `filter`.
    fn pick_vertex<F>(&mut self, filter: F) -> Result<StateId, GenerationError>
    where
        F: Fn(&Self, StateId) -> bool,
    {
        let this: &Self = self;
        let candidates: Vec<StateId> = (0..this.transitions.len())
            .filter(|&v| this.transitions.is_entered(v) && filter(this, v))
            .collect();
        candidates
            .choose(&mut *self.rng)
            .copied()
            .ok_or(GenerationError::NoOpenEdges)
    }

    /// Take a random unused state (never `exclude`) and put it on `side`.
    fn use_random_state(
        &mut self,
        side: bool,
        exclude: Option<StateId>,
    ) -> Result<StateId, GenerationError> {
        let candidates: Vec<usize> = (0..self.unused.len())
            .filter(|&i| Some(self.unused[i]) != exclude)
            .collect();
        let slot = *candidates
            .choose(&mut *self.rng)
            .ok_or(GenerationError::NoUnusedStates)?;
        let state = self.unused.swap_remove(slot);
        self.side[state] = Some(side);
        Ok(state)
    }

    fn connect(&mut self, from: StateId, to: StateId) -> Result<StateId, GenerationError> {
        if !self.has_open_edges(from) {
            return Err(GenerationError::VertexFull { from });
        }
        if self.bipartite {
            let Some(from_side) = self.side[from] else {
                return Err(GenerationError::NoSide { state: from });
            };
            let to_side = *self.side[to].get_or_insert(!from_side);
            if from_side == to_side {
                return Err(GenerationError::SameSide { from, to });
            }
        }

        let free: Vec<char> = self
            .symbols
            .iter()
            .copied()
            .filter(|&s| !self.transitions.has_symbol(from, s))
            .collect();
        let symbol = *free
            .choose(&mut *self.rng)
            .ok_or(GenerationError::VertexFull { from })?;
        self.transitions.insert(from, symbol, to);
        Ok(to)
    }

    fn flipped_side(&self, state: StateId) -> bool {
        !self.side[state].unwrap_or(false)
    }

    fn random_path(
        &mut self,
        mut from: StateId,
        to: StateId,
        mut length: usize,
    ) -> Result<StateId, GenerationError> {
        while !self.unused.is_empty() && length > 0 {
            let state = self.use_random_state(self.flipped_side(from), Some(to))?;
            self.connect(from, state)?;
            from = state;
            length -= 1;
        }
        self.connect(from, to)
    }

    /// Hang a chain of unused states off a random open vertex; returns its end.
    fn tail(&mut self, length: usize) -> Result<StateId, GenerationError> {
        if self.unused.is_empty() {
            return Err(GenerationError::NoUnusedStates);
        }
        let length = length.min(self.unused.len());
        let mut current = self.pick_vertex(|g, v| g.has_open_edges(v))?;

        for _ in 0..length {
            let state = self.use_random_state(self.flipped_side(current), None)?;
            self.connect(current, state)?;
            current = state;
        }
        Ok(current)
    }

    fn add_detour(&mut self, length: usize) -> Result<(), GenerationError> {
        if self.unused.is_empty() {
            return Ok(());
        }
        let end = self.tail(length)?;
        let back = self.pick_vertex(|g, v| g.opposite(v, end))?;
        self.connect(end, back)?;
        Ok(())
    }

    fn add_kite(&mut self, length: usize) -> Result<(), GenerationError> {
        if self.unused.is_empty() {
            return Ok(());
        }
        self.tail(length)?;
        Ok(())
    }

    fn entangle(&mut self) -> Result<(), GenerationError> {
        let alphabet = self.symbols.len();
        for state in 0..self.transitions.len() {
            let target_share = self.rng.r#gen::<f64>().powf(1.5);
            let mut degree = self.transitions.out_degree(state);

            while (degree as f64) / (alphabet as f64) < target_share && degree < alphabet {
                let to = self.pick_vertex(|g, v| g.opposite(v, state))?;
                self.connect(state, to)?;
                degree += 1;
            }
        }
        Ok(())
    }
}
