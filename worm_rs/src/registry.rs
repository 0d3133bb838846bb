//! Lifecycle of all sessions: creation gates, solving, history, idle sweep.
//!
//! One registry per game run. Every mutation goes through `&mut self`, so
//! the cooldown check and the capacity check are each a single step with
//! their update.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::bonus::RewardSink;
use crate::clock::Clock;
use crate::config::WormConfig;
use crate::error::{Result, WormError};
use crate::session::{PuzzleSession, Scoring, SessionId, SessionOwner};

/// Processes currently alive in the host runtime.
pub trait ProcessTable {
    fn is_running(&self, pid: u32) -> bool;
}

impl ProcessTable for HashSet<u32> {
    fn is_running(&self, pid: u32) -> bool {
        self.contains(&pid)
    }
}

impl ProcessTable for BTreeSet<u32> {
    fn is_running(&self, pid: u32) -> bool {
        self.contains(&pid)
    }
}

impl ProcessTable for Vec<u32> {
    fn is_running(&self, pid: u32) -> bool {
        self.contains(&pid)
    }
}

/// Limits the registry enforces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_sessions: usize,
    pub create_cooldown_ms: u64,
    pub solve_cooldown_ms: u64,
    pub history_capacity: usize,
    pub generation_attempts: u32,
    pub scoring: Scoring,
}

impl From<&WormConfig> for Limits {
    fn from(config: &WormConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            create_cooldown_ms: config.create_cooldown_ms,
            solve_cooldown_ms: config.solve_cooldown_ms,
            history_capacity: config.history_capacity,
            generation_attempts: config.generation_attempts,
            scoring: config.scoring(),
        }
    }
}

pub struct SessionRegistry {
    limits: Limits,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    active: BTreeMap<SessionId, PuzzleSession>,
    history: VecDeque<PuzzleSession>,
    next_id: u64,
    last_create_ms: Option<u64>,
    last_solve_ms: Option<u64>,
}

impl SessionRegistry {
    pub fn new(limits: Limits, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(limits, clock, StdRng::from_entropy())
    }

    /// Registry with a fixed random source, for reproducible puzzles.
    pub fn with_rng(limits: Limits, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            limits,
            clock,
            rng,
            active: BTreeMap::new(),
            history: VecDeque::new(),
            next_id: 1,
            last_create_ms: None,
            last_solve_ms: None,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Start a new session.
    ///
    /// `Ok(None)` while the creation cooldown runs or all slots are taken.
    pub fn create_session(
        &mut self,
        owner: SessionOwner,
        completions: f64,
    ) -> Result<Option<SessionId>> {
        let now = self.clock.now_ms();
        if elapsed_less_than(self.last_create_ms, now, self.limits.create_cooldown_ms) {
            return Ok(None);
        }
        if self.active.len() >= self.limits.max_sessions {
            return Ok(None);
        }

        let id = SessionId(self.next_id);
        let session = PuzzleSession::generate(
            id,
            owner,
            completions,
            self.limits.generation_attempts,
            now,
            &mut self.rng,
        )?;
        self.next_id += 1;
        self.last_create_ms = Some(now);

        info!(
            %id,
            states = session.graph.states.len(),
            symbols = session.graph.symbols.len(),
            "worm session created"
        );
        self.active.insert(id, session);
        Ok(Some(id))
    }

    /// Active session by id.
    pub fn get(&self, id: SessionId) -> Result<&PuzzleSession> {
        self.active.get(&id).ok_or(WormError::UnknownSession(id))
    }

    pub fn get_mut(&mut self, id: SessionId) -> Result<&mut PuzzleSession> {
        self.active.get_mut(&id).ok_or(WormError::UnknownSession(id))
    }

    pub fn unsolved_ids(&self) -> Vec<SessionId> {
        self.active.keys().copied().collect()
    }

    /// Finished session by id, while it is still in the history.
    pub fn finished(&self, id: SessionId) -> Result<&PuzzleSession> {
        self.history
            .iter()
            .find(|s| s.id == id)
            .ok_or(WormError::UnknownSession(id))
    }

    /// Finished sessions, oldest first.
    pub fn finished_ids(&self) -> Vec<SessionId> {
        self.history.iter().map(|s| s.id).collect()
    }

    /// Score a session, hand the reward to `sink` and archive the session.
    pub fn solve_session(&mut self, id: SessionId, sink: &mut dyn RewardSink) -> Result<f64> {
        if !self.active.contains_key(&id) {
            return Err(if self.history.iter().any(|s| s.id == id) {
                WormError::AlreadySolved(id)
            } else {
                WormError::UnknownSession(id)
            });
        }

        let now = self.clock.now_ms();
        if let Some(last) = self.last_solve_ms {
            let ready_at = last.saturating_add(self.limits.solve_cooldown_ms);
            if now < ready_at {
                return Err(WormError::SolveCooldown {
                    remaining_ms: ready_at - now,
                });
            }
        }

        let mut session = self.active.remove(&id).ok_or(WormError::UnknownSession(id))?;
        let reward = match session.solve(now, &self.limits.scoring) {
            Ok(reward) => reward,
            Err(err) => {
                self.active.insert(id, session);
                return Err(err);
            }
        };

        sink.apply_reward(reward);
        self.last_solve_ms = Some(now);
        info!(%id, reward, tests = session.tests_done, "worm session solved");
        self.archive(session);
        Ok(reward)
    }

    /// End every process-owned session whose process is gone. Returns the
    /// ids that were archived.
    pub fn remove_idle_sessions(&mut self, processes: &dyn ProcessTable) -> Vec<SessionId> {
        let idle: Vec<SessionId> = self
            .active
            .values()
            .filter(|s| matches!(s.owner, SessionOwner::Process(pid) if !processes.is_running(pid)))
            .map(|s| s.id)
            .collect();

        let now = self.clock.now_ms();
        for id in &idle {
            if let Some(mut session) = self.active.remove(id) {
                session.end(now);
                info!(%id, "idle worm session ended");
                self.archive(session);
            }
        }
        idle
    }

    /// Forget everything, as on a fresh run.
    pub fn reset(&mut self) {
        self.active.clear();
        self.history.clear();
        self.last_create_ms = None;
        self.last_solve_ms = None;
    }

    fn archive(&mut self, session: PuzzleSession) {
        self.history.push_back(session);
        while self.history.len() > self.limits.history_capacity {
            self.history.pop_front();
        }
    }
}

fn elapsed_less_than(last: Option<u64>, now: u64, cooldown: u64) -> bool {
    last.is_some_and(|last| now < last.saturating_add(cooldown))
}
