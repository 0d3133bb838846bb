//! The surface scripts and the manual-entry UI talk to.
//!
//! [`WormApi`] owns the registry, the player's [`Worm`] progress and the
//! scheduler used to delay traversal results.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::bonus::{BonusTable, Worm};
use crate::clock::{Clock, Scheduler};
use crate::config::WormConfig;
use crate::error::Result;
use crate::registry::{Limits, ProcessTable, SessionRegistry};
use crate::session::{GuessField, Params, SessionId, SessionOwner, SessionSnapshot};

pub struct WormApi {
    config: WormConfig,
    registry: SessionRegistry,
    worm: Worm,
    bonuses: BonusTable,
    scheduler: Arc<dyn Scheduler>,
    /// Intelligence skill of the player, shortens guess time.
    intelligence: f64,
}

impl WormApi {
    pub fn new(config: WormConfig, clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        let registry = SessionRegistry::new(Limits::from(&config), clock);
        Self::with_registry(config, registry, scheduler)
    }

    pub fn with_registry(
        config: WormConfig,
        registry: SessionRegistry,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let bonuses = config.bonus_table();
        Self {
            worm: Worm::new(&bonuses),
            bonuses,
            config,
            registry,
            scheduler,
            intelligence: 0.0,
        }
    }

    pub fn config(&self) -> &WormConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn worm(&self) -> &Worm {
        &self.worm
    }

    pub fn set_intelligence(&mut self, intelligence: f64) {
        self.intelligence = intelligence;
    }

    pub fn create_session(&mut self, owner: SessionOwner) -> Result<Option<SessionId>> {
        self.registry.create_session(owner, self.worm.completions)
    }

    pub fn unsolved_sessions(&self) -> Vec<SessionId> {
        self.registry.unsolved_ids()
    }

    pub fn session_states(&self, id: SessionId) -> Result<Vec<String>> {
        Ok(self.registry.get(id)?.graph.states.clone())
    }

    pub fn session_symbols(&self, id: SessionId) -> Result<Vec<char>> {
        Ok(self.registry.get(id)?.graph.symbols.clone())
    }

    pub fn session_params(&self, id: SessionId) -> Result<Params> {
        Ok(self.registry.get(id)?.params.clone())
    }

    /// Snapshot of an active session (answers hidden).
    pub fn session_snapshot(&self, id: SessionId) -> Result<SessionSnapshot> {
        Ok(self.registry.get(id)?.snapshot())
    }

    /// Walk `input` through the session's graph after the guess-time delay.
    pub async fn test_input(&mut self, id: SessionId, input: &str, threads: u32) -> Result<String> {
        self.registry.get(id)?;
        let delay = self.guess_time(threads);
        debug!(%id, input, delay_ms = delay.as_millis() as u64, "testing worm input");

        self.scheduler.sleep(delay).await;

        Ok(self.registry.get_mut(id)?.evaluate(input))
    }

    pub fn set_guess(&mut self, id: SessionId, field: GuessField) -> Result<()> {
        self.registry.get_mut(id)?.set_guess(field);
        Ok(())
    }

    pub fn solve_session(&mut self, id: SessionId) -> Result<f64> {
        self.registry.solve_session(id, &mut self.worm)
    }

    pub fn finished_session(&self, id: SessionId) -> Result<SessionSnapshot> {
        Ok(self.registry.finished(id)?.snapshot())
    }

    pub fn finished_sessions(&self) -> Vec<SessionId> {
        self.registry.finished_ids()
    }

    pub fn remove_idle_sessions(&mut self, processes: &dyn ProcessTable) -> Vec<SessionId> {
        self.registry.remove_idle_sessions(processes)
    }

    pub fn session_limit(&self) -> usize {
        self.config.max_sessions
    }

    pub fn guess_time(&self, threads: u32) -> Duration {
        self.config.guess_time(threads, self.intelligence)
    }

    pub fn completions(&self) -> f64 {
        self.worm.completions
    }

    pub fn set_bonus(&mut self, id: u32) -> Result<()> {
        self.worm.set_bonus(&self.bonuses, id)
    }

    pub fn bonus_effect(&self) -> f64 {
        self.worm.bonus_effect()
    }

    pub fn bonuses(&self) -> &BonusTable {
        &self.bonuses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, RecordingScheduler};
    use crate::error::WormError;
    use futures::executor::block_on;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn api() -> (WormApi, RecordingScheduler, ManualClock) {
        let config = WormConfig {
            create_cooldown_ms: 0,
            ..WormConfig::default()
        };
        let clock = ManualClock::new(10);
        let scheduler = RecordingScheduler::advancing(clock.clone());
        let registry = SessionRegistry::with_rng(
            Limits::from(&config),
            Arc::new(clock.clone()),
            StdRng::seed_from_u64(9),
        );
        let api = WormApi::with_registry(config, registry, Arc::new(scheduler.clone()));
        (api, scheduler, clock)
    }

    #[test]
    fn test_input_waits_guess_time_then_answers() {
        let (mut api, scheduler, clock) = api();
        let id = api
            .create_session(SessionOwner::Manual)
            .expect("ok")
            .expect("slot");

        let answer = block_on(api.test_input(id, "", 4)).expect("session exists");
        assert_eq!(answer, api.session_states(id).expect("exists")[0]);
        assert_eq!(scheduler.delays(), vec![Duration::from_secs(150)]);
        assert_eq!(clock.now_ms(), 150_010);
        assert_eq!(api.session_snapshot(id).expect("exists").tests_done, 1);
    }

    #[test]
    fn test_input_on_unknown_session_does_not_wait() {
        let (mut api, scheduler, _) = api();
        let err = block_on(api.test_input(SessionId(3), "A", 1)).unwrap_err();
        assert!(matches!(err, WormError::UnknownSession(SessionId(3))));
        assert!(scheduler.delays().is_empty());
    }

    #[test]
    fn test_solve_feeds_completions() {
        let (mut api, _, _) = api();
        let id = api
            .create_session(SessionOwner::Manual)
            .expect("ok")
            .expect("slot");
        let snapshot = api.session_snapshot(id).expect("exists");
        assert!(snapshot.expected.is_none());

        api.set_guess(id, GuessField::Bipartite(true)).expect("exists");
        let reward = api.solve_session(id).expect("solves");
        assert_eq!(reward, 0.0, "empty path never scores");
        assert_eq!(api.completions(), 0.0);

        let finished = api.finished_session(id).expect("in history");
        assert!(finished.guess.bipartite);
        assert!(finished.expected.is_some());
        assert_eq!(api.finished_sessions(), vec![id]);
    }

    #[test]
    fn test_bonus_selection() {
        let (mut api, _, _) = api();
        assert_eq!(api.bonus_effect(), 0.0);
        api.set_bonus(1).expect("valid");
        assert!((api.bonus_effect() - 1.0).abs() < 1e-12);
        assert!(matches!(api.set_bonus(12), Err(WormError::UnknownBonus { id: 12, .. })));
        assert_eq!(api.session_limit(), 4);
    }
}
