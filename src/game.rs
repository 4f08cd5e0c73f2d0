use crate::leaderboard::Leaderboard;
use crate::rng::{RotationRng, ROTATION_DELAY_MIN_MS, ROTATION_DELAY_SPREAD_MS};
use crate::timing::{Clock, TickScheduler};
use crate::util::mean;

/// The closed color set the rotation draws from
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum GameColor {
    #[strum(serialize = "RED")]
    Red,
    #[strum(serialize = "GREEN")]
    Green,
    #[strum(serialize = "BLUE")]
    Blue,
}

impl GameColor {
    pub const ALL: [GameColor; 3] = [GameColor::Red, GameColor::Green, GameColor::Blue];
}

/// Live state of one session, owned exclusively by `GameSession`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundState {
    pub active: bool,
    pub target: GameColor,
    pub current: GameColor,
    pub awaiting_reaction: bool,
    pub reaction_started_ms: u64,
    pub score: u32,
}

/// What the score line should say about the most recent event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Feedback {
    Idle,
    NewTarget,
    Hit { reaction_ms: u64 },
    Miss,
    Paused,
}

/// Result of one player action, for the caller to act on
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActionOutcome {
    /// Session was inactive; a fresh one was started instead of scoring.
    Started,
    Hit {
        reaction_ms: u64,
        awarded: u32,
        records_updated: bool,
    },
    Miss,
    /// Action inside an already-consumed reaction window.
    Ignored,
}

/// Aggregate of a finished session, appended to the history log
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    pub score: u32,
    pub hits: usize,
    pub best_reaction_ms: u64,
    pub mean_reaction_ms: f64,
}

/// Reward decays linearly with latency: full 6 points under 200 ms,
/// one point less per further 200 ms, floored at 1 for any valid hit.
/// Integer floor division is part of the scoring contract.
pub fn calculate_score(reaction_ms: u64) -> u32 {
    let steps = reaction_ms / 200;
    if steps >= 5 {
        1
    } else {
        (6 - steps) as u32
    }
}

/// The match/mismatch state machine. Driven by two external event
/// sources on one logical timeline: the self-rescheduling rotation tick
/// and the player action. Every collaborator (clock, randomness, tick
/// scheduling) is injected.
#[derive(Debug)]
pub struct GameSession<C: Clock, R: RotationRng, S: TickScheduler> {
    clock: C,
    rng: R,
    scheduler: S,
    initial_delay_ms: u64,
    state: RoundState,
    feedback: Feedback,
    leaderboard: Leaderboard,
    reactions: Vec<u64>,
    completed: Option<SessionSummary>,
}

impl<C: Clock, R: RotationRng, S: TickScheduler> GameSession<C, R, S> {
    pub fn new(
        clock: C,
        rng: R,
        scheduler: S,
        initial_delay_ms: u64,
        leaderboard: Leaderboard,
    ) -> Self {
        Self {
            clock,
            rng,
            scheduler,
            initial_delay_ms,
            state: RoundState {
                active: false,
                target: GameColor::Red,
                current: GameColor::Red,
                awaiting_reaction: false,
                reaction_started_ms: 0,
                score: 0,
            },
            feedback: Feedback::Idle,
            leaderboard,
            reactions: Vec::new(),
            completed: None,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Begin a fresh session: pending ticks are cancelled before any
    /// state changes so no stale tick can fire into the reset session.
    /// Restarting over a running session is allowed.
    pub fn start_session(&mut self) {
        self.scheduler.cancel_all();

        if let Some(summary) = self.session_summary() {
            self.completed = Some(summary);
        }
        self.reactions.clear();

        self.state.score = 0;
        self.state.active = true;
        self.state.awaiting_reaction = false;
        self.state.target = self.rng.next_color();
        self.feedback = Feedback::NewTarget;

        self.scheduler.schedule_once(self.initial_delay_ms);
    }

    /// One rotation: re-pick the displayed color, open the reaction
    /// window when it matches the target, and arm the next tick. A tick
    /// arriving after pause is ignored and the chain is not re-armed.
    pub fn on_rotation_tick(&mut self) {
        if !self.state.active {
            return;
        }

        self.state.awaiting_reaction = false;
        self.state.current = self.rng.next_color();

        if self.state.current == self.state.target {
            self.state.awaiting_reaction = true;
            self.state.reaction_started_ms = self.clock.now_ms();
        }

        let delay = self.rng.next_rotation_delay();
        assert!(
            (ROTATION_DELAY_MIN_MS..ROTATION_DELAY_MIN_MS + ROTATION_DELAY_SPREAD_MS)
                .contains(&delay),
            "rotation source returned out-of-range delay: {delay} ms"
        );
        self.scheduler.schedule_once(delay);
    }

    /// Handle one player action. While inactive any action starts a
    /// fresh session. Otherwise an open matching window scores a hit, a
    /// mismatched color scores a miss, and acting again inside an
    /// already-consumed window does nothing.
    pub fn on_player_action(&mut self) -> ActionOutcome {
        if !self.state.active {
            self.start_session();
            return ActionOutcome::Started;
        }

        if self.state.current == self.state.target && self.state.awaiting_reaction {
            let reaction_ms = self
                .clock
                .now_ms()
                .saturating_sub(self.state.reaction_started_ms);
            let awarded = calculate_score(reaction_ms);

            self.state.score += awarded;
            self.state.awaiting_reaction = false;
            self.reactions.push(reaction_ms);

            let records_updated = self
                .leaderboard
                .check_and_update(self.state.score, reaction_ms);
            self.feedback = Feedback::Hit { reaction_ms };

            ActionOutcome::Hit {
                reaction_ms,
                awarded,
                records_updated,
            }
        } else if self.state.current != self.state.target {
            self.state.score = self.state.score.saturating_sub(1);
            self.feedback = Feedback::Miss;
            ActionOutcome::Miss
        } else {
            // current == target with the window already consumed: the
            // tick chain keeps running, nothing to score here.
            ActionOutcome::Ignored
        }
    }

    /// Cancel pending ticks, then deactivate. The inactive guard in
    /// `on_rotation_tick` catches any tick that raced the cancellation.
    pub fn pause_session(&mut self) {
        self.scheduler.cancel_all();
        self.state.active = false;
        self.feedback = Feedback::Paused;
    }

    /// Resuming always restarts a fresh session rather than continuing
    /// the old one.
    pub fn resume_session(&mut self) {
        if !self.state.active {
            self.start_session();
        }
    }

    /// Fire the rotation tick if its deadline has passed. The deadline
    /// is consumed before dispatch so a tick is delivered at most once.
    /// Returns true when a tick fired.
    pub fn poll_tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.scheduler.next_deadline_ms() {
            Some(deadline) if deadline <= now => {
                self.scheduler.cancel_all();
                self.on_rotation_tick();
                true
            }
            _ => false,
        }
    }

    /// Milliseconds until the pending rotation tick, if one is armed.
    pub fn time_until_tick(&self) -> Option<u64> {
        self.scheduler
            .next_deadline_ms()
            .map(|deadline| deadline.saturating_sub(self.clock.now_ms()))
    }

    /// Aggregate of the running session; None until the first hit.
    pub fn session_summary(&self) -> Option<SessionSummary> {
        if self.reactions.is_empty() {
            return None;
        }

        let best = self.reactions.iter().copied().min().unwrap_or(0);
        let samples: Vec<f64> = self.reactions.iter().map(|&r| r as f64).collect();

        Some(SessionSummary {
            score: self.state.score,
            hits: self.reactions.len(),
            best_reaction_ms: best,
            mean_reaction_ms: mean(&samples).unwrap_or(0.0),
        })
    }

    /// Summary of the previous session, captured when a restart replaced
    /// it. Draining it is the caller's cue to append a history row.
    pub fn take_completed(&mut self) -> Option<SessionSummary> {
        self.completed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRotation;
    use crate::timing::{DeadlineScheduler, ManualClock};
    use assert_matches::assert_matches;

    type TestSession = GameSession<ManualClock, ScriptedRotation, DeadlineScheduler<ManualClock>>;

    fn session_with(rng: ScriptedRotation) -> (TestSession, ManualClock) {
        let clock = ManualClock::new(0);
        let scheduler = DeadlineScheduler::new(clock.clone());
        let session = GameSession::new(clock.clone(), rng, scheduler, 1000, Leaderboard::new());
        (session, clock)
    }

    /// Script where every drawn color matches the target.
    fn matching_session(delay_ms: u64) -> (TestSession, ManualClock) {
        session_with(ScriptedRotation::always(GameColor::Red, delay_ms))
    }

    /// Script where the target is red and every rotation shows green.
    fn mismatching_session() -> (TestSession, ManualClock) {
        session_with(ScriptedRotation::new(
            &[GameColor::Red, GameColor::Green],
            &[1500],
        ))
    }

    #[test]
    fn score_formula_contract_values() {
        assert_eq!(calculate_score(0), 6);
        assert_eq!(calculate_score(199), 6);
        assert_eq!(calculate_score(200), 5);
        assert_eq!(calculate_score(399), 5);
        assert_eq!(calculate_score(999), 2);
        assert_eq!(calculate_score(1000), 1);
        assert_eq!(calculate_score(100_000), 1);
    }

    #[test]
    fn new_session_is_inactive() {
        let (session, _clock) = matching_session(1500);

        assert!(!session.state().active);
        assert_eq!(session.state().score, 0);
        assert_eq!(session.feedback(), Feedback::Idle);
        assert_eq!(session.time_until_tick(), None);
    }

    #[test]
    fn start_session_arms_first_tick_and_clears_window() {
        let (mut session, _clock) = matching_session(1500);

        session.start_session();

        assert!(session.state().active);
        assert!(!session.state().awaiting_reaction);
        assert_eq!(session.state().score, 0);
        assert_eq!(session.feedback(), Feedback::NewTarget);
        assert_eq!(session.time_until_tick(), Some(1000));
    }

    #[test]
    fn matching_tick_opens_reaction_window() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();

        clock.advance(1000);
        assert!(session.poll_tick());

        assert!(session.state().awaiting_reaction);
        assert_eq!(session.state().current, session.state().target);
        assert_eq!(session.state().reaction_started_ms, 1000);
        // Next tick armed from the script's delay.
        assert_eq!(session.time_until_tick(), Some(1500));
    }

    #[test]
    fn mismatching_tick_keeps_window_closed() {
        let (mut session, clock) = mismatching_session();
        session.start_session();
        assert_eq!(session.state().target, GameColor::Red);

        clock.advance(1000);
        assert!(session.poll_tick());

        assert_eq!(session.state().current, GameColor::Green);
        assert!(!session.state().awaiting_reaction);
    }

    #[test]
    fn hit_scores_by_reaction_speed_and_updates_records() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();

        clock.advance(1000);
        session.poll_tick();
        clock.advance(300);

        let outcome = session.on_player_action();
        assert_eq!(
            outcome,
            ActionOutcome::Hit {
                reaction_ms: 300,
                awarded: 5,
                records_updated: true,
            }
        );
        assert_eq!(session.state().score, 5);
        assert!(!session.state().awaiting_reaction);
        assert_eq!(session.feedback(), Feedback::Hit { reaction_ms: 300 });
        assert_eq!(session.leaderboard().top_scores(), [5, 0, 0]);
        assert_eq!(session.leaderboard().best_times_ms(), [300, 9999, 9999]);
    }

    #[test]
    fn hit_does_not_rearm_the_tick_chain() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();

        clock.advance(1000);
        session.poll_tick();
        let pending = session.time_until_tick();

        clock.advance(100);
        session.on_player_action();

        // Deadline unchanged apart from the elapsed 100 ms.
        assert_eq!(session.time_until_tick(), pending.map(|t| t - 100));
    }

    #[test]
    fn second_action_in_consumed_window_is_ignored() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();

        clock.advance(1000);
        session.poll_tick();
        clock.advance(100);

        assert_matches!(session.on_player_action(), ActionOutcome::Hit { .. });
        let score = session.state().score;

        // Color still matches the target but the window is consumed.
        assert_eq!(session.on_player_action(), ActionOutcome::Ignored);
        assert_eq!(session.state().score, score);
    }

    #[test]
    fn miss_decrements_score() {
        let (mut session, clock) = mismatching_session();
        session.start_session();
        clock.advance(1000);
        session.poll_tick();

        assert_eq!(session.on_player_action(), ActionOutcome::Miss);
        assert_eq!(session.state().score, 0);
        assert_eq!(session.feedback(), Feedback::Miss);
    }

    #[test]
    fn score_never_goes_negative() {
        let (mut session, clock) = mismatching_session();
        session.start_session();
        clock.advance(1000);
        session.poll_tick();

        for _ in 0..5 {
            session.on_player_action();
            assert_eq!(session.state().score, 0);
        }
    }

    #[test]
    fn action_while_inactive_starts_a_session() {
        let (mut session, _clock) = matching_session(1500);

        assert_eq!(session.on_player_action(), ActionOutcome::Started);
        assert!(session.state().active);
        assert_eq!(session.time_until_tick(), Some(1000));
    }

    #[test]
    fn pause_cancels_pending_tick() {
        let (mut session, _clock) = matching_session(1500);
        session.start_session();

        session.pause_session();

        assert!(!session.state().active);
        assert_eq!(session.feedback(), Feedback::Paused);
        assert_eq!(session.time_until_tick(), None);
    }

    #[test]
    fn stale_tick_after_pause_changes_nothing() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();
        clock.advance(1000);
        session.poll_tick();

        session.pause_session();
        let state = *session.state();

        // Simulate a tick that raced the cancellation.
        session.on_rotation_tick();

        assert_eq!(*session.state(), state);
        assert_eq!(session.time_until_tick(), None);
    }

    #[test]
    fn resume_restarts_a_fresh_session() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();
        clock.advance(1000);
        session.poll_tick();
        clock.advance(100);
        session.on_player_action();
        assert!(session.state().score > 0);

        session.pause_session();
        session.resume_session();

        assert!(session.state().active);
        assert_eq!(session.state().score, 0);
        assert!(!session.state().awaiting_reaction);
        assert_eq!(session.time_until_tick(), Some(1000));
    }

    #[test]
    fn resume_while_active_is_a_no_op() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();
        clock.advance(1000);
        session.poll_tick();
        clock.advance(100);
        session.on_player_action();

        let state = *session.state();
        session.resume_session();
        assert_eq!(*session.state(), state);
    }

    #[test]
    fn poll_before_deadline_does_not_fire() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();

        clock.advance(999);
        assert!(!session.poll_tick());
        assert!(!session.state().awaiting_reaction);

        clock.advance(1);
        assert!(session.poll_tick());
    }

    #[test]
    fn restart_captures_summary_of_previous_session() {
        let (mut session, clock) = matching_session(1500);
        session.start_session();
        clock.advance(1000);
        session.poll_tick();
        clock.advance(250);
        session.on_player_action();

        session.start_session();

        let summary = session.take_completed().unwrap();
        assert_eq!(summary.score, 5);
        assert_eq!(summary.hits, 1);
        assert_eq!(summary.best_reaction_ms, 250);
        assert_eq!(summary.mean_reaction_ms, 250.0);
        // Drained once.
        assert_eq!(session.take_completed(), None);
    }

    #[test]
    fn summary_is_none_without_hits() {
        let (mut session, _clock) = matching_session(1500);
        session.start_session();

        assert_eq!(session.session_summary(), None);
        session.start_session();
        assert_eq!(session.take_completed(), None);
    }

    #[test]
    #[should_panic(expected = "out-of-range delay")]
    fn out_of_range_delay_is_a_contract_violation() {
        let (mut session, clock) = session_with(ScriptedRotation::always(GameColor::Red, 500));
        session.start_session();
        clock.advance(1000);
        session.poll_tick();
    }

    #[test]
    fn color_labels_are_literal() {
        assert_eq!(GameColor::Red.to_string(), "RED");
        assert_eq!(GameColor::Green.to_string(), "GREEN");
        assert_eq!(GameColor::Blue.to_string(), "BLUE");
    }
}
