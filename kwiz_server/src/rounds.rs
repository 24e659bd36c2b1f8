// Game state machine.
//
// Module overview:
// Drives the quiz through its phases: waiting for a first player, a grace
// countdown, timed question rounds, and the post-game ranking window that
// either restarts the game or shuts the server down. All transitions happen
// in `tick`, which the server calls after every event batch and on every
// poll timeout, so the clock only needs to be as fine as the poll interval.
//
// Design decisions:
// - `tick` takes the current `Instant` as an argument instead of reading the
//   clock itself, so tests can drive the machine through hours of game time
//   with fabricated timestamps.
// - Grading is a straight-line function, not a phase: a round ends and the
//   next begins (or the final ranking opens) within a single tick.
// - Eligibility is fixed at round start. A player logging in mid-round gets
//   the current question and remaining time as a courtesy snapshot but
//   cannot score until the next round.

use std::time::{Duration, Instant};

use log::{debug, info};

use kwiz_protocol::ServerLine;

use crate::bank::AnswerBank;
use crate::registry::{PlayerId, Registry};
use crate::scoring::{Submission, score_round};

/// Timing and length of one game.
#[derive(Clone, Copy, Debug)]
pub struct GameRules {
    /// How long players get to answer each question.
    pub time_limit: Duration,
    /// Rounds per game.
    pub max_rounds: u32,
    /// Pause before the first round and after the final ranking.
    pub grace: Duration,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            time_limit: Duration::from_secs(30),
            max_rounds: 5,
            grace: Duration::from_secs(20),
        }
    }
}

/// Where the game currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No game scheduled; the next login arms the countdown.
    Idle,
    /// A player has logged in; the first round starts once the grace period
    /// passes.
    AwaitingQuorum { since: Instant },
    /// A question is open for answers.
    RoundInProgress { started: Instant },
    /// All rounds are played; after the grace period the game restarts or
    /// the server shuts down.
    FinalRanking { since: Instant },
}

/// What the server loop should do after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The final ranking expired with nobody connected.
    Shutdown,
}

/// The quiz itself: current phase, round index, and the open question.
pub struct Game {
    rules: GameRules,
    bank: AnswerBank,
    phase: Phase,
    round: u32,
    question: Option<String>,
}

impl Game {
    pub fn new(rules: GameRules, bank: AnswerBank) -> Self {
        Game {
            rules,
            bank,
            phase: Phase::Idle,
            round: 0,
            question: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Zero-based index of the current (or next) round.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// React to a completed login. The first login of an idle game arms the
    /// countdown; a login during a round gets the courtesy snapshot.
    pub fn player_logged_in(&mut self, now: Instant, reg: &mut Registry, id: PlayerId) {
        match self.phase {
            Phase::Idle if self.round < self.rules.max_rounds => {
                self.phase = Phase::AwaitingQuorum { since: now };
                reg.broadcast(&ServerLine::GameStarting);
                info!("countdown armed, first round in {:?}", self.rules.grace);
            }
            Phase::RoundInProgress { started } => {
                // A round past the end of the question bank broadcast no
                // question, so there is nothing to catch up on.
                if let Some(text) = self.question.clone() {
                    let remaining = self
                        .rules
                        .time_limit
                        .saturating_sub(now.duration_since(started));
                    reg.send(id, &ServerLine::Question(text));
                    reg.send(id, &ServerLine::TimeLeft(whole_secs(remaining)));
                    reg.send(id, &ServerLine::InGame(false));
                }
            }
            _ => {}
        }
    }

    /// Store a line received from a logged-in player. Outside a round the
    /// line is ignored.
    pub fn answer_received(&mut self, now: Instant, reg: &mut Registry, id: PlayerId, text: String) {
        let Phase::RoundInProgress { started } = self.phase else {
            return;
        };
        reg.record_answer(id, text, now.duration_since(started));
    }

    /// All players disconnected. Outside the final ranking the game resets
    /// to idle; during it the countdown keeps running and its expiry decides
    /// between restart and shutdown.
    pub fn on_registry_drained(&mut self) {
        if matches!(self.phase, Phase::FinalRanking { .. }) {
            return;
        }
        info!("all players left; game reset");
        self.round = 0;
        self.question = None;
        self.phase = Phase::Idle;
    }

    /// Advance the machine to `now`.
    pub fn tick(&mut self, now: Instant, reg: &mut Registry) -> TickOutcome {
        match self.phase {
            Phase::Idle => {}
            Phase::AwaitingQuorum { since } => {
                // Re-checked every tick: the player who armed the countdown
                // may be gone, in which case the start waits for the next
                // login.
                if now.duration_since(since) >= self.rules.grace
                    && reg.count_named() > 0
                    && self.round < self.rules.max_rounds
                {
                    self.start_round(now, reg);
                }
            }
            Phase::RoundInProgress { started } => {
                let timed_out = now.duration_since(started) >= self.rules.time_limit;
                let quorum = reg.count_answered() >= quorum_threshold(reg.count_eligible());
                if timed_out || quorum {
                    self.grade_round(now, reg);
                }
            }
            Phase::FinalRanking { since } => {
                if now.duration_since(since) < self.rules.grace {
                    return TickOutcome::Continue;
                }
                if reg.is_empty() {
                    reg.broadcast(&ServerLine::GameOver);
                    self.phase = Phase::Idle;
                    info!("game complete with no players left; shutting down");
                    return TickOutcome::Shutdown;
                }
                reg.reset_for_new_game();
                reg.broadcast(&ServerLine::NewGame);
                self.round = 0;
                info!("new game started with {} players", reg.len());
                self.start_round(now, reg);
            }
        }
        TickOutcome::Continue
    }

    /// Open the current round: fix eligibility, broadcast the question (if
    /// the bank still has one) and the time limit.
    fn start_round(&mut self, now: Instant, reg: &mut Registry) {
        reg.begin_round();
        self.question = self.bank.question_text(self.round).map(str::to_string);
        self.phase = Phase::RoundInProgress { started: now };
        if let Some(text) = &self.question {
            reg.broadcast(&ServerLine::Question(text.clone()));
        }
        reg.broadcast(&ServerLine::TimeLeft(whole_secs(self.rules.time_limit)));
        debug!(
            "round {} started, {} eligible players",
            self.round + 1,
            reg.count_eligible()
        );
    }

    /// Close the current round: score the eligible players, broadcast the
    /// ranking, and move on to the next round or the final ranking.
    fn grade_round(&mut self, now: Instant, reg: &mut Registry) {
        let answered = reg.count_answered();
        let eligible = reg.count_eligible();
        let graded: Vec<(PlayerId, u32)> = {
            let accepted = self.bank.accepted_answers(self.round);
            let mut ids = Vec::new();
            let mut submissions = Vec::new();
            for (id, player) in reg.iter() {
                if player.is_eligible() {
                    ids.push(id);
                    submissions.push(Submission {
                        answer: player.answer(),
                        elapsed: player.answer_time(),
                    });
                }
            }
            let points = score_round(accepted, self.rules.time_limit, &submissions);
            ids.into_iter().zip(points).collect()
        };
        reg.apply_round_points(&graded);
        info!(
            "round {} graded, {answered} of {eligible} eligible answered",
            self.round + 1
        );

        // The scoreboard is built before answers are cleared so the ranking
        // lines can echo what each player wrote.
        let rows = reg.scoreboard();
        reg.broadcast(&ServerLine::RankingHeader {
            round: self.round + 1,
        });
        let mut rank: u32 = 0;
        for row in rows {
            rank += 1;
            reg.broadcast(&ServerLine::RankingEntry {
                rank,
                name: row.name,
                round_points: row.round_points,
                total_points: row.total_points,
                answer: row.answer,
            });
        }
        reg.broadcast(&ServerLine::InGame(false));
        reg.broadcast(&ServerLine::TimeLeft(0));
        reg.clear_answers();

        self.round += 1;
        if self.round < self.rules.max_rounds {
            self.start_round(now, reg);
        } else {
            reg.broadcast(&ServerLine::QuestionsExhausted);
            self.phase = Phase::FinalRanking { since: now };
            info!(
                "all {} rounds played; final ranking holds for {:?}",
                self.round, self.rules.grace
            );
        }
    }
}

/// Smallest count strictly more than half of `eligible`.
fn quorum_threshold(eligible: usize) -> usize {
    eligible / 2 + 1
}

/// Whole seconds of `d`, truncated. Game time limits are nowhere near
/// `u32::MAX` seconds.
#[expect(clippy::cast_possible_truncation)]
fn whole_secs(d: Duration) -> u32 {
    d.as_secs() as u32
}
