// Player registry.
//
// Module overview:
// Owns every connected player: their write half, nickname, score, and the
// current round's answer. The registry is mutated only from the server's
// main thread, so there is no locking; reader threads never touch it and
// communicate through the event channel instead.
//
// Design decisions:
// - Write errors are ignored. A player whose socket broke keeps their slot
//   until the reader thread notices the disconnect and the server removes
//   them, which keeps scoring and ranking consistent in the meantime.
// - `BTreeMap` keyed by ascending `PlayerId` makes iteration order equal
//   registration order, which the scoreboard relies on for tie-breaks.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;
use std::time::Duration;

use log::debug;

use kwiz_protocol::{ServerLine, write_line};

/// Identifies one connected player for the lifetime of their connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u32);

/// The requested nickname is already in use.
#[derive(Debug)]
pub struct NameTaken;

/// One connected player.
pub struct Player {
    name: Option<String>,
    score: u32,
    answer: Option<String>,
    answer_time: Option<Duration>,
    eligible: bool,
    last_points: u32,
    writer: BufWriter<TcpStream>,
}

impl Player {
    /// The player's nickname, `None` until they log in.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Total score across all rounds of the current game.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// The answer submitted this round, if any.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Time from round start to this round's answer.
    pub fn answer_time(&self) -> Option<Duration> {
        self.answer_time
    }

    /// Whether the player takes part in the current round.
    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// Whether the player has answered the current round's question.
    pub fn has_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// Points earned in the most recently graded round.
    pub fn last_points(&self) -> u32 {
        self.last_points
    }
}

/// One row of the end-of-round scoreboard.
pub struct ScoreRow {
    pub name: Option<String>,
    pub round_points: u32,
    pub total_points: u32,
    pub answer: Option<String>,
}

/// All connected players, keyed by [`PlayerId`].
pub struct Registry {
    players: BTreeMap<PlayerId, Player>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            players: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register a new connection and prompt it for a nickname.
    pub fn add(&mut self, stream: TcpStream) -> PlayerId {
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        self.players.insert(
            id,
            Player {
                name: None,
                score: 0,
                answer: None,
                answer_time: None,
                eligible: false,
                last_points: 0,
                writer: BufWriter::new(stream),
            },
        );
        self.send(id, &ServerLine::NicknamePrompt);
        id
    }

    /// Drop a player. Returns true when the registry became empty.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        self.players.remove(&id);
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterate players in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &Player)> {
        self.players.iter().map(|(&id, player)| (id, player))
    }

    /// Whether any connected player already uses `name`. Comparison is
    /// byte-exact, so case variants count as distinct nicknames.
    pub fn is_nickname_taken(&self, name: &str) -> bool {
        self.players
            .values()
            .any(|p| p.name.as_deref() == Some(name))
    }

    /// Assign a nickname, rejecting duplicates.
    pub fn set_nickname(&mut self, id: PlayerId, name: String) -> Result<(), NameTaken> {
        if self.is_nickname_taken(&name) {
            return Err(NameTaken);
        }
        if let Some(player) = self.players.get_mut(&id) {
            player.name = Some(name);
        }
        Ok(())
    }

    /// Send one line to one player. Errors are ignored; the reader thread
    /// reports broken connections.
    pub fn send(&mut self, id: PlayerId, line: &ServerLine) {
        if let Some(player) = self.players.get_mut(&id) {
            let _ = write_line(&mut player.writer, &line.render());
        }
    }

    /// Send one line to every connected player.
    pub fn broadcast(&mut self, line: &ServerLine) {
        let rendered = line.render();
        for player in self.players.values_mut() {
            let _ = write_line(&mut player.writer, &rendered);
        }
    }

    /// Players taking part in the current round.
    pub fn count_eligible(&self) -> usize {
        self.players.values().filter(|p| p.eligible).count()
    }

    /// Eligible players who have answered the current round.
    pub fn count_answered(&self) -> usize {
        self.players
            .values()
            .filter(|p| p.eligible && p.has_answered())
            .count()
    }

    /// Players who have completed login.
    pub fn count_named(&self) -> usize {
        self.players.values().filter(|p| p.name.is_some()).count()
    }

    /// Mark round participants and clear per-round state. Only players who
    /// are logged in when the round starts take part; later joiners wait
    /// for the next one.
    pub fn begin_round(&mut self) {
        for player in self.players.values_mut() {
            player.eligible = player.name.is_some();
            player.answer = None;
            player.answer_time = None;
        }
    }

    /// Store a player's answer. Returns false when the player is not
    /// eligible or already answered; only the first answer counts.
    pub fn record_answer(&mut self, id: PlayerId, answer: String, elapsed: Duration) -> bool {
        match self.players.get_mut(&id) {
            Some(player) if player.eligible && player.answer.is_none() => {
                debug!(
                    "answer from {} after {:.1}s: {answer:?}",
                    player.name.as_deref().unwrap_or("<unnamed>"),
                    elapsed.as_secs_f64()
                );
                player.answer = Some(answer);
                player.answer_time = Some(elapsed);
                true
            }
            _ => false,
        }
    }

    /// Credit graded points: every player's round score is reset, then the
    /// listed players receive theirs.
    pub fn apply_round_points(&mut self, points: &[(PlayerId, u32)]) {
        for player in self.players.values_mut() {
            player.last_points = 0;
        }
        for &(id, earned) in points {
            if let Some(player) = self.players.get_mut(&id) {
                player.last_points = earned;
                player.score += earned;
            }
        }
    }

    /// Forget the current round's answers.
    pub fn clear_answers(&mut self) {
        for player in self.players.values_mut() {
            player.answer = None;
            player.answer_time = None;
        }
    }

    /// Reset all game state for a fresh game. Connections and nicknames
    /// survive; scores and round state do not.
    pub fn reset_for_new_game(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
            player.last_points = 0;
            player.answer = None;
            player.answer_time = None;
            player.eligible = false;
        }
    }

    /// Build the scoreboard, best total first. The sort is stable over
    /// `BTreeMap` iteration order, so equal totals rank by registration.
    pub fn scoreboard(&self) -> Vec<ScoreRow> {
        let mut rows: Vec<ScoreRow> = self
            .players
            .values()
            .map(|p| ScoreRow {
                name: p.name.clone(),
                round_points: p.last_points,
                total_points: p.score,
                answer: p.answer.clone(),
            })
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.total_points));
        rows
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use std::net::TcpListener;

    use kwiz_protocol::read_line;

    /// A connected pair: the server-side stream and the client's read half.
    fn tcp_pair() -> (TcpStream, BufReader<TcpStream>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        (server_side, BufReader::new(client))
    }

    fn recv_line(reader: &mut BufReader<TcpStream>) -> String {
        read_line(reader).unwrap()
    }

    #[test]
    fn add_prompts_for_nickname() {
        let mut reg = Registry::new();
        let (server_side, mut client) = tcp_pair();
        reg.add(server_side);
        assert_eq!(recv_line(&mut client), "Podaj swój pseudonim:");
    }

    #[test]
    fn duplicate_nickname_is_rejected() {
        let mut reg = Registry::new();
        let (a, _ca) = tcp_pair();
        let (b, _cb) = tcp_pair();
        let first = reg.add(a);
        let second = reg.add(b);

        reg.set_nickname(first, "Ala".to_string()).unwrap();
        assert!(reg.set_nickname(second, "Ala".to_string()).is_err());
        // Comparison is byte-exact: a case variant is a different name.
        assert!(reg.set_nickname(second, "ala".to_string()).is_ok());
    }

    #[test]
    fn record_answer_requires_eligibility() {
        let mut reg = Registry::new();
        let (server_side, _client) = tcp_pair();
        let id = reg.add(server_side);
        reg.set_nickname(id, "Ala".to_string()).unwrap();

        // Not yet in a round.
        assert!(!reg.record_answer(id, "paris".to_string(), Duration::from_secs(1)));

        reg.begin_round();
        assert!(reg.record_answer(id, "paris".to_string(), Duration::from_secs(1)));
        // Only the first answer counts.
        assert!(!reg.record_answer(id, "rome".to_string(), Duration::from_secs(2)));
        let player = reg.get(id).unwrap();
        assert_eq!(player.answer(), Some("paris"));
        assert_eq!(player.answer_time(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn begin_round_marks_named_players_only() {
        let mut reg = Registry::new();
        let (a, _ca) = tcp_pair();
        let (b, _cb) = tcp_pair();
        let named = reg.add(a);
        let unnamed = reg.add(b);
        reg.set_nickname(named, "Ala".to_string()).unwrap();

        reg.begin_round();
        assert!(reg.get(named).unwrap().is_eligible());
        assert!(!reg.get(unnamed).unwrap().is_eligible());
        assert_eq!(reg.count_eligible(), 1);
    }

    #[test]
    fn counts_track_login_and_answers() {
        let mut reg = Registry::new();
        let (a, _ca) = tcp_pair();
        let (b, _cb) = tcp_pair();
        let first = reg.add(a);
        let second = reg.add(b);
        assert_eq!(reg.count_named(), 0);

        reg.set_nickname(first, "Ala".to_string()).unwrap();
        reg.set_nickname(second, "Ola".to_string()).unwrap();
        assert_eq!(reg.count_named(), 2);

        reg.begin_round();
        assert_eq!(reg.count_answered(), 0);
        reg.record_answer(first, "paris".to_string(), Duration::from_secs(1));
        assert_eq!(reg.count_answered(), 1);
    }

    #[test]
    fn remove_signals_when_registry_drains() {
        let mut reg = Registry::new();
        let (a, _ca) = tcp_pair();
        let (b, _cb) = tcp_pair();
        let first = reg.add(a);
        let second = reg.add(b);

        assert!(!reg.remove(first));
        assert!(reg.remove(second));
        assert!(reg.is_empty());
    }

    #[test]
    fn broadcast_reaches_every_player() {
        let mut reg = Registry::new();
        let (a, mut ca) = tcp_pair();
        let (b, mut cb) = tcp_pair();
        reg.add(a);
        reg.add(b);
        recv_line(&mut ca);
        recv_line(&mut cb);

        reg.broadcast(&ServerLine::TimeLeft(30));
        assert_eq!(recv_line(&mut ca), "TIME_LEFT=30");
        assert_eq!(recv_line(&mut cb), "TIME_LEFT=30");
    }

    #[test]
    fn apply_round_points_resets_then_credits() {
        let mut reg = Registry::new();
        let (a, _ca) = tcp_pair();
        let (b, _cb) = tcp_pair();
        let first = reg.add(a);
        let second = reg.add(b);
        reg.set_nickname(first, "Ala".to_string()).unwrap();
        reg.set_nickname(second, "Ola".to_string()).unwrap();

        reg.apply_round_points(&[(first, 20), (second, 15)]);
        assert_eq!(reg.get(first).unwrap().score(), 20);
        assert_eq!(reg.get(second).unwrap().last_points(), 15);

        // A round where only the second player scores zeroes the first
        // player's round points but keeps their total.
        reg.apply_round_points(&[(second, 10)]);
        assert_eq!(reg.get(first).unwrap().last_points(), 0);
        assert_eq!(reg.get(first).unwrap().score(), 20);
        assert_eq!(reg.get(second).unwrap().score(), 25);
    }

    #[test]
    fn scoreboard_breaks_ties_by_registration_order() {
        let mut reg = Registry::new();
        let (a, _ca) = tcp_pair();
        let (b, _cb) = tcp_pair();
        let (c, _cc) = tcp_pair();
        let first = reg.add(a);
        let second = reg.add(b);
        let third = reg.add(c);
        reg.set_nickname(first, "Ala".to_string()).unwrap();
        reg.set_nickname(second, "Ola".to_string()).unwrap();
        reg.set_nickname(third, "Ela".to_string()).unwrap();

        reg.apply_round_points(&[(first, 15), (second, 20), (third, 15)]);
        let rows = reg.scoreboard();
        assert_eq!(rows[0].name.as_deref(), Some("Ola"));
        assert_eq!(rows[1].name.as_deref(), Some("Ala"));
        assert_eq!(rows[2].name.as_deref(), Some("Ela"));
    }

    #[test]
    fn reset_for_new_game_keeps_names_and_connections() {
        let mut reg = Registry::new();
        let (server_side, _client) = tcp_pair();
        let id = reg.add(server_side);
        reg.set_nickname(id, "Ala".to_string()).unwrap();
        reg.begin_round();
        reg.record_answer(id, "paris".to_string(), Duration::from_secs(1));
        reg.apply_round_points(&[(id, 20)]);

        reg.reset_for_new_game();
        let player = reg.get(id).unwrap();
        assert_eq!(player.name(), Some("Ala"));
        assert_eq!(player.score(), 0);
        assert_eq!(player.last_points(), 0);
        assert!(player.answer().is_none());
        assert!(!player.is_eligible());
    }
}
