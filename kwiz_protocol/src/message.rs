// Server line vocabulary.
//
// One enum covers every line the server can send. Clients recognize lines by
// string prefix, so the rendered text is load-bearing byte for byte and must
// never drift; `parse` is the exact inverse and exists for clients and test
// harnesses.
//
// There is no client message enum. Client lines are free text, a nickname
// first and quiz answers afterwards; the server assigns meaning from session
// state, not from the line itself.

/// Lines sent by the server to clients. Rendered without the `\n` terminator;
/// `line::write_line` appends it.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerLine {
    /// Ask a fresh connection for its nickname.
    NicknamePrompt,
    /// Reject a nickname already in use.
    NicknameTaken,
    /// Confirm a successful login.
    LoginOk,
    /// First player logged in; the game starts after the grace period.
    GameStarting,
    /// Question broadcast at round start, replayed to mid-round joiners.
    Question(String),
    /// Seconds remaining in the current round.
    TimeLeft(u32),
    /// Whether the receiving player counts in the current round.
    InGame(bool),
    /// Ranking block header. `round` is 1-based.
    RankingHeader { round: u32 },
    /// One ranking row. A missing name renders as `???`, a missing answer as
    /// `brak`.
    RankingEntry {
        rank: u32,
        name: Option<String>,
        round_points: u32,
        total_points: u32,
        answer: Option<String>,
    },
    /// All rounds played; a fresh game or shutdown follows the hold period.
    QuestionsExhausted,
    /// Scores wiped, fresh game starting.
    NewGame,
    /// Server is about to shut down.
    GameOver,
}

impl ServerLine {
    /// Render the wire form of this line, terminator excluded.
    pub fn render(&self) -> String {
        match self {
            ServerLine::NicknamePrompt => "Podaj swój pseudonim:".to_string(),
            ServerLine::NicknameTaken => "Pseudonim zajęty, wybierz inny.".to_string(),
            ServerLine::LoginOk => "Zalogowano pomyślnie!".to_string(),
            ServerLine::GameStarting => {
                "Pierwszy gracz dołączył! Za 20 sekund start rozgrywki...".to_string()
            }
            ServerLine::Question(text) => format!("Pytanie: {text}"),
            ServerLine::TimeLeft(secs) => format!("TIME_LEFT={secs}"),
            ServerLine::InGame(true) => "IN_GAME=1".to_string(),
            ServerLine::InGame(false) => "IN_GAME=0".to_string(),
            ServerLine::RankingHeader { round } => {
                format!("Runda {round} zakończona, wyniki:")
            }
            ServerLine::RankingEntry {
                rank,
                name,
                round_points,
                total_points,
                answer,
            } => {
                let name = name.as_deref().unwrap_or("???");
                let answer = answer.as_deref().unwrap_or("brak");
                format!(
                    "{rank}. {name}, Punkty za pytanie: {round_points}, Łącznie: {total_points}, Odpowiedź: {answer}"
                )
            }
            ServerLine::QuestionsExhausted => {
                "Koniec pytań, za 20 sekund ruszy nowa gra / koniec.".to_string()
            }
            ServerLine::NewGame => "Nowa gra rozpoczęta!".to_string(),
            ServerLine::GameOver => "Gra zakończona! Dzięki za grę!".to_string(),
        }
    }

    /// Parse one received line (terminator already stripped) back into the
    /// message that rendered it. Returns `None` for anything outside the
    /// vocabulary.
    pub fn parse(line: &str) -> Option<ServerLine> {
        match line {
            "Podaj swój pseudonim:" => return Some(ServerLine::NicknamePrompt),
            "Pseudonim zajęty, wybierz inny." => return Some(ServerLine::NicknameTaken),
            "Zalogowano pomyślnie!" => return Some(ServerLine::LoginOk),
            "Pierwszy gracz dołączył! Za 20 sekund start rozgrywki..." => {
                return Some(ServerLine::GameStarting);
            }
            "IN_GAME=0" => return Some(ServerLine::InGame(false)),
            "IN_GAME=1" => return Some(ServerLine::InGame(true)),
            "Koniec pytań, za 20 sekund ruszy nowa gra / koniec." => {
                return Some(ServerLine::QuestionsExhausted);
            }
            "Nowa gra rozpoczęta!" => return Some(ServerLine::NewGame),
            "Gra zakończona! Dzięki za grę!" => return Some(ServerLine::GameOver),
            _ => {}
        }
        if let Some(text) = line.strip_prefix("Pytanie: ") {
            return Some(ServerLine::Question(text.to_string()));
        }
        if let Some(secs) = line.strip_prefix("TIME_LEFT=") {
            return secs.parse().ok().map(ServerLine::TimeLeft);
        }
        if let Some(rest) = line.strip_suffix(" zakończona, wyniki:") {
            let round = rest.strip_prefix("Runda ")?.parse().ok()?;
            return Some(ServerLine::RankingHeader { round });
        }
        Self::parse_ranking_entry(line)
    }

    // `<rank>. <name>, Punkty za pytanie: <p>, Łącznie: <t>, Odpowiedź: <a>`.
    // Field markers are matched left to right; a nickname that itself contains
    // a marker defeats this, same as it does any prefix-matching client.
    fn parse_ranking_entry(line: &str) -> Option<ServerLine> {
        let (rank, rest) = line.split_once(". ")?;
        let rank = rank.parse().ok()?;
        let (name, rest) = rest.split_once(", Punkty za pytanie: ")?;
        let (round_points, rest) = rest.split_once(", Łącznie: ")?;
        let (total_points, answer) = rest.split_once(", Odpowiedź: ")?;
        Some(ServerLine::RankingEntry {
            rank,
            name: (name != "???").then(|| name.to_string()),
            round_points: round_points.parse().ok()?,
            total_points: total_points.parse().ok()?,
            answer: (answer != "brak").then(|| answer.to_string()),
        })
    }
}
