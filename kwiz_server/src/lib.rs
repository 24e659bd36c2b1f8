// kwiz_server: multiplayer quiz server.
//
// This crate implements a Polish-language trivia game over plain TCP. The
// server accepts client connections, collects nicknames, and runs games of
// timed question rounds: each round broadcasts a question, waits for answers
// until a majority has answered or the time limit passes, then scores the
// round and broadcasts a ranking. After the last round the game restarts
// with whoever stayed, or the server shuts down once everyone has left.
//
// Module overview:
// - `config.rs`:   The question file, JSON with the time limit, round count,
//                  and the question bank. Loaded once at startup.
// - `bank.rs`:     Question lookup and accepted-answer matching.
// - `registry.rs`: Connected players, their nicknames, scores, per-round
//                  answers, and the write halves of their sockets.
// - `scoring.rs`:  Round arithmetic for correctness and speed points.
// - `rounds.rs`:   The game state machine driven by `tick`.
// - `server.rs`:   TCP listener, reader threads (one per client), and the
//                  main event loop. Uses `std::net` with a thread-per-reader
//                  architecture and an `mpsc` channel to funnel events into
//                  the single-threaded `Registry` and `Game`.
//
// Dependencies: `kwiz_protocol` (line framing and message rendering),
// `serde`/`serde_json` (question file), `log` (diagnostics).
//
// The server can run as a standalone binary (`main.rs`) or be embedded in a
// test harness via the library API (`start_server`).

pub mod bank;
pub mod config;
pub mod registry;
pub mod rounds;
pub mod scoring;
pub mod server;

pub use server::start_server;
