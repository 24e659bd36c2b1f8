// kwiz_protocol: wire protocol for the quiz server and its clients.
//
// This crate defines the line vocabulary and framing used by the quiz server
// (`kwiz_server`) and game clients to communicate over TCP. It is shared
// between both sides and has no dependency on the server crate.
//
// Module overview:
// - `line.rs`:     Newline-delimited framing over any `BufRead`/`Write`
//                  stream, with a maximum-line-length guard.
// - `message.rs`:  The `ServerLine` enum covering every line the server can
//                  send, with exact render and parse.
//
// Design decisions:
// - **Plain text lines.** Clients recognize server lines by string prefix,
//   so the wire format is exact Polish text, not JSON, and `render` output is
//   load-bearing byte for byte.
// - **No client message enum.** Client lines are free text (nickname, then
//   answers); the server assigns meaning from session state.
// - **No async runtime.** Uses `std::io::BufRead`/`Write` for framing,
//   compatible with blocking TCP streams and buffered wrappers.

pub mod line;
pub mod message;

pub use line::{MAX_LINE_LEN, read_line, write_line};
pub use message::ServerLine;
