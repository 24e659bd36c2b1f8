// Newline-delimited text framing over TCP.
//
// The quiz protocol is one UTF-8 message per `\n`-terminated line. TCP gives
// no message boundaries, so `read_line` reassembles lines from arbitrary
// segment splits: a line arriving in three segments is one message, and three
// lines arriving in one segment come back as three separate reads.
//
// A `MAX_LINE_LEN` cap protects against unbounded buffering of a peer that
// never sends a newline. Overlong or non-UTF-8 lines are protocol errors;
// callers treat them like a disconnect.

use std::io::{self, BufRead, Write};

/// Longest accepted line in bytes, terminator excluded. Nicknames and quiz
/// answers are short; anything past this is a misbehaving peer.
pub const MAX_LINE_LEN: usize = 1024;

/// Read one line, stripped of its `\n` terminator (and a preceding `\r`, so
/// telnet-style clients work).
///
/// Returns `UnexpectedEof` if the stream closes cleanly, `InvalidData` for a
/// line longer than `MAX_LINE_LEN` or one that is not valid UTF-8.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<String> {
    let mut line = Vec::new();
    loop {
        let (done, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                ));
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    line.extend_from_slice(&available[..pos]);
                    (true, pos + 1)
                }
                None => {
                    line.extend_from_slice(available);
                    (false, available.len())
                }
            }
        };
        reader.consume(used);
        if line.len() > MAX_LINE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line too long: {} bytes (max {MAX_LINE_LEN})", line.len()),
            ));
        }
        if done {
            break;
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "line is not valid UTF-8"))
}

/// Write one line and flush. The terminator is appended here; `line` must not
/// contain one.
pub fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
