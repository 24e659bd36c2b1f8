// Test-only quiz client for end-to-end server tests.
//
// Wraps a plain TCP socket with the protocol crate's line framing to provide
// a synchronous, test-friendly API for exercising the full server pipeline:
// connect, log in, read broadcasts, submit answers, and observe rankings.
// All networking uses the same framing as a real client; the only
// test-specific code is the blocking read helpers.
//
// See also: `tests/full_game.rs` for the integration test scenarios.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use kwiz_protocol::{read_line, write_line};

/// Timeout for blocking reads. Generous so slow CI machines do not produce
/// spurious failures.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A test client speaking the quiz wire protocol over TCP.
pub struct TestClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl TestClient {
    /// Connect to a running server.
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", addr.port()))
            .expect("TestClient::connect failed");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set_read_timeout failed");
        let reader_stream = stream.try_clone().expect("stream clone failed");
        Self {
            reader: BufReader::new(reader_stream),
            writer: BufWriter::new(stream),
        }
    }

    /// Send one line to the server.
    pub fn send_line(&mut self, line: &str) {
        write_line(&mut self.writer, line).expect("send_line failed");
    }

    /// Blocking read of the next server line.
    pub fn recv_line(&mut self) -> String {
        read_line(&mut self.reader).expect("recv_line failed")
    }

    /// Read one line and assert its exact text.
    pub fn expect_line(&mut self, expected: &str) {
        let line = self.recv_line();
        assert_eq!(line, expected);
    }

    /// Read one line, assert its prefix, and return the full line.
    pub fn expect_prefix(&mut self, prefix: &str) -> String {
        let line = self.recv_line();
        assert!(
            line.starts_with(prefix),
            "expected prefix {prefix:?}, got {line:?}"
        );
        line
    }

    /// Read lines until one equals `target`, returning the lines read before
    /// it. Panics if the target does not show up within 100 lines.
    pub fn recv_until(&mut self, target: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for _ in 0..100 {
            let line = self.recv_line();
            if line == target {
                return seen;
            }
            seen.push(line);
        }
        panic!("did not receive {target:?} within 100 lines, saw: {seen:?}");
    }

    /// Complete the login handshake: read the prompt, send the nickname,
    /// read the confirmation.
    pub fn login(&mut self, name: &str) {
        self.expect_line("Podaj swój pseudonim:");
        self.send_line(name);
        self.expect_line("Zalogowano pomyślnie!");
    }

    /// Close the connection. Dropping both halves is the whole goodbye; the
    /// protocol has no farewell message.
    pub fn disconnect(self) {}
}
