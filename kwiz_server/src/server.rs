// TCP server and main event loop for the quiz.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main thread.
// - **Reader threads** (one per client): call `read_line()` in a loop and
//   send `InternalEvent::LineFrom` to the main thread. On error/EOF, send
//   `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Registry` and the `Game`, receives events
//   from the channel, and dispatches them. Uses `recv_timeout` with the poll
//   interval as the timeout and runs `Game::tick` after every event batch
//   and every timeout, so phase deadlines are honored to poll-interval
//   resolution without a separate timer thread.
//
// The main thread is the only writer to client TCP streams (via
// `Registry::broadcast`/`send`). Reader threads only read from streams.
// This avoids concurrent read/write on the same `TcpStream`, which is safe
// on most platforms but fragile.
//
// Shutdown: the main thread checks a `keep_running` flag, set to false by
// `ServerHandle::stop` or by the game finishing with nobody connected, and
// breaks out of the event loop.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use kwiz_protocol::{ServerLine, read_line};

use crate::bank::AnswerBank;
use crate::registry::{NameTaken, PlayerId, Registry};
use crate::rounds::{Game, GameRules, TickOutcome};

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    LineFrom {
        player_id: PlayerId,
        line: String,
    },
    Disconnected {
        player_id: PlayerId,
    },
}

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }

    /// Block until the server stops on its own, which happens when a
    /// finished game's ranking window expires with nobody connected.
    pub fn wait(self) {
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a quiz server.
pub struct ServerConfig {
    pub port: u16,
    pub rules: GameRules,
    pub bank: AnswerBank,
    /// Ceiling on how long the main loop waits for events before checking
    /// phase deadlines.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 12345,
            rules: GameRules::default(),
            bank: AnswerBank::default(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Start the quiz server on a background thread. Returns a handle for
/// stopping or waiting on it and the actual bound address (useful when
/// port 0 is used to let the OS pick a free port).
pub fn start_server(
    config: ServerConfig,
) -> std::io::Result<(ServerHandle, std::net::SocketAddr)> {
    let listener = TcpListener::bind(("0.0.0.0", config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    info!("server listening on {addr}");

    let thread = thread::spawn(move || {
        run_server(listener, config, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main server loop. Runs until `keep_running` is set to false.
fn run_server(listener: TcpListener, config: ServerConfig, keep_running: Arc<AtomicBool>) {
    let mut registry = Registry::new();
    let mut game = Game::new(config.rules, config.bank);

    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Set the listener to non-blocking so the accept thread can check
    // keep_running periodically.
    listener.set_nonblocking(true).ok();

    // Listener thread: accepts new connections.
    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    // Main event loop.
    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(config.poll_interval) {
            Ok(event) => {
                handle_event(&mut registry, &mut game, event, &tx, &keep_running);
                // Drain any additional events that arrived during handling.
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut registry, &mut game, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        // Deadlines are checked on both paths: a quorum reached by the
        // events above should end the round now, not a poll later.
        if game.tick(Instant::now(), &mut registry) == TickOutcome::Shutdown {
            keep_running.store(false, Ordering::SeqCst);
        }
    }
}

/// Dispatch a single event to the registry and the game.
fn handle_event(
    registry: &mut Registry,
    game: &mut Game,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            handle_new_connection(registry, stream, tx, keep_running);
        }
        InternalEvent::LineFrom { player_id, line } => {
            handle_line(registry, game, player_id, line);
        }
        InternalEvent::Disconnected { player_id } => {
            let drained = registry.remove(player_id);
            debug!(
                "player {} disconnected, {} remain",
                player_id.0,
                registry.len()
            );
            if drained {
                game.on_registry_drained();
            }
        }
    }
}

/// Handle a new TCP connection: register the player, which prompts them for
/// a nickname, and spawn a reader thread.
fn handle_new_connection(
    registry: &mut Registry,
    stream: TcpStream,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    enable_keepalive(&stream);

    // Clone the stream for the reader thread; the registry keeps the
    // write half.
    let read_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };

    let player_id = registry.add(stream);
    debug!("player {} connected, {} total", player_id.0, registry.len());

    let tx_reader = tx.clone();
    let keep_running_reader = keep_running.clone();
    thread::spawn(move || {
        reader_loop(
            BufReader::new(read_stream),
            player_id,
            tx_reader,
            keep_running_reader,
        );
    });
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    player_id: PlayerId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_line(&mut reader) {
            Ok(line) => {
                if tx.send(InternalEvent::LineFrom { player_id, line }).is_err() {
                    break;
                }
            }
            Err(_) => {
                // Read error, EOF, or a protocol violation: disconnect.
                let _ = tx.send(InternalEvent::Disconnected { player_id });
                break;
            }
        }
    }
}

/// Handle one line from a client. Before login the line is a nickname
/// attempt; after login every line is an answer to the open question.
fn handle_line(registry: &mut Registry, game: &mut Game, player_id: PlayerId, line: String) {
    let now = Instant::now();
    let logged_in = registry
        .get(player_id)
        .is_some_and(|p| p.name().is_some());
    if logged_in {
        game.answer_received(now, registry, player_id, line);
        return;
    }

    match registry.set_nickname(player_id, line.clone()) {
        Ok(()) => {
            registry.send(player_id, &ServerLine::LoginOk);
            info!(
                "{line} logged in (player {}), {} named players",
                player_id.0,
                registry.count_named()
            );
            game.player_logged_in(now, registry, player_id);
        }
        Err(NameTaken) => {
            registry.send(player_id, &ServerLine::NicknameTaken);
        }
    }
}

/// Enable TCP keepalive so half-open connections from vanished clients are
/// eventually torn down and reported by the reader thread.
#[cfg(unix)]
fn enable_keepalive(stream: &TcpStream) {
    use std::os::unix::io::AsRawFd;

    let enable: libc::c_int = 1;
    // Best effort; a socket without keepalive still works.
    unsafe {
        libc::setsockopt(
            stream.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_KEEPALIVE,
            std::ptr::from_ref(&enable).cast(),
            size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

#[cfg(not(unix))]
fn enable_keepalive(_stream: &TcpStream) {}
