// Integration smoke test for the quiz server.
//
// Starts a server on localhost, connects mock TCP clients, and exercises the
// basic lifecycle: nickname prompt, login, countdown, question broadcast,
// answer, ranking, and shutdown.
//
// Each client is a plain TCP socket using the protocol crate's line framing.
// Timings are compressed so a round fits in a test run.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use kwiz_protocol::{read_line, write_line};
use kwiz_server::bank::AnswerBank;
use kwiz_server::config::GameConfig;
use kwiz_server::rounds::GameRules;
use kwiz_server::server::{ServerConfig, start_server};

/// One-question config with a short grace period and a snappy poll interval.
/// The ten second answer limit never elapses; rounds end on the answer
/// quorum instead.
fn quick_config() -> ServerConfig {
    let game_config = GameConfig::from_json(
        r#"{
            "time_limit_secs": 10,
            "max_rounds": 1,
            "questions": [
                {"question": "Stolica Francji?", "answers": ["Paryż", "Paris"]}
            ]
        }"#,
    )
    .unwrap();
    ServerConfig {
        port: 0,
        rules: GameRules {
            time_limit: Duration::from_secs(u64::from(game_config.time_limit_secs)),
            max_rounds: game_config.max_rounds,
            grace: Duration::from_millis(200),
        },
        bank: AnswerBank::from_config(&game_config),
        poll_interval: Duration::from_millis(25),
    }
}

fn connect(addr: std::net::SocketAddr) -> (BufReader<TcpStream>, BufWriter<TcpStream>) {
    let stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let reader_stream = stream.try_clone().unwrap();
    (BufReader::new(reader_stream), BufWriter::new(stream))
}

fn recv(reader: &mut BufReader<TcpStream>) -> String {
    read_line(reader).unwrap()
}

fn send(writer: &mut BufWriter<TcpStream>, line: &str) {
    write_line(writer, line).unwrap();
}

#[test]
fn single_player_game() {
    let (handle, addr) = start_server(quick_config()).unwrap();

    // Give the listener thread a moment to start.
    std::thread::sleep(Duration::from_millis(50));

    let (mut reader, mut writer) = connect(addr);
    assert_eq!(recv(&mut reader), "Podaj swój pseudonim:");
    send(&mut writer, "Ala");
    assert_eq!(recv(&mut reader), "Zalogowano pomyślnie!");
    assert_eq!(
        recv(&mut reader),
        "Pierwszy gracz dołączył! Za 20 sekund start rozgrywki..."
    );

    // First round opens after the grace period.
    assert_eq!(recv(&mut reader), "Pytanie: Stolica Francji?");
    assert_eq!(recv(&mut reader), "TIME_LEFT=10");

    // A single answer is a quorum of one: the round grades immediately.
    send(&mut writer, "Paryż");
    assert_eq!(recv(&mut reader), "Runda 1 zakończona, wyniki:");
    assert_eq!(
        recv(&mut reader),
        "1. Ala, Punkty za pytanie: 20, Łącznie: 20, Odpowiedź: Paryż"
    );
    assert_eq!(recv(&mut reader), "IN_GAME=0");
    assert_eq!(recv(&mut reader), "TIME_LEFT=0");
    assert_eq!(
        recv(&mut reader),
        "Koniec pytań, za 20 sekund ruszy nowa gra / koniec."
    );

    handle.stop();
}

#[test]
fn duplicate_nickname_is_rejected() {
    let (handle, addr) = start_server(quick_config()).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    // First client takes the name.
    let (mut reader_a, mut writer_a) = connect(addr);
    assert_eq!(recv(&mut reader_a), "Podaj swój pseudonim:");
    send(&mut writer_a, "Ala");
    assert_eq!(recv(&mut reader_a), "Zalogowano pomyślnie!");

    // Second client is told to pick another; a case variant is fine because
    // nicknames compare byte for byte.
    let (mut reader_b, mut writer_b) = connect(addr);
    assert_eq!(recv(&mut reader_b), "Podaj swój pseudonim:");
    send(&mut writer_b, "Ala");
    assert_eq!(recv(&mut reader_b), "Pseudonim zajęty, wybierz inny.");
    send(&mut writer_b, "ala");
    assert_eq!(recv(&mut reader_b), "Zalogowano pomyślnie!");

    handle.stop();
}
