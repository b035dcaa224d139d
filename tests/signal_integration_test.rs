#![cfg(unix)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn connect_with_retry(port: u16) -> TcpStream {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match TcpStream::connect(("127.0.0.1", port)) {
            Ok(stream) => return stream,
            Err(_) if Instant::now() < deadline => sleep(Duration::from_millis(50)),
            Err(e) => panic!("bridge never accepted on {}: {}", port, e),
        }
    }
}

fn exit_signal(name: &str) {
    let temp_dir = TempDir::new().unwrap();
    let state_path = temp_dir.path().join("scope.json");
    let lx200_port = free_port();

    let mut child = Command::new(env!("CARGO_BIN_EXE_lx200-bridge"))
        .args([
            "--encoder-server",
            &format!("http://127.0.0.1:{}", free_port()),
            "--port",
            &lx200_port.to_string(),
            "--stellarium-port",
            &free_port().to_string(),
            "--web-port",
            &free_port().to_string(),
            "--store-path",
            state_path.to_str().unwrap(),
            "--state-save-interval",
            "600000",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stream = connect_with_retry(lx200_port);
    stream.write_all(b":RG#:GVP#").unwrap();
    let mut reply = Vec::new();
    BufReader::new(&stream).read_until(b'#', &mut reply).unwrap();
    assert!(reply.ends_with(b"#"));

    let status = Command::new("kill")
        .args([&format!("-{}", name), &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("bridge did not exit after SIG{}", name);
        }
        sleep(Duration::from_millis(50));
    };

    assert!(exit.success(), "exit status after SIG{}: {:?}", name, exit);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    assert_eq!(saved["mount"]["slew"]["rate"], "guiding");
}

#[test]
fn test_sigquit_saves_state_and_exits() {
    exit_signal("QUIT");
}

#[test]
fn test_sigterm_saves_state_and_exits() {
    exit_signal("TERM");
}
