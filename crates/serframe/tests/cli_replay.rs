#![cfg(all(unix, feature = "cli"))]

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/serframe-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn serframe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_serframe"));
    cmd.env_remove("SERFRAME_CONFIG")
        .env_remove("SERFRAME_PORT")
        .env_remove("SERFRAME_BAUD")
        .arg("--log-level")
        .arg("error");
    cmd
}

fn printed_messages(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| {
            let envelope: Value = serde_json::from_str(line).expect("stdout line should be json");
            envelope["message"].clone()
        })
        .collect()
}

const CAPTURE: &str = concat!(
    r#"{"type":"status","text":"a } in a string"}"#,
    r#"{"type":"reading","value":{"t":21.5}}"#,
    "{not json}",
    r#"{"type":"ack","id":7}"#,
    r#"{"type":"parti"#,
);

#[test]
fn replay_file_prints_messages_in_order() {
    let dir = unique_temp_dir("replay-file");
    let capture = dir.join("capture.bin");
    std::fs::write(&capture, CAPTURE).expect("capture should be writable");

    let output = serframe()
        .args(["--format", "json", "replay"])
        .arg(&capture)
        .args(["--read-idle", "1ms"])
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        printed_messages(&output),
        vec![
            json!({"type": "status", "text": "a } in a string"}),
            json!({"type": "reading", "value": {"t": 21.5}}),
            json!({"type": "ack", "id": 7}),
        ]
    );

    let first: Value = serde_json::from_str(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .expect("one line at least"),
    )
    .expect("envelope should be json");
    assert_eq!(first["msg_type"], "status");
    assert_eq!(first["size"], 42);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_stdin_honours_count() {
    let mut child = serframe()
        .args(["--format", "raw", "replay", "-", "--count", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("replay should start");

    let mut stdin = child.stdin.take().expect("stdin should be piped");
    stdin
        .write_all(br#"{"n":1}{"n":2}{"n":3}"#)
        .expect("stdin should accept bytes");
    drop(stdin);

    let output = child.wait_with_output().expect("replay should finish");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"n\":1}\n{\"n\":2}\n"
    );
}

#[test]
fn replay_stdin_stops_on_sigint_while_stdin_stays_open() {
    let mut child = serframe()
        .args(["--format", "json", "replay", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("replay should start");

    let mut stdin = child.stdin.take().expect("stdin should be piped");
    stdin
        .write_all(br#"{"type":"hello"}"#)
        .expect("stdin should accept bytes");
    stdin.flush().expect("stdin should flush");

    let mut stdout = BufReader::new(child.stdout.take().expect("stdout should be piped"));
    let mut line = String::new();
    stdout
        .read_line(&mut line)
        .expect("first message should be printed");
    let envelope: Value = serde_json::from_str(&line).expect("envelope should be json");
    assert_eq!(envelope["message"], json!({"type": "hello"}));

    // SAFETY: plain signal delivery to a child we own.
    unsafe {
        libc::kill(child.id() as i32, libc::SIGINT);
    }

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().expect("child should be waitable") {
            break Some(status);
        }
        if start.elapsed() > Duration::from_secs(5) {
            break None;
        }
        thread::sleep(Duration::from_millis(10));
    };
    if status.is_none() {
        let _ = child.kill();
        let _ = child.wait();
    }
    drop(stdin);

    let status = status.expect("replay should exit after ctrl-c with stdin still open");
    assert_eq!(status.code(), Some(0));
}

#[test]
fn replay_missing_file_fails() {
    let output = serframe()
        .args(["replay", "/nonexistent/serframe-capture.bin"])
        .output()
        .expect("replay should run");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed opening"));
}

#[test]
fn bad_duration_is_usage_error() {
    let output = serframe()
        .args(["replay", "-", "--process-idle", "soon"])
        .stdin(Stdio::null())
        .output()
        .expect("replay should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_reports_crate_version() {
    let output = serframe()
        .arg("version")
        .output()
        .expect("version should run");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("serframe {}", env!("CARGO_PKG_VERSION"))
    );
}
