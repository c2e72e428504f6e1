#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Stdio};

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
        .arg("error")
        .stdin(Stdio::null());
    cmd
}

#[test]
fn missing_config_file_is_usage_error() {
    let output = serframe()
        .args(["listen", "--config", "/nonexistent/serframe.json"])
        .output()
        .expect("listen should run");
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file not found"));
}

#[test]
fn invalid_config_file_is_data_error() {
    let dir = unique_temp_dir("bad-config");
    let config = dir.join("config.json");
    std::fs::write(&config, r#"{"serial":{"port":"/dev/ttyUSB0"}}"#)
        .expect("config should be writable");

    let output = serframe()
        .arg("listen")
        .arg("--config")
        .arg(&config)
        .output()
        .expect("listen should run");
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_without_port_is_usage_error() {
    let output = serframe()
        .args(["send", "--json", r#"{"type":"ping"}"#])
        .output()
        .expect("send should run");
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no serial port"));
}

#[test]
fn listen_on_non_tty_is_transport_error() {
    let output = serframe()
        .args(["listen", "--port", "/dev/null"])
        .output()
        .expect("listen should run");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn unsupported_baud_from_env_is_usage_error() {
    let output = serframe()
        .env("SERFRAME_BAUD", "1234")
        .args(["listen", "--port", "/dev/null"])
        .output()
        .expect("listen should run");
    assert_eq!(output.status.code(), Some(64));
}

#[cfg(target_os = "linux")]
mod pty {
    use std::io::{Read, Write};
    use std::process::Stdio;
    use std::thread;
    use std::time::{Duration, Instant};

    use portable_pty::{native_pty_system, MasterPty, PtySize};
    use serde_json::{json, Value};

    use super::serframe;

    fn open_pty() -> portable_pty::PtyPair {
        native_pty_system()
            .openpty(PtySize::default())
            .expect("pty should open")
    }

    /// The slave side shares its termios with the master on Linux.
    fn slave_is_raw(master: &dyn MasterPty) -> bool {
        let Some(fd) = master.as_raw_fd() else {
            return false;
        };
        // SAFETY: an all-zero termios is a valid out-parameter for tcgetattr.
        let mut tty: libc::termios = unsafe { std::mem::zeroed() };
        // SAFETY: `fd` belongs to the open master held by the caller.
        if unsafe { libc::tcgetattr(fd, &mut tty) } != 0 {
            return false;
        }
        tty.c_lflag & libc::ICANON == 0
    }

    fn wait_until<F: FnMut() -> bool>(mut cond: F, timeout: Duration) -> bool {
        let start = Instant::now();
        while !cond() {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
        true
    }

    #[test]
    fn listen_prints_messages_from_serial_line() {
        let pair = open_pty();
        let slave = pair.master.tty_name().expect("pty should have a name");
        let mut master = pair.master.take_writer().expect("pty writer");

        let mut child = serframe()
            .args(["--format", "json", "listen", "--count", "2", "--port"])
            .arg(&slave)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("listen should start");

        assert!(
            wait_until(|| slave_is_raw(pair.master.as_ref()), Duration::from_secs(5)),
            "listener never configured the port"
        );

        master
            .write_all(br#"{"type":"ping","id":1}{"type":"po"#)
            .expect("master write should succeed");
        master.flush().expect("master flush should succeed");
        thread::sleep(Duration::from_millis(30));
        master
            .write_all(br#"ng","id":2}{"type":"extra"}"#)
            .expect("master write should succeed");
        master.flush().expect("master flush should succeed");

        let exited = wait_until(
            || matches!(child.try_wait(), Ok(Some(_))),
            Duration::from_secs(5),
        );
        if !exited {
            let _ = child.kill();
        }
        let output = child.wait_with_output().expect("listen should finish");
        assert!(exited, "listen did not stop after --count");
        assert_eq!(output.status.code(), Some(0));

        let messages: Vec<Value> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| {
                let envelope: Value = serde_json::from_str(line).expect("json envelope");
                envelope["message"].clone()
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                json!({"type": "ping", "id": 1}),
                json!({"type": "pong", "id": 2})
            ]
        );
    }

    #[test]
    fn send_writes_compact_message() {
        let pair = open_pty();
        let slave = pair.master.tty_name().expect("pty should have a name");
        let mut master = pair.master.try_clone_reader().expect("pty reader");

        let output = serframe()
            .args(["send", "--json", r#"{ "type": "cmd", "args": [1, 2] }"#, "--port"])
            .arg(&slave)
            .output()
            .expect("send should run");
        assert_eq!(
            output.status.code(),
            Some(0),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let expected = br#"{"args":[1,2],"type":"cmd"}"#;
        let mut received = vec![0u8; expected.len()];
        master
            .read_exact(&mut received)
            .expect("master should receive the message");
        assert_eq!(received, expected);
    }
}
