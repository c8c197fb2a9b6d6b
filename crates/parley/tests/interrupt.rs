#![cfg(all(unix, feature = "cli"))]

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

#[test]
fn test_interrupt_at_prompt_exits() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_parley"))
        .args(["chat", "--base-url", "http://127.0.0.1:9"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Held open with no data, so the prompt never gets an answer.
    let _stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    let mut output = Vec::new();
    let mut buf = [0; 256];
    while !output.ends_with(b"user> ") {
        let n = stdout.read(&mut buf).unwrap();
        assert!(n > 0, "stdout closed before the first prompt");
        output.extend_from_slice(&buf[..n]);
    }
    sleep(Duration::from_millis(200));

    let pid = child.id().to_string();
    let kill = Command::new("kill").args(["-INT", &pid]).status().unwrap();
    assert!(kill.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("parley kept running after SIGINT");
        }
        sleep(Duration::from_millis(50));
    };
    assert_eq!(status.code(), Some(130));

    stdout.read_to_end(&mut output).unwrap();
    assert!(String::from_utf8_lossy(&output).ends_with("Interrupted.\n"));
}
