use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

fn write_framed(stdin: &mut std::process::ChildStdin, payload: &Value) {
    let body = serde_json::to_vec(payload).expect("serialize payload");
    let frame = format!("Content-Length: {}\r\n\r\n", body.len());
    stdin
        .write_all(frame.as_bytes())
        .expect("write frame header");
    stdin.write_all(&body).expect("write frame body");
    stdin.flush().expect("flush");
}

fn read_framed<R: BufRead>(reader: &mut R) -> Value {
    let mut length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).expect("read header");
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some(v) = header.strip_prefix("Content-Length:") {
            length = v.trim().parse().expect("content length");
        }
    }
    let mut body = vec![0_u8; length];
    reader.read_exact(&mut body).expect("read body");
    serde_json::from_slice(&body).expect("parse framed response")
}

#[test]
fn stdio_answers_both_framings_and_skips_notifications() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let weights_path = std::env::temp_dir()
        .join(format!("saw-rank-stdio-{now}.json"))
        .display()
        .to_string();

    let mut child = Command::new(env!("CARGO_BIN_EXE_saw-rankd"))
        .env("SAW_RANKD_TRANSPORT", "stdio")
        .env("SAW_RANK_WEIGHTS_PATH", &weights_path)
        .env("SAW_SCORING_PROVIDER", "local")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn saw-rankd");

    let mut child_stdin = child.stdin.take().expect("stdin");
    let child_stdout = child.stdout.take().expect("stdout");
    let mut reader = BufReader::new(child_stdout);

    let set = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {
            "name": "saw_weights_set",
            "arguments": {"criteria": ["Harga", "Rating"], "weights": [0.25, 0.75]}
        }
    });
    writeln!(child_stdin, "{set}").expect("write request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let response: Value = serde_json::from_str(&line).expect("parse response json");
    assert_eq!(
        response["result"]["content"][0]["text"],
        json!("Harga: 25.00%\nRating: 75.00%")
    );

    let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    writeln!(child_stdin, "{notification}").expect("write notification");

    write_framed(
        &mut child_stdin,
        &json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}),
    );
    let pong = read_framed(&mut reader);
    assert_eq!(pong["id"], json!(2));
    assert_eq!(pong["result"], json!({}));

    writeln!(child_stdin, "not json").expect("write garbage");
    line.clear();
    reader.read_line(&mut line).expect("read parse error");
    let parse_error: Value = serde_json::from_str(&line).expect("parse error json");
    assert_eq!(parse_error["error"]["code"], json!(-32700));

    child_stdin
        .write_all(b"Content-Length: 18446744073709551615\r\n\r\n")
        .expect("write oversized header");
    drop(child_stdin);
    let refused = read_framed(&mut reader);
    assert_eq!(refused["error"]["code"], json!(-32700));
    assert!(refused["error"]["message"]
        .as_str()
        .expect("refusal message")
        .contains("byte limit"));

    let status = child.wait().expect("wait child");
    assert!(status.success());
    let _ = std::fs::remove_file(weights_path);
}
