use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_allocd");
    let mut child = Command::new(exe)
        .env_remove("ALLOCD_CONFIG")
        .env_remove("ALLOCD_SCALE")
        .env_remove("ALLOCD_TOTAL_MARKS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn allocd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_value(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_value(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["result"]["scale"], 2);
    assert_eq!(health["result"]["defaultTotalMarks"].as_f64(), Some(100.0));

    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "allocation.validate",
        json!({ "items": [], "target": 0 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "questionPaper.check",
        json!({ "paper": { "sections": [] } }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "fees.checkSchedule",
        json!({ "lines": [], "target": 0 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "fees.monthsInPeriod",
        json!({ "start": "2026-01", "end": "2026-06" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "6",
        "payments.summarizeBulk",
        json!({ "students": [] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "payments.checkBulk",
        json!({ "students": [], "collected": 0 }),
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn unknown_method_and_bad_json_keep_the_loop_alive() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{\"id\":\"1\",\"method\":\"fees.delete\"}}").expect("write");
    stdin.flush().expect("flush");
    let v = read_value(&mut reader);
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"]["code"], "not_implemented");

    writeln!(stdin, "this is not json").expect("write");
    stdin.flush().expect("flush");
    let v = read_value(&mut reader);
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"]["code"], "bad_json");

    // Blank lines are skipped without a reply.
    writeln!(stdin).expect("write");
    let v = request(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(v["ok"], true);

    drop(stdin);
    let _ = child.wait();
}
