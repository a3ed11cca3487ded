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

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn bulk_summary_adds_late_fees() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "payments.summarizeBulk",
        json!({
            "students": [
                { "studentId": "STD-001", "pendingAmount": 1200, "overdueAmount": 100 },
                { "studentId": "STD-002", "totalDue": "800.50" },
                { "studentId": "STD-003" }
            ]
        }),
    );
    assert_eq!(r["studentsCount"], 3);
    assert_eq!(r["totalAmount"].as_f64(), Some(2000.5));
    assert_eq!(r["lateFees"].as_f64(), Some(100.0));
    assert_eq!(r["grandTotal"].as_f64(), Some(2100.5));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn bulk_check_flags_mismatch_and_duplicates() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let students = json!([
        { "studentId": "STD-001", "pendingAmount": 500 },
        { "studentId": "STD-002", "pendingAmount": 500, "overdueAmount": 50 }
    ]);
    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "payments.checkBulk",
        json!({ "students": students, "collected": 1050 }),
    );
    assert_eq!(r["ok"], true, "{}", r);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "payments.checkBulk",
        json!({ "students": students, "collected": 1000 }),
    );
    assert_eq!(r["ok"], false);
    assert_eq!(r["issues"][0]["code"], "collected_mismatch");

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "payments.checkBulk",
        json!({
            "students": [
                { "studentId": "STD-001", "pendingAmount": 500 },
                { "studentId": "STD-001", "pendingAmount": 500 }
            ],
            "collected": 1000
        }),
    );
    assert_eq!(r["issues"][0]["code"], "duplicate_student");
    assert_eq!(r["issues"][0]["label"], "STD-001");

    let r = request(
        &mut stdin,
        &mut reader,
        "4",
        "payments.checkBulk",
        json!({
            "students": [{ "studentId": "STD-009", "pendingAmount": -20 }],
            "collected": 0
        }),
    );
    assert_eq!(r["error"]["code"], "invalid_item");
    assert_eq!(r["error"]["details"]["label"], "STD-009");

    drop(stdin);
    let _ = child.wait();
}
