use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradecalcd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradecalcd");
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

fn assert_close(actual: &serde_json::Value, expected: f64) {
    let a = actual
        .as_f64()
        .unwrap_or_else(|| panic!("expected number, got {}", actual));
    assert!((a - expected).abs() < 1e-9, "expected {}, got {}", expected, a);
}

fn grade(
    student: &str,
    subject: &str,
    value: f64,
    max: f64,
    coefficient: f64,
    trimester: &str,
    date: &str,
) -> serde_json::Value {
    json!({
        "studentId": student,
        "subjectId": subject,
        "value": value,
        "maxValue": max,
        "coefficient": coefficient,
        "evaluationType": "devoir",
        "trimester": trimester,
        "academicYear": "2024-2025",
        "evaluationDate": date,
    })
}

fn year_grades() -> serde_json::Value {
    json!([
        grade("s1", "math", 10.0, 20.0, 1.0, "T1", "2024-10-01"),
        grade("s1", "math", 40.0, 50.0, 2.0, "T1", "2024-11-20"),
        grade("s1", "french", 11.0, 20.0, 1.0, "T1", "2024-10-08"),
        grade("s1", "math", 15.0, 20.0, 1.0, "T2", "2025-01-15"),
        grade("s1", "french", 17.0, 20.0, 1.0, "T2", "2025-02-03"),
        grade("s2", "math", 12.0, 20.0, 1.0, "T1", "2024-10-01")
    ])
}

fn weights() -> serde_json::Value {
    json!([
        { "subjectId": "math", "coefficient": 4 },
        { "subjectId": "french", "coefficient": 2 }
    ])
}

#[test]
fn normalize_rescales_and_rejects_bad_maximum() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.normalize",
        json!({ "value": 45, "maxValue": 60 }),
    );
    assert_close(&res["normalized"], 15.0);

    // Extra credit is not clamped.
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.normalize",
        json!({ "value": 22, "maxValue": 20 }),
    );
    assert_close(&res["normalized"], 22.0);

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.normalize",
        json!({ "value": 5, "maxValue": 0 }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("invalid_input"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn subject_summary_weights_grade_coefficients() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.subjectSummary",
        json!({
            "subjectId": "math",
            "grades": year_grades(),
            "period": { "trimester": "T1", "academicYear": "2024-2025" },
        }),
    );
    // s1: 10 (x1) and 16 (x2); s2: 12 (x1).
    assert_eq!(summary["gradeCount"], json!(3));
    assert_close(&summary["average"], (10.0 + 32.0 + 12.0) / 4.0);
    assert_close(&summary["minGrade"], 10.0);
    assert_close(&summary["maxGrade"], 16.0);
    assert_eq!(summary["grades"][0]["evaluationDate"], json!("2024-11-20"));

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.subjectSummary",
        json!({ "subjectId": "history", "grades": year_grades() }),
    );
    assert_eq!(empty["gradeCount"], json!(0));
    assert_close(&empty["average"], 0.0);

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.subjectSummary",
        json!({
            "subjectId": "math",
            "grades": [grade("s1", "math", 10.0, 20.0, -1.0, "T1", "2024-10-01")],
        }),
    );
    assert_eq!(resp["error"]["code"], json!("invalid_input"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn general_average_uses_subject_weights() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.generalAverage",
        json!({
            "studentId": "s1",
            "grades": year_grades(),
            "weights": weights(),
            "period": { "trimester": "T1", "academicYear": "2024-2025" },
        }),
    );
    // math (10 + 2 * 16) / 3 = 14, french 11.
    assert_close(&res["generalAverage"], (14.0 * 4.0 + 11.0 * 2.0) / 6.0);
    assert_close(&res["totalCoefficients"], 6.0);
    assert_eq!(res["contributingSubjects"], json!(["math", "french"]));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.generalAverage",
        json!({ "studentId": "s9", "grades": year_grades(), "weights": weights() }),
    );
    assert_close(&res["generalAverage"], 0.0);
    assert_close(&res["totalCoefficients"], 0.0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn trend_compares_earlier_and_later_halves() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let rising = json!([
        grade("s1", "math", 8.0, 20.0, 1.0, "T1", "2024-09-10"),
        grade("s1", "math", 14.0, 20.0, 1.0, "T1", "2024-11-10"),
        grade("s1", "math", 9.0, 20.0, 1.0, "T1", "2024-09-20"),
        grade("s1", "math", 15.0, 20.0, 1.0, "T1", "2024-11-20")
    ]);
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.trend",
        json!({ "grades": rising }),
    );
    assert_eq!(res["trend"], json!("up"));
    assert_eq!(res["gradeCount"], json!(4));

    let single = json!([grade("s1", "math", 8.0, 20.0, 1.0, "T1", "2024-09-10")]);
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.trend",
        json!({ "grades": single }),
    );
    assert_eq!(res["trend"], json!("none"));

    let flat = json!([
        grade("s1", "math", 12.0, 20.0, 1.0, "T1", "2024-09-10"),
        grade("s1", "math", 12.5, 20.0, 1.0, "T1", "2024-10-10")
    ]);
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.trend",
        json!({ "grades": flat }),
    );
    assert_eq!(res["trend"], json!("stable"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn progression_between_trimesters() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "analytics.student.progression",
        json!({
            "studentId": "s1",
            "academicYear": "2024-2025",
            "fromTrimester": "T1",
            "toTrimester": "T2",
            "grades": year_grades(),
            "weights": weights(),
        }),
    );
    let p = &res["progression"];
    let t1 = (14.0 * 4.0 + 11.0 * 2.0) / 6.0;
    let t2 = (15.0 * 4.0 + 17.0 * 2.0) / 6.0;
    assert_close(&p["previousAverage"], t1);
    assert_close(&p["currentAverage"], t2);
    assert_close(&p["delta"], t2 - t1);
    assert_eq!(p["trend"], json!("up"));

    // s2 has nothing in T2.
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "analytics.student.progression",
        json!({
            "studentId": "s2",
            "academicYear": "2024-2025",
            "fromTrimester": "T1",
            "toTrimester": "T2",
            "grades": year_grades(),
            "weights": weights(),
        }),
    );
    assert_eq!(res["progression"]["trend"], json!("none"));
    assert_eq!(res["progression"]["currentAverage"], json!(null));
    assert_eq!(res["progression"]["delta"], json!(null));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn student_performance_is_unranked_and_period_scoped() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let perf = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "analytics.student.performance",
        json!({
            "studentId": "s1",
            "grades": year_grades(),
            "weights": weights(),
            "period": { "trimester": "T2", "academicYear": "2024-2025" },
        }),
    );
    assert_eq!(perf["rank"], json!(null));
    assert_close(&perf["generalAverage"], (15.0 * 4.0 + 17.0 * 2.0) / 6.0);
    assert_eq!(perf["appreciation"], json!("Bien"));
    assert_eq!(perf["progressionTrend"], json!("up"));
    let ids: Vec<&str> = perf["subjects"]
        .as_array()
        .expect("subjects")
        .iter()
        .map(|s| s["subjectId"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec!["math", "french"]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn averages_require_subject_weights() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let period = json!({ "trimester": "T1", "academicYear": "2024-2025" });

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "grades.generalAverage",
        json!({ "studentId": "s1", "grades": year_grades() }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("bad_params"));

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "analytics.class.alerts",
        json!({ "grades": year_grades(), "weights": [], "period": period }),
    );
    assert_eq!(resp["error"]["code"], json!("bad_params"));
    assert_eq!(resp["error"]["message"], json!("weights must not be empty"));

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "reports.classReportCards",
        json!({ "grades": year_grades(), "period": period }),
    );
    assert_eq!(resp["error"]["code"], json!("bad_params"));

    // Weighting the same subject twice is rejected, graded or not.
    let resp = request(
        &mut stdin,
        &mut reader,
        "4",
        "grades.generalAverage",
        json!({
            "studentId": "s1",
            "grades": year_grades(),
            "weights": [
                { "subjectId": "math", "coefficient": 4 },
                { "subjectId": "art", "coefficient": 1 },
                { "subjectId": "art", "coefficient": 2 }
            ],
        }),
    );
    assert_eq!(resp["error"]["code"], json!("invalid_input"));
    assert_eq!(resp["error"]["details"]["subjectId"], json!("art"));

    drop(stdin);
    let _ = child.wait();
}
