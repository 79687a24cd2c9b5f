use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::{ApiClient, ApiError, ClientOptions, ExportKind, Payload, PostBody};
use crate::output::OutputFormat;
use crate::session::{Options, Session};
use crate::shell::{Shell, View};
use crate::toast::Severity;
use crate::views::{
    AttendanceFilter, AttendanceState, FormError, HealthLine, RegisterOutcome, SortKey,
};

fn session_for(server: &MockServer) -> Session {
    Session::new(Options {
        server: server.uri(),
        timeout_seconds: 5,
        spinners: false,
        ..Options::default()
    })
    .unwrap()
}

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ClientOptions {
        base_url: server.uri(),
        ..ClientOptions::default()
    })
    .unwrap()
}

fn users_json(count: usize) -> serde_json::Value {
    let users: Vec<_> = (1..=count)
        .map(|i| {
            json!({
                "user_id": i,
                "name": format!("User {i:02}"),
                "email": format!("user{i}@example.com"),
                "proxy": format!("P{i}"),
                "salary": 1000 + i
            })
        })
        .collect();
    json!(users)
}

fn image_file() -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(b"\xff\xd8\xff fake jpeg").unwrap();
    file
}

#[tokio::test]
async fn get_negotiates_json_and_text_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.get("/json").await.unwrap(),
        Payload::Json(json!({"ok": true}))
    );
    assert_eq!(
        client.get("text").await.unwrap(),
        Payload::Text("plain words".to_string())
    );
}

#[tokio::test]
async fn get_error_carries_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = client_for(&server).get("/missing").await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "404 Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn post_error_prefers_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/with-body"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.post("/with-body", PostBody::Empty).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("database is locked"));

    let err = client.post("/empty", PostBody::Empty).await.unwrap_err();
    assert!(err.to_string().contains("500 Internal Server Error"));
}

#[tokio::test]
async fn health_line_reports_timestamp_or_unknown() {
    let server = MockServer::start().await;
    let mut session = session_for(&server);
    assert_eq!(
        session.dashboard.check_health(&session.client).await,
        &HealthLine::Unknown
    );
    assert_eq!(session.dashboard.status_line(), "Server status: unknown");

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "timestamp": "2026-10-19T08:00:00"})),
        )
        .mount(&server)
        .await;
    session.dashboard.check_health(&session.client).await;
    assert_eq!(
        session.dashboard.status_line(),
        "Server OK · 2026-10-19T08:00:00"
    );
}

#[tokio::test]
async fn attendance_sends_only_active_filter_inputs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attendance"))
        .and(query_param("filter_type", "range"))
        .and(query_param("start_date", "2026-10-01"))
        .and(query_param("end_date", "2026-10-19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Ada", "timestamp": "2026-10-02T09:15:00"},
            {"name": "Grace", "timestamp": "2026-10-03T09:01:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let mut filter = AttendanceFilter::range("2026-10-01", "2026-10-19");
    filter.date = "2026-01-01".to_string();
    session.attendance.set_filter(filter);
    session
        .attendance
        .apply(&session.client, &mut session.ui)
        .await;

    assert_eq!(session.attendance.records().len(), 2);
    let text = session.attendance.render(OutputFormat::Text);
    assert!(text.contains("Grace"));
}

#[tokio::test]
async fn attendance_empty_array_shows_no_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attendance"))
        .and(query_param("filter_type", "single"))
        .and(query_param("date", "2026-10-19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session
        .attendance
        .set_filter(AttendanceFilter::single("2026-10-19"));
    let state = session
        .attendance
        .apply(&session.client, &mut session.ui)
        .await;
    assert_eq!(state, &AttendanceState::NoRecords);
    assert!(!session.ui.has_toast(Severity::Error, ""));
    assert!(session
        .attendance
        .render(OutputFormat::Text)
        .contains("No records"));
}

#[tokio::test]
async fn attendance_non_array_body_shows_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attendance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session
        .attendance
        .apply(&session.client, &mut session.ui)
        .await;
    assert_eq!(session.attendance.state(), &AttendanceState::NoData);
}

#[tokio::test]
async fn attendance_failure_sets_error_and_toast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/attendance"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session
        .attendance
        .apply(&session.client, &mut session.ui)
        .await;
    assert!(matches!(
        session.attendance.state(),
        AttendanceState::Error(_)
    ));
    assert!(session
        .ui
        .has_toast(Severity::Error, "Failed to load attendance"));
    assert!(session
        .attendance
        .render(OutputFormat::Text)
        .contains("Failed to load"));
}

#[tokio::test]
async fn users_are_paged_searched_and_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_json(13)))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    assert!(session.users.load(&session.client, &mut session.ui).await);
    assert_eq!(session.users.pager(), "Page 1 / 2");
    assert_eq!(session.users.current_page().len(), 12);

    assert!(session.users.next_page());
    assert_eq!(session.users.current_page().len(), 1);

    session.users.set_search("USER1@");
    assert_eq!(session.users.filtered_len(), 1);
    assert_eq!(session.users.pager(), "Page 1 / 1");

    session.users.set_search("");
    session.users.sort_by(SortKey::Salary);
    session.users.sort_by(SortKey::Salary);
    assert_eq!(session.users.filtered()[0].name, "User 13");
}

#[tokio::test]
async fn users_failure_keeps_list_and_raises_toast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    assert!(!session.users.load(&session.client, &mut session.ui).await);
    assert!(!session.users.is_loaded());
    assert!(session.ui.has_toast(Severity::Error, "Failed to load users"));
}

#[tokio::test]
async fn register_without_image_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.register.form.name = "Ada".to_string();
    let outcome = session
        .register
        .submit(&session.client, &mut session.ui)
        .await;
    assert!(matches!(
        outcome,
        RegisterOutcome::Invalid(FormError::MissingImage)
    ));
    assert!(session.ui.has_toast(Severity::Warning, "Upload a face image"));
    assert_eq!(session.register.form.name, "Ada");
}

#[tokio::test]
async fn register_success_clears_the_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "user_id": 14})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let file = image_file();
    let mut session = session_for(&server);
    session.register.form.name = "Ada Lovelace".to_string();
    session.register.form.email = "ada@example.com".to_string();
    session.register.form.select_image(file.path()).unwrap();

    let outcome = session
        .register
        .submit(&session.client, &mut session.ui)
        .await;
    match outcome {
        RegisterOutcome::Registered { user_id } => assert_eq!(user_id.as_deref(), Some("14")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(session.register.form.name.is_empty());
    assert!(session.register.form.image().is_none());
    assert!(session.ui.has_toast(Severity::Success, "Registered Ada Lovelace"));
}

#[tokio::test]
async fn register_rejection_surfaces_server_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("No face found in image"))
        .mount(&server)
        .await;

    let file = image_file();
    let mut session = session_for(&server);
    session.register.form.name = "Ada".to_string();
    session.register.form.select_image(file.path()).unwrap();

    let outcome = session
        .register
        .submit(&session.client, &mut session.ui)
        .await;
    match outcome {
        RegisterOutcome::Rejected(message) => assert_eq!(message, "No face found in image"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.register.form.name, "Ada");
    assert!(session
        .ui
        .has_toast(Severity::Error, "No face found in image"));
}

#[tokio::test]
async fn mark_falls_back_to_get_on_405() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mark_attendance"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mark_attendance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": [
                {"user_id": 1, "name": "Ada", "result": "marked"},
                {"user_id": 2, "name": "Grace", "result": "already"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let report = session
        .dashboard
        .mark_attendance(&session.client, &mut session.ui)
        .await
        .clone();
    assert_eq!(report.method, reqwest::Method::GET);
    assert!(report.ok);
    assert!(session.ui.has_toast(
        Severity::Success,
        "Attendance marked: 1 new, 1 already present"
    ));
    assert!(session.dashboard.render().contains("GET /mark_attendance"));
}

#[tokio::test]
async fn mark_keeps_the_server_verdict_on_other_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mark_attendance"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"status": "error", "message": "No faces detected"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mark_attendance"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let report = session
        .dashboard
        .mark_attendance(&session.client, &mut session.ui)
        .await
        .clone();
    assert_eq!(report.method, reqwest::Method::POST);
    assert_eq!(report.http_status, Some(400));
    assert!(!report.ok);
    assert!(session.ui.has_toast(Severity::Error, "No faces detected"));
}

#[tokio::test]
async fn export_writes_the_downloaded_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_attendance"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04sheet".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("attendance.xlsx");
    let mut session = session_for(&server);
    let size = session
        .export(ExportKind::Attendance, &target)
        .await
        .unwrap();
    assert_eq!(size, 9);
    assert_eq!(std::fs::read(&target).unwrap(), b"PK\x03\x04sheet");
}

#[tokio::test]
async fn export_failure_is_reported() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("employees.xlsx");
    let mut session = session_for(&server);
    let err = session
        .export(ExportKind::Employees, &target)
        .await
        .unwrap_err();
    assert!(err.contains("/download_employees"));
    assert!(!target.exists());
}

#[tokio::test]
async fn shell_form_input_is_not_a_shortcut() {
    colored::control::set_override(false);
    let server = MockServer::start().await;
    let session = session_for(&server);
    // "q" typed as the name must land in the form instead of quitting.
    let script: &[u8] = b"r\nq\n\n\n\n\nq\n";
    let mut shell = Shell::new(session, script, Vec::new());
    shell.run().await.unwrap();
    assert_eq!(shell.active(), View::Register);

    let (session, out) = shell.into_parts();
    assert_eq!(session.register.form.name, "q");
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Server status: unknown"));
    assert!(out.contains("Name: "));
}

#[tokio::test]
async fn shell_navigates_and_pages_users() {
    colored::control::set_override(false);
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_json(13)))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let script: &[u8] = b"u\nn\nn\nbogus\n";
    let mut shell = Shell::new(session, script, Vec::new());
    shell.run().await.unwrap();
    assert_eq!(shell.active(), View::Users);
    assert_eq!(shell.session().users.page(), 2);

    let (_, out) = shell.into_parts();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Page 2 / 2"));
    assert!(out.contains("unknown command 'bogus'"));
}
