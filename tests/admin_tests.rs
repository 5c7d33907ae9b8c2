use actix_web::{dev::ServiceResponse, http::StatusCode, http::header, test};
use payroll_clock::handlers::admin::AdminDashboard;
use payroll_clock::handlers::shared::ApiResponse;
use payroll_clock::services::export::XLSX_CONTENT_TYPE;
use payroll_clock::services::report;
use pretty_assertions::assert_eq;

mod common;

use common::{ADMIN, ALEX, CellValue, KEVIN, central};

fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn seed_week(ctx: &common::TestContext) {
    // Week of Monday 2025-09-08: Kevin 8.5 h + 5 h at 18/h, Alex 4 h at 22/h
    ctx.insert_session(
        KEVIN.0,
        central(2025, 9, 8, 9, 0),
        Some(central(2025, 9, 8, 17, 30)),
    )
    .await;
    ctx.insert_session(
        KEVIN.0,
        central(2025, 9, 10, 8, 0),
        Some(central(2025, 9, 10, 13, 0)),
    )
    .await;
    ctx.insert_session(
        ALEX.0,
        central(2025, 9, 12, 10, 0),
        Some(central(2025, 9, 12, 14, 0)),
    )
    .await;
}

#[actix_rt::test]
async fn test_admin_report_groups_sessions_by_day() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    seed_week(&ctx).await;
    let app = test_app!(ctx);

    let cookie = ctx.session_cookie(ADMIN).await;
    let req = test::TestRequest::get()
        .uri("/admin?week=2025-09-08")
        .cookie(cookie)
        .to_request();
    let body: ApiResponse<AdminDashboard> = test::call_and_read_body_json(&app, req).await;
    let dashboard = body.data.unwrap();
    let report = dashboard.report;

    assert_eq!(report.week_start.to_string(), "2025-09-08");
    assert_eq!(report.week_end.to_string(), "2025-09-14");

    let kevin = &report.employees[KEVIN.0];
    assert_eq!(kevin.days.len(), 7);
    assert_eq!(kevin.days[0].day, "Monday");
    assert_eq!(kevin.day("Monday").unwrap().entries[0].time, "09:00 AM - 05:30 PM");
    assert_eq!(kevin.day("Wednesday").unwrap().entries[0].gross, 90.0);
    assert_eq!(kevin.total.hours, 13.5);
    assert_eq!(kevin.total.gross, 243.0);
    assert_eq!(kevin.total.net, 223.0);

    let alex = &report.employees[ALEX.0];
    assert_eq!(alex.total.gross, 88.0);
    assert_eq!(alex.total.net, 68.0);

    assert_eq!(report.grand_total.hours, 17.5);
    assert_eq!(report.grand_total.gross, 331.0);
    assert_eq!(report.grand_total.tax, 40.0);
    assert_eq!(report.grand_total.net, 291.0);
    assert!(dashboard.documents.is_empty());
}

#[actix_rt::test]
async fn test_rostered_employees_without_sessions_still_listed() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    let app = test_app!(ctx);

    let cookie = ctx.session_cookie(ADMIN).await;
    let req = test::TestRequest::get()
        .uri("/admin?week=2025-09-08")
        .cookie(cookie)
        .to_request();
    let body: ApiResponse<AdminDashboard> = test::call_and_read_body_json(&app, req).await;
    let report = body.data.unwrap().report;

    let names: Vec<&str> = report.employees.keys().map(String::as_str).collect();
    assert_eq!(names, vec![ALEX.0, KEVIN.0]);
    assert_eq!(report.employees[KEVIN.0].total.tax, 0.0);
    assert_eq!(report.grand_total.net, 0.0);
}

#[actix_rt::test]
async fn test_admin_rejects_weeks_beyond_the_calendar() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    let app = test_app!(ctx);
    let cookie = ctx.session_cookie(ADMIN).await;

    let req = test::TestRequest::get()
        .uri("/admin?week=%2B262142-12-31")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/admin")
        .cookie(cookie)
        .set_form([("week_nav", "prev"), ("week", "-262143-01-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_admin_week_navigation_redirects() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    let app = test_app!(ctx);
    let cookie = ctx.session_cookie(ADMIN).await;

    let req = test::TestRequest::post()
        .uri("/admin")
        .cookie(cookie.clone())
        .set_form([("week_nav", "next"), ("week", "2025-09-08")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin?week=2025-09-15");

    let req = test::TestRequest::post()
        .uri("/admin")
        .cookie(cookie.clone())
        .set_form([("week_nav", "prev"), ("week", "2025-09-10")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/admin?week=2025-09-01");

    let req = test::TestRequest::post()
        .uri("/admin")
        .cookie(cookie)
        .set_form([("week", "2025-09-10")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_reset_with_wrong_pin_keeps_sessions() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    seed_week(&ctx).await;
    let app = test_app!(ctx);
    let cookie = ctx.session_cookie(ADMIN).await;

    for form in [vec![("pin", "0000")], vec![]] {
        let req = test::TestRequest::post()
            .uri("/reset")
            .cookie(cookie.clone())
            .set_form(form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: ApiResponse<()> = test::read_body_json(resp).await;
        assert_eq!(body.message.as_deref(), Some("Invalid PIN. Reset denied."));
    }

    common::assert_record_count(&ctx.pool, "work_sessions", 3).await;
}

#[actix_rt::test]
async fn test_reset_with_correct_pin_clears_ledger_only() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    seed_week(&ctx).await;
    let app = test_app!(ctx);
    let cookie = ctx.session_cookie(ADMIN).await;

    let req = test::TestRequest::post()
        .uri("/reset")
        .cookie(cookie.clone())
        .set_form([("pin", "2003")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");
    common::assert_record_count(&ctx.pool, "work_sessions", 0).await;
    common::assert_record_count(&ctx.pool, "users", 3).await;

    // Accounts survive, so the employee can still log in and clock in
    let kevin = ctx.user_id(KEVIN.0).await;
    ctx.state
        .clock_service
        .clock_in(kevin, chrono::Utc::now())
        .await
        .unwrap();
}

#[actix_rt::test]
async fn test_export_returns_workbook_attachment() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    seed_week(&ctx).await;
    let app = test_app!(ctx);
    let cookie = ctx.session_cookie(ADMIN).await;

    let req = test::TestRequest::get()
        .uri("/export")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some(XLSX_CONTENT_TYPE)
    );
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("payroll.xlsx"));

    let body = test::read_body(resp).await;
    assert_eq!(&body[..2], b"PK");
}

#[actix_rt::test]
async fn test_export_workbook_contains_weekly_payroll() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    seed_week(&ctx).await;
    let app = test_app!(ctx);
    let cookie = ctx.session_cookie(ADMIN).await;

    let req = test::TestRequest::get()
        .uri("/export")
        .cookie(cookie)
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    let workbook = common::read_xlsx_entry(&body, "xl/workbook.xml");
    assert!(workbook.contains(r#"<sheet name="Payroll""#));

    let sheet = common::read_worksheet(&body);
    let values: Vec<Vec<CellValue>> = sheet
        .iter()
        .map(|row| row.iter().map(|cell| cell.value.clone()).collect())
        .collect();
    let text = |s: &str| CellValue::Text(s.to_string());
    assert_eq!(
        values,
        vec![
            vec![
                text("Username"),
                text("Week Start"),
                text("Hours Worked"),
                text("Net Pay"),
            ],
            vec![
                text("Alex"),
                text("2025-09-08"),
                CellValue::Number(4.0),
                CellValue::Number(68.0),
            ],
            vec![
                text("Kevin"),
                text("2025-09-08"),
                CellValue::Number(13.5),
                CellValue::Number(223.0),
            ],
        ]
    );

    // Header is formatted, and hours and pay carry the number format
    assert!(sheet[0].iter().all(|cell| cell.styled));
    for row in &sheet[1..] {
        assert!(row[2].styled && row[3].styled);
    }
}

#[actix_rt::test]
async fn test_export_rows_match_weekly_report() {
    common::setup_test_env();
    let ctx = common::TestContext::new().await.unwrap();
    seed_week(&ctx).await;
    // A session in the following week lands in its own row
    ctx.insert_session(
        KEVIN.0,
        central(2025, 9, 15, 9, 0),
        Some(central(2025, 9, 15, 11, 0)),
    )
    .await;
    // Open sessions contribute nothing
    ctx.insert_session(ALEX.0, central(2025, 9, 16, 9, 0), None).await;

    let settings = ctx.config.report_settings();
    let records = ctx
        .state
        .work_session_repository
        .list_records(None)
        .await
        .unwrap();
    let rows = report::weekly_payroll_rows(&records, &settings);

    let summary: Vec<(String, String, f64, f64)> = rows
        .iter()
        .map(|r| {
            (
                r.username.clone(),
                r.week_start.to_string(),
                r.hours_worked,
                r.net_pay,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Alex".to_string(), "2025-09-08".to_string(), 4.0, 68.0),
            ("Alex".to_string(), "2025-09-15".to_string(), 0.0, 0.0),
            ("Kevin".to_string(), "2025-09-08".to_string(), 13.5, 223.0),
            ("Kevin".to_string(), "2025-09-15".to_string(), 2.0, 16.0),
        ]
    );

    let week = rows[0].week_start;
    let weekly =
        report::build_weekly_report(&records, week, &settings, &ctx.config.employee_names())
            .unwrap();
    for row in rows.iter().filter(|r| r.week_start == week) {
        let totals = weekly.employees[&row.username].total;
        assert_eq!(totals.hours, row.hours_worked);
        assert_eq!(totals.net, row.net_pay);
    }
}
