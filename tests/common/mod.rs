#![allow(dead_code)]

use actix_web::{cookie::Cookie, web};
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc, Weekday};
use chrono_tz::America::Chicago;
use sqlx::SqlitePool;
use std::env;
use std::io::{Cursor, Read};
use tempfile::TempDir;

use payroll_clock::config::{EmployeeConfig, Roster};
use payroll_clock::database::init_database;
use payroll_clock::services::{auth::SESSION_COOKIE, roster};
use payroll_clock::{AppState, Config};

pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const KEVIN: (&str, &str) = ("Kevin", "Kelos45");
pub const ALEX: (&str, &str) = ("Alex", "Merida23");

/// Builds an actix test service with every route and the request-id middleware.
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .wrap(payroll_clock::middleware::RequestIdMiddleware)
                .configure(payroll_clock::routes::configure),
        )
        .await
    };
}

pub fn default_roster() -> Roster {
    let mut roster = Roster::new();
    roster.insert(
        KEVIN.0.to_string(),
        EmployeeConfig {
            rate: 18.0,
            password: KEVIN.1.to_string(),
        },
    );
    roster.insert(
        ALEX.0.to_string(),
        EmployeeConfig {
            rate: 22.0,
            password: ALEX.1.to_string(),
        },
    );
    roster
}

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
        session_expiration_hours: 1,
        cors_origin: "http://localhost:3000".to_string(),
        timezone: Chicago,
        week_start: Weekday::Mon,
        flat_weekly_tax: 20.0,
        fallback_hourly_rate: 15.0,
        reset_pin: "2003".to_string(),
        admin_username: ADMIN.0.to_string(),
        admin_password: ADMIN.1.to_string(),
        roster: default_roster(),
        max_upload_bytes: 1024 * 1024,
        bcrypt_cost: 4,
    }
}

pub struct TestContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub state: web::Data<AppState>,
    _temp_dir: TempDir,
}

impl TestContext {
    /// Fresh database with the admin and default roster already seeded.
    pub async fn new() -> Result<Self> {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite://{}/test.db", temp_dir.path().display());

        let mut config = test_config(&database_url);
        customize(&mut config);

        let pool = init_database(&database_url).await?;
        let state = AppState::new(config.clone(), pool.clone());
        roster::seed_users(&state.user_repository, &config).await?;

        Ok(TestContext {
            pool,
            config,
            state: web::Data::new(state),
            _temp_dir: temp_dir,
        })
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        self.state
            .user_repository
            .find_by_username(username)
            .await
            .expect("Failed to look up user")
            .expect("User not seeded")
            .id
    }

    /// Session cookie for a seeded account, issued the same way `/login` does.
    pub async fn session_cookie(&self, (username, password): (&str, &str)) -> Cookie<'static> {
        let session = self
            .state
            .auth_service
            .login(username, password)
            .await
            .expect("Failed to log in test user");
        Cookie::new(SESSION_COOKIE, session.token)
    }

    pub async fn insert_session(
        &self,
        username: &str,
        clock_in: DateTime<Utc>,
        clock_out: Option<DateTime<Utc>>,
    ) {
        let user_id = self.user_id(username).await;
        let hours = clock_out.map(|out| (out - clock_in).num_seconds() as f64 / 3600.0);
        let wage = hours.map(|h| h * self.config.rate_for(username));

        sqlx::query(
            "INSERT INTO work_sessions (user_id, clock_in, clock_out, hours, wage) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(clock_in)
        .bind(clock_out)
        .bind(hours)
        .bind(wage)
        .execute(&self.pool)
        .await
        .expect("Failed to insert test session");
    }
}

/// Wall-clock time in America/Chicago, as UTC.
pub fn central(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Chicago
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("Unambiguous local time")
        .with_timezone(&Utc)
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    let query = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar::<_, i64>(&query)
        .fetch_one(pool)
        .await
        .expect("Failed to count records")
}

pub async fn assert_record_count(pool: &SqlitePool, table: &str, expected_count: i64) {
    let result = count_rows(pool, table).await;
    assert_eq!(
        result, expected_count,
        "Expected {} records in {} table, but found {}",
        expected_count, table, result
    );
}

pub const BOUNDARY: &str = "----payrollclockboundary";

/// Hand-built multipart/form-data body. A field with a filename is a file part.
pub fn multipart_body(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                name, filename
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetCell {
    pub value: CellValue,
    pub styled: bool,
}

/// Reads one part of an xlsx package as text.
pub fn read_xlsx_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

/// Decodes the first worksheet into rows of cells, resolving shared strings.
pub fn read_worksheet(bytes: &[u8]) -> Vec<Vec<SheetCell>> {
    let shared = read_xlsx_entry(bytes, "xl/sharedStrings.xml");
    let strings: Vec<String> = shared
        .split("<si>")
        .skip(1)
        .map(|si| unescape_xml(element_text(si, "t").unwrap()))
        .collect();

    let sheet = read_xlsx_entry(bytes, "xl/worksheets/sheet1.xml");
    let mut rows: Vec<Vec<SheetCell>> = Vec::new();
    // "<c" also prefixes <cols>/<col>; only cells continue with a space
    for cell in sheet.split("<c").skip(1).filter(|c| c.starts_with(' ')) {
        let reference = attribute(cell, "r").unwrap();
        let row: usize = reference
            .trim_start_matches(|ch: char| ch.is_ascii_alphabetic())
            .parse()
            .unwrap();
        let raw = element_text(cell, "v").unwrap();
        let value = match attribute(cell, "t") {
            Some("s") => CellValue::Text(strings[raw.parse::<usize>().unwrap()].clone()),
            Some(other) => panic!("unexpected cell type {} at {}", other, reference),
            None => CellValue::Number(raw.parse().unwrap()),
        };

        if rows.len() < row {
            rows.resize_with(row, Vec::new);
        }
        rows[row - 1].push(SheetCell {
            value,
            styled: attribute(cell, "s").is_some(),
        });
    }
    rows
}

fn attribute<'a>(fragment: &'a str, name: &str) -> Option<&'a str> {
    let head = &fragment[..fragment.find('>')?];
    let key = format!(" {}=\"", name);
    let start = head.find(&key)? + key.len();
    let end = start + head[start..].find('"')?;
    Some(&head[start..end])
}

fn element_text<'a>(fragment: &'a str, tag: &str) -> Option<&'a str> {
    let open = fragment.find(&format!("<{}", tag))?;
    let start = open + fragment[open..].find('>')? + 1;
    let end = start + fragment[start..].find(&format!("</{}>", tag))?;
    Some(&fragment[start..end])
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}
