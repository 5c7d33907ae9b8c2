//! Weekly payroll aggregation.
//!
//! Everything here is pure: callers load [`SessionRecord`]s from the ledger
//! and pass them in together with the [`ReportSettings`] taken from config.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::database::models::{SessionRecord, WorkSession};

const TIME_FORMAT: &str = "%I:%M %p";
const TIMESTAMP_FORMAT: &str = "%I:%M %p on %m/%d/%Y";
const OPEN_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    pub timezone: Tz,
    pub week_start: Weekday,
    pub flat_tax: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekNav {
    Prev,
    Next,
}

impl std::str::FromStr for WeekNav {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prev" => Ok(WeekNav::Prev),
            "next" => Ok(WeekNav::Next),
            _ => Err(format!("Invalid week navigation: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub hours: f64,
    pub gross: f64,
    pub tax: f64,
    pub net: f64,
}

impl Totals {
    fn add(&mut self, hours: f64, gross: f64) {
        self.hours += hours;
        self.gross += gross;
    }

    /// Rounds the running sums and charges the flat tax once. Tax and net
    /// are taken from the unrounded gross.
    fn finalize(&mut self, flat_tax: f64) {
        let gross = self.gross;
        self.hours = round2(self.hours);
        self.gross = round2(gross);
        self.tax = if gross > 0.0 { flat_tax } else { 0.0 };
        self.net = round2((gross - self.tax).max(0.0));
    }

    fn absorb(&mut self, other: &Totals) {
        self.hours = round2(self.hours + other.hours);
        self.gross = round2(self.gross + other.gross);
        self.tax = round2(self.tax + other.tax);
        self.net = round2(self.net + other.net);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub time: String,
    pub hours: f64,
    pub gross: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntries {
    pub day: String,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeWeek {
    pub days: Vec<DayEntries>,
    pub total: Totals,
}

impl EmployeeWeek {
    fn empty(week_start: NaiveDate) -> Self {
        let days = week_start
            .iter_days()
            .take(7)
            .map(|date| DayEntries {
                day: weekday_name(date.weekday()).to_string(),
                entries: Vec::new(),
            })
            .collect();

        Self {
            days,
            total: Totals::default(),
        }
    }

    pub fn day(&self, name: &str) -> Option<&DayEntries> {
        self.days.iter().find(|d| d.day == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub employees: BTreeMap<String, EmployeeWeek>,
    pub grand_total: Totals,
}

/// One spreadsheet row: an employee's totals for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRow {
    pub username: String,
    pub week_start: NaiveDate,
    pub hours_worked: f64,
    pub net_pay: f64,
}

/// A session formatted for the employee dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub day: String,
    pub clock_in: String,
    pub clock_out: String,
    pub hours: f64,
    pub wage: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The instant of local midnight at the start of `date`. Zones that skip
/// midnight for DST fall back to reading the naive time as UTC.
pub fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// The anchored week start (a local date) containing `date`, or `None` when
/// it falls before the first representable date.
pub fn week_start_date(date: NaiveDate, anchor: Weekday) -> Option<NaiveDate> {
    let back = (7 + date.weekday().num_days_from_monday() - anchor.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(back as u64))
}

/// The anchored week start containing the local date of `instant`.
pub fn week_start_for(instant: DateTime<Utc>, settings: &ReportSettings) -> Option<NaiveDate> {
    let local = instant.with_timezone(&settings.timezone).date_naive();
    week_start_date(local, settings.week_start)
}

pub fn shift_week(week_start: NaiveDate, direction: WeekNav) -> Option<NaiveDate> {
    match direction {
        WeekNav::Prev => week_start.checked_sub_days(Days::new(7)),
        WeekNav::Next => week_start.checked_add_days(Days::new(7)),
    }
}

/// Half-open `[start, end)` instants covering the seven local days from
/// `week_start`.
pub fn week_window(tz: Tz, week_start: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let next = week_start.checked_add_days(Days::new(7))?;
    Some((local_midnight(tz, week_start), local_midnight(tz, next)))
}

fn entry_amounts(record: &SessionRecord) -> (f64, f64) {
    if record.clock_out.is_none() {
        return (0.0, 0.0);
    }
    (
        round2(record.hours.unwrap_or(0.0)),
        round2(record.wage.unwrap_or(0.0)),
    )
}

fn format_range(clock_in: DateTime<Tz>, clock_out: Option<DateTime<Utc>>, tz: Tz) -> String {
    let end = clock_out
        .map(|out| out.with_timezone(&tz).format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| OPEN_PLACEHOLDER.to_string());
    format!("{} - {}", clock_in.format(TIME_FORMAT), end)
}

/// Builds the per-employee, per-day table for the week starting at
/// `week_start` (a local date in the configured timezone). Every name in
/// `roster` gets a row even without sessions. `None` when the week runs past
/// the last representable date.
pub fn build_weekly_report(
    records: &[SessionRecord],
    week_start: NaiveDate,
    settings: &ReportSettings,
    roster: &[String],
) -> Option<WeeklyReport> {
    let tz = settings.timezone;
    let (window_start, window_end) = week_window(tz, week_start)?;
    let week_end = week_start.checked_add_days(Days::new(6))?;

    let mut employees: BTreeMap<String, EmployeeWeek> = roster
        .iter()
        .map(|name| (name.clone(), EmployeeWeek::empty(week_start)))
        .collect();

    let mut in_window: Vec<(&SessionRecord, DateTime<Utc>)> = records
        .iter()
        .filter_map(|r| r.clock_in.map(|clock_in| (r, clock_in)))
        .filter(|(_, clock_in)| *clock_in >= window_start && *clock_in < window_end)
        .collect();
    in_window.sort_by_key(|(_, clock_in)| *clock_in);

    for (record, clock_in) in in_window {
        let local_in = clock_in.with_timezone(&tz);
        let offset = (local_in.date_naive() - week_start).num_days().clamp(0, 6) as usize;
        let (hours, gross) = entry_amounts(record);

        let week = employees
            .entry(record.username.clone())
            .or_insert_with(|| EmployeeWeek::empty(week_start));

        week.days[offset].entries.push(ReportEntry {
            time: format_range(local_in, record.clock_out, tz),
            hours,
            gross,
        });
        week.total.add(hours, gross);
    }

    let mut grand_total = Totals::default();
    for week in employees.values_mut() {
        week.total.finalize(settings.flat_tax);
        grand_total.absorb(&week.total);
    }

    Some(WeeklyReport {
        week_start,
        week_end,
        employees,
        grand_total,
    })
}

/// Groups every session by (employee, anchored week) for the payroll export.
/// Totals are accumulated exactly as [`build_weekly_report`] does.
pub fn weekly_payroll_rows(records: &[SessionRecord], settings: &ReportSettings) -> Vec<PayrollRow> {
    let mut weeks: BTreeMap<(String, NaiveDate), Totals> = BTreeMap::new();

    for record in records {
        let Some(week_start) = record.clock_in.and_then(|c| week_start_for(c, settings)) else {
            continue;
        };
        let (hours, gross) = entry_amounts(record);
        weeks
            .entry((record.username.clone(), week_start))
            .or_default()
            .add(hours, gross);
    }

    weeks
        .into_iter()
        .map(|((username, week_start), mut totals)| {
            totals.finalize(settings.flat_tax);
            PayrollRow {
                username,
                week_start,
                hours_worked: totals.hours,
                net_pay: totals.net,
            }
        })
        .collect()
}

pub fn session_view(session: &WorkSession, tz: Tz) -> SessionView {
    let local_in = session.clock_in.with_timezone(&tz);
    let clock_out = session
        .clock_out
        .map(|out| out.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| OPEN_PLACEHOLDER.to_string());

    SessionView {
        day: weekday_name(local_in.weekday()).to_string(),
        clock_in: local_in.format(TIMESTAMP_FORMAT).to_string(),
        clock_out,
        hours: round2(session.hours.unwrap_or(0.0)),
        wage: round2(session.wage.unwrap_or(0.0)),
    }
}
