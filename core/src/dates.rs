//! French date expressions.
//!
//! Query dates are captured as partial patterns (`YYYY-**-**`, `YYYY-MM-**`,
//! `YYYY-MM-DD`), expanded into calendar spans, and compared against the
//! `DD/MM/YYYY` values stored in the index.

use crate::error::{EngineError, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Date, Month};

const MONTHS: &[(&str, u8)] = &[
    ("janvier", 1),
    ("février", 2),
    ("fevrier", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("août", 8),
    ("aout", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("décembre", 12),
    ("decembre", 12),
];

pub fn month_number(name: &str) -> Option<u8> {
    MONTHS.iter().find(|(m, _)| *m == name).map(|(_, n)| *n)
}

fn months_alternation() -> String {
    MONTHS.iter().map(|(m, _)| *m).collect::<Vec<_>>().join("|")
}

const PREPOSITIONS: &str = "au mois de|au mois|en|de|du|dans";

lazy_static! {
    static ref DAY_MONTH_YEAR: Regex = Regex::new(r"^(\d{1,2})\s+(\p{L}+)\s+(\d{4})").expect("valid regex");
    static ref MONTH_YEAR: Regex = Regex::new(r"^(\p{L}+)\s+(\d{4})").expect("valid regex");
    static ref COMPACT_DAY: Regex = Regex::new(r"^(\d{2})(\d{2})(\d{4})").expect("valid regex");
    static ref YEAR: Regex = Regex::new(r"^(?:19|20)\d{2}").expect("valid regex");

    static ref EXCLUSION: Regex =
        Regex::new(r"\bpas\s+(?:(?:au mois de|au mois|en|de|du)\s+)?(\p{L}+)").expect("valid regex");

    static ref DATE_RULES: Vec<DateRule> = vec![
        DateRule {
            name: "between",
            pattern: Regex::new(r"\bentre\s+(.*?)\s+et\s+(.*)").expect("valid regex"),
            resolve: |c| range(parse_date_str(&c[1]), parse_date_str(&c[2])),
        },
        DateRule {
            name: "from",
            pattern: Regex::new(r"\b(?:à partir de|à partir|après|apres|d’après|d'apres|depuis)\s+([^.,;]*)")
                .expect("valid regex"),
            resolve: |c| range(parse_date_str(&c[1]), None),
        },
        DateRule {
            name: "before",
            pattern: Regex::new(r"\bavant\s+([^\s,.]+)").expect("valid regex"),
            resolve: |c| range(None, parse_date_str(&c[1])),
        },
        DateRule {
            name: "exact",
            pattern: Regex::new(&format!(r"\b(?:{PREPOSITIONS})\s+([^\s,.]+)")).expect("valid regex"),
            resolve: |c| parse_date_str(&c[1]).map(DateBound::Exact),
        },
    ];

    static ref CLEANUP: Vec<Regex> = {
        let months = months_alternation();
        [
            format!(r"\bpas\s+(?:(?:au mois de|au mois|en|de|du)\s+)?(?:{months})\b"),
            format!(r"\b\d{{1,2}}\s+(?:{months})\s+\d{{4}}\b"),
            format!(r"\b(?:{months})\s+\d{{4}}\b"),
            format!(r"\b(?:{PREPOSITIONS})\s+(?:{months})\b"),
            r"\b(?:19|20)\d{2}\b".to_string(),
            r"\b\d{8}\b".to_string(),
            r"\b(?:entre|et|avant|après|apres|d’après|d'apres|année|depuis|pas au mois de|au mois|mois|à partir)\b"
                .to_string(),
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    };
}

/// A calendar date, possibly with unknown day or month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DatePattern {
    Year(i32),
    YearMonth(i32, Month),
    Day(Date),
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatePattern::Year(y) => write!(f, "{y:04}-**-**"),
            DatePattern::YearMonth(y, m) => write!(f, "{y:04}-{:02}-**", u8::from(*m)),
            DatePattern::Day(d) => write!(f, "{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day()),
        }
    }
}

/// Parses the canonical form. Wildcards and trailing dashes are dropped first;
/// what remains must be 4, 7 or 10 characters long.
impl FromStr for DatePattern {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::DateFormat(s.to_string());
        let cleaned = s.replace('*', "");
        let cleaned = cleaned.trim_end_matches('-');
        let parts: Vec<&str> = cleaned.split('-').collect();
        let number = |p: &str| p.parse::<i32>().map_err(|_| invalid());
        match (cleaned.len(), parts.as_slice()) {
            (4, [y]) => Ok(DatePattern::Year(number(y)?)),
            (7, [y, m]) => {
                let month = u8::try_from(number(m)?).ok().and_then(|m| Month::try_from(m).ok()).ok_or_else(invalid)?;
                Ok(DatePattern::YearMonth(number(y)?, month))
            }
            (10, [y, m, d]) => {
                let month = u8::try_from(number(m)?).ok().and_then(|m| Month::try_from(m).ok()).ok_or_else(invalid)?;
                let day = u8::try_from(number(d)?).map_err(|_| invalid())?;
                Date::from_calendar_date(number(y)?, month, day).map(DatePattern::Day).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

impl From<DatePattern> for String {
    fn from(p: DatePattern) -> Self { p.to_string() }
}

impl TryFrom<String> for DatePattern {
    type Error = EngineError;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl DatePattern {
    /// Full calendar span implied by the pattern.
    pub fn span(&self) -> Result<DateSpan> {
        let invalid = |_| EngineError::DateFormat(self.to_string());
        let (min, max) = match *self {
            DatePattern::Year(y) => (
                Date::from_calendar_date(y, Month::January, 1).map_err(invalid)?,
                Date::from_calendar_date(y, Month::December, 31).map_err(invalid)?,
            ),
            DatePattern::YearMonth(y, m) => {
                let last = m.length(y);
                (
                    Date::from_calendar_date(y, m, 1).map_err(invalid)?,
                    Date::from_calendar_date(y, m, last).map_err(invalid)?,
                )
            }
            DatePattern::Day(d) => (d, d),
        };
        Ok(DateSpan { min, max })
    }
}

/// Inclusive date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub min: Date,
    pub max: Date,
}

impl DateSpan {
    pub fn contains(&self, date: Date) -> bool { self.min <= date && date <= self.max }

    /// Both bounds in the index's `DD/MM/YYYY` form.
    pub fn display(&self) -> (String, String) { (display_date(self.min), display_date(self.max)) }
}

/// Expand a canonical date pattern (`2013-03-**`) into its calendar span.
pub fn min_max_dates(pattern: &str) -> Result<DateSpan> {
    pattern.parse::<DatePattern>()?.span()
}

pub fn display_date(date: Date) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), u8::from(date.month()), date.year())
}

/// Parse a stored `DD/MM/YYYY` value.
pub fn parse_display_date(s: &str) -> Option<Date> {
    let format = time::macros::format_description!("[day]/[month]/[year]");
    Date::parse(s.trim(), format).ok()
}

/// Recognize a date at the start of `text`.
///
/// Tried in order: `D month YYYY`, `month YYYY`, `DDMMYYYY`, `YYYY`. A form
/// that matches but names an impossible day yields `None`.
pub fn parse_date_str(text: &str) -> Option<DatePattern> {
    let text = text.trim();
    if let Some(c) = DAY_MONTH_YEAR.captures(text) {
        if let Some(month) = month_number(&c[2]) {
            return day(&c[3], month, &c[1]);
        }
    }
    if let Some(c) = MONTH_YEAR.captures(text) {
        if let Some(month) = month_number(&c[1]) {
            let year = c[2].parse().ok()?;
            return Some(DatePattern::YearMonth(year, Month::try_from(month).ok()?));
        }
    }
    if let Some(c) = COMPACT_DAY.captures(text) {
        let month = c[2].parse().ok()?;
        return day(&c[3], month, &c[1]);
    }
    YEAR.find(text).and_then(|m| m.as_str().parse().ok()).map(DatePattern::Year)
}

fn day(year: &str, month: u8, day: &str) -> Option<DatePattern> {
    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok()?;
    Some(DatePattern::Day(date))
}

/// A month excluded whatever the year and day (`****-MM-**`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct MonthExclusion(pub Month);

impl fmt::Display for MonthExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "****-{:02}-**", u8::from(self.0))
    }
}

impl From<MonthExclusion> for String {
    fn from(e: MonthExclusion) -> Self { e.to_string() }
}

impl MonthExclusion {
    /// Wildcard pattern over `DD/MM/YYYY` values.
    pub fn display_regex(&self) -> Regex {
        let pattern = format!(r"^.*/{:02}/.*$", u8::from(self.0));
        Regex::new(&pattern).expect("valid regex")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBound {
    Exact(DatePattern),
    Range { min: Option<DatePattern>, max: Option<DatePattern> },
}

fn range(min: Option<DatePattern>, max: Option<DatePattern>) -> Option<DateBound> {
    if min.is_none() && max.is_none() { None } else { Some(DateBound::Range { min, max }) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateConstraint {
    pub bound: Option<DateBound>,
    pub exclude: Option<MonthExclusion>,
}

impl DateConstraint {
    /// Lower and upper limits, open when absent. An exact pattern becomes the
    /// span it covers; a range keeps the start of its lower pattern and the
    /// end of its upper one.
    pub fn window(&self) -> Result<(Option<Date>, Option<Date>)> {
        match &self.bound {
            None => Ok((None, None)),
            Some(DateBound::Exact(p)) => {
                let span = p.span()?;
                Ok((Some(span.min), Some(span.max)))
            }
            Some(DateBound::Range { min, max }) => {
                let lo = min.map(|p| p.span()).transpose()?.map(|s| s.min);
                let hi = max.map(|p| p.span()).transpose()?.map(|s| s.max);
                Ok((lo, hi))
            }
        }
    }
}

struct DateRule {
    name: &'static str,
    pattern: Regex,
    resolve: fn(&Captures) -> Option<DateBound>,
}

/// Extract the date constraint of a cleaned query.
///
/// A month exclusion (`pas au mois juin`) is recorded first and never stops
/// the search. The bound is the first success among: `entre X et Y`,
/// `à partir de|après|depuis X`, `avant X`, `en|de|du|dans|au mois X`, then a
/// sliding three-word window, a two-word window and single words. Returns the
/// constraint (if any) and the query with every date expression removed.
pub fn extract_dates(text: &str) -> (Option<DateConstraint>, String) {
    let text = text.to_lowercase();
    let exclude = EXCLUSION
        .captures_iter(&text)
        .find_map(|c| month_number(&c[1]))
        .and_then(|m| Month::try_from(m).ok())
        .map(MonthExclusion);

    let bound = DATE_RULES
        .iter()
        .find_map(|rule| {
            let caps = rule.pattern.captures(&text)?;
            let bound = (rule.resolve)(&caps)?;
            tracing::debug!(rule = rule.name, ?bound, "date rule matched");
            Some(bound)
        })
        .or_else(|| scan_windows(&text));

    let constraint = if bound.is_none() && exclude.is_none() {
        None
    } else {
        Some(DateConstraint { bound, exclude })
    };
    (constraint, strip_dates(&text))
}

fn scan_windows(text: &str) -> Option<DateBound> {
    let words: Vec<&str> = text.split_whitespace().collect();
    [3, 2, 1].into_iter().find_map(|size| {
        if words.len() < size {
            return None;
        }
        words.windows(size).find_map(|w| parse_date_str(&w.join(" "))).map(DateBound::Exact)
    })
}

/// Remove month names, dates, years and temporal connectors.
pub fn strip_dates(text: &str) -> String {
    let mut out = text.to_string();
    for re in CLEANUP.iter() {
        out = re.replace_all(&out, "").into_owned();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
