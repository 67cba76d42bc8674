//! Date and time helpers.
//!
//! Formatting with configurable delimiters and a tolerant parser that finds
//! a date (optionally with a time) somewhere inside free text such as a log
//! line or a file name.
//!
//! # Example
//!
//! ```rust
//! use shellscript::datetime::{parse_datetime, to_yyyy_mm_dd_hh_mm, DateTimeFormat, ParseOptions};
//!
//! let dt = parse_datetime("backup_2022-12-31_23-59.tar", &ParseOptions::default())?;
//! assert_eq!(to_yyyy_mm_dd_hh_mm(&dt, &DateTimeFormat::default()), "2022-12-31 23:59");
//! # Ok::<(), shellscript::ShellError>(())
//! ```

use crate::error::{Result, ShellError};
use chrono::{
    DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use regex::{Captures, Regex};
use std::time::Duration;

/// Current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Sleep for `seconds`. Negative or non-finite values do not sleep.
pub fn delay(seconds: f64) {
    let duration = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO);
    std::thread::sleep(duration);
}

/// Drop everything below whole seconds.
pub fn trim_millis(dt: NaiveDateTime) -> NaiveDateTime {
    NaiveDateTime::new(dt.date(), trim_time_millis(dt.time()))
}

/// Drop seconds and everything below.
pub fn trim_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    NaiveDateTime::new(dt.date(), trim_time_seconds(dt.time()))
}

/// Midnight of the same day.
pub fn trim_time(dt: NaiveDateTime) -> NaiveDateTime {
    NaiveDateTime::new(dt.date(), NaiveTime::default())
}

pub fn trim_time_millis(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), t.second()).unwrap_or(t)
}

pub fn trim_time_seconds(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// Values that carry a calendar date and a wall-clock time.
///
/// Plain dates format as midnight.
pub trait CalendarTime {
    fn date_part(&self) -> NaiveDate;
    fn time_part(&self) -> NaiveTime;
}

impl CalendarTime for NaiveDateTime {
    fn date_part(&self) -> NaiveDate {
        self.date()
    }

    fn time_part(&self) -> NaiveTime {
        self.time()
    }
}

impl CalendarTime for NaiveDate {
    fn date_part(&self) -> NaiveDate {
        *self
    }

    fn time_part(&self) -> NaiveTime {
        NaiveTime::default()
    }
}

impl<Tz: TimeZone> CalendarTime for DateTime<Tz> {
    fn date_part(&self) -> NaiveDate {
        self.naive_local().date()
    }

    fn time_part(&self) -> NaiveTime {
        self.naive_local().time()
    }
}

/// Delimiters used when formatting a date-time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeFormat {
    /// Between year, month and day.
    pub date: String,
    /// Between hours, minutes and seconds.
    pub time: String,
    /// Between the date and the time.
    pub date_time: String,
    /// Overrides both `date` and `time` when set.
    pub all: Option<String>,
}

impl Default for DateTimeFormat {
    fn default() -> Self {
        Self {
            date: "-".to_string(),
            time: ":".to_string(),
            date_time: " ".to_string(),
            all: None,
        }
    }
}

impl DateTimeFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, delimiter: impl Into<String>) -> Self {
        self.date = delimiter.into();
        self
    }

    pub fn with_time(mut self, delimiter: impl Into<String>) -> Self {
        self.time = delimiter.into();
        self
    }

    pub fn with_date_time(mut self, delimiter: impl Into<String>) -> Self {
        self.date_time = delimiter.into();
        self
    }

    pub fn with_all(mut self, delimiter: impl Into<String>) -> Self {
        self.all = Some(delimiter.into());
        self
    }

    fn date_delimiter(&self) -> &str {
        self.all.as_deref().unwrap_or(&self.date)
    }

    fn time_delimiter(&self) -> &str {
        self.all.as_deref().unwrap_or(&self.time)
    }
}

/// `YYYY-MM-DD HH:MM:SS` with the delimiters of `format`.
pub fn to_yyyy_mm_dd_hh_mm_ss(value: &impl CalendarTime, format: &DateTimeFormat) -> String {
    format!(
        "{}{}{}",
        to_yyyy_mm_dd(&value.date_part(), format.date_delimiter()),
        format.date_time,
        to_hh_mm_ss(&value.time_part(), format.time_delimiter())
    )
}

/// `YYYY-MM-DD HH:MM` with the delimiters of `format`.
pub fn to_yyyy_mm_dd_hh_mm(value: &impl CalendarTime, format: &DateTimeFormat) -> String {
    format!(
        "{}{}{}",
        to_yyyy_mm_dd(&value.date_part(), format.date_delimiter()),
        format.date_time,
        to_hh_mm(&value.time_part(), format.time_delimiter())
    )
}

pub fn to_yyyy_mm_dd(value: &impl Datelike, delimiter: &str) -> String {
    format!(
        "{:04}{d}{:02}{d}{:02}",
        value.year(),
        value.month(),
        value.day(),
        d = delimiter
    )
}

pub fn to_hh_mm_ss(value: &impl Timelike, delimiter: &str) -> String {
    format!(
        "{:02}{d}{:02}{d}{:02}",
        value.hour(),
        value.minute(),
        value.second(),
        d = delimiter
    )
}

pub fn to_hh_mm(value: &impl Timelike, delimiter: &str) -> String {
    format!("{:02}{d}{:02}", value.hour(), value.minute(), d = delimiter)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Where a match must sit inside the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Anchor {
    /// Anywhere.
    #[default]
    None,
    /// At the very start (or end) of the input.
    Required,
    /// Directly after (or before) text matching this regex.
    Pattern(String),
}

impl Anchor {
    fn start_fragment(&self) -> String {
        match self {
            Anchor::None => String::new(),
            Anchor::Required => "^".to_string(),
            Anchor::Pattern(p) => format!("(?:{})", p),
        }
    }

    fn end_fragment(&self) -> String {
        match self {
            Anchor::None => String::new(),
            Anchor::Required => "$".to_string(),
            Anchor::Pattern(p) => format!("(?:{})", p),
        }
    }
}

/// Options for [`parse_datetime`] and [`DateTimeParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub date_delimiters: Vec<String>,
    pub time_delimiters: Vec<String>,
    pub date_time_delimiters: Vec<String>,
    pub start: Anchor,
    pub end: Anchor,
    /// Only accept `YYYY-MM-DD HH:MM[:SS]`.
    pub iso: bool,
    /// Only accept `YYYYMMDD HHMM[SS]`. Ignored when `iso` is set.
    pub iso_basic: bool,
    /// Also accept a date without a time.
    pub no_time: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            date_delimiters: strings(&["-", "/"]),
            time_delimiters: strings(&["-", ":"]),
            date_time_delimiters: strings(&[" ", "_", "-", "T"]),
            start: Anchor::None,
            end: Anchor::None,
            iso: false,
            iso_basic: false,
            no_time: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_delimiters(mut self, delimiters: &[&str]) -> Self {
        self.date_delimiters = strings(delimiters);
        self
    }

    pub fn with_time_delimiters(mut self, delimiters: &[&str]) -> Self {
        self.time_delimiters = strings(delimiters);
        self
    }

    pub fn with_date_time_delimiters(mut self, delimiters: &[&str]) -> Self {
        self.date_time_delimiters = strings(delimiters);
        self
    }

    pub fn with_start(mut self, anchor: Anchor) -> Self {
        self.start = anchor;
        self
    }

    pub fn with_end(mut self, anchor: Anchor) -> Self {
        self.end = anchor;
        self
    }

    pub fn with_iso(mut self, iso: bool) -> Self {
        self.iso = iso;
        self
    }

    pub fn with_iso_basic(mut self, iso_basic: bool) -> Self {
        self.iso_basic = iso_basic;
        self
    }

    pub fn with_no_time(mut self, no_time: bool) -> Self {
        self.no_time = no_time;
        self
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Year4,
    Year2,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    DateDelim,
    TimeDelim,
    DateTimeDelim,
}

use Part::*;

// Each group lists its variants with seconds first.
const ISO_HUMAN: &[&[Part]] = &[
    &[
        Year4, DateDelim, Month, DateDelim, Day, DateTimeDelim, Hour, TimeDelim, Minute,
        TimeDelim, Second,
    ],
    &[Year4, DateDelim, Month, DateDelim, Day, DateTimeDelim, Hour, TimeDelim, Minute],
];

const ISO_BASIC: &[&[Part]] = &[
    &[Year4, Month, Day, DateTimeDelim, Hour, Minute, Second],
    &[Year4, Month, Day, DateTimeDelim, Hour, Minute],
];

const SHORT_YEAR: &[&[Part]] = &[
    &[
        Year2, DateDelim, Month, DateDelim, Day, DateTimeDelim, Hour, TimeDelim, Minute,
        TimeDelim, Second,
    ],
    &[Year2, DateDelim, Month, DateDelim, Day, DateTimeDelim, Hour, TimeDelim, Minute],
];

const DATE_ONLY: &[&[Part]] = &[
    &[Year4, DateDelim, Month, DateDelim, Day],
    &[Year4, Month, Day],
];

const DAY_FIRST: &[&[Part]] = &[
    &[
        Day, DateDelim, Month, DateDelim, Year4, DateTimeDelim, Hour, TimeDelim, Minute,
        TimeDelim, Second,
    ],
    &[Day, DateDelim, Month, DateDelim, Year4, DateTimeDelim, Hour, TimeDelim, Minute],
];

/// Precompiled date-time finder.
///
/// Formats are tried in order; the first one found anywhere in the input
/// decides the result, even if its values turn out to be out of range.
#[derive(Debug, Clone)]
pub struct DateTimeParser {
    /// One entry per format; each holds a regex per delimiter combination.
    formats: Vec<Vec<Regex>>,
}

impl DateTimeParser {
    pub fn new(options: &ParseOptions) -> Result<Self> {
        let groups: Vec<&[&[Part]]> = if options.iso {
            vec![ISO_HUMAN]
        } else if options.iso_basic {
            vec![ISO_BASIC]
        } else {
            let mut groups = vec![ISO_HUMAN, ISO_BASIC, SHORT_YEAR];
            if options.no_time {
                groups.push(DATE_ONLY);
            }
            groups.push(DAY_FIRST);
            groups
        };

        let formats = groups
            .into_iter()
            .flatten()
            .map(|parts| compile_format(parts, options))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { formats })
    }

    pub fn parse(&self, input: &str) -> Result<NaiveDateTime> {
        for combos in &self.formats {
            // Leftmost match wins; ties go to the earlier delimiter combination
            let found = combos
                .iter()
                .filter_map(|re| re.captures(input))
                .min_by_key(|caps| caps.get(0).map_or(usize::MAX, |m| m.start()));
            if let Some(caps) = found {
                return build_datetime(input, &caps);
            }
        }
        Err(parse_error(input, "no supported date format found"))
    }
}

/// Find and parse the first date-time in `input`.
pub fn parse_datetime(input: &str, options: &ParseOptions) -> Result<NaiveDateTime> {
    DateTimeParser::new(options)?.parse(input)
}

fn compile_format(parts: &[Part], options: &ParseOptions) -> Result<Vec<Regex>> {
    let date_choices = delimiter_choices(parts.contains(&DateDelim), &options.date_delimiters);
    let time_choices = delimiter_choices(parts.contains(&TimeDelim), &options.time_delimiters);
    let date_time = format!(
        "(?:{})",
        options
            .date_time_delimiters
            .iter()
            .map(|d| regex::escape(d))
            .collect::<Vec<_>>()
            .join("|")
    );

    let mut regexes = Vec::with_capacity(date_choices.len() * time_choices.len());
    for date in &date_choices {
        for time in &time_choices {
            let mut pattern = options.start.start_fragment();
            for part in parts {
                match part {
                    Year4 => pattern.push_str("(?P<year>[0-9]{4})"),
                    Year2 => pattern.push_str("(?P<year>[0-9]{2})"),
                    Month => pattern.push_str("(?P<month>[0-1][0-9])"),
                    Day => pattern.push_str("(?P<day>[0-9]{2})"),
                    Hour => pattern.push_str("(?P<hour>[0-2][0-9])"),
                    Minute => pattern.push_str("(?P<minute>[0-5][0-9])"),
                    Second => pattern.push_str("(?P<second>[0-9]{2})"),
                    DateDelim => pattern.push_str(&regex::escape(date)),
                    TimeDelim => pattern.push_str(&regex::escape(time)),
                    DateTimeDelim => pattern.push_str(&date_time),
                }
            }
            pattern.push_str(&options.end.end_fragment());

            let re = Regex::new(&pattern).map_err(|e| {
                ShellError::invalid("anchor", format!("invalid date pattern: {}", e))
            })?;
            regexes.push(re);
        }
    }
    Ok(regexes)
}

// An unused or empty delimiter list still yields one (empty) choice.
fn delimiter_choices(used: bool, delimiters: &[String]) -> Vec<&str> {
    if !used || delimiters.is_empty() {
        return vec![""];
    }
    delimiters.iter().map(String::as_str).collect()
}

fn build_datetime(input: &str, caps: &Captures<'_>) -> Result<NaiveDateTime> {
    let mut year = capture_number(input, caps, "year")? as i32;
    if caps.name("year").map_or(0, |m| m.as_str().len()) == 2 {
        year += 2000;
    }
    let month = capture_number(input, caps, "month")?;
    let day = capture_number(input, caps, "day")?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        parse_error(input, format!("invalid date {:04}-{:02}-{:02}", year, month, day))
    })?;

    let hour = capture_number(input, caps, "hour")?;
    let minute = capture_number(input, caps, "minute")?;
    let second = capture_number(input, caps, "second")?;
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| {
        parse_error(input, format!("invalid time {:02}:{:02}:{:02}", hour, minute, second))
    })?;

    Ok(NaiveDateTime::new(date, time))
}

// Missing groups (seconds in the short variants) read as zero.
fn capture_number(input: &str, caps: &Captures<'_>, name: &str) -> Result<u32> {
    match caps.name(name) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| parse_error(input, format!("bad {} {:?}", name, m.as_str()))),
        None => Ok(0),
    }
}

fn parse_error(input: &str, message: impl Into<String>) -> ShellError {
    ShellError::DateTimeParse {
        input: input.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn parse(input: &str, options: ParseOptions) -> Result<NaiveDateTime> {
        parse_datetime(input, &options)
    }

    fn date_only() -> ParseOptions {
        ParseOptions::default().with_no_time(true)
    }

    #[test]
    fn test_format_defaults() {
        let value = dt(2024, 10, 14, 12, 30, 45);
        let format = DateTimeFormat::default();
        assert_eq!(to_yyyy_mm_dd_hh_mm_ss(&value, &format), "2024-10-14 12:30:45");
        assert_eq!(to_yyyy_mm_dd_hh_mm(&value, &format), "2024-10-14 12:30");
    }

    #[test]
    fn test_format_custom_delimiters() {
        let value = dt(2024, 10, 14, 12, 30, 45);

        let format = DateTimeFormat::new().with_date("/").with_time(".");
        assert_eq!(to_yyyy_mm_dd_hh_mm_ss(&value, &format), "2024/10/14 12.30.45");

        let format = DateTimeFormat::new().with_date(".").with_time("-");
        assert_eq!(to_yyyy_mm_dd_hh_mm(&value, &format), "2024.10.14 12-30");

        let format = DateTimeFormat::new().with_all(".");
        assert_eq!(to_yyyy_mm_dd_hh_mm_ss(&value, &format), "2024.10.14 12.30.45");

        let format = DateTimeFormat::new().with_all("/").with_date_time("_");
        assert_eq!(to_yyyy_mm_dd_hh_mm(&value, &format), "2024/10/14_12/30");
    }

    #[test]
    fn test_format_date_as_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 14).unwrap();
        assert_eq!(
            to_yyyy_mm_dd_hh_mm_ss(&date, &DateTimeFormat::default()),
            "2024-10-14 00:00:00"
        );
        assert_eq!(to_yyyy_mm_dd(&date, "-"), "2024-10-14");
    }

    #[test]
    fn test_format_time_parts() {
        let t = NaiveTime::from_hms_opt(8, 16, 32).unwrap();
        assert_eq!(to_hh_mm_ss(&t, ":"), "08:16:32");
        assert_eq!(to_hh_mm(&t, "-"), "08-16");
    }

    #[test]
    fn test_trim_helpers() {
        let value = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 678)
            .unwrap();
        assert_eq!(trim_millis(value), dt(2024, 1, 2, 3, 4, 5));
        assert_eq!(trim_seconds(value), dt(2024, 1, 2, 3, 4, 0));
        assert_eq!(trim_time(value), dt(2024, 1, 2, 0, 0, 0));
        assert_eq!(
            trim_time_seconds(value.time()),
            NaiveTime::from_hms_opt(3, 4, 0).unwrap()
        );
        assert_eq!(
            trim_time_millis(value.time()),
            NaiveTime::from_hms_opt(3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_delay_ignores_negative() {
        delay(-1.0);
        delay(0.001);
    }

    #[test]
    fn test_parse_iso_human() {
        let opts = ParseOptions::default;
        assert_eq!(parse("2022-12-31 23:59:01", opts()).unwrap(), dt(2022, 12, 31, 23, 59, 1));
        assert_eq!(
            parse("2022/12/31T23-59-04", opts()).unwrap(),
            dt(2022, 12, 31, 23, 59, 4)
        );
        assert_eq!(
            parse("2020-02-29 12:00:00", opts()).unwrap(),
            dt(2020, 2, 29, 12, 0, 0)
        );
    }

    #[test]
    fn test_parse_custom_delimiters() {
        let opts = ParseOptions::default()
            .with_date_delimiters(&["/"])
            .with_time_delimiters(&["-"]);
        assert_eq!(
            parse("2022/12/31_23-02", opts).unwrap(),
            dt(2022, 12, 31, 23, 2, 0)
        );

        let opts = ParseOptions::default()
            .with_date_delimiters(&["-", ".", "/"])
            .with_date_time_delimiters(&["-"])
            .with_time_delimiters(&[":"]);
        assert_eq!(
            parse("2022.12.31-23:59:59", opts).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
    }

    #[test]
    fn test_parse_iso_basic() {
        let opts = ParseOptions::default()
            .with_date_time_delimiters(&["T"])
            .with_iso_basic(true);
        assert_eq!(
            parse("20221231T235905", opts).unwrap(),
            dt(2022, 12, 31, 23, 59, 5)
        );

        let opts = ParseOptions::default()
            .with_date_time_delimiters(&[" "])
            .with_iso_basic(true);
        assert_eq!(
            parse("20221231 235959", opts).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );

        let opts = ParseOptions::default().with_date_time_delimiters(&[" "]);
        assert_eq!(
            parse("20221231 2359", opts).unwrap(),
            dt(2022, 12, 31, 23, 59, 0)
        );
    }

    #[test]
    fn test_parse_short_year_and_day_first() {
        let opts = ParseOptions::default;
        assert_eq!(
            parse("22-12-31 23:59:59", opts()).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
        assert_eq!(
            parse("99-12-31 23:59:59", opts()).unwrap(),
            dt(2099, 12, 31, 23, 59, 59)
        );
        assert_eq!(
            parse("31-12-2022 23:59:59", opts()).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
    }

    #[test]
    fn test_parse_date_only() {
        let midnight = dt(2022, 12, 31, 0, 0, 0);
        assert_eq!(parse("2022-12-31", date_only()).unwrap(), midnight);
        assert_eq!(parse("20221231", date_only()).unwrap(), midnight);
        assert!(parse("2022-12-31", ParseOptions::default()).is_err());
    }

    #[test]
    fn test_parse_anchors() {
        let start = date_only().with_start(Anchor::Required);
        assert_eq!(
            parse("2022-12-31 data", start).unwrap(),
            dt(2022, 12, 31, 0, 0, 0)
        );

        let end = date_only().with_end(Anchor::Required);
        assert_eq!(
            parse("data 2022-12-31", end).unwrap(),
            dt(2022, 12, 31, 0, 0, 0)
        );

        let both = date_only()
            .with_start(Anchor::Pattern("Start".into()))
            .with_end(Anchor::Pattern("End".into()));
        assert_eq!(
            parse("Start2022-12-31End", both.clone()).unwrap(),
            dt(2022, 12, 31, 0, 0, 0)
        );
        assert!(parse("Start2022-12-31", both).is_err());

        let required = date_only()
            .with_start(Anchor::Required)
            .with_end(Anchor::Required);
        assert!(parse("data 2022-12-31 data", required).is_err());

        let start = ParseOptions::default().with_start(Anchor::Required);
        assert!(parse("Log at 2022-12-31 23:03", start).is_err());
        let end = ParseOptions::default().with_end(Anchor::Required);
        assert!(parse("2022-12-31 23:04 Log", end).is_err());
    }

    #[test]
    fn test_parse_ignores_suffixes() {
        let opts = ParseOptions::default;
        assert_eq!(
            parse("2022-12-31 23:59:59+02:00", opts()).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
        assert_eq!(
            parse("2022-12-31T23:59:59Z", opts()).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
        assert_eq!(
            parse("2022-12-31 23:59:59.123", opts()).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
    }

    #[test]
    fn test_parse_iso_flags_restrict_formats() {
        let iso = || ParseOptions::default().with_iso(true);
        assert_eq!(
            parse("2022-12-31 23:59:59", iso()).unwrap(),
            dt(2022, 12, 31, 23, 59, 59)
        );
        assert!(parse("20221231 235959", iso()).is_err());
        assert!(parse("2022-12-31", iso()).is_err());
        assert!(parse("2022-12", iso()).is_err());

        let basic = ParseOptions::default().with_iso_basic(true);
        assert!(parse("2022-12-31 23:59:59", basic).is_err());
    }

    #[test]
    fn test_parse_out_of_range_values() {
        let opts = ParseOptions::default;
        for input in [
            "2022-13-31 23:59:59",
            "2022-12-32 23:59:59",
            "2022-12-31 24:00:00",
            "2022-12-31 23:60:00",
            "2022-12-31 23:59:60",
            "2019-02-29 12:00:00",
        ] {
            assert!(
                matches!(parse(input, opts()), Err(ShellError::DateTimeParse { .. })),
                "{input} should not parse"
            );
        }
        assert!(parse("2022/13/31", date_only()).is_err());
    }

    #[test]
    fn test_parse_no_date() {
        assert!(parse("Invalid date", ParseOptions::default()).is_err());
        assert!(parse("", ParseOptions::default()).is_err());
        assert!(parse("Just some random text", ParseOptions::default()).is_err());
        assert!(parse("1234567890", date_only()).is_err());
    }

    #[test]
    fn test_invalid_anchor_pattern() {
        let opts = ParseOptions::default().with_start(Anchor::Pattern("(".into()));
        assert!(matches!(
            DateTimeParser::new(&opts),
            Err(ShellError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parser_reuse() {
        let parser = DateTimeParser::new(&ParseOptions::default()).unwrap();
        let a = parser.parse("log_2023-01-02_03-04-05.txt").unwrap();
        let b = parser.parse("log_2023-01-02_03-04.txt").unwrap();
        assert_eq!(a, dt(2023, 1, 2, 3, 4, 5));
        assert_eq!(b, dt(2023, 1, 2, 3, 4, 0));
    }
}
