//! Timestamp formats used by the CLI, the reporting API and log lines.

use chrono::{NaiveDateTime, ParseResult};

const JOB_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const API_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a window bound given on the command line (`T` or space separated).
pub fn parse_cli_time(s: &str) -> ParseResult<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, JOB_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, API_FORMAT))
}

/// Parse a `conversion_time` field as sent by the reporting API.
pub fn parse_conversion_time(s: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, API_FORMAT)
}

/// `start_date` / `end_date` query parameter format.
pub fn format_api_time(t: NaiveDateTime) -> String {
    t.format(API_FORMAT).to_string()
}

/// Format used in job descriptions and stored rows.
pub fn format_job_time(t: NaiveDateTime) -> String {
    t.format(JOB_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_time_accepts_both_separators() {
        let a = parse_cli_time("2017-01-22T12:23:44").unwrap();
        let b = parse_cli_time("2017-01-22 12:23:44").unwrap();
        assert_eq!(a, b);
        assert_eq!(format_api_time(a), "2017-01-22 12:23:44");
        assert_eq!(format_job_time(a), "2017-01-22T12:23:44");
    }

    #[test]
    fn conversion_time_rejects_t_separator() {
        assert!(parse_conversion_time("2017-01-22 12:23:44").is_ok());
        assert!(parse_conversion_time("2017-01-22T12:23:44").is_err());
        assert!(parse_conversion_time("").is_err());
    }
}
