//! Row date normalisation.
//!
//! Meeting tables list one meeting per row with a date cell. Papers circulated
//! between meetings appear as undated continuation rows; these inherit the
//! date of the closest dated row above them and are numbered
//! `YYYYMMDD_interMeeting1`, `YYYYMMDD_interMeeting2`, ...

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Date used for continuation rows that appear before any dated row.
pub const DEFAULT_DATE: &str = "20160101";

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<y>20[0-9]{2}).?(?P<m>[01]?[0-9]).?(?P<d>[0123]?[0-9])")
        .expect("date pattern is valid")
});

/// Canonical key of a table row, used as a breadcrumb segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKey {
    /// `YYYYMMDD`.
    pub date: String,
    /// Position in a run of undated rows, counted from 1.
    pub inter_meeting: Option<u32>,
}

impl DateKey {
    pub fn is_inter_meeting(&self) -> bool {
        self.inter_meeting.is_some()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inter_meeting {
            Some(n) => write!(f, "{}_interMeeting{}", self.date, n),
            None => f.write_str(&self.date),
        }
    }
}

/// Find a `YYYY?MM?DD` date (year 2000-2099) in `text`, as `YYYYMMDD`.
pub fn parse_date(text: &str) -> Option<String> {
    let caps = DATE_PATTERN.captures(text)?;
    let field = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
    let (y, m, d) = (field("y")?, field("m")?, field("d")?);
    Some(format!("{y}{m:02}{d:02}"))
}

/// Assign a [`DateKey`] to every row, given each row's date cell text in order.
pub fn normalize<'a, I>(date_cells: I) -> Vec<DateKey>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut current = DEFAULT_DATE.to_string();
    let mut counter = 1u32;
    date_cells
        .into_iter()
        .map(|text| match parse_date(text) {
            Some(date) => {
                current = date.clone();
                counter = 1;
                DateKey {
                    date,
                    inter_meeting: None,
                }
            }
            None => {
                let key = DateKey {
                    date: current.clone(),
                    inter_meeting: Some(counter),
                };
                counter += 1;
                key
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(cells: &[&str]) -> Vec<String> {
        normalize(cells.iter().copied())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_inter_meeting_rows_inherit_previous_date() {
        assert_eq!(
            keys(&["2016-01-05", "", "", "2016-02-10"]),
            [
                "20160105",
                "20160105_interMeeting1",
                "20160105_interMeeting2",
                "20160210"
            ]
        );
    }

    #[test]
    fn test_counter_resets_after_dated_row() {
        assert_eq!(
            keys(&["2019年3月7日", "傳閱文件", "2019年4月2日", "傳閱文件"]),
            [
                "20190307",
                "20190307_interMeeting1",
                "20190402",
                "20190402_interMeeting1"
            ]
        );
    }

    #[test]
    fn test_leading_undated_row_uses_default_date() {
        assert_eq!(keys(&["", "2017-03-15"]), ["20160101_interMeeting1", "20170315"]);
    }

    #[test]
    fn test_parse_date_variants() {
        assert_eq!(parse_date("2018/11/20").as_deref(), Some("20181120"));
        assert_eq!(parse_date("日期: 2018.1.2 (星期二)").as_deref(), Some("20180102"));
        assert_eq!(parse_date("1999-01-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_inter_meeting_flag() {
        let parsed = normalize(["2016-01-05", "x"]);
        assert!(!parsed[0].is_inter_meeting());
        assert!(parsed[1].is_inter_meeting());
    }
}
