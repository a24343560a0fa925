// Exam date from the file name.
//
// Scans are usually named after the sitting ("midterm_2023-05-10.png",
// "final_10052023.jpg"). Patterns are tried in order; the first one that
// matches and forms a real calendar date wins.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex_lite::Regex;

const DATE_PATTERNS: [&str; 6] = [
    r"(\d{4})-(\d{1,2})-(\d{1,2})", // 2023-05-10
    r"(\d{1,2})-(\d{1,2})-(\d{4})", // 10-05-2023
    r"(\d{4})(\d{2})(\d{2})",       // 20230510
    r"(\d{2})(\d{2})(\d{4})",       // 10052023
    r"(\d{4})_(\d{1,2})_(\d{1,2})", // 2023_05_10
    r"(\d{1,2})_(\d{1,2})_(\d{4})", // 10_05_2023
];

/// How to read the two leading groups of a year-last date.
///
/// `Heuristic` reads day-month when the third group exceeds 31 and
/// month-day otherwise. With a four-digit year in third place that is
/// almost always day-month, so "03-04-2023" becomes 3 April; the other two
/// orders pin the reading explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateOrder {
    #[default]
    Heuristic,
    DayFirst,
    MonthFirst,
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(DateOrder::Heuristic),
            "day-first" | "dmy" => Ok(DateOrder::DayFirst),
            "month-first" | "mdy" => Ok(DateOrder::MonthFirst),
            other => Err(format!(
                "unknown date order {other:?} (expected heuristic, day-first or month-first)"
            )),
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateOrder::Heuristic => "heuristic",
            DateOrder::DayFirst => "day-first",
            DateOrder::MonthFirst => "month-first",
        })
    }
}

pub struct DateExtractor {
    patterns: Vec<Regex>,
    order: DateOrder,
}

impl DateExtractor {
    pub fn new(order: DateOrder) -> Result<Self, regex_lite::Error> {
        let patterns = DATE_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns, order })
    }

    /// The first valid date found in `filename`, if any.
    pub fn extract(&self, filename: &str) -> Option<NaiveDate> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(filename)?;
            let groups = [caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str()];
            self.interpret(groups)
        })
    }

    /// Like `extract`, falling back to today's date.
    pub fn extract_or_today(&self, filename: &str) -> NaiveDate {
        self.extract(filename)
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    fn interpret(&self, groups: [&str; 3]) -> Option<NaiveDate> {
        let [a, b, c] = groups;
        let (year, month, day) = if a.len() == 4 {
            (a, b, c)
        } else {
            let day_first = match self.order {
                DateOrder::DayFirst => true,
                DateOrder::MonthFirst => false,
                DateOrder::Heuristic => c.parse::<u32>().ok()? > 31,
            };
            if day_first {
                (c, b, a)
            } else {
                (c, a, b)
            }
        };
        NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn heuristic() -> DateExtractor {
        DateExtractor::new(DateOrder::Heuristic).unwrap()
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(heuristic().extract("midterm_2023-05-10.png"), Some(ymd(2023, 5, 10)));
    }

    #[test]
    fn test_compact_and_underscore_dates() {
        let d = heuristic();
        assert_eq!(d.extract("scan20221201.jpg"), Some(ymd(2022, 12, 1)));
        assert_eq!(d.extract("final_2021_7_3.png"), Some(ymd(2021, 7, 3)));
    }

    #[test]
    fn test_heuristic_reads_year_last_as_day_month() {
        // The year always exceeds 31, so the heuristic picks day-month
        assert_eq!(heuristic().extract("exam_03-04-2023.png"), Some(ymd(2023, 4, 3)));
    }

    #[test]
    fn test_month_first_override() {
        let d = DateExtractor::new(DateOrder::MonthFirst).unwrap();
        assert_eq!(d.extract("exam_03-04-2023.png"), Some(ymd(2023, 3, 4)));
    }

    #[test]
    fn test_invalid_match_falls_through_to_next_pattern() {
        // "1205" "20" "23" is not a date under the compact pattern; the
        // DDMMYYYY pattern then reads 12 May 2023
        assert_eq!(heuristic().extract("paper_12052023.png"), Some(ymd(2023, 5, 12)));
    }

    #[test]
    fn test_no_date_defaults_to_today() {
        let d = heuristic();
        assert_eq!(d.extract("statistics_paper.png"), None);
        assert_eq!(
            d.extract_or_today("statistics_paper.png"),
            chrono::Local::now().date_naive()
        );
    }

    #[test]
    fn test_parse_date_order() {
        assert_eq!("Day-First".parse::<DateOrder>(), Ok(DateOrder::DayFirst));
        assert_eq!("mdy".parse::<DateOrder>(), Ok(DateOrder::MonthFirst));
        assert!("sideways".parse::<DateOrder>().is_err());
    }
}
