//! Time-series column headers
//!
//! Headers name periods: `2021` (annual), `2021Q3` (quarterly) or `2021-07`
//! (monthly). Shifting data right needs the next headers in the series and
//! blank cells to fill them.

use crate::error::ChainError;
use lazy_regex::regex;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Period granularity of a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesType {
    Annual,
    Quarterly,
    Monthly,
}

impl SeriesType {
    /// Header pattern, matched anywhere in the header
    pub fn pattern(&self) -> &'static Regex {
        match self {
            SeriesType::Annual => regex!(r"\d{4}"),
            SeriesType::Quarterly => regex!(r"\d{4}Q\d{1}"),
            SeriesType::Monthly => regex!(r"\d{4}-\d{2}"),
        }
    }

    /// Text between year and period
    pub fn separator(&self) -> &'static str {
        match self {
            SeriesType::Annual => " ",
            SeriesType::Quarterly => "Q",
            SeriesType::Monthly => "-",
        }
    }

    /// Periods per year, `None` for annual series
    pub fn frequency(&self) -> Option<u32> {
        match self {
            SeriesType::Annual => None,
            SeriesType::Quarterly => Some(4),
            SeriesType::Monthly => Some(12),
        }
    }
}

impl FromStr for SeriesType {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "annual" => Ok(SeriesType::Annual),
            "quarterly" => Ok(SeriesType::Quarterly),
            "monthly" => Ok(SeriesType::Monthly),
            _ => Err(ChainError::InvalidSeries(s.to_string())),
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeriesType::Annual => "Annual",
            SeriesType::Quarterly => "Quarterly",
            SeriesType::Monthly => "Monthly",
        };
        f.write_str(name)
    }
}

/// Whether a header belongs to the series
pub fn is_column_valid(column: &str, series: SeriesType) -> bool {
    series.pattern().is_match(column)
}

/// Index of the first header belonging to the series
pub fn first_column<S: AsRef<str>>(headers: &[S], series: SeriesType) -> Option<usize> {
    headers
        .iter()
        .position(|header| is_column_valid(header.as_ref(), series))
}

/// The `count` headers following `last`
///
/// Empty when `last` is not part of the series. Annual headers only advance
/// when they are purely numeric. Stops early rather than overflow the year.
pub fn next_headers(last: &str, series: SeriesType, count: usize) -> Vec<String> {
    if !is_column_valid(last, series) {
        return Vec::new();
    }

    let frequency = match series.frequency() {
        Some(frequency) => u64::from(frequency),
        None => {
            if last.is_empty() || !last.chars().all(|c| c.is_ascii_digit()) {
                return Vec::new();
            }
            return match last.parse::<u64>() {
                Ok(year) => (1..=count)
                    .map_while(|i| year.checked_add(u64::try_from(i).ok()?))
                    .map(|year| year.to_string())
                    .collect(),
                Err(_) => Vec::new(),
            };
        }
    };

    let (year, period) = match split_period(last, series) {
        Some(parts) => parts,
        None => return Vec::new(),
    };

    (1..=count)
        .map_while(|i| {
            let total = period.saturating_sub(1).checked_add(u64::try_from(i).ok()?)?;
            let year = year.checked_add(total / frequency)?;
            let period = total % frequency + 1;
            Some(match series {
                SeriesType::Monthly => format!("{}{}{:02}", year, series.separator(), period),
                _ => format!("{}{}{}", year, series.separator(), period),
            })
        })
        .collect()
}

fn split_period(header: &str, series: SeriesType) -> Option<(u64, u64)> {
    let (year, period) = header.split_once(series.separator())?;
    Some((year.trim().parse().ok()?, period.trim().parse().ok()?))
}

/// Extend a header row with the next `count` headers of its series
///
/// Returns the number of headers added.
pub fn append_columns(headers: &mut Vec<String>, series: SeriesType, count: usize) -> usize {
    let next = match headers.last() {
        Some(last) => next_headers(last, series, count),
        None => Vec::new(),
    };
    let added = next.len();
    headers.extend(next);
    tracing::debug!(%series, added, "appended series columns");
    added
}

/// Append `count` blank rows of `width` cells
pub fn append_blank_rows(rows: &mut Vec<Vec<String>>, width: usize, count: usize) {
    rows.extend((0..count).map(|_| vec![String::new(); width]));
}

/// Header row plus string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SeriesTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Add the next `count` series columns, blank in every row
    pub fn append_columns(&mut self, series: SeriesType, count: usize) -> usize {
        let added = append_columns(&mut self.headers, series, count);
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        added
    }

    pub fn append_blank_rows(&mut self, count: usize) {
        append_blank_rows(&mut self.rows, self.headers.len(), count);
    }

    /// Index of the first series column
    pub fn first_column(&self, series: SeriesType) -> Option<usize> {
        first_column(&self.headers, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Quarterly".parse::<SeriesType>().unwrap(), SeriesType::Quarterly);
        assert_eq!("monthly".parse::<SeriesType>().unwrap(), SeriesType::Monthly);
        assert!(matches!(
            "weekly".parse::<SeriesType>(),
            Err(ChainError::InvalidSeries(ref s)) if s == "weekly"
        ));
    }

    #[test]
    fn test_is_column_valid() {
        assert!(is_column_valid("2021", SeriesType::Annual));
        assert!(is_column_valid("FY 2021", SeriesType::Annual));
        assert!(is_column_valid("2021Q3", SeriesType::Quarterly));
        assert!(!is_column_valid("2021-3", SeriesType::Monthly));
        assert!(!is_column_valid("Name", SeriesType::Annual));
    }

    #[test]
    fn test_first_column() {
        let row = headers(&["Name", "Unit", "2019Q4", "2020Q1"]);
        assert_eq!(first_column(&row, SeriesType::Quarterly), Some(2));
        assert_eq!(first_column(&row, SeriesType::Monthly), None);
    }

    #[test]
    fn test_annual() {
        assert_eq!(next_headers("2020", SeriesType::Annual, 2), vec!["2021", "2022"]);
        assert!(next_headers("FY 2020", SeriesType::Annual, 2).is_empty());
    }

    #[test]
    fn test_quarterly_wraps_year() {
        assert_eq!(next_headers("2020Q4", SeriesType::Quarterly, 1), vec!["2021Q1"]);
        assert_eq!(
            next_headers("2020Q3", SeriesType::Quarterly, 3),
            vec!["2020Q4", "2021Q1", "2021Q2"]
        );
    }

    #[test]
    fn test_monthly_zero_padded() {
        assert_eq!(
            next_headers("2020-11", SeriesType::Monthly, 2),
            vec!["2020-12", "2021-01"]
        );
        assert_eq!(next_headers("2020-12", SeriesType::Monthly, 13).last().unwrap(), "2022-01");
    }

    #[test]
    fn test_oversized_year_stops() {
        assert!(next_headers("18446744073709551615", SeriesType::Annual, 1).is_empty());
        assert_eq!(
            next_headers("18446744073709551614", SeriesType::Annual, 3),
            vec!["18446744073709551615"]
        );
        assert_eq!(
            next_headers("18446744073709551615Q3", SeriesType::Quarterly, 2),
            vec!["18446744073709551615Q4"]
        );
        assert!(next_headers("99999999999999999999-01", SeriesType::Monthly, 1).is_empty());
    }

    #[test]
    fn test_append_columns_requires_series_header() {
        let mut row = headers(&["Name", "Total"]);
        assert_eq!(append_columns(&mut row, SeriesType::Annual, 2), 0);
        assert_eq!(row, headers(&["Name", "Total"]));
    }

    #[test]
    fn test_table_shift() {
        let mut table = SeriesTable::new(headers(&["Name", "2020Q4"]));
        table.rows.push(headers(&["revenue", "10"]));

        assert_eq!(table.append_columns(SeriesType::Quarterly, 2), 2);
        assert_eq!(table.headers, headers(&["Name", "2020Q4", "2021Q1", "2021Q2"]));
        assert_eq!(table.rows[0], headers(&["revenue", "10", "", ""]));

        table.append_blank_rows(1);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec![String::new(); 4]);
    }
}
