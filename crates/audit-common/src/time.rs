//! Calendar windows for yearly composites.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar year selected for compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditYear(pub i32);

impl AuditYear {
    /// The full-year acquisition window for this year.
    pub fn window(&self) -> YearWindow {
        YearWindow::for_year(self.0)
    }

    /// Inclusive range of years from `self` to `end`.
    pub fn through(self, end: AuditYear) -> impl Iterator<Item = AuditYear> {
        (self.0..=end.0).map(AuditYear)
    }
}

impl From<i32> for AuditYear {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

impl std::fmt::Display for AuditYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open date range `[start, end)` covering one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl YearWindow {
    /// Jan 1 of `year` up to (excluding) Jan 1 of the following year.
    pub fn for_year(year: i32) -> Self {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_window_bounds() {
        let window = AuditYear(2014).window();
        assert!(window.contains(NaiveDate::from_ymd_opt(2014, 1, 1).unwrap()));
        assert!(window.contains(NaiveDate::from_ymd_opt(2014, 12, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2013, 12, 31).unwrap()));
        assert_eq!(window.year(), 2014);
    }

    #[test]
    fn test_year_range() {
        let years: Vec<_> = AuditYear(2014).through(AuditYear(2024)).collect();
        assert_eq!(years.len(), 11);
        assert_eq!(years[0], AuditYear(2014));
        assert_eq!(years[10], AuditYear(2024));
    }
}
