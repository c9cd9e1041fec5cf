use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A calendar month, written canonically as `YYYY-MM`.
///
/// The canonical form is a prefix of every ISO 8601 date that falls within the month,
/// which is what allows budgets and expenses to be matched by month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    // Field order matters: the derived `Ord` must sort by year before month.
    year: i32,
    month: u32,
}

#[derive(Error, Debug, PartialEq)]
pub enum MonthKeyError {
    #[error("'{0}' is not a month in the form YYYY-MM")]
    Malformed(String),
    #[error("month {0} is outside the range 1 - 12")]
    MonthOutOfRange(u32),
    #[error("year {0} is outside the range 0000 - 9999")]
    YearOutOfRange(i32),
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(0..=9999).contains(&year) {
            return Err(MonthKeyError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::MonthOutOfRange(month));
        }

        Ok(MonthKey { year, month })
    }

    /// Returns the month containing `date`. Fails for dates outside the years
    /// 0000 - 9999, which have no canonical form.
    pub fn of(date: NaiveDate) -> Result<Self, MonthKeyError> {
        MonthKey::new(date.year(), date.month())
    }

    /// The first calendar day of this month
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("MonthKey year and month are validated on construction")
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns whether `date` falls within this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Step back `months` calendar months, rolling over into previous years as needed.
    /// Returns `None` if the result would fall before year 0000.
    pub fn checked_sub_months(&self, months: u32) -> Option<Self> {
        // Working from the first of the month means chrono never has to clamp the day
        let date = self.first_day().checked_sub_months(Months::new(months))?;
        MonthKey::of(date).ok()
    }

    /// Step forward `months` calendar months, rolling over into following years as
    /// needed. Returns `None` if the result would fall after year 9999.
    pub fn checked_add_months(&self, months: u32) -> Option<Self> {
        let date = self.first_day().checked_add_months(Months::new(months))?;
        MonthKey::of(date).ok()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MonthKeyError::Malformed(s.into());

        // Only the canonical form is accepted, so "2024-3" and "24-03" are both errors
        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4
            || month.len() != 2
            || !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }

        let year = year.parse().map_err(|_| malformed())?;
        let month = month.parse().map_err(|_| malformed())?;

        MonthKey::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> String {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn parse_canonical() {
        let month = key("2024-03");
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 3);
        assert_eq!(month.to_string(), "2024-03");
    }

    #[test]
    fn parse_malformed() {
        for s in &["2024-3", "24-03", "2024/03", "2024-03-01", "", "abcd-ef", "+024-03"] {
            assert_eq!(
                s.parse::<MonthKey>(),
                Err(MonthKeyError::Malformed(s.to_string())),
                "{}",
                s
            );
        }
    }

    #[test]
    fn parse_month_out_of_range() {
        assert_eq!(
            "2024-13".parse::<MonthKey>(),
            Err(MonthKeyError::MonthOutOfRange(13))
        );
        assert_eq!(
            "2024-00".parse::<MonthKey>(),
            Err(MonthKeyError::MonthOutOfRange(0))
        );
    }

    #[test]
    fn new_year_out_of_range() {
        assert_eq!(
            MonthKey::new(10000, 1),
            Err(MonthKeyError::YearOutOfRange(10000))
        );
    }

    #[test]
    fn display_is_prefix_of_iso_date() {
        let date = NaiveDate::from_ymd_opt(987, 7, 4).unwrap();
        let month = MonthKey::of(date).unwrap();
        assert_eq!(month.to_string(), "0987-07");
        assert!(date.to_string().starts_with(&month.to_string()));
    }

    #[test]
    fn of_date_without_canonical_form() {
        let before = NaiveDate::from_ymd_opt(-1, 3, 15).unwrap();
        let after = NaiveDate::from_ymd_opt(10000, 3, 15).unwrap();

        assert_eq!(MonthKey::of(before), Err(MonthKeyError::YearOutOfRange(-1)));
        assert_eq!(MonthKey::of(after), Err(MonthKeyError::YearOutOfRange(10000)));
    }

    #[test]
    fn of_round_trips_through_text() {
        let month = MonthKey::of(NaiveDate::from_ymd_opt(3, 1, 31).unwrap()).unwrap();
        assert_eq!(month.to_string(), "0003-01");
        assert_eq!(month.to_string().parse::<MonthKey>(), Ok(month));
    }

    #[test]
    fn first_day() {
        assert_eq!(
            key("2024-02").first_day(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(
            key("0000-12").first_day(),
            NaiveDate::from_ymd_opt(0, 12, 1).unwrap()
        );
    }

    #[test]
    fn contains_date() {
        let month = key("2024-02");
        assert!(month.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(month.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
    }

    #[test]
    fn sub_months_rolls_over_year() {
        let march = key("2024-03");
        assert_eq!(march.checked_sub_months(0), Some(march));
        assert_eq!(march.checked_sub_months(2), Some(key("2024-01")));
        assert_eq!(march.checked_sub_months(3), Some(key("2023-12")));
        assert_eq!(march.checked_sub_months(4), Some(key("2023-11")));
        assert_eq!(march.checked_sub_months(27), Some(key("2021-12")));
    }

    #[test]
    fn add_months_rolls_over_year() {
        assert_eq!(key("2023-11").checked_add_months(2), Some(key("2024-01")));
        assert_eq!(key("2023-12").checked_add_months(12), Some(key("2024-12")));
    }

    #[test]
    fn shift_beyond_supported_years() {
        assert_eq!(key("0000-02").checked_sub_months(2), None);
        assert_eq!(key("9999-12").checked_add_months(1), None);
    }

    #[test]
    fn ordering_is_chronological() {
        let mut months = vec![key("2024-01"), key("2023-12"), key("2023-02")];
        months.sort();
        assert_eq!(months, vec![key("2023-02"), key("2023-12"), key("2024-01")]);
    }

    #[test]
    fn serde_as_canonical_string() {
        let json = serde_json::to_string(&key("2024-06")).unwrap();
        assert_eq!(json, "\"2024-06\"");
        assert!(serde_json::from_str::<MonthKey>("\"2024-6\"").is_err());
    }
}
