use crate::{
    aggregate::{monthly_summary, MonthlyTotal},
    month::MonthKey,
    record::{saturating_sum, Expense},
};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

/// The number of months covered by a rolling summary, including the current month.
pub const ROLLING_WINDOW_MONTHS: u32 = 6;

/// Monthly totals for the month containing `now` and the five months before it, oldest
/// first.
///
/// This is always rebuilt from the full expense collection; months without expenses are
/// included with a zero total.
///
/// Only months within the years 0000 - 9999 are summarised. The summary is empty when
/// `now` falls outside that range, and is cut short when `now` is within the first five
/// months of year 0000.
pub fn rolling_summary(expenses: &[Expense], now: NaiveDate) -> Vec<MonthlyTotal> {
    let current = match MonthKey::of(now) {
        Ok(month) => month,
        Err(e) => {
            warn!("no rolling summary for {}: {}", now, e);
            return Vec::new();
        }
    };
    let mut summary = Vec::with_capacity(ROLLING_WINDOW_MONTHS as usize);

    // Walk backwards from the current month, then flip into chronological order
    for offset in 0..ROLLING_WINDOW_MONTHS {
        match current.checked_sub_months(offset) {
            Some(month) => summary.push(monthly_summary(expenses, month)),
            None => warn!("no month {} months before {}", offset, current),
        }
    }
    summary.reverse();

    debug!(
        "rolling summary {} - {} over {} expenses",
        summary.first().map(|m| m.month.to_string()).unwrap_or_default(),
        current,
        expenses.len()
    );

    summary
}

/// The month with the highest spending. Ties go to the earliest month.
pub fn highest_spending_month(summary: &[MonthlyTotal]) -> Option<&MonthlyTotal> {
    summary.iter().fold(None, |best, m| match best {
        Some(b) if b.total >= m.total => Some(b),
        _ => Some(m),
    })
}

/// The month with the lowest spending, ignoring months where nothing was spent. Ties go
/// to the earliest month.
///
/// A month without expenses usually means nothing was recorded rather than nothing was
/// spent, so it is not considered a candidate.
pub fn lowest_spending_month(summary: &[MonthlyTotal]) -> Option<&MonthlyTotal> {
    summary
        .iter()
        .filter(|m| !m.is_empty())
        .fold(None, |best, m| match best {
            Some(b) if b.total <= m.total => Some(b),
            _ => Some(m),
        })
}

/// Mean spending per month across the summary, counting months with no expenses
pub fn average_monthly_spend(summary: &[MonthlyTotal]) -> Decimal {
    if summary.is_empty() {
        return Decimal::ZERO;
    }

    saturating_sum(summary.iter().map(|m| m.total)) / Decimal::from(summary.len())
}
