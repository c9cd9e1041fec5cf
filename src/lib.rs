//! Derived views over a personal expense ledger: monthly totals, category breakdowns,
//! budget and savings progress, and a rolling six month summary.
//!
//! Everything here is a pure function of the records passed in. Storage and sign-in
//! belong to the caller, see [`RecordSource`] and [`SessionProvider`].

mod aggregate;
mod category;
mod ledger;
mod month;
mod progress;
mod record;
mod summary;

pub use aggregate::{
    category_total, category_totals, expenses_in_month, monthly_summary, monthly_total,
    total_spent, MonthlyTotal,
};
pub use category::{Category, CategoryError};
pub use ledger::{Ledger, LedgerError, RecordSource, SessionProvider};
pub use month::{MonthKey, MonthKeyError};
pub use progress::{
    budget_progress, budget_progress_for, category_breakdown, category_progress, fund,
    is_over_budget, remaining_budget, savings_progress, CategoryProgress, FundingError,
};
pub use record::{Budget, CategoryAmounts, Expense, RecordError, SavingsGoal};
pub use summary::{
    average_monthly_spend, highest_spending_month, lowest_spending_month, rolling_summary,
    ROLLING_WINDOW_MONTHS,
};
