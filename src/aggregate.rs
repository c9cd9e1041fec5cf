use crate::{
    category::Category,
    month::MonthKey,
    record::{saturating_sum, CategoryAmounts, Expense},
};
use log::{debug, trace};
use rust_decimal::Decimal;
use serde::Serialize;

/// Spending for one month, derived from the expense collection.
///
/// These are never stored or edited. Recompute whenever the expenses change.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: MonthKey,
    pub total: Decimal,
    pub per_category_totals: CategoryAmounts,
}

impl MonthlyTotal {
    /// A month with no spending
    pub fn empty(month: MonthKey) -> Self {
        MonthlyTotal {
            month,
            total: Decimal::ZERO,
            per_category_totals: CategoryAmounts::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == Decimal::ZERO
    }
}

/// Returns the expenses dated within `month`, in their original order
pub fn expenses_in_month(expenses: &[Expense], month: MonthKey) -> Vec<&Expense> {
    let matched: Vec<&Expense> = expenses
        .iter()
        .filter(|e| month.contains(e.date()))
        .collect();

    debug!(
        "{} of {} expenses fall in {}",
        matched.len(),
        expenses.len(),
        month
    );

    matched
}

/// Sum of every expense dated within `month`. Zero if there are none.
pub fn monthly_total(expenses: &[Expense], month: MonthKey) -> Decimal {
    saturating_sum(expenses_in_month(expenses, month).into_iter().map(Expense::amount))
}

/// Spending per category within `month`. Categories with no spending are absent.
pub fn category_totals(expenses: &[Expense], month: MonthKey) -> CategoryAmounts {
    let mut totals = CategoryAmounts::new();

    for expense in expenses_in_month(expenses, month) {
        trace!(
            "{}: {} {} on {}",
            month,
            expense.category().id(),
            expense.amount(),
            expense.date()
        );
        totals.add(expense.category(), expense.amount());
    }

    totals
}

/// Spending for a single category within `month`
pub fn category_total(expenses: &[Expense], month: MonthKey, category: Category) -> Decimal {
    saturating_sum(
        expenses_in_month(expenses, month)
            .into_iter()
            .filter(|e| e.category() == category)
            .map(Expense::amount),
    )
}

/// Builds the full [`MonthlyTotal`] for `month`
pub fn monthly_summary(expenses: &[Expense], month: MonthKey) -> MonthlyTotal {
    let per_category_totals = category_totals(expenses, month);

    // Every matched expense lands in exactly one category, so the category sum is the
    // month's total.
    MonthlyTotal {
        month,
        total: per_category_totals.total(),
        per_category_totals,
    }
}

/// Sum of every expense in the collection, regardless of date
pub fn total_spent(expenses: &[Expense]) -> Decimal {
    saturating_sum(expenses.iter().map(Expense::amount))
}
