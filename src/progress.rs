use crate::{
    aggregate::{category_totals, monthly_total},
    category::Category,
    record::{Budget, Expense, SavingsGoal},
};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

// Progress is expressed as a percentage. These are never clamped: a budget that is 40%
// overspent reports 140, so callers can tell it has been exceeded.
const PERCENT: Decimal = dec!(100);

#[derive(Error, Debug, PartialEq)]
pub enum FundingError {
    #[error("funding amount must be greater than zero, got {0}")]
    NonPositiveIncrement(Decimal),
    #[error("adding {increment} to {current} would exceed the target of {target}")]
    ExceedsTarget {
        current: Decimal,
        increment: Decimal,
        target: Decimal,
    },
}

/// Spending against the limit for one category of a budget
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub category: Category,
    pub limit: Decimal,
    pub spent: Decimal,
    pub progress: Decimal,
}

/// Returns `spent` as a percentage of `limit`, or zero if there is no limit to measure
/// against.
///
/// A percentage too large to represent saturates at `Decimal::MAX`, which still reads as
/// over budget.
pub fn budget_progress(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    // Multiply first to keep as much precision as possible. Amounts near the top of the
    // Decimal range only fit if we divide first.
    spent
        .checked_mul(PERCENT)
        .and_then(|s| s.checked_div(limit))
        .or_else(|| spent.checked_div(limit)?.checked_mul(PERCENT))
        .unwrap_or_else(|| {
            warn!("progress of {} against {} saturated", spent, limit);
            Decimal::MAX
        })
}

/// Percentage of the budget's total limit spent during the budget's month
pub fn budget_progress_for(budget: &Budget, expenses: &[Expense]) -> Decimal {
    budget_progress(monthly_total(expenses, budget.month()), budget.total_limit())
}

/// Percentage of one category's limit spent during the budget's month. Zero when the
/// budget sets no limit for `category`.
pub fn category_progress(budget: &Budget, expenses: &[Expense], category: Category) -> Decimal {
    match budget.category_limit(category) {
        Some(limit) => {
            let spent = category_totals(expenses, budget.month()).amount_or_zero(category);
            budget_progress(spent, limit)
        }
        None => Decimal::ZERO,
    }
}

/// Progress for every category the budget sets a limit for, in category order
pub fn category_breakdown(budget: &Budget, expenses: &[Expense]) -> Vec<CategoryProgress> {
    // Compute totals once rather than once per category
    let totals = category_totals(expenses, budget.month());

    budget
        .category_limits()
        .iter()
        .map(|(category, limit)| {
            let spent = totals.amount_or_zero(category);
            CategoryProgress {
                category,
                limit,
                spent,
                progress: budget_progress(spent, limit),
            }
        })
        .collect()
}

/// What is left of the budget's total limit. Negative once overspent.
pub fn remaining_budget(budget: &Budget, expenses: &[Expense]) -> Decimal {
    budget.total_limit() - monthly_total(expenses, budget.month())
}

pub fn is_over_budget(progress: Decimal) -> bool {
    progress > PERCENT
}

/// Percentage of the savings target reached so far
pub fn savings_progress(goal: &SavingsGoal) -> Decimal {
    budget_progress(goal.current_amount(), goal.target_amount())
}

/// Returns a copy of `goal` with `increment` added to the amount saved.
///
/// The goal is rejected, rather than partially funded, if the increment would take it
/// past its target.
pub fn fund(goal: &SavingsGoal, increment: Decimal) -> Result<SavingsGoal, FundingError> {
    if increment <= Decimal::ZERO {
        warn!("refusing to fund goal {} with {}", goal.id(), increment);
        return Err(FundingError::NonPositiveIncrement(increment));
    }

    // An increment too large to add is certainly past the target
    let funded = goal
        .current_amount()
        .checked_add(increment)
        .filter(|f| *f <= goal.target_amount());
    let funded = match funded {
        Some(f) => f,
        None => {
            warn!(
                "refusing to fund goal {}: {} + {} exceeds target {}",
                goal.id(),
                goal.current_amount(),
                increment,
                goal.target_amount()
            );
            return Err(FundingError::ExceedsTarget {
                current: goal.current_amount(),
                increment,
                target: goal.target_amount(),
            });
        }
    };

    debug!("funding goal {} with {}", goal.id(), increment);

    Ok(goal.with_current_amount(funded))
}
