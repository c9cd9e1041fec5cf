use crate::{category::Category, month::MonthKey};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, error};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::{btree_map, BTreeMap};
use thiserror::Error;
use uuid::Uuid;

/// A single spend, filed under one category on one calendar day
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: Uuid,
    amount: Decimal,
    description: String,
    category: Category,
    date: NaiveDate,
    created_at: DateTime<Utc>,
    owner_id: Uuid,
}

/// Spending limits for one owner for one month.
///
/// Limits per category are sparse: a category without an entry has no limit, which is
/// distinct from a limit of zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    id: Uuid,
    month: MonthKey,
    per_category_limits: CategoryAmounts,
    total_limit: Decimal,
    owner_id: Uuid,
}

/// An amount of money being saved towards by a target date.
///
/// `current_amount` can only grow through [`crate::fund`], which refuses any
/// increment that would take it past `target_amount`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    id: Uuid,
    name: String,
    target_amount: Decimal,
    current_amount: Decimal,
    start_date: NaiveDate,
    target_date: NaiveDate,
    // Free-form, unlike expense categories
    category: String,
    owner_id: Uuid,
}

/// A sparse mapping of category to amount.
///
/// An absent category means "nothing recorded": no limit set when used for budgets, no
/// spend when used for totals. Use [`CategoryAmounts::get`] to tell the two apart from an
/// explicit zero, or [`CategoryAmounts::amount_or_zero`] when they mean the same thing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryAmounts(BTreeMap<Category, Decimal>);

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("expense amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("budget limit cannot be negative, got {0}")]
    NegativeLimit(Decimal),
    #[error("budget limit for {0} cannot be negative, got {1}")]
    NegativeCategoryLimit(Category, Decimal),
    #[error("savings target must be greater than zero, got {0}")]
    NonPositiveTarget(Decimal),
    #[error("amount saved cannot be negative, got {0}")]
    NegativeCurrentAmount(Decimal),
    #[error("amount saved ({current}) exceeds the target ({target})")]
    CurrentExceedsTarget { current: Decimal, target: Decimal },
    #[error("target date {target} is before the start date {start}")]
    TargetBeforeStart { start: NaiveDate, target: NaiveDate },
}

impl Expense {
    pub fn new(
        owner_id: Uuid,
        amount: Decimal,
        category: Category,
        date: NaiveDate,
    ) -> Result<Self, RecordError> {
        check_amount(amount)?;

        Ok(Expense {
            id: Uuid::new_v4(),
            amount,
            description: String::new(),
            category,
            date,
            created_at: Utc::now(),
            owner_id,
        })
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn set_amount(&mut self, amount: Decimal) -> Result<(), RecordError> {
        check_amount(amount)?;
        self.amount = amount;
        Ok(())
    }

    pub fn set_description<S: Into<String>>(&mut self, description: S) {
        self.description = description.into();
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Budget {
    pub fn new(
        owner_id: Uuid,
        month: MonthKey,
        total_limit: Decimal,
    ) -> Result<Self, RecordError> {
        check_limit(total_limit)?;

        Ok(Budget {
            id: Uuid::new_v4(),
            month,
            per_category_limits: CategoryAmounts::default(),
            total_limit,
            owner_id,
        })
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Builder form of [`Budget::set_category_limit`]
    pub fn with_category_limit(
        mut self,
        category: Category,
        limit: Decimal,
    ) -> Result<Self, RecordError> {
        self.set_category_limit(category, limit)?;
        Ok(self)
    }

    pub fn set_total_limit(&mut self, limit: Decimal) -> Result<(), RecordError> {
        check_limit(limit)?;
        self.total_limit = limit;
        Ok(())
    }

    pub fn set_category_limit(
        &mut self,
        category: Category,
        limit: Decimal,
    ) -> Result<(), RecordError> {
        if limit < Decimal::ZERO {
            error!("refusing negative limit {} for {}", limit, category.id());
            return Err(RecordError::NegativeCategoryLimit(category, limit));
        }

        self.per_category_limits.set(category, limit);
        Ok(())
    }

    /// Removes the limit for `category`, returning what it was
    pub fn clear_category_limit(&mut self, category: Category) -> Option<Decimal> {
        self.per_category_limits.remove(category)
    }

    /// Returns the limit for `category`, or `None` if no limit has been set
    pub fn category_limit(&self, category: Category) -> Option<Decimal> {
        self.per_category_limits.get(category)
    }

    pub fn category_limits(&self) -> &CategoryAmounts {
        &self.per_category_limits
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn total_limit(&self) -> Decimal {
        self.total_limit
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl SavingsGoal {
    pub fn new<S: Into<String>>(
        owner_id: Uuid,
        name: S,
        target_amount: Decimal,
        current_amount: Decimal,
        start_date: NaiveDate,
        target_date: NaiveDate,
    ) -> Result<Self, RecordError> {
        if target_amount <= Decimal::ZERO {
            error!("refusing savings target of {}", target_amount);
            return Err(RecordError::NonPositiveTarget(target_amount));
        }
        if current_amount < Decimal::ZERO {
            error!("refusing negative amount saved {}", current_amount);
            return Err(RecordError::NegativeCurrentAmount(current_amount));
        }
        if current_amount > target_amount {
            error!(
                "refusing amount saved {} above target {}",
                current_amount, target_amount
            );
            return Err(RecordError::CurrentExceedsTarget {
                current: current_amount,
                target: target_amount,
            });
        }
        if target_date < start_date {
            error!("refusing target date {} before {}", target_date, start_date);
            return Err(RecordError::TargetBeforeStart {
                start: start_date,
                target: target_date,
            });
        }

        Ok(SavingsGoal {
            id: Uuid::new_v4(),
            name: name.into(),
            target_amount,
            current_amount,
            start_date,
            target_date,
            category: String::new(),
            owner_id,
        })
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = category.into();
        self
    }

    // Only funding may move the amount saved. The caller has already checked the new
    // amount against the target.
    pub(crate) fn with_current_amount(&self, current_amount: Decimal) -> Self {
        debug!(
            "goal {} moves from {} to {} of {}",
            self.id, self.current_amount, current_amount, self.target_amount
        );

        SavingsGoal {
            current_amount,
            ..self.clone()
        }
    }

    /// How much is still needed to reach the target
    pub fn remaining(&self) -> Decimal {
        self.target_amount - self.current_amount
    }

    pub fn is_complete(&self) -> bool {
        self.current_amount >= self.target_amount
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_amount(&self) -> Decimal {
        self.target_amount
    }

    pub fn current_amount(&self) -> Decimal {
        self.current_amount
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl CategoryAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<Decimal> {
        self.0.get(&category).copied()
    }

    pub fn amount_or_zero(&self, category: Category) -> Decimal {
        self.get(category).unwrap_or(Decimal::ZERO)
    }

    /// Sets the amount for `category`, replacing any previous amount
    pub fn set(&mut self, category: Category, amount: Decimal) {
        self.0.insert(category, amount);
    }

    /// Adds `amount` to the running amount for `category`, saturating at the Decimal
    /// range
    pub fn add(&mut self, category: Category, amount: Decimal) {
        let entry = self.0.entry(category).or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(amount);
    }

    pub fn remove(&mut self, category: Category) -> Option<Decimal> {
        self.0.remove(&category)
    }

    /// Sum of every amount present
    pub fn total(&self) -> Decimal {
        saturating_sum(self.0.values().copied())
    }

    /// Iterate over present categories in [`Category::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Category, Decimal)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Category, Decimal)> for CategoryAmounts {
    fn from_iter<I: IntoIterator<Item = (Category, Decimal)>>(iter: I) -> Self {
        let mut amounts = CategoryAmounts::new();
        for (category, amount) in iter {
            amounts.add(category, amount);
        }
        amounts
    }
}

impl IntoIterator for CategoryAmounts {
    type Item = (Category, Decimal);
    type IntoIter = btree_map::IntoIter<Category, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Sums `amounts`, pinning the result to the Decimal range instead of overflowing.
///
/// Derived totals have no error path, so a sum that cannot be represented reports the
/// nearest representable value.
pub(crate) fn saturating_sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(amount))
}

fn check_amount(amount: Decimal) -> Result<(), RecordError> {
    if amount <= Decimal::ZERO {
        error!("refusing expense amount of {}", amount);
        return Err(RecordError::NonPositiveAmount(amount));
    }
    Ok(())
}

fn check_limit(limit: Decimal) -> Result<(), RecordError> {
    if limit < Decimal::ZERO {
        error!("refusing budget limit of {}", limit);
        return Err(RecordError::NegativeLimit(limit));
    }
    Ok(())
}

// Stored records are deserialized into these plain field sets first, then run through
// the same checks as the constructors. A record that breaks an invariant never exists.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseFields {
    id: Uuid,
    amount: Decimal,
    #[serde(default)]
    description: String,
    category: Category,
    date: NaiveDate,
    created_at: DateTime<Utc>,
    owner_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetFields {
    id: Uuid,
    month: MonthKey,
    #[serde(default)]
    per_category_limits: CategoryAmounts,
    total_limit: Decimal,
    owner_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavingsGoalFields {
    id: Uuid,
    name: String,
    target_amount: Decimal,
    current_amount: Decimal,
    start_date: NaiveDate,
    target_date: NaiveDate,
    #[serde(default)]
    category: String,
    owner_id: Uuid,
}

impl<'de> Deserialize<'de> for Expense {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let f = ExpenseFields::deserialize(deserializer)?;
        let expense = Expense::new(f.owner_id, f.amount, f.category, f.date)
            .map_err(de::Error::custom)?;

        Ok(expense
            .with_id(f.id)
            .with_description(f.description)
            .with_created_at(f.created_at))
    }
}

impl<'de> Deserialize<'de> for Budget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let f = BudgetFields::deserialize(deserializer)?;
        let mut budget =
            Budget::new(f.owner_id, f.month, f.total_limit).map_err(de::Error::custom)?;

        for (category, limit) in f.per_category_limits {
            budget
                .set_category_limit(category, limit)
                .map_err(de::Error::custom)?;
        }

        Ok(budget.with_id(f.id))
    }
}

impl<'de> Deserialize<'de> for SavingsGoal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let f = SavingsGoalFields::deserialize(deserializer)?;
        let goal = SavingsGoal::new(
            f.owner_id,
            f.name,
            f.target_amount,
            f.current_amount,
            f.start_date,
            f.target_date,
        )
        .map_err(de::Error::custom)?;

        Ok(goal.with_id(f.id).with_category(f.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expense_non_positive_amount() {
        let owner = Uuid::new_v4();
        for amount in [Decimal::ZERO, dec!(-0.01)] {
            let result = Expense::new(owner, amount, Category::Food, date(2024, 1, 1));
            assert_eq!(result.err(), Some(RecordError::NonPositiveAmount(amount)));
        }
    }

    #[test]
    fn expense_update_keeps_identity() {
        let day = date(2024, 1, 1);
        let mut expense = Expense::new(Uuid::new_v4(), dec!(12.50), Category::Food, day)
            .unwrap()
            .with_description("lunch");
        let id = expense.id();

        expense.set_amount(dec!(13)).unwrap();
        expense.set_category(Category::Entertainment);
        assert_eq!(expense.id(), id);
        assert_eq!(expense.amount(), dec!(13));
        assert_eq!(expense.category(), Category::Entertainment);
        assert_eq!(expense.description(), "lunch");

        // A rejected update leaves the expense untouched
        assert!(expense.set_amount(dec!(-1)).is_err());
        assert_eq!(expense.amount(), dec!(13));
    }

    #[test]
    fn budget_limits() {
        let month = "2024-06".parse().unwrap();
        assert_eq!(
            Budget::new(Uuid::new_v4(), month, dec!(-1)).err(),
            Some(RecordError::NegativeLimit(dec!(-1)))
        );

        let mut budget = Budget::new(Uuid::new_v4(), month, Decimal::ZERO)
            .unwrap()
            .with_category_limit(Category::Food, dec!(200))
            .unwrap();
        assert_eq!(budget.category_limit(Category::Food), Some(dec!(200)));
        assert_eq!(budget.category_limit(Category::Housing), None);

        assert_eq!(
            budget.set_category_limit(Category::Housing, dec!(-5)),
            Err(RecordError::NegativeCategoryLimit(Category::Housing, dec!(-5)))
        );
        assert_eq!(budget.category_limit(Category::Housing), None);

        // An explicit zero limit is still a limit
        budget.set_category_limit(Category::Gifts, Decimal::ZERO).unwrap();
        assert_eq!(budget.category_limit(Category::Gifts), Some(Decimal::ZERO));

        assert_eq!(budget.clear_category_limit(Category::Food), Some(dec!(200)));
        assert_eq!(budget.category_limit(Category::Food), None);
    }

    #[test]
    fn savings_goal_invariants() {
        let owner = Uuid::new_v4();
        let start = date(2024, 1, 1);
        let end = date(2024, 12, 31);

        assert_eq!(
            SavingsGoal::new(owner, "car", Decimal::ZERO, Decimal::ZERO, start, end).err(),
            Some(RecordError::NonPositiveTarget(Decimal::ZERO))
        );
        assert_eq!(
            SavingsGoal::new(owner, "car", dec!(100), dec!(-1), start, end).err(),
            Some(RecordError::NegativeCurrentAmount(dec!(-1)))
        );
        assert_eq!(
            SavingsGoal::new(owner, "car", dec!(100), dec!(101), start, end).err(),
            Some(RecordError::CurrentExceedsTarget {
                current: dec!(101),
                target: dec!(100)
            })
        );
        assert_eq!(
            SavingsGoal::new(owner, "car", dec!(100), Decimal::ZERO, end, start).err(),
            Some(RecordError::TargetBeforeStart {
                start: end,
                target: start
            })
        );

        let goal = SavingsGoal::new(owner, "car", dec!(100), dec!(100), start, start).unwrap();
        assert!(goal.is_complete());
        assert_eq!(goal.remaining(), Decimal::ZERO);
    }

    #[test]
    fn category_amounts_absent_vs_zero() {
        let mut amounts = CategoryAmounts::new();
        amounts.add(Category::Food, dec!(10));
        amounts.add(Category::Food, dec!(2.5));
        amounts.set(Category::Debt, Decimal::ZERO);

        assert_eq!(amounts.get(Category::Food), Some(dec!(12.5)));
        assert_eq!(amounts.get(Category::Debt), Some(Decimal::ZERO));
        assert_eq!(amounts.get(Category::Other), None);
        assert_eq!(amounts.amount_or_zero(Category::Other), Decimal::ZERO);
        assert_eq!(amounts.total(), dec!(12.5));
        assert_eq!(amounts.len(), 2);
    }

    #[test]
    fn category_amounts_saturate() {
        let mut amounts = CategoryAmounts::new();
        amounts.add(Category::Food, Decimal::MAX);
        amounts.add(Category::Food, dec!(1));
        amounts.set(Category::Housing, Decimal::MAX);

        assert_eq!(amounts.get(Category::Food), Some(Decimal::MAX));
        assert_eq!(amounts.total(), Decimal::MAX);
    }

    #[test]
    fn category_amounts_iterate_in_category_order() {
        let amounts: CategoryAmounts = vec![
            (Category::Other, dec!(1)),
            (Category::Housing, dec!(2)),
            (Category::Food, dec!(3)),
            (Category::Housing, dec!(4)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            amounts.iter().collect::<Vec<_>>(),
            vec![
                (Category::Housing, dec!(6)),
                (Category::Food, dec!(3)),
                (Category::Other, dec!(1)),
            ]
        );
    }

    #[test]
    fn budget_record_shape() {
        let budget = Budget::new(Uuid::nil(), "2024-06".parse().unwrap(), dec!(1000))
            .unwrap()
            .with_id(Uuid::nil())
            .with_category_limit(Category::Food, dec!(200))
            .unwrap();

        let json = serde_json::to_value(&budget).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "month": "2024-06",
                "perCategoryLimits": { "food": "200" },
                "totalLimit": "1000",
                "ownerId": "00000000-0000-0000-0000-000000000000",
            })
        );

        let back: Budget = serde_json::from_value(json).unwrap();
        assert_eq!(back, budget);
    }

    #[test]
    fn stored_records_are_validated() {
        let expense = serde_json::json!({
            "id": Uuid::nil(),
            "amount": "0",
            "category": "food",
            "date": "2024-06-01",
            "createdAt": "2024-06-01T10:00:00Z",
            "ownerId": Uuid::nil(),
        });
        assert!(serde_json::from_value::<Expense>(expense).is_err());

        let goal = serde_json::json!({
            "id": Uuid::nil(),
            "name": "holiday",
            "targetAmount": "100",
            "currentAmount": "120",
            "startDate": "2024-01-01",
            "targetDate": "2024-12-01",
            "ownerId": Uuid::nil(),
        });
        assert!(serde_json::from_value::<SavingsGoal>(goal).is_err());

        let budget = serde_json::json!({
            "id": Uuid::nil(),
            "month": "2024-6",
            "totalLimit": "100",
            "ownerId": Uuid::nil(),
        });
        assert!(serde_json::from_value::<Budget>(budget).is_err());
    }

    #[test]
    fn stored_expense_keeps_identity() {
        let json = serde_json::json!({
            "id": "6f2b6d0e-8a8c-4c1e-9a55-0a9d1f4b2c3d",
            "amount": "42.10",
            "description": "train",
            "category": "transportation",
            "date": "2024-06-03",
            "createdAt": "2024-06-03T08:15:00Z",
            "ownerId": Uuid::nil(),
        });
        let expense: Expense = serde_json::from_value(json).unwrap();

        assert_eq!(
            expense.id().to_string(),
            "6f2b6d0e-8a8c-4c1e-9a55-0a9d1f4b2c3d"
        );
        assert_eq!(expense.amount(), dec!(42.10));
        assert_eq!(expense.category(), Category::Transportation);
        assert_eq!(expense.date(), date(2024, 6, 3));
    }
}
