use crate::{
    aggregate::{monthly_summary, MonthlyTotal},
    category::Category,
    month::MonthKey,
    progress::{self, FundingError},
    record::{Budget, Expense, SavingsGoal},
    summary::rolling_summary,
};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Supplies the identity of whoever is signed in, if anyone
pub trait SessionProvider {
    fn current_owner(&self) -> Option<Uuid>;
}

/// Supplies the stored records belonging to an owner.
///
/// Implementations own all I/O. The ledger only ever reads from them.
pub trait RecordSource {
    type Error;

    fn expenses(&self, owner: Uuid) -> Result<Vec<Expense>, Self::Error>;
    fn budgets(&self, owner: Uuid) -> Result<Vec<Budget>, Self::Error>;
    fn savings_goals(&self, owner: Uuid) -> Result<Vec<SavingsGoal>, Self::Error>;
}

/// An in-memory snapshot of one owner's records.
///
/// Changes made through the persistence layer are merged in with the `upsert_*` and
/// `remove_*` methods; the last write for a given id wins. Every query recomputes from
/// the snapshot as it stands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    owner: Option<Uuid>,
    expenses: Vec<Expense>,
    budgets: Vec<Budget>,
    goals: Vec<SavingsGoal>,
}

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("no savings goal with id {0}")]
    GoalNotFound(Uuid),
    #[error("could not fund savings goal")]
    Funding(#[from] FundingError),
}

impl SessionProvider for Option<Uuid> {
    fn current_owner(&self) -> Option<Uuid> {
        *self
    }
}

impl Ledger {
    /// An empty ledger for `owner`
    pub fn new(owner: Uuid) -> Self {
        Ledger {
            owner: Some(owner),
            ..Default::default()
        }
    }

    /// Builds a ledger for `owner` from full record collections, discarding any records
    /// that belong to someone else.
    pub fn for_owner<E, B, G>(owner: Uuid, expenses: E, budgets: B, goals: G) -> Self
    where
        E: IntoIterator<Item = Expense>,
        B: IntoIterator<Item = Budget>,
        G: IntoIterator<Item = SavingsGoal>,
    {
        let mut ledger = Ledger::new(owner);

        for expense in expenses {
            ledger.upsert_expense(expense);
        }
        for budget in budgets {
            ledger.upsert_budget(budget);
        }
        for goal in goals {
            ledger.upsert_goal(goal);
        }

        debug!(
            "ledger for {} holds {} expenses, {} budgets, {} goals",
            owner,
            ledger.expenses.len(),
            ledger.budgets.len(),
            ledger.goals.len()
        );

        ledger
    }

    /// Loads the signed-in owner's records. Nobody signed in yields an empty ledger
    /// without touching `source`.
    pub fn load<P, S>(session: &P, source: &S) -> Result<Self, S::Error>
    where
        P: SessionProvider,
        S: RecordSource,
    {
        match session.current_owner() {
            Some(owner) => Ok(Ledger::for_owner(
                owner,
                source.expenses(owner)?,
                source.budgets(owner)?,
                source.savings_goals(owner)?,
            )),
            None => {
                debug!("no session, ledger is empty");
                Ok(Ledger::default())
            }
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    pub fn savings_goals(&self) -> &[SavingsGoal] {
        &self.goals
    }

    /// Inserts or replaces an expense by id. Returns `false` if the expense belongs to a
    /// different owner and was ignored.
    pub fn upsert_expense(&mut self, expense: Expense) -> bool {
        if !self.owns(expense.owner_id()) {
            return false;
        }

        match self.expenses.iter_mut().find(|e| e.id() == expense.id()) {
            Some(existing) => *existing = expense,
            None => self.expenses.push(expense),
        }
        true
    }

    /// Inserts or replaces a budget. An owner has at most one budget per month, so this
    /// also replaces a budget with a different id for the same month.
    pub fn upsert_budget(&mut self, budget: Budget) -> bool {
        if !self.owns(budget.owner_id()) {
            return false;
        }

        self.budgets
            .retain(|b| b.id() != budget.id() && b.month() != budget.month());
        self.budgets.push(budget);
        true
    }

    pub fn upsert_goal(&mut self, goal: SavingsGoal) -> bool {
        if !self.owns(goal.owner_id()) {
            return false;
        }

        match self.goals.iter_mut().find(|g| g.id() == goal.id()) {
            Some(existing) => *existing = goal,
            None => self.goals.push(goal),
        }
        true
    }

    pub fn remove_expense(&mut self, id: Uuid) -> Option<Expense> {
        let index = self.expenses.iter().position(|e| e.id() == id)?;
        Some(self.expenses.remove(index))
    }

    pub fn remove_budget(&mut self, id: Uuid) -> Option<Budget> {
        let index = self.budgets.iter().position(|b| b.id() == id)?;
        Some(self.budgets.remove(index))
    }

    pub fn remove_goal(&mut self, id: Uuid) -> Option<SavingsGoal> {
        let index = self.goals.iter().position(|g| g.id() == id)?;
        Some(self.goals.remove(index))
    }

    pub fn budget_for(&self, month: MonthKey) -> Option<&Budget> {
        self.budgets.iter().find(|b| b.month() == month)
    }

    pub fn goal(&self, id: Uuid) -> Option<&SavingsGoal> {
        self.goals.iter().find(|g| g.id() == id)
    }

    pub fn monthly_summary(&self, month: MonthKey) -> MonthlyTotal {
        monthly_summary(&self.expenses, month)
    }

    pub fn rolling_summary(&self, now: NaiveDate) -> Vec<MonthlyTotal> {
        rolling_summary(&self.expenses, now)
    }

    /// Progress against the budget for `month`, or `None` if no budget has been set
    pub fn budget_progress(&self, month: MonthKey) -> Option<Decimal> {
        self.budget_for(month)
            .map(|b| progress::budget_progress_for(b, &self.expenses))
    }

    pub fn category_progress(&self, month: MonthKey, category: Category) -> Option<Decimal> {
        self.budget_for(month)
            .map(|b| progress::category_progress(b, &self.expenses, category))
    }

    /// Funds the goal with `id` and stores the result in this snapshot. The snapshot is
    /// unchanged if funding is refused.
    pub fn fund_goal(
        &mut self,
        id: Uuid,
        increment: Decimal,
    ) -> Result<&SavingsGoal, LedgerError> {
        let index = self
            .goals
            .iter()
            .position(|g| g.id() == id)
            .ok_or(LedgerError::GoalNotFound(id))?;

        let funded = progress::fund(&self.goals[index], increment)?;
        self.goals[index] = funded;
        Ok(&self.goals[index])
    }

    fn owns(&self, owner_id: Uuid) -> bool {
        if self.owner == Some(owner_id) {
            return true;
        }

        warn!(
            "ignoring record for owner {} in ledger for {:?}",
            owner_id, self.owner
        );
        false
    }
}
