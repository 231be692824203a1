// Lifeboard/backend-api/src/stats.rs
//! Derived statistics over owner-scoped snapshots.
//!
//! Everything here is a pure fold over rows already loaded by a handler;
//! no function touches the database.
use crate::models::{MealPlan, MealProgress, Task, Transaction};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
    #[default]
    All,
}

impl Period {
    /// Inclusive lower bound of the period, `None` for `All`.
    pub fn start_boundary(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Week => today.checked_sub_signed(Duration::days(7)),
            Period::Month => today.checked_sub_months(Months::new(1)),
            Period::Quarter => today.checked_sub_months(Months::new(3)),
            Period::Year => today.checked_sub_months(Months::new(12)),
            Period::All => None,
        }
    }

    fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.start_boundary(today) {
            Some(start) => date >= start,
            None => true,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct StatsQuery {
    #[serde(default)]
    pub period: Period,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 * 100.0 / whole as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// --- Tasks ---

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub total: usize,
    pub completed: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskStats {
    pub period: Period,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: f64,
    pub by_category: BTreeMap<String, CategoryBreakdown>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub overdue: usize,
    pub due_today: usize,
    /// Minutes still planned on incomplete tasks.
    pub pending_time_estimate: i64,
}

pub fn task_stats(tasks: &[Task], period: Period, today: NaiveDate) -> TaskStats {
    let mut stats = TaskStats {
        period,
        total: 0,
        completed: 0,
        pending: 0,
        completion_rate: 0.0,
        by_category: BTreeMap::new(),
        by_priority: BTreeMap::new(),
        by_type: BTreeMap::new(),
        overdue: 0,
        due_today: 0,
        pending_time_estimate: 0,
    };

    for task in tasks
        .iter()
        .filter(|t| period.contains(t.created_at.date_naive(), today))
    {
        stats.total += 1;

        let category = stats.by_category.entry(task.category.clone()).or_default();
        category.total += 1;
        *stats.by_priority.entry(task.priority.clone()).or_default() += 1;
        *stats.by_type.entry(task.task_type.clone()).or_default() += 1;

        if task.completed {
            stats.completed += 1;
            category.completed += 1;
            continue;
        }

        match task.due_date {
            Some(due) if due < today => stats.overdue += 1,
            Some(due) if due == today => stats.due_today += 1,
            _ => {}
        }
        stats.pending_time_estimate += i64::from(task.time_estimate.unwrap_or(0));
    }

    stats.pending = stats.total - stats.completed;
    stats.completion_rate = percentage(stats.completed, stats.total);
    stats
}

// --- Transactions ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BudgetDelta {
    pub current_month: String,
    pub previous_month: String,
    pub current_expenses: Decimal,
    pub previous_expenses: Decimal,
    pub delta: Decimal,
    /// `None` when nothing was spent in the previous month.
    pub change_percentage: Option<f64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TransactionStats {
    pub period: Period,
    pub count: usize,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub savings_rate: f64,
    pub recurring_income: Decimal,
    pub recurring_expenses: Decimal,
    pub income_by_category: BTreeMap<String, Decimal>,
    pub expenses_by_category: BTreeMap<String, Decimal>,
    pub monthly: Vec<MonthlyAggregate>,
    pub budget: BudgetDelta,
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn transaction_stats(
    transactions: &[Transaction],
    period: Period,
    today: NaiveDate,
) -> TransactionStats {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut recurring_income = Decimal::ZERO;
    let mut recurring_expenses = Decimal::ZERO;
    let mut income_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut expenses_by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut monthly: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    let mut count = 0;

    for tx in transactions
        .iter()
        .filter(|t| period.contains(t.transaction_date, today))
    {
        count += 1;
        let month = monthly.entry(month_key(tx.transaction_date)).or_default();

        if tx.is_income() {
            total_income += tx.amount;
            month.0 += tx.amount;
            *income_by_category.entry(tx.category.clone()).or_default() += tx.amount;
            if tx.recurring {
                recurring_income += tx.amount;
            }
        } else if tx.is_expense() {
            total_expenses += tx.amount;
            month.1 += tx.amount;
            *expenses_by_category.entry(tx.category.clone()).or_default() += tx.amount;
            if tx.recurring {
                recurring_expenses += tx.amount;
            }
        }
    }

    let balance = total_income - total_expenses;
    let savings_rate = if total_income.is_zero() {
        0.0
    } else {
        (balance * Decimal::ONE_HUNDRED / total_income)
            .to_f64()
            .map(round2)
            .unwrap_or(0.0)
    };

    TransactionStats {
        period,
        count,
        total_income,
        total_expenses,
        balance,
        savings_rate,
        recurring_income,
        recurring_expenses,
        income_by_category,
        expenses_by_category,
        monthly: monthly
            .into_iter()
            .map(|(month, (income, expenses))| MonthlyAggregate {
                month,
                income,
                expenses,
                net: income - expenses,
            })
            .collect(),
        budget: budget_delta(transactions, today),
    }
}

/// Current calendar month's expenses against the previous month's.
pub fn budget_delta(transactions: &[Transaction], today: NaiveDate) -> BudgetDelta {
    let current_month = month_key(today);
    let previous_month = today
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .map(month_key)
        .unwrap_or_else(|| current_month.clone());

    let spent_in = |month: &str| -> Decimal {
        transactions
            .iter()
            .filter(|t| t.is_expense() && month_key(t.transaction_date) == month)
            .map(|t| t.amount)
            .sum()
    };

    let current_expenses = spent_in(&current_month);
    let previous_expenses = spent_in(&previous_month);
    let delta = current_expenses - previous_expenses;
    let change_percentage = if previous_expenses.is_zero() {
        None
    } else {
        (delta * Decimal::ONE_HUNDRED / previous_expenses)
            .to_f64()
            .map(round2)
    };

    BudgetDelta {
        current_month,
        previous_month,
        current_expenses,
        previous_expenses,
        delta,
        change_percentage,
    }
}

// --- Meals ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MealSlotStatus {
    pub slot: String,
    pub meal_name: String,
    pub time: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MealDaySummary {
    pub date: NaiveDate,
    pub slots: Vec<MealSlotStatus>,
    pub completed: usize,
    pub total: usize,
    pub completion_rate: f64,
}

/// Per-slot completion for one day. Progress rows for slots that are no
/// longer in the plan are ignored.
pub fn meal_day_summary(
    plan: &MealPlan,
    progress: &[MealProgress],
    date: NaiveDate,
) -> MealDaySummary {
    let mut slots: Vec<MealSlotStatus> = plan
        .iter()
        .map(|(slot, meal)| {
            let record = progress
                .iter()
                .find(|p| p.progress_date == date && &p.meal_slot == slot);
            MealSlotStatus {
                slot: slot.clone(),
                meal_name: meal.name.clone(),
                time: meal.time.clone(),
                completed: record.map(|p| p.completed).unwrap_or(false),
                completed_at: record.and_then(|p| p.completed_at),
            }
        })
        .collect();
    slots.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.slot.cmp(&b.slot)));

    let completed = slots.iter().filter(|s| s.completed).count();
    let total = slots.len();
    MealDaySummary {
        date,
        slots,
        completed,
        total,
        completion_rate: percentage(completed, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealDefinition, TaskType};
    use crate::recurrence::tests::task;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2026, 10, 17)
    }

    fn tx(kind: &str, amount: i64, category: &str, date: NaiveDate) -> Transaction {
        let created = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            kind: kind.to_string(),
            amount: Decimal::new(amount, 0),
            description: String::new(),
            category: category.to_string(),
            transaction_date: date,
            recurring: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn empty_collection_has_zero_rate() {
        let stats = task_stats(&[], Period::All, today());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.completed + stats.pending, stats.total);
    }

    #[test]
    fn completed_plus_pending_is_total() {
        let mut tasks: Vec<Task> = (0..7).map(|_| task(TaskType::Normal, None)).collect();
        tasks[0].completed = true;
        tasks[3].completed = true;
        let stats = task_stats(&tasks, Period::All, today());
        assert_eq!(stats.total, 7);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 5);
        assert_eq!(stats.completion_rate, 28.57);
    }

    #[test]
    fn overdue_counts_only_incomplete_tasks_due_before_today() {
        let mut done_late = task(TaskType::Normal, Some(d(2026, 10, 10)));
        done_late.completed = true;
        let tasks = vec![
            task(TaskType::Normal, Some(d(2026, 10, 10))),
            task(TaskType::Normal, Some(today())),
            task(TaskType::Normal, Some(d(2026, 10, 20))),
            task(TaskType::Normal, None),
            done_late,
        ];
        let stats = task_stats(&tasks, Period::All, today());
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.due_today, 1);
    }

    #[test]
    fn breakdowns_and_pending_estimate() {
        let mut a = task(TaskType::Daily, None);
        a.priority = "high".to_string();
        let mut b = task(TaskType::Normal, None);
        b.category = "work".to_string();
        b.time_estimate = Some(45);
        b.completed = true;
        let c = task(TaskType::Normal, None);

        let stats = task_stats(&[a, b, c], Period::All, today());
        assert_eq!(stats.by_priority["high"], 1);
        assert_eq!(stats.by_priority["medium"], 2);
        assert_eq!(stats.by_type["daily"], 1);
        assert_eq!(
            stats.by_category["work"],
            CategoryBreakdown {
                total: 1,
                completed: 1
            }
        );
        assert_eq!(stats.by_category["health"].total, 2);
        // the completed 45-minute task does not count
        assert_eq!(stats.pending_time_estimate, 30);
    }

    #[test]
    fn period_filters_on_creation_date() {
        let mut old = task(TaskType::Normal, None);
        old.created_at = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut recent = task(TaskType::Normal, None);
        recent.created_at = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();

        let tasks = vec![old, recent];
        assert_eq!(task_stats(&tasks, Period::Week, today()).total, 1);
        assert_eq!(task_stats(&tasks, Period::Quarter, today()).total, 1);
        assert_eq!(task_stats(&tasks, Period::Year, today()).total, 2);
    }

    #[test]
    fn period_boundaries() {
        assert_eq!(Period::Week.start_boundary(today()), Some(d(2026, 10, 10)));
        assert_eq!(Period::Month.start_boundary(today()), Some(d(2026, 9, 17)));
        assert_eq!(Period::Quarter.start_boundary(today()), Some(d(2026, 7, 17)));
        assert_eq!(Period::Year.start_boundary(today()), Some(d(2025, 10, 17)));
        assert_eq!(Period::All.start_boundary(today()), None);
    }

    #[test]
    fn transaction_totals_and_categories() {
        let txs = vec![
            tx("income", 3000, "salary", d(2026, 10, 1)),
            tx("expense", 900, "housing", d(2026, 10, 2)),
            tx("expense", 300, "food", d(2026, 10, 9)),
            tx("expense", 200, "food", d(2026, 9, 20)),
        ];
        let stats = transaction_stats(&txs, Period::All, today());
        assert_eq!(stats.count, 4);
        assert_eq!(stats.total_income, Decimal::new(3000, 0));
        assert_eq!(stats.total_expenses, Decimal::new(1400, 0));
        assert_eq!(stats.balance, Decimal::new(1600, 0));
        assert_eq!(stats.expenses_by_category["food"], Decimal::new(500, 0));
        assert_eq!(stats.savings_rate, 53.33);

        let months: Vec<&str> = stats.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2026-09", "2026-10"]);
        assert_eq!(stats.monthly[1].net, Decimal::new(1800, 0));
    }

    #[test]
    fn savings_rate_is_zero_without_income() {
        let txs = vec![tx("expense", 50, "food", today())];
        let stats = transaction_stats(&txs, Period::All, today());
        assert_eq!(stats.savings_rate, 0.0);
        assert_eq!(stats.balance, Decimal::new(-50, 0));
    }

    #[test]
    fn budget_delta_compares_with_previous_month() {
        let txs = vec![
            tx("expense", 150, "food", d(2026, 10, 3)),
            tx("expense", 100, "food", d(2026, 9, 28)),
            tx("income", 999, "salary", d(2026, 9, 1)),
        ];
        let budget = budget_delta(&txs, today());
        assert_eq!(budget.previous_month, "2026-09");
        assert_eq!(budget.delta, Decimal::new(50, 0));
        assert_eq!(budget.change_percentage, Some(50.0));

        let january = budget_delta(&[], d(2027, 1, 4));
        assert_eq!(january.previous_month, "2026-12");
        assert_eq!(january.change_percentage, None);
    }

    #[test]
    fn meal_summary_follows_plan_slots() {
        let mut plan = MealPlan::new();
        plan.insert(
            "lunch".to_string(),
            MealDefinition {
                name: "Salad".to_string(),
                time: "12:30".to_string(),
                items: vec![],
            },
        );
        plan.insert(
            "breakfast".to_string(),
            MealDefinition {
                name: "Oats".to_string(),
                time: "07:30".to_string(),
                items: vec!["oats".to_string(), "milk".to_string()],
            },
        );
        let done = MealProgress {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            meal_slot: "breakfast".to_string(),
            progress_date: today(),
            completed: true,
            completed_at: Some(Utc::now()),
        };
        let stale = MealProgress {
            meal_slot: "snack".to_string(),
            ..done.clone()
        };
        let yesterday = MealProgress {
            meal_slot: "lunch".to_string(),
            progress_date: d(2026, 10, 16),
            ..done.clone()
        };

        let summary = meal_day_summary(&plan, &[done, stale, yesterday], today());
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.completion_rate, 50.0);
        assert_eq!(summary.slots[0].slot, "breakfast");
        assert!(!summary.slots[1].completed);
    }
}
