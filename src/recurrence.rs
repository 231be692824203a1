// Lifeboard/backend-api/src/recurrence.rs
//! Regeneration cadence for recurring tasks.
//!
//! Completing a daily, weekly, monthly or meal task schedules a fresh,
//! incomplete copy at the next due date. Meal tasks stop regenerating once
//! their `recurrence_end` is passed.
use crate::models::{NewTask, Task, TaskType};
use chrono::{Datelike, Duration, Months, NaiveDate};

pub fn next_due_date(task_type: TaskType, from: NaiveDate) -> Option<NaiveDate> {
    match task_type {
        TaskType::Normal => None,
        TaskType::Daily | TaskType::Meal => from.checked_add_signed(Duration::days(1)),
        TaskType::Weekly => from.checked_add_signed(Duration::days(7)),
        // chrono clamps Jan 31 + 1 month to the last day of February
        TaskType::Monthly => from.checked_add_months(Months::new(1)),
    }
}

/// Last calendar day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// The copy to insert after `task` is completed, if its type recurs.
pub fn next_occurrence(task: &Task, today: NaiveDate) -> Option<NewTask> {
    let base = task.due_date.unwrap_or(today);
    let due = next_due_date(task.kind(), base)?;

    if let Some(end) = task.recurrence_end {
        if due > end {
            return None;
        }
    }

    Some(NewTask {
        user_id: task.user_id,
        title: task.title.clone(),
        description: task.description.clone(),
        category: task.category.clone(),
        priority: task.priority.clone(),
        completed: false,
        due_date: Some(due),
        time_estimate: task.time_estimate,
        task_type: task.task_type.clone(),
        diet_id: task.diet_id,
        meal_slot: task.meal_slot.clone(),
        recurrence_end: task.recurrence_end,
    })
}

/// Whether `candidates` already hold the copy described by `next`.
///
/// Toggling a task off and on again must not schedule a second copy.
pub fn already_scheduled(next: &NewTask, candidates: &[Task]) -> bool {
    candidates.iter().any(|t| {
        t.user_id == next.user_id
            && t.title == next.title
            && t.task_type == next.task_type
            && t.due_date == next.due_date
    })
}
