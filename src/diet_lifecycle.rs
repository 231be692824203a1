// Lifeboard/backend-api/src/diet_lifecycle.rs
//! Planning side of the diet lifecycle.
//!
//! A user has at most one active diet. Installing a new one archives the
//! current diet into history and provisions one meal task per slot;
//! removing it archives as well. The handlers execute these plans against
//! the database; the functions here decide what must be written.
use crate::error_handler::ServiceError;
use crate::models::{
    CreateDietPayload, Diet, MealPlan, MealProgress, NewDiet, NewDietHistoryEntry, NewTask,
    Priority, TaskCategory, TaskType,
};
use crate::recurrence::end_of_month;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum DietLifecycleError {
    NoActiveDiet,
    InvalidDiet(String),
    UnknownMealSlot(String),
    CorruptMealPlan(String),
}

impl fmt::Display for DietLifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DietLifecycleError::NoActiveDiet => write!(f, "No active diet for this user"),
            DietLifecycleError::InvalidDiet(msg) => write!(f, "Invalid diet: {}", msg),
            DietLifecycleError::UnknownMealSlot(slot) => {
                write!(f, "Meal slot '{}' is not part of the active diet", slot)
            }
            DietLifecycleError::CorruptMealPlan(msg) => {
                write!(f, "Stored meal plan could not be read: {}", msg)
            }
        }
    }
}

impl From<DietLifecycleError> for ServiceError {
    fn from(error: DietLifecycleError) -> ServiceError {
        match error {
            DietLifecycleError::NoActiveDiet | DietLifecycleError::UnknownMealSlot(_) => {
                ServiceError::NotFound(error.to_string())
            }
            DietLifecycleError::InvalidDiet(_) => ServiceError::BadRequest(error.to_string()),
            DietLifecycleError::CorruptMealPlan(_) => {
                log::error!("{}", error);
                ServiceError::InternalServerError(error.to_string())
            }
        }
    }
}

/// Writes needed to install a new diet.
#[derive(Debug, Clone, PartialEq)]
pub struct DietReplacement {
    pub archive: Option<NewDietHistoryEntry>,
    /// Diet whose record and meal tasks are retired.
    pub retired_diet_id: Option<Uuid>,
    pub diet: NewDiet,
    pub meal_tasks: Vec<NewTask>,
    /// Day whose meal progress is cleared so the new plan starts unticked.
    pub reset_progress_on: NaiveDate,
}

/// Writes needed to remove the active diet.
#[derive(Debug, Clone, PartialEq)]
pub struct DietRemoval {
    pub archive: NewDietHistoryEntry,
    pub retired_diet_id: Uuid,
}

pub fn archive_entry(diet: &Diet, ended_at: DateTime<Utc>) -> NewDietHistoryEntry {
    NewDietHistoryEntry {
        user_id: diet.user_id,
        diet_id: diet.id,
        name: diet.name.clone(),
        objective: diet.objective.clone(),
        calorie_target: diet.calorie_target,
        protein_g: diet.protein_g,
        carbs_g: diet.carbs_g,
        fat_g: diet.fat_g,
        meals: diet.meals.clone(),
        started_at: diet.created_at,
        ended_at,
    }
}

fn validate(payload: &CreateDietPayload) -> Result<(), DietLifecycleError> {
    if payload.name.trim().is_empty() {
        return Err(DietLifecycleError::InvalidDiet(
            "name cannot be empty".to_string(),
        ));
    }
    if payload.meals.is_empty() {
        return Err(DietLifecycleError::InvalidDiet(
            "at least one meal slot is required".to_string(),
        ));
    }
    if let Some(slot) = payload.meals.keys().find(|slot| slot.trim().is_empty()) {
        return Err(DietLifecycleError::InvalidDiet(format!(
            "meal slot name '{}' is blank",
            slot
        )));
    }
    let targets = [
        ("calorie_target", payload.calorie_target),
        ("protein_g", payload.protein_g),
        ("carbs_g", payload.carbs_g),
        ("fat_g", payload.fat_g),
    ];
    if let Some((field, _)) = targets.iter().find(|(_, value)| *value < 0) {
        return Err(DietLifecycleError::InvalidDiet(format!(
            "{} cannot be negative",
            field
        )));
    }
    Ok(())
}

/// One meal task per slot, due `today` and recurring daily until month end.
pub fn provision_meal_tasks(
    user_id: Uuid,
    diet_id: Uuid,
    meals: &MealPlan,
    today: NaiveDate,
) -> Vec<NewTask> {
    let recurrence_end = end_of_month(today);
    meals
        .iter()
        .map(|(slot, meal)| {
            let mut description = format!("{} at {}", meal.name, meal.time);
            if !meal.items.is_empty() {
                description.push_str(": ");
                description.push_str(&meal.items.join(", "));
            }
            NewTask {
                user_id,
                title: format!("{} - {}", slot, meal.name),
                description: Some(description),
                category: TaskCategory::Health.as_str().to_string(),
                priority: Priority::Medium.as_str().to_string(),
                completed: false,
                due_date: Some(today),
                time_estimate: None,
                task_type: TaskType::Meal.as_str().to_string(),
                diet_id: Some(diet_id),
                meal_slot: Some(slot.clone()),
                recurrence_end: Some(recurrence_end),
            }
        })
        .collect()
}

pub fn plan_replacement(
    current: Option<&Diet>,
    payload: &CreateDietPayload,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<DietReplacement, DietLifecycleError> {
    validate(payload)?;

    let meals = serde_json::to_value(&payload.meals)
        .map_err(|e| DietLifecycleError::InvalidDiet(e.to_string()))?;
    let diet = NewDiet {
        id: Uuid::new_v4(),
        user_id,
        name: payload.name.trim().to_string(),
        objective: payload.objective.trim().to_string(),
        calorie_target: payload.calorie_target,
        protein_g: payload.protein_g,
        carbs_g: payload.carbs_g,
        fat_g: payload.fat_g,
        meals,
        active: true,
    };
    let today = now.date_naive();
    let meal_tasks = provision_meal_tasks(user_id, diet.id, &payload.meals, today);

    Ok(DietReplacement {
        archive: current.map(|d| archive_entry(d, now)),
        retired_diet_id: current.map(|d| d.id),
        diet,
        meal_tasks,
        reset_progress_on: today,
    })
}

pub fn plan_removal(
    current: Option<&Diet>,
    now: DateTime<Utc>,
) -> Result<DietRemoval, DietLifecycleError> {
    let diet = current.ok_or(DietLifecycleError::NoActiveDiet)?;
    Ok(DietRemoval {
        archive: archive_entry(diet, now),
        retired_diet_id: diet.id,
    })
}

/// Rejects toggles for slots the active diet does not define.
pub fn ensure_slot(diet: &Diet, slot: &str) -> Result<MealPlan, DietLifecycleError> {
    let plan = diet
        .meal_plan()
        .map_err(|e| DietLifecycleError::CorruptMealPlan(e.to_string()))?;
    if !plan.contains_key(slot) {
        return Err(DietLifecycleError::UnknownMealSlot(slot.to_string()));
    }
    Ok(plan)
}

/// New `(completed, completed_at)` for a slot after a toggle.
pub fn toggled_progress(
    existing: Option<&MealProgress>,
    now: DateTime<Utc>,
) -> (bool, Option<DateTime<Utc>>) {
    let completed = !existing.map(|p| p.completed).unwrap_or(false);
    (completed, completed.then_some(now))
}

/// `completed_at` to write after the flag was flipped in place; `None` when
/// the stored stamp already matches.
pub fn restamped_progress(
    flipped: &MealProgress,
    now: DateTime<Utc>,
) -> Option<Option<DateTime<Utc>>> {
    match (flipped.completed, flipped.completed_at) {
        (true, None) => Some(Some(now)),
        (false, Some(_)) => Some(None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealDefinition;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap()
    }

    fn payload(name: &str) -> CreateDietPayload {
        let mut meals = MealPlan::new();
        meals.insert(
            "breakfast".to_string(),
            MealDefinition {
                name: "Oats".to_string(),
                time: "07:30".to_string(),
                items: vec!["oats".to_string(), "banana".to_string()],
            },
        );
        meals.insert(
            "dinner".to_string(),
            MealDefinition {
                name: "Fish".to_string(),
                time: "19:00".to_string(),
                items: vec![],
            },
        );
        CreateDietPayload {
            name: name.to_string(),
            objective: "maintain".to_string(),
            calorie_target: 2200,
            protein_g: 140,
            carbs_g: 250,
            fat_g: 70,
            meals,
        }
    }

    fn installed(replacement: &DietReplacement) -> Diet {
        let d = &replacement.diet;
        Diet {
            id: d.id,
            user_id: d.user_id,
            name: d.name.clone(),
            objective: d.objective.clone(),
            calorie_target: d.calorie_target,
            protein_g: d.protein_g,
            carbs_g: d.carbs_g,
            fat_g: d.fat_g,
            meals: d.meals.clone(),
            active: d.active,
            created_at: Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn first_diet_archives_nothing() {
        let user = Uuid::new_v4();
        let plan = plan_replacement(None, &payload("Cut"), user, now()).unwrap();
        assert!(plan.archive.is_none());
        assert!(plan.retired_diet_id.is_none());
        assert!(plan.diet.active);
        assert_eq!(plan.diet.user_id, user);
    }

    #[test]
    fn second_diet_moves_first_into_history() {
        let user = Uuid::new_v4();
        let first = installed(&plan_replacement(None, &payload("Cut"), user, now()).unwrap());

        let second = plan_replacement(Some(&first), &payload("Bulk"), user, now()).unwrap();
        let archive = second.archive.as_ref().unwrap();
        assert_eq!(archive.diet_id, first.id);
        assert_eq!(archive.name, "Cut");
        assert_eq!(archive.started_at, first.created_at);
        assert_eq!(archive.ended_at, now());
        assert_eq!(second.retired_diet_id, Some(first.id));
        assert_ne!(second.diet.id, first.id);
        assert_eq!(second.diet.name, "Bulk");
        // a reused slot name must not inherit today's ticks
        assert_eq!(second.reset_progress_on, now().date_naive());
    }

    #[test]
    fn meal_tasks_cover_each_slot_until_month_end() {
        let user = Uuid::new_v4();
        let plan = plan_replacement(None, &payload("Cut"), user, now()).unwrap();
        assert_eq!(plan.meal_tasks.len(), 2);

        let breakfast = &plan.meal_tasks[0];
        assert_eq!(breakfast.meal_slot.as_deref(), Some("breakfast"));
        assert_eq!(breakfast.task_type, "meal");
        assert_eq!(breakfast.diet_id, Some(plan.diet.id));
        assert_eq!(breakfast.due_date, NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(breakfast.recurrence_end, NaiveDate::from_ymd_opt(2026, 10, 31));
        assert_eq!(
            breakfast.description.as_deref(),
            Some("Oats at 07:30: oats, banana")
        );
        assert_eq!(plan.meal_tasks[1].description.as_deref(), Some("Fish at 19:00"));
    }

    #[test]
    fn invalid_payloads_are_rejected() {
        let user = Uuid::new_v4();
        let mut empty = payload("Cut");
        empty.meals.clear();
        assert!(matches!(
            plan_replacement(None, &empty, user, now()),
            Err(DietLifecycleError::InvalidDiet(_))
        ));

        let mut negative = payload("Cut");
        negative.fat_g = -1;
        assert!(plan_replacement(None, &negative, user, now()).is_err());

        assert!(plan_replacement(None, &payload("   "), user, now()).is_err());
    }

    #[test]
    fn removing_without_active_diet_reports_error() {
        let err = plan_removal(None, now()).unwrap_err();
        assert_eq!(err, DietLifecycleError::NoActiveDiet);
        assert!(matches!(ServiceError::from(err), ServiceError::NotFound(_)));
    }

    #[test]
    fn removal_archives_active_diet() {
        let user = Uuid::new_v4();
        let diet = installed(&plan_replacement(None, &payload("Cut"), user, now()).unwrap());
        let removal = plan_removal(Some(&diet), now()).unwrap();
        assert_eq!(removal.retired_diet_id, diet.id);
        assert_eq!(removal.archive.ended_at, now());
    }

    #[test]
    fn slot_must_belong_to_active_diet() {
        let user = Uuid::new_v4();
        let diet = installed(&plan_replacement(None, &payload("Cut"), user, now()).unwrap());
        assert!(ensure_slot(&diet, "breakfast").is_ok());
        assert_eq!(
            ensure_slot(&diet, "brunch").unwrap_err(),
            DietLifecycleError::UnknownMealSlot("brunch".to_string())
        );
    }

    #[test]
    fn toggle_flips_and_stamps_completion() {
        assert_eq!(toggled_progress(None, now()), (true, Some(now())));

        let done = MealProgress {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            meal_slot: "breakfast".to_string(),
            progress_date: now().date_naive(),
            completed: true,
            completed_at: Some(now()),
        };
        assert_eq!(toggled_progress(Some(&done), now()), (false, None));
    }

    #[test]
    fn flipped_rows_get_a_matching_stamp() {
        let mut row = MealProgress {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            meal_slot: "dinner".to_string(),
            progress_date: now().date_naive(),
            completed: true,
            completed_at: None,
        };
        assert_eq!(restamped_progress(&row, now()), Some(Some(now())));

        row.completed = false;
        row.completed_at = Some(now());
        assert_eq!(restamped_progress(&row, now()), Some(None));

        // freshly inserted rows already carry the right stamp
        row.completed = true;
        assert_eq!(restamped_progress(&row, now()), None);
    }
}
