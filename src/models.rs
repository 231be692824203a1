// Lifeboard/backend-api/src/models.rs
use crate::schema::{diet_history, meal_progress, tasks, transactions, user_diets, users};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// --- Helper for nullable fields in update payloads ---

// absent -> None, JSON null -> Some(None), value -> Some(Some(v))
fn deserialize_opt_opt<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

// --- Task vocabularies ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Work,
    Personal,
    Health,
    Learning,
    Finance,
    Home,
    Shopping,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 8] = [
        TaskCategory::Work,
        TaskCategory::Personal,
        TaskCategory::Health,
        TaskCategory::Learning,
        TaskCategory::Finance,
        TaskCategory::Home,
        TaskCategory::Shopping,
        TaskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Work => "work",
            TaskCategory::Personal => "personal",
            TaskCategory::Health => "health",
            TaskCategory::Learning => "learning",
            TaskCategory::Finance => "finance",
            TaskCategory::Home => "home",
            TaskCategory::Shopping => "shopping",
            TaskCategory::Other => "other",
        }
    }
}

impl FromStr for TaskCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "task category",
                value: s.to_string(),
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

/// Governs whether a completed task regenerates, and at which cadence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Normal,
    Daily,
    Weekly,
    Monthly,
    Meal,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Normal,
        TaskType::Daily,
        TaskType::Weekly,
        TaskType::Monthly,
        TaskType::Meal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Normal => "normal",
            TaskType::Daily => "daily",
            TaskType::Weekly => "weekly",
            TaskType::Monthly => "monthly",
            TaskType::Meal => "meal",
        }
    }
}

impl FromStr for TaskType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "task type",
                value: s.to_string(),
            })
    }
}

// --- Task Model ---
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub time_estimate: Option<i32>, // minutes
    pub task_type: String,
    pub diet_id: Option<Uuid>,
    pub meal_slot: Option<String>,
    pub recurrence_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    // Rows written outside the API may carry an unknown type; treat them as one-off tasks.
    pub fn kind(&self) -> TaskType {
        self.task_type.parse().unwrap_or(TaskType::Normal)
    }
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub time_estimate: Option<i32>,
    pub task_type: String,
    pub diet_id: Option<Uuid>,
    pub meal_slot: Option<String>,
    pub recurrence_end: Option<NaiveDate>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = tasks)]
pub struct UpdateTaskChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub time_estimate: Option<Option<i32>>,
    pub task_type: Option<String>,
    pub recurrence_end: Option<Option<NaiveDate>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

// --- Transaction vocabularies ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

pub const INCOME_CATEGORIES: [&str; 6] = [
    "salary",
    "freelance",
    "investment",
    "gift",
    "refund",
    "other",
];

pub const EXPENSE_CATEGORIES: [&str; 10] = [
    "food",
    "transport",
    "housing",
    "utilities",
    "health",
    "entertainment",
    "education",
    "shopping",
    "subscriptions",
    "other",
];

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            TransactionKind::Income => &INCOME_CATEGORIES,
            TransactionKind::Expense => &EXPENSE_CATEGORIES,
        }
    }

    pub fn accepts_category(&self, category: &str) -> bool {
        self.categories().contains(&category)
    }
}

impl FromStr for TransactionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(UnknownVariant {
                kind: "transaction type",
                value: other.to_string(),
            }),
        }
    }
}

// --- Transaction Model ---
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    #[serde(rename = "date")]
    pub transaction_date: NaiveDate,
    pub recurring: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income.as_str()
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense.as_str()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = transactions)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub transaction_date: NaiveDate,
    pub recurring: bool,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = transactions)]
pub struct UpdateTransactionChangeset {
    pub kind: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub recurring: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

// --- Diet Models ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MealDefinition {
    pub name: String,
    /// Time of day, "HH:MM".
    pub time: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Meal slot (breakfast, lunch, ...) -> meal served in that slot.
pub type MealPlan = BTreeMap<String, MealDefinition>;

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = user_diets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Diet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub objective: String,
    pub calorie_target: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub meals: serde_json::Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Diet {
    pub fn meal_plan(&self) -> Result<MealPlan, serde_json::Error> {
        serde_json::from_value(self.meals.clone())
    }
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = user_diets)]
pub struct NewDiet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub objective: String,
    pub calorie_target: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub meals: serde_json::Value,
    pub active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = diet_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DietHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub diet_id: Uuid,
    pub name: String,
    pub objective: String,
    pub calorie_target: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub meals: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = diet_history)]
pub struct NewDietHistoryEntry {
    pub user_id: Uuid,
    pub diet_id: Uuid,
    pub name: String,
    pub objective: String,
    pub calorie_target: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub meals: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

// --- MealProgress Model ---
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = meal_progress)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MealProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_slot: String,
    #[serde(rename = "date")]
    pub progress_date: NaiveDate,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = meal_progress)]
pub struct NewMealProgress {
    pub user_id: Uuid,
    pub meal_slot: String,
    pub progress_date: NaiveDate,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

// --- User profile ---
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = users)]
pub struct UpdateUserProfileChangeset {
    pub email: String,
    pub display_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// --- PAYLOAD DTOs ---

#[derive(Deserialize, Debug)]
pub struct UpsertUserPayload {
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<TaskCategory>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub time_estimate: Option<i32>,
    pub task_type: Option<TaskType>,
    pub recurrence_end: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub description: Option<Option<String>>,
    pub category: Option<TaskCategory>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub time_estimate: Option<Option<i32>>,
    pub task_type: Option<TaskType>,
    #[serde(deserialize_with = "deserialize_opt_opt", default)]
    pub recurrence_end: Option<Option<NaiveDate>>,
}

#[derive(Deserialize, Debug)]
pub struct CreateTransactionPayload {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    #[serde(rename = "date")]
    pub transaction_date: Option<NaiveDate>,
    pub recurring: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateTransactionPayload {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "date")]
    pub transaction_date: Option<NaiveDate>,
    pub recurring: Option<bool>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateDietPayload {
    pub name: String,
    pub objective: String,
    pub calorie_target: i32,
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fat_g: i32,
    pub meals: MealPlan,
}

// --- Pagination DTOs ---
#[derive(Serialize, Debug)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total_items: i64, page: i64, per_page: i64) -> Self {
        PaginatedResponse {
            items,
            total_items,
            total_pages: (total_items + per_page - 1) / per_page,
            page,
            per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_payload_distinguishes_null_from_absent() {
        let payload: UpdateTaskPayload =
            serde_json::from_value(json!({ "due_date": null, "title": "Renamed" })).unwrap();
        assert_eq!(payload.due_date, Some(None));
        assert_eq!(payload.description, None);
        assert_eq!(payload.title.as_deref(), Some("Renamed"));
    }

    #[test]
    fn vocabularies_round_trip_through_their_string_form() {
        for category in TaskCategory::ALL {
            assert_eq!(category.as_str().parse::<TaskCategory>(), Ok(category));
        }
        for task_type in TaskType::ALL {
            assert_eq!(task_type.as_str().parse::<TaskType>(), Ok(task_type));
        }
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn income_and_expense_categories_are_distinct_vocabularies() {
        assert!(TransactionKind::Income.accepts_category("salary"));
        assert!(!TransactionKind::Expense.accepts_category("salary"));
        assert!(TransactionKind::Expense.accepts_category("housing"));
        assert!(!TransactionKind::Income.accepts_category("housing"));
    }

    #[test]
    fn transaction_payload_uses_type_and_date_keys() {
        let payload: CreateTransactionPayload = serde_json::from_value(json!({
            "type": "expense",
            "amount": "12.50",
            "description": "Groceries",
            "category": "food",
            "date": "2026-10-01"
        }))
        .unwrap();
        assert_eq!(payload.kind, TransactionKind::Expense);
        assert_eq!(payload.amount, Decimal::new(1250, 2));
        assert_eq!(
            payload.transaction_date,
            NaiveDate::from_ymd_opt(2026, 10, 1)
        );
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 21, 1, 10);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(Vec::new(), 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
    }
}
