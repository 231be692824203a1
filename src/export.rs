// Lifeboard/backend-api/src/export.rs
use crate::models::{Task, Transaction};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a, T> {
    exported_at: DateTime<Utc>,
    count: usize,
    items: &'a [T],
}

pub const TASK_CSV_HEADER: &str = "id,title,description,category,priority,completed,due_date,time_estimate,task_type,created_at,completed_at";
pub const TRANSACTION_CSV_HEADER: &str = "id,date,type,category,description,amount,recurring";

pub fn export_filename(collection: &str, format: ExportFormat, today: NaiveDate) -> String {
    format!("{}-{}.{}", collection, today.format("%Y-%m-%d"), format.extension())
}

fn to_json<T: Serialize>(items: &[T], exported_at: DateTime<Utc>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Snapshot {
        exported_at,
        count: items.len(),
        items,
    })
}

pub fn tasks_to_json(tasks: &[Task], exported_at: DateTime<Utc>) -> serde_json::Result<String> {
    to_json(tasks, exported_at)
}

pub fn transactions_to_json(
    transactions: &[Transaction],
    exported_at: DateTime<Utc>,
) -> serde_json::Result<String> {
    to_json(transactions, exported_at)
}

// Spreadsheets evaluate cells starting with these as formulas.
const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

// Quote when the field would otherwise break the row.
fn csv_field(value: &str) -> String {
    let value = if value.starts_with(FORMULA_PREFIXES) {
        format!("'{}", value)
    } else {
        value.to_string()
    };
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut out = String::from(TASK_CSV_HEADER);
    out.push('\n');
    for task in tasks {
        out.push_str(&csv_row(&[
            task.id.to_string(),
            task.title.clone(),
            task.description.clone().unwrap_or_default(),
            task.category.clone(),
            task.priority.clone(),
            task.completed.to_string(),
            opt(task.due_date),
            opt(task.time_estimate),
            task.task_type.clone(),
            task.created_at.to_rfc3339(),
            opt(task.completed_at.map(|t| t.to_rfc3339())),
        ]));
        out.push('\n');
    }
    out
}

pub fn transactions_to_csv(transactions: &[Transaction]) -> String {
    let mut out = String::from(TRANSACTION_CSV_HEADER);
    out.push('\n');
    for tx in transactions {
        out.push_str(&csv_row(&[
            tx.id.to_string(),
            tx.transaction_date.to_string(),
            tx.kind.clone(),
            tx.category.clone(),
            tx.description.clone(),
            tx.amount.to_string(),
            tx.recurring.to_string(),
        ]));
        out.push('\n');
    }
    out
}
