use serde::{Deserialize, Serialize};

/// A tracked interval of work. `end_time == None` means the entry is still
/// running; at most one entry per user should be open at any instant.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub start_time: chrono::NaiveDateTime,
    pub end_time: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeEntryPayload {
    pub description: Option<String>,
    pub start_time: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StopTimeEntryPayload {
    pub end_time: Option<chrono::NaiveDateTime>,
}
