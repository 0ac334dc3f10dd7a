use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// One answer to a survey question: a single choice or a set of choices.
/// Serialized untagged so the wire shape is a bare string or an array of
/// strings, matching what the form UI submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multi(Vec<String>),
}

/// One stored survey submission. Records are insert-only; `answers` keys
/// are the literal question texts from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: String,
    pub answers: HashMap<String, Answer>,
    pub created_at: String,
}

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS survey_responses (
            id TEXT PRIMARY KEY,
            answers TEXT NOT NULL,
            created_at TEXT NOT NULL
          );
          CREATE INDEX IF NOT EXISTS idx_survey_responses_created
            ON survey_responses(created_at);",
    )?;
    Ok(())
}

fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Persists a submitted answer set and returns the created record with
/// its assigned id and timestamp. Answers are stored as a JSON blob; no
/// validation against the catalog happens here.
pub fn insert_response(
    conn: &Connection,
    answers: HashMap<String, Answer>,
) -> Result<ResponseRecord, StoreError> {
    let record = ResponseRecord {
        id: Uuid::new_v4().to_string(),
        answers,
        created_at: now_string(),
    };

    let encoded = serde_json::to_string(&record.answers)?;
    conn.execute(
        "INSERT INTO survey_responses (id, answers, created_at) VALUES (?1, ?2, ?3)",
        params![record.id, encoded, record.created_at],
    )?;

    Ok(record)
}

/// Returns every stored response, newest first.
pub fn list_responses(conn: &Connection) -> Result<Vec<ResponseRecord>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, answers, created_at FROM survey_responses ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, raw, created_at) = row?;
        let answers: HashMap<String, Answer> = serde_json::from_str(&raw)?;
        records.push(ResponseRecord {
            id,
            answers,
            created_at,
        });
    }
    Ok(records)
}
