//! Activity Timeline
//!
//! Persistent per-user timeline of learning activity (plan generation, quiz
//! attempts, progress updates, tool invocations). The conversational layer
//! renders this as its observability trace. Timeline writes are best-effort
//! from the caller's perspective: a failure here must never fail the primary
//! operation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqlResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================
// EVENT TYPES
// ============================================================

/// Types of events recorded on the timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LearningEventType {
    PlanGenerated,
    ModuleCompleted,
    QuizGenerated,
    QuizEvaluated,
    ProgressUpdated,
    ResourcesSearched,
    ToolInvoked,
}

impl LearningEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningEventType::PlanGenerated => "plan_generated",
            LearningEventType::ModuleCompleted => "module_completed",
            LearningEventType::QuizGenerated => "quiz_generated",
            LearningEventType::QuizEvaluated => "quiz_evaluated",
            LearningEventType::ProgressUpdated => "progress_updated",
            LearningEventType::ResourcesSearched => "resources_searched",
            LearningEventType::ToolInvoked => "tool_invoked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "plan_generated" => Some(LearningEventType::PlanGenerated),
            "module_completed" => Some(LearningEventType::ModuleCompleted),
            "quiz_generated" => Some(LearningEventType::QuizGenerated),
            "quiz_evaluated" => Some(LearningEventType::QuizEvaluated),
            "progress_updated" => Some(LearningEventType::ProgressUpdated),
            "resources_searched" => Some(LearningEventType::ResourcesSearched),
            "tool_invoked" => Some(LearningEventType::ToolInvoked),
            _ => None,
        }
    }
}

/// A single event on a user's timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningEvent {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: LearningEventType,
    pub description: String,
    /// Optional structured metadata (JSON)
    pub metadata: Option<serde_json::Value>,
}

impl LearningEvent {
    pub fn new(user_id: &str, event_type: LearningEventType, description: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            event_type,
            description: description.to_string(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A user's full timeline, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningTimeline {
    pub user_id: String,
    pub events: Vec<LearningEvent>,
}

// ============================================================
// TIMELINE STORE (SQLite-backed)
// ============================================================

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS learning_events (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    event_type TEXT NOT NULL,
    description TEXT NOT NULL,
    metadata TEXT
)";

/// SQLite-backed persistent timeline store
pub struct TimelineStore {
    conn: Arc<Mutex<Connection>>,
}

impl TimelineStore {
    pub fn new(db_path: Option<PathBuf>) -> SqlResult<Self> {
        let path = db_path.unwrap_or_else(|| PathBuf::from("learning_memory.db"));
        let conn = Connection::open(path)?;

        conn.execute(SCHEMA, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_user_id ON learning_events(user_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON learning_events(timestamp)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests
    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn record_event(&self, event: &LearningEvent) -> SqlResult<()> {
        let conn = self.conn.lock().unwrap();
        let metadata_json = event.metadata.as_ref().map(|m| m.to_string());

        conn.execute(
            "INSERT INTO learning_events (id, user_id, timestamp, event_type, description, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id,
                event.user_id,
                event.timestamp.to_rfc3339(),
                event.event_type.as_str(),
                event.description,
                metadata_json,
            ],
        )?;

        Ok(())
    }

    /// All events for a user, oldest first
    pub fn user_timeline(&self, user_id: &str) -> SqlResult<LearningTimeline> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, timestamp, event_type, description, metadata
             FROM learning_events
             WHERE user_id = ?1
             ORDER BY timestamp ASC",
        )?;

        let events = stmt.query_map([user_id], row_to_event)?;
        let events: Vec<LearningEvent> = events.filter_map(|e| e.ok()).collect();

        Ok(LearningTimeline {
            user_id: user_id.to_string(),
            events,
        })
    }

    /// Events from the last `days` days, oldest first
    pub fn recent_events(&self, user_id: &str, days: i64) -> SqlResult<Vec<LearningEvent>> {
        let cutoff = (Utc::now() - chrono::Duration::days(days)).to_rfc3339();
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, user_id, timestamp, event_type, description, metadata
             FROM learning_events
             WHERE user_id = ?1 AND timestamp >= ?2
             ORDER BY timestamp ASC",
        )?;

        let events = stmt.query_map(params![user_id, cutoff], row_to_event)?;
        Ok(events.filter_map(|e| e.ok()).collect())
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<LearningEvent> {
    let timestamp_str: String = row.get(2)?;
    let event_type_str: String = row.get(3)?;
    let metadata_str: Option<String> = row.get(5)?;

    Ok(LearningEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        event_type: LearningEventType::from_str(&event_type_str)
            .unwrap_or(LearningEventType::ToolInvoked),
        description: row.get(4)?,
        metadata: metadata_str.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

// ============================================================
// HELPER FUNCTIONS
// ============================================================

pub fn record_plan_generated(
    store: &TimelineStore,
    user_id: &str,
    skill: &str,
    module_count: usize,
) -> SqlResult<()> {
    let event = LearningEvent::new(
        user_id,
        LearningEventType::PlanGenerated,
        &format!("Generated learning plan for {} with {} modules", skill, module_count),
    );
    store.record_event(&event)
}

pub fn record_module_completed(
    store: &TimelineStore,
    user_id: &str,
    module_title: &str,
    score: f64,
) -> SqlResult<()> {
    let event = LearningEvent::new(
        user_id,
        LearningEventType::ModuleCompleted,
        &format!("Completed module '{}' with score {:.1}%", module_title, score),
    );
    store.record_event(&event)
}

pub fn record_quiz_generated(
    store: &TimelineStore,
    user_id: &str,
    topic: &str,
    question_count: usize,
) -> SqlResult<()> {
    let event = LearningEvent::new(
        user_id,
        LearningEventType::QuizGenerated,
        &format!("Generated {}-question quiz on {}", question_count, topic),
    );
    store.record_event(&event)
}

pub fn record_quiz_evaluated(
    store: &TimelineStore,
    user_id: &str,
    topic: &str,
    score: f64,
) -> SqlResult<()> {
    let event = LearningEvent::new(
        user_id,
        LearningEventType::QuizEvaluated,
        &format!("Evaluated quiz on {} at {:.1}%", topic, score),
    );
    store.record_event(&event)
}

pub fn record_progress_updated(
    store: &TimelineStore,
    user_id: &str,
    skill: &str,
    module_title: &str,
) -> SqlResult<()> {
    let event = LearningEvent::new(
        user_id,
        LearningEventType::ProgressUpdated,
        &format!("Recorded completion of '{}' under {}", module_title, skill),
    );
    store.record_event(&event)
}

pub fn record_resources_searched(
    store: &TimelineStore,
    user_id: &str,
    query: &str,
    result_count: usize,
) -> SqlResult<()> {
    let event = LearningEvent::new(
        user_id,
        LearningEventType::ResourcesSearched,
        &format!("Found {} resources for '{}'", result_count, query),
    );
    store.record_event(&event)
}

pub fn record_tool_invoked(
    store: &TimelineStore,
    user_id: &str,
    tool_name: &str,
    input_preview: &str,
) -> SqlResult<()> {
    let preview: String = input_preview.chars().take(200).collect();
    let event = LearningEvent::new(
        user_id,
        LearningEventType::ToolInvoked,
        &format!("Invoked tool '{}'", tool_name),
    )
    .with_metadata(serde_json::json!({ "input": preview }));
    store.record_event(&event)
}
