//! Learning Assistant Types
//!
//! Core data structures for the personalized learning path assistant.
//! Every entity validates its fields at the construction boundary so that
//! no partially-valid value is ever observable downstream.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A field-level constraint violation, raised at entity construction.
#[derive(Debug, Clone, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================
// LEVELS & MODULE STATUS
// ============================================================

/// Proficiency level for plans and quizzes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Expert,
}

impl Level {
    /// Parse a user-supplied level. Anything outside the enumerated set
    /// falls back to the expert track.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beginner" => Level::Beginner,
            "intermediate" => Level::Intermediate,
            _ => Level::Expert,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Expert => "expert",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a learning module
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Locked,
    Active,
    Completed,
}

// ============================================================
// LEARNING PLAN
// ============================================================

/// One unit of a learning plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Unique within a plan, starting at 1
    pub id: u32,
    pub title: String,
    pub status: ModuleStatus,
    /// Topics covered, in study order
    pub topics: Vec<String>,
    /// Estimated effort in hours (1-20)
    pub estimated_hours: u32,
    /// Quiz performance percentage (0-100)
    pub mastery_score: f64,
}

impl Module {
    pub fn new(
        id: u32,
        title: &str,
        status: ModuleStatus,
        topics: Vec<String>,
        estimated_hours: u32,
        mastery_score: f64,
    ) -> Result<Self, ValidationError> {
        let module = Self {
            id,
            title: title.to_string(),
            status,
            topics,
            estimated_hours,
            mastery_score,
        };
        module.validate()?;
        Ok(module)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id == 0 {
            return Err(ValidationError::new("id", "module id must be positive"));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "module title must not be empty"));
        }
        if !(1..=20).contains(&self.estimated_hours) {
            return Err(ValidationError::new(
                "estimated_hours",
                format!("must be between 1 and 20, got {}", self.estimated_hours),
            ));
        }
        if !(0.0..=100.0).contains(&self.mastery_score) {
            return Err(ValidationError::new(
                "mastery_score",
                format!("must be between 0 and 100, got {}", self.mastery_score),
            ));
        }
        Ok(())
    }
}

/// Complete learning path for one skill, session-scoped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPlan {
    pub skill: String,
    pub level: Level,
    /// Ordered by intended study order
    pub modules: Vec<Module>,
    pub created: DateTime<Utc>,
}

impl LearningPlan {
    /// The module currently in progress, if any
    pub fn active_module(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.status == ModuleStatus::Active)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.skill.trim().is_empty() {
            return Err(ValidationError::new("skill", "skill must not be empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for module in &self.modules {
            module.validate()?;
            if !seen.insert(module.id) {
                return Err(ValidationError::new(
                    "modules",
                    format!("duplicate module id {}", module.id),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================
// QUIZ
// ============================================================

/// Single multiple-choice question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    /// 2-4 answer options
    pub options: Vec<String>,
    /// Index of the correct option (0-3, within bounds of `options`)
    pub correct_index: usize,
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn new(
        question: &str,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, ValidationError> {
        let q = Self {
            question: question.to_string(),
            options,
            correct_index,
            explanation,
        };
        q.validate()?;
        Ok(q)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::new("question", "question text must not be empty"));
        }
        if !(2..=4).contains(&self.options.len()) {
            return Err(ValidationError::new(
                "options",
                format!("expected 2 to 4 options, got {}", self.options.len()),
            ));
        }
        if self.correct_index >= 4 || self.correct_index >= self.options.len() {
            return Err(ValidationError::new(
                "correct_index",
                format!(
                    "index {} out of range for {} options",
                    self.correct_index,
                    self.options.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Structured quiz tied to a plan module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub module_id: u32,
    pub topic: String,
    pub difficulty: Level,
    /// 3-10 questions
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::new("topic", "quiz topic must not be empty"));
        }
        if !(3..=10).contains(&self.questions.len()) {
            return Err(ValidationError::new(
                "questions",
                format!("expected 3 to 10 questions, got {}", self.questions.len()),
            ));
        }
        for (idx, question) in self.questions.iter().enumerate() {
            question.validate().map_err(|e| {
                ValidationError::new(format!("questions[{}].{}", idx, e.field), e.message)
            })?;
        }
        Ok(())
    }
}

// ============================================================
// RESOURCES
// ============================================================

/// External learning resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    /// Relevance to the query, 0.0-1.0
    pub relevance_score: f64,
}

impl ResourceLink {
    pub fn new(
        title: &str,
        url: &str,
        description: Option<String>,
        relevance_score: f64,
    ) -> Result<Self, ValidationError> {
        let link = Self {
            title: title.to_string(),
            url: url.to_string(),
            description,
            relevance_score,
        };
        link.validate()?;
        Ok(link)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "resource title must not be empty"));
        }
        if self.url.trim().is_empty() {
            return Err(ValidationError::new("url", "resource url must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.relevance_score) {
            return Err(ValidationError::new(
                "relevance_score",
                format!("must be between 0 and 1, got {}", self.relevance_score),
            ));
        }
        Ok(())
    }
}

/// Ranked result set from a resource search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSearchResult {
    pub query: String,
    /// Best-first
    pub resources: Vec<ResourceLink>,
    pub search_timestamp: DateTime<Utc>,
}

// ============================================================
// USER PROFILE
// ============================================================

/// One completed module inside a skill's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub title: String,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

/// Per-skill progress record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillProgress {
    /// Completion history, oldest first
    pub modules: Vec<ModuleRecord>,
    /// Arithmetic mean of all scores under this skill
    pub avg_score: f64,
}

/// Durable per-user aggregate of all skill progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub skills: BTreeMap<String, SkillProgress>,
    pub total_modules_completed: u32,
    /// Mean of every module score across all skills
    pub overall_avg_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile with no history. Absence of a persisted record is a
    /// valid state, not an error.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            skills: BTreeMap::new(),
            total_modules_completed: 0,
            overall_avg_score: 0.0,
            last_updated: Utc::now(),
        }
    }

    /// Record a completed module under `skill` and refresh the aggregates.
    ///
    /// Averages are recomputed from the full history rather than updated
    /// incrementally, and only after the new record is appended.
    pub fn record_completion(
        &mut self,
        skill: &str,
        module_title: &str,
        score: f64,
    ) -> Result<(), ValidationError> {
        if skill.trim().is_empty() {
            return Err(ValidationError::new("skill", "skill must not be empty"));
        }
        if !(0.0..=100.0).contains(&score) {
            return Err(ValidationError::new(
                "score",
                format!("must be between 0 and 100, got {}", score),
            ));
        }

        let entry = self.skills.entry(skill.to_string()).or_default();
        entry.modules.push(ModuleRecord {
            title: module_title.to_string(),
            score,
            completed_at: Utc::now(),
        });
        entry.avg_score =
            entry.modules.iter().map(|m| m.score).sum::<f64>() / entry.modules.len() as f64;

        self.total_modules_completed += 1;

        let all_scores: Vec<f64> = self
            .skills
            .values()
            .flat_map(|s| s.modules.iter().map(|m| m.score))
            .collect();
        if !all_scores.is_empty() {
            self.overall_avg_score = all_scores.iter().sum::<f64>() / all_scores.len() as f64;
        }

        self.last_updated = Utc::now();
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::new("user_id", "user id must not be empty"));
        }
        if !(0.0..=100.0).contains(&self.overall_avg_score) {
            return Err(ValidationError::new(
                "overall_avg_score",
                format!("must be between 0 and 100, got {}", self.overall_avg_score),
            ));
        }
        for (skill, progress) in &self.skills {
            for record in &progress.modules {
                if !(0.0..=100.0).contains(&record.score) {
                    return Err(ValidationError::new(
                        format!("skills.{}.modules.score", skill),
                        format!("must be between 0 and 100, got {}", record.score),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_rejects_out_of_range_mastery_score() {
        let err = Module::new(1, "Foundations of Rust", ModuleStatus::Active, vec![], 4, 150.0)
            .unwrap_err();
        assert_eq!(err.field, "mastery_score");
    }

    #[test]
    fn module_rejects_zero_id_and_bad_hours() {
        assert!(Module::new(0, "x", ModuleStatus::Locked, vec![], 4, 0.0).is_err());
        assert!(Module::new(1, "x", ModuleStatus::Locked, vec![], 0, 0.0).is_err());
        assert!(Module::new(1, "x", ModuleStatus::Locked, vec![], 21, 0.0).is_err());
        assert!(Module::new(1, "  ", ModuleStatus::Locked, vec![], 4, 0.0).is_err());
    }

    #[test]
    fn question_rejects_correct_index_out_of_range() {
        let options: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let err = QuizQuestion::new("pick one", options, 4, None).unwrap_err();
        assert_eq!(err.field, "correct_index");
    }

    #[test]
    fn question_rejects_bad_option_counts() {
        let one: Vec<String> = vec!["a".to_string()];
        assert!(QuizQuestion::new("q", one, 0, None).is_err());
        let five: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert!(QuizQuestion::new("q", five, 0, None).is_err());
    }

    #[test]
    fn question_index_must_be_within_options() {
        // index 2 is within 0..4 but the question only has 2 options
        let two: Vec<String> = vec!["a".to_string(), "b".to_string()];
        let err = QuizQuestion::new("q", two, 2, None).unwrap_err();
        assert_eq!(err.field, "correct_index");
    }

    #[test]
    fn quiz_requires_three_to_ten_questions() {
        let question = QuizQuestion::new(
            "q",
            vec!["a".to_string(), "b".to_string()],
            0,
            None,
        )
        .unwrap();
        let quiz = Quiz {
            module_id: 1,
            topic: "Rust".to_string(),
            difficulty: Level::Beginner,
            questions: vec![question.clone(), question.clone()],
        };
        let err = quiz.validate().unwrap_err();
        assert_eq!(err.field, "questions");
    }

    #[test]
    fn level_parse_falls_back_to_expert() {
        assert_eq!(Level::parse("beginner"), Level::Beginner);
        assert_eq!(Level::parse("Intermediate"), Level::Intermediate);
        assert_eq!(Level::parse("expert"), Level::Expert);
        assert_eq!(Level::parse("wizard"), Level::Expert);
    }

    #[test]
    fn resource_link_rejects_out_of_range_relevance() {
        assert!(ResourceLink::new("t", "https://example.com", None, 1.5).is_err());
        assert!(ResourceLink::new("t", "https://example.com", None, 0.5).is_ok());
    }

    #[test]
    fn record_completion_recomputes_averages() {
        let mut profile = UserProfile::empty("learner");
        profile.record_completion("Python", "Basics", 80.0).unwrap();
        assert_eq!(profile.total_modules_completed, 1);
        assert!((profile.skills["Python"].avg_score - 80.0).abs() < 1e-9);

        profile.record_completion("Python", "Functions", 90.0).unwrap();
        assert_eq!(profile.total_modules_completed, 2);
        assert!((profile.skills["Python"].avg_score - 85.0).abs() < 1e-9);
        assert!((profile.overall_avg_score - 85.0).abs() < 1e-9);
    }

    #[test]
    fn overall_average_spans_all_skills() {
        let mut profile = UserProfile::empty("learner");
        profile.record_completion("Python", "Basics", 100.0).unwrap();
        profile.record_completion("SQL", "Joins", 50.0).unwrap();
        assert!((profile.overall_avg_score - 75.0).abs() < 1e-9);
        assert_eq!(profile.skills.len(), 2);
    }

    #[test]
    fn record_completion_rejects_bad_score() {
        let mut profile = UserProfile::empty("learner");
        let err = profile.record_completion("Python", "Basics", 120.0).unwrap_err();
        assert_eq!(err.field, "score");
        assert_eq!(profile.total_modules_completed, 0);
    }
}
