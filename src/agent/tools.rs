//! Tool Dispatch
//!
//! The conversational driver invokes three tools by name with JSON
//! arguments and receives renderable text back. Every failure path is
//! converted to a descriptive string so the caller can always produce a
//! sentence for the user.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::memory::{self, TimelineStore};
use super::profile::{profile_overview, progress_summary, ProfileStore};
use super::quiz::{format_quiz_output, QuizGenerator, QuizRequest};
use super::resources::{format_results, ResourceQuery, ResourceSearch};
use super::types::Level;

pub const PROFILE_TOOL: &str = "knowledge_profile_manager";
pub const QUIZ_TOOL: &str = "structured_quiz_generator";
pub const RESOURCE_TOOL: &str = "real_time_resource_search";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(
        "Unknown tool '{0}'. Available tools: knowledge_profile_manager, \
         structured_quiz_generator, real_time_resource_search"
    )]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        source: serde_json::Error,
    },
}

// ============================================================
// ARGUMENT SCHEMAS
// ============================================================

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_num_questions() -> usize {
    5
}

fn default_module_id() -> u32 {
    1
}

fn default_max_results() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ProfileToolArgs {
    /// 'read', 'update', or 'get_summary'
    pub action: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub skill: Option<String>,
    pub module_title: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct QuizToolArgs {
    pub topic: String,
    pub difficulty: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    #[serde(default = "default_module_id")]
    pub module_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct ResourceToolArgs {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

// ============================================================
// REGISTRY
// ============================================================

/// Holds the collaborators the tools act through
pub struct ToolRegistry {
    profiles: Arc<ProfileStore>,
    timeline: Arc<TimelineStore>,
    quiz_generator: Arc<dyn QuizGenerator>,
    resources: Arc<dyn ResourceSearch>,
}

impl ToolRegistry {
    pub fn new(
        profiles: Arc<ProfileStore>,
        timeline: Arc<TimelineStore>,
        quiz_generator: Arc<dyn QuizGenerator>,
        resources: Arc<dyn ResourceSearch>,
    ) -> Self {
        Self {
            profiles,
            timeline,
            quiz_generator,
            resources,
        }
    }

    /// Invoke a tool by name. Always returns text the conversational layer
    /// can relay; errors are embedded in the text, never raised.
    pub fn dispatch(&self, user_id: &str, name: &str, arguments: &Value) -> String {
        if let Err(e) = memory::record_tool_invoked(
            &self.timeline,
            user_id,
            name,
            &arguments.to_string(),
        ) {
            log::warn!("failed to record tool invocation: {}", e);
        }

        let result = match name {
            PROFILE_TOOL => self.run_profile_tool(arguments),
            QUIZ_TOOL => self.run_quiz_tool(user_id, arguments),
            RESOURCE_TOOL => self.run_resource_tool(user_id, arguments),
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        result.unwrap_or_else(|e| format!("Error: {}", e))
    }

    fn run_profile_tool(&self, arguments: &Value) -> Result<String, ToolError> {
        let args: ProfileToolArgs =
            serde_json::from_value(arguments.clone()).map_err(|source| {
                ToolError::InvalidArguments {
                    tool: PROFILE_TOOL,
                    source,
                }
            })?;

        match args.action.as_str() {
            "read" => match self.profiles.load(&args.user_id) {
                Ok(profile) => Ok(profile_overview(&profile)),
                Err(e) => Ok(format!("Error managing knowledge profile: {}", e)),
            },

            "update" => {
                let (Some(skill), Some(module_title), Some(score)) =
                    (args.skill, args.module_title, args.score)
                else {
                    return Ok(
                        "Error: update action requires skill, module_title, and score".to_string(),
                    );
                };

                let mut profile = match self.profiles.load(&args.user_id) {
                    Ok(profile) => profile,
                    Err(e) => return Ok(format!("Error managing knowledge profile: {}", e)),
                };
                if let Err(e) = profile.record_completion(&skill, &module_title, score) {
                    return Ok(format!("Error managing knowledge profile: {}", e));
                }
                if let Err(e) = self.profiles.save(&profile) {
                    return Ok(format!("Error managing knowledge profile: {}", e));
                }

                if let Err(e) = memory::record_progress_updated(
                    &self.timeline,
                    &args.user_id,
                    &skill,
                    &module_title,
                ) {
                    log::warn!("failed to record progress event: {}", e);
                }

                Ok(format!(
                    "Profile updated successfully!\n\
                     Module: {}\n\
                     Score: {:.1}%\n\
                     Total modules completed: {}\n\
                     Overall average: {:.1}%",
                    module_title, score, profile.total_modules_completed, profile.overall_avg_score,
                ))
            }

            "get_summary" => match self.profiles.load(&args.user_id) {
                Ok(profile) => Ok(progress_summary(&profile)),
                Err(e) => Ok(format!("Error managing knowledge profile: {}", e)),
            },

            other => Ok(format!(
                "Error: Unknown action '{}'. Use 'read', 'update', or 'get_summary'",
                other
            )),
        }
    }

    fn run_quiz_tool(&self, user_id: &str, arguments: &Value) -> Result<String, ToolError> {
        let args: QuizToolArgs =
            serde_json::from_value(arguments.clone()).map_err(|source| {
                ToolError::InvalidArguments {
                    tool: QUIZ_TOOL,
                    source,
                }
            })?;

        let request = QuizRequest {
            module_id: args.module_id,
            topic: args.topic,
            difficulty: Level::parse(&args.difficulty),
            num_questions: args.num_questions,
        };

        match self.quiz_generator.generate(&request) {
            Ok(quiz) => {
                if let Err(e) = memory::record_quiz_generated(
                    &self.timeline,
                    user_id,
                    &quiz.topic,
                    quiz.questions.len(),
                ) {
                    log::warn!("failed to record quiz event: {}", e);
                }
                Ok(format_quiz_output(&quiz))
            }
            Err(e) => Ok(format!("Error generating quiz: {}", e)),
        }
    }

    fn run_resource_tool(&self, user_id: &str, arguments: &Value) -> Result<String, ToolError> {
        let args: ResourceToolArgs =
            serde_json::from_value(arguments.clone()).map_err(|source| {
                ToolError::InvalidArguments {
                    tool: RESOURCE_TOOL,
                    source,
                }
            })?;

        let query = ResourceQuery::new(&args.query, args.max_results);
        let result = self.resources.search(&query);

        if let Err(e) = memory::record_resources_searched(
            &self.timeline,
            user_id,
            &result.query,
            result.resources.len(),
        ) {
            log::warn!("failed to record search event: {}", e);
        }

        Ok(format_results(&result))
    }
}
