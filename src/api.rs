//! Web API Module
//!
//! Exposes RESTful endpoints for the learning assistant's conversational
//! driver. All endpoints return JSON and require no authentication
//! (prototype mode).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::agent::{
    memory::{self, TimelineStore},
    planner,
    profile::{ProfileStore, StorageError},
    quiz::{self, GenerationError, QuizGenerator, QuizRequest, TemplateQuizGenerator},
    resources::{CuratedResourceCatalog, ResourceQuery, ResourceSearch},
    tools::ToolRegistry,
    types::{LearningPlan, Level, Quiz},
};
use crate::config::AppConfig;

// ============================================================
// APPLICATION STATE
// ============================================================

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to initialize profile store: {0}")]
    Profiles(#[from] StorageError),

    #[error("failed to initialize timeline store: {0}")]
    Timeline(#[from] rusqlite::Error),
}

/// Shared application state. Plans and active quizzes are session-scoped
/// and live only in memory; profiles and the timeline are durable.
pub struct AppState {
    pub profiles: Arc<ProfileStore>,
    pub timeline: Arc<TimelineStore>,
    pub plans: Mutex<HashMap<String, LearningPlan>>,
    pub quizzes: Mutex<HashMap<String, Quiz>>,
    pub quiz_generator: Arc<dyn QuizGenerator>,
    pub resources: Arc<dyn ResourceSearch>,
    pub tools: ToolRegistry,
}

impl AppState {
    pub fn new(profiles: Arc<ProfileStore>, timeline: Arc<TimelineStore>) -> Self {
        let quiz_generator: Arc<dyn QuizGenerator> = Arc::new(TemplateQuizGenerator);
        let resources: Arc<dyn ResourceSearch> = Arc::new(CuratedResourceCatalog);
        let tools = ToolRegistry::new(
            profiles.clone(),
            timeline.clone(),
            quiz_generator.clone(),
            resources.clone(),
        );
        Self {
            profiles,
            timeline,
            plans: Mutex::new(HashMap::new()),
            quizzes: Mutex::new(HashMap::new()),
            quiz_generator,
            resources,
            tools,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, InitError> {
        let profiles = Arc::new(ProfileStore::new(&config.data_dir)?);
        let timeline = Arc::new(TimelineStore::new(Some(config.db_path.clone()))?);
        Ok(Self::new(profiles, timeline))
    }
}

// ============================================================
// API REQUEST/RESPONSE TYPES
// ============================================================

#[derive(Deserialize)]
pub struct GeneratePlanRequest {
    pub user_id: String,
    pub skill: String,
    pub level: String,
}

#[derive(Deserialize)]
pub struct CompleteModuleRequest {
    pub user_id: String,
    pub module_id: u32,
    pub score: f64,
}

#[derive(Deserialize)]
pub struct GenerateQuizRequest {
    pub user_id: String,
    pub topic: String,
    pub difficulty: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    #[serde(default = "default_module_id")]
    pub module_id: u32,
}

fn default_num_questions() -> usize {
    5
}

fn default_module_id() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct EvaluateQuizRequest {
    pub user_id: String,
    pub answers: Vec<usize>,
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    pub user_id: String,
    pub skill: String,
    pub module_title: String,
    pub score: f64,
}

#[derive(Deserialize)]
pub struct ResourcesRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

#[derive(Deserialize)]
pub struct ToolRequest {
    #[serde(default = "default_tool_user")]
    pub user_id: String,
    pub name: String,
    pub arguments: Value,
}

fn default_tool_user() -> String {
    "default_user".to_string()
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: &str) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

// ============================================================
// API HANDLERS
// ============================================================

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Learning Agent API",
        "version": "0.1.0"
    }))
}

/// Generate a learning plan for a (skill, level) pair
async fn generate_plan(
    data: web::Data<Arc<AppState>>,
    req: web::Json<GeneratePlanRequest>,
) -> impl Responder {
    if req.skill.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("skill must not be empty"));
    }

    let level = Level::parse(&req.level);
    let plan = planner::generate_plan(&req.skill, level);

    if let Err(e) =
        memory::record_plan_generated(&data.timeline, &req.user_id, &plan.skill, plan.modules.len())
    {
        log::warn!("failed to record plan event: {}", e);
    }

    let mut plans = data.plans.lock().unwrap();
    plans.insert(req.user_id.clone(), plan.clone());

    HttpResponse::Ok().json(ApiResponse::success(plan))
}

/// Get the session's current learning plan
async fn get_plan(data: web::Data<Arc<AppState>>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    let plans = data.plans.lock().unwrap();
    match plans.get(&user_id) {
        Some(plan) => HttpResponse::Ok().json(ApiResponse::success(plan.clone())),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::error(
            "Learning plan not found. Generate one first.",
        )),
    }
}

/// Mark a plan module completed and unlock its successor
async fn complete_module(
    data: web::Data<Arc<AppState>>,
    req: web::Json<CompleteModuleRequest>,
) -> impl Responder {
    if !(0.0..=100.0).contains(&req.score) {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("score must be between 0 and 100"));
    }

    let mut plans = data.plans.lock().unwrap();
    let Some(plan) = plans.get_mut(&req.user_id) else {
        return HttpResponse::NotFound().json(ApiResponse::<()>::error(
            "Learning plan not found. Generate one first.",
        ));
    };

    let module_title = plan
        .modules
        .iter()
        .find(|m| m.id == req.module_id)
        .map(|m| m.title.clone());

    planner::complete_module(plan, req.module_id, req.score);

    if let Some(title) = module_title {
        if let Err(e) =
            memory::record_module_completed(&data.timeline, &req.user_id, &title, req.score)
        {
            log::warn!("failed to record completion event: {}", e);
        }
    }

    HttpResponse::Ok().json(ApiResponse::success(plan.clone()))
}

/// Generate a quiz through the collaborator seam and keep it as the
/// user's active quiz
async fn generate_quiz(
    data: web::Data<Arc<AppState>>,
    req: web::Json<GenerateQuizRequest>,
) -> impl Responder {
    let request = QuizRequest {
        module_id: req.module_id,
        topic: req.topic.clone(),
        difficulty: Level::parse(&req.difficulty),
        num_questions: req.num_questions,
    };

    match data.quiz_generator.generate(&request) {
        Ok(generated) => {
            if let Err(e) = memory::record_quiz_generated(
                &data.timeline,
                &req.user_id,
                &generated.topic,
                generated.questions.len(),
            ) {
                log::warn!("failed to record quiz event: {}", e);
            }

            let mut quizzes = data.quizzes.lock().unwrap();
            quizzes.insert(req.user_id.clone(), generated.clone());

            HttpResponse::Ok().json(ApiResponse::success(generated))
        }
        Err(GenerationError::InvalidRequest(e)) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(&e.to_string()))
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(&format!("Error generating quiz: {}", e))),
    }
}

/// Score the user's active quiz against submitted answers
async fn evaluate_quiz(
    data: web::Data<Arc<AppState>>,
    req: web::Json<EvaluateQuizRequest>,
) -> impl Responder {
    let active = {
        let quizzes = data.quizzes.lock().unwrap();
        quizzes.get(&req.user_id).cloned()
    };

    let Some(active) = active else {
        return HttpResponse::NotFound().json(ApiResponse::<()>::error(
            "No active quiz for this user. Generate one first.",
        ));
    };

    let outcome = quiz::evaluate(&active, &req.answers);

    if let quiz::QuizOutcome::Scored(report) = &outcome {
        if let Err(e) =
            memory::record_quiz_evaluated(&data.timeline, &req.user_id, &active.topic, report.score)
        {
            log::warn!("failed to record evaluation event: {}", e);
        }
    }

    HttpResponse::Ok().json(ApiResponse::success(outcome))
}

/// Load a user's durable profile
async fn get_profile(data: web::Data<Arc<AppState>>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match data.profiles.load(&user_id) {
        Ok(profile) => HttpResponse::Ok().json(ApiResponse::success(profile)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(&format!("Storage error: {}", e))),
    }
}

/// Record a completed module in the durable profile
async fn update_progress(
    data: web::Data<Arc<AppState>>,
    req: web::Json<ProgressRequest>,
) -> impl Responder {
    let mut profile = match data.profiles.load(&req.user_id) {
        Ok(profile) => profile,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error(&format!("Storage error: {}", e)));
        }
    };

    if let Err(e) = profile.record_completion(&req.skill, &req.module_title, req.score) {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(&e.to_string()));
    }

    if let Err(e) = data.profiles.save(&profile) {
        return HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(&format!("Storage error: {}", e)));
    }

    if let Err(e) = memory::record_progress_updated(
        &data.timeline,
        &req.user_id,
        &req.skill,
        &req.module_title,
    ) {
        log::warn!("failed to record progress event: {}", e);
    }

    HttpResponse::Ok().json(ApiResponse::success(profile))
}

/// Search learning resources. Degrades to an empty list, never an error.
async fn search_resources(
    data: web::Data<Arc<AppState>>,
    query: web::Query<ResourcesRequest>,
) -> impl Responder {
    let request = ResourceQuery::new(&query.query, query.max_results);
    let result = data.resources.search(&request);
    HttpResponse::Ok().json(ApiResponse::success(result))
}

/// Invoke a named tool on behalf of the conversational driver
async fn run_tool(data: web::Data<Arc<AppState>>, req: web::Json<ToolRequest>) -> impl Responder {
    let output = data.tools.dispatch(&req.user_id, &req.name, &req.arguments);
    HttpResponse::Ok().json(ApiResponse::success(output))
}

/// Get a user's activity timeline
async fn get_memory(data: web::Data<Arc<AppState>>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match data.timeline.user_timeline(&user_id) {
        Ok(timeline) => HttpResponse::Ok().json(ApiResponse::success(timeline)),
        Err(e) => HttpResponse::InternalServerError()
            .json(ApiResponse::<()>::error(&format!("Database error: {}", e))),
    }
}

// ============================================================
// SERVER CONFIGURATION
// ============================================================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/api/plan", web::post().to(generate_plan))
        .route("/api/plan/complete", web::post().to(complete_module))
        .route("/api/plan/{user_id}", web::get().to(get_plan))
        .route("/api/quiz/generate", web::post().to(generate_quiz))
        .route("/api/quiz/evaluate", web::post().to(evaluate_quiz))
        .route("/api/profile/{user_id}", web::get().to(get_profile))
        .route("/api/progress", web::post().to(update_progress))
        .route("/api/resources", web::get().to(search_resources))
        .route("/api/tool", web::post().to(run_tool))
        .route("/api/memory/{user_id}", web::get().to(get_memory));
}

/// Configure and run the API server
pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let state = Arc::new(
        AppState::from_config(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );

    log::info!(
        "Learning Agent API starting at http://{}:{}",
        config.host,
        config.port
    );
    log::info!("profiles dir: {}", config.data_dir.display());
    log::info!("timeline db: {}", config.db_path.display());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use serde_json::json;

    fn test_state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let profiles = Arc::new(ProfileStore::new(dir.path().join("profiles")).unwrap());
        let timeline = Arc::new(TimelineStore::in_memory().unwrap());
        (dir, Arc::new(AppState::new(profiles, timeline)))
    }

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn health_endpoint_responds() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_rt::test]
    async fn plan_generation_and_completion_flow() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/plan")
            .set_json(json!({"user_id": "u", "skill": "Rust", "level": "beginner"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["modules"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"]["modules"][0]["status"], "active");

        let req = test::TestRequest::post()
            .uri("/api/plan/complete")
            .set_json(json!({"user_id": "u", "module_id": 1, "score": 85.0}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["modules"][0]["status"], "completed");
        assert_eq!(body["data"]["modules"][1]["status"], "active");

        let req = test::TestRequest::get().uri("/api/plan/u").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["modules"][0]["mastery_score"], 85.0);
    }

    #[actix_rt::test]
    async fn quiz_generation_and_evaluation_flow() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/quiz/generate")
            .set_json(json!({
                "user_id": "u",
                "topic": "Rust",
                "difficulty": "beginner",
                "num_questions": 3,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        let questions = body["data"]["questions"].as_array().unwrap().clone();
        assert_eq!(questions.len(), 3);

        let answers: Vec<u64> = questions
            .iter()
            .map(|q| q["correct_index"].as_u64().unwrap())
            .collect();
        let req = test::TestRequest::post()
            .uri("/api/quiz/evaluate")
            .set_json(json!({"user_id": "u", "answers": answers}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "scored");
        assert_eq!(body["data"]["score"], 100.0);
        assert_eq!(body["data"]["tier"], "mastered");
    }

    #[actix_rt::test]
    async fn evaluating_without_an_active_quiz_is_not_found() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/quiz/evaluate")
            .set_json(json!({"user_id": "nobody", "answers": [0, 1, 2]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn progress_updates_persist_into_the_profile() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/progress")
            .set_json(json!({
                "user_id": "u",
                "skill": "Python",
                "module_title": "Basics",
                "score": 80.0,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total_modules_completed"], 1);

        let req = test::TestRequest::get().uri("/api/profile/u").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["skills"]["Python"]["avg_score"], 80.0);
    }

    #[actix_rt::test]
    async fn tool_endpoint_relays_dispatch_text() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/tool")
            .set_json(json!({
                "user_id": "u",
                "name": "real_time_resource_search",
                "arguments": {"query": "python", "max_results": 2},
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_str().unwrap().contains("Found 2 learning resources"));

        let req = test::TestRequest::post()
            .uri("/api/tool")
            .set_json(json!({"user_id": "u", "name": "bogus", "arguments": {}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_str().unwrap().contains("Unknown tool"));
    }

    #[actix_rt::test]
    async fn memory_endpoint_returns_the_timeline() {
        let (_dir, state) = test_state();
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/plan")
            .set_json(json!({"user_id": "u", "skill": "Go", "level": "expert"}))
            .to_request();
        let _: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get().uri("/api/memory/u").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let events = body["data"]["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event_type"], "plan_generated");
    }
}
