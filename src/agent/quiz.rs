//! Quiz Lifecycle
//!
//! Scoring of completed quiz attempts, feedback tiers, and the seam to the
//! quiz-generation collaborator. Evaluation never panics on user input:
//! a mismatched answer sheet is a reportable outcome, not an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Level, Quiz, QuizQuestion, ValidationError};

// ============================================================
// FEEDBACK TIERS
// ============================================================

/// Feedback bucket derived from a quiz score. Thresholds are inclusive on
/// the lower bound and checked in descending order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    Mastered,
    Strong,
    OnTrack,
    Fair,
    NeedsMoreStudy,
}

impl FeedbackTier {
    pub fn for_score(score: f64) -> Self {
        if score >= 90.0 {
            FeedbackTier::Mastered
        } else if score >= 80.0 {
            FeedbackTier::Strong
        } else if score >= 70.0 {
            FeedbackTier::OnTrack
        } else if score >= 60.0 {
            FeedbackTier::Fair
        } else {
            FeedbackTier::NeedsMoreStudy
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FeedbackTier::Mastered => "Excellent! You've mastered this topic.",
            FeedbackTier::Strong => "Great work! You have a strong understanding.",
            FeedbackTier::OnTrack => "Good job! You're on the right track.",
            FeedbackTier::Fair => "Fair performance. Review the material and try again.",
            FeedbackTier::NeedsMoreStudy => {
                "More study needed. Don't worry, practice makes perfect!"
            }
        }
    }
}

// ============================================================
// EVALUATION
// ============================================================

/// Review detail for one question, sufficient to render a full answer
/// review without touching the quiz again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    /// 1-based position in the quiz
    pub question_num: usize,
    pub question: String,
    /// Submitted choice as an option letter (A-D)
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Scored attempt with per-question review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Unrounded percentage; presentation layers round for display
    pub score: f64,
    pub correct: usize,
    pub total: usize,
    pub tier: FeedbackTier,
    pub feedback: String,
    pub results: Vec<QuestionResult>,
}

/// Outcome of evaluating an attempt. A mismatched answer count is a
/// recoverable validation outcome the conversational layer can relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizOutcome {
    Scored(QuizReport),
    Rejected { message: String, score: f64 },
}

fn option_label(index: usize) -> String {
    if index < 4 {
        ((b'A' + index as u8) as char).to_string()
    } else {
        "?".to_string()
    }
}

/// Score a completed quiz attempt against the submitted answer indices.
pub fn evaluate(quiz: &Quiz, user_answers: &[usize]) -> QuizOutcome {
    if user_answers.len() != quiz.questions.len() {
        return QuizOutcome::Rejected {
            message: format!(
                "Number of answers ({}) doesn't match number of questions ({})",
                user_answers.len(),
                quiz.questions.len()
            ),
            score: 0.0,
        };
    }

    let mut results = Vec::with_capacity(quiz.questions.len());
    let mut correct_count = 0;

    for (idx, (question, &answer)) in quiz.questions.iter().zip(user_answers).enumerate() {
        let is_correct = answer == question.correct_index;
        if is_correct {
            correct_count += 1;
        }
        results.push(QuestionResult {
            question_num: idx + 1,
            question: question.question.clone(),
            user_answer: option_label(answer),
            correct_answer: option_label(question.correct_index),
            is_correct,
            explanation: question.explanation.clone(),
        });
    }

    let score = correct_count as f64 / quiz.questions.len() as f64 * 100.0;
    let tier = FeedbackTier::for_score(score);

    QuizOutcome::Scored(QuizReport {
        score,
        correct: correct_count,
        total: quiz.questions.len(),
        tier,
        feedback: tier.message().to_string(),
        results,
    })
}

// ============================================================
// GENERATION COLLABORATOR
// ============================================================

/// Validated request for the quiz-generation collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub module_id: u32,
    pub topic: String,
    pub difficulty: Level,
    pub num_questions: usize,
}

impl QuizRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::new("topic", "quiz topic must not be empty"));
        }
        if !(3..=10).contains(&self.num_questions) {
            return Err(ValidationError::new(
                "num_questions",
                format!("must be between 3 and 10, got {}", self.num_questions),
            ));
        }
        Ok(())
    }
}

/// Failure from the generation collaborator, surfaced as text for the
/// conversational layer rather than crashing the interaction.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid quiz request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("quiz generator returned a malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("generated quiz failed validation: {0}")]
    InvalidQuiz(ValidationError),

    #[error("quiz generation failed: {0}")]
    Upstream(String),
}

/// Seam for the external quiz-generation collaborator. A hosted-model
/// implementation plugs in here; the core only requires that the output
/// satisfies the domain invariants.
pub trait QuizGenerator: Send + Sync {
    fn generate(&self, request: &QuizRequest) -> Result<Quiz, GenerationError>;
}

/// Validate an upstream generator's JSON payload into a domain `Quiz`.
pub fn parse_quiz_payload(payload: &str) -> Result<Quiz, GenerationError> {
    let quiz: Quiz = serde_json::from_str(payload)?;
    quiz.validate().map_err(GenerationError::InvalidQuiz)?;
    Ok(quiz)
}

// ============================================================
// TEMPLATE GENERATOR
// ============================================================

struct QuestionTemplate {
    question: &'static str,
    options: [&'static str; 4],
    correct_index: usize,
    explanation: &'static str,
}

const BEGINNER_BANK: &[QuestionTemplate] = &[
    QuestionTemplate {
        question: "Which statement best describes what studying {topic} begins with?",
        options: [
            "Advanced internals only",
            "The fundamentals and core ideas",
            "Rewriting production systems",
            "Vendor certifications",
        ],
        correct_index: 1,
        explanation: "A beginner path starts from the fundamentals before anything else.",
    },
    QuestionTemplate {
        question: "When starting out with {topic}, which habit helps the most?",
        options: [
            "Practicing small examples regularly",
            "Memorizing trivia without practice",
            "Skipping documentation entirely",
            "Avoiding feedback on mistakes",
        ],
        correct_index: 0,
        explanation: "Regular hands-on practice builds durable understanding.",
    },
    QuestionTemplate {
        question: "Which resource is usually the best first stop for {topic}?",
        options: [
            "Random forum threads",
            "Unreviewed code snippets",
            "The official documentation or an introductory tutorial",
            "Marketing material",
        ],
        correct_index: 2,
        explanation: "Official documentation and introductory tutorials are curated for newcomers.",
    },
    QuestionTemplate {
        question: "What is a realistic first goal when learning {topic}?",
        options: [
            "Publishing a research paper",
            "Skipping the basics to study internals",
            "Rewriting an entire production system",
            "Completing a small end-to-end exercise",
        ],
        correct_index: 3,
        explanation: "A small end-to-end exercise exercises every fundamental at once.",
    },
    QuestionTemplate {
        question: "How should mistakes be treated while learning {topic}?",
        options: [
            "As feedback that guides further study",
            "As failures to hide",
            "As reasons to quit",
            "As someone else's problem",
        ],
        correct_index: 0,
        explanation: "Mistakes are the main feedback signal in early learning.",
    },
];

const INTERMEDIATE_BANK: &[QuestionTemplate] = &[
    QuestionTemplate {
        question: "What distinguishes intermediate work in {topic} from beginner work?",
        options: [
            "Avoiding all documentation",
            "Applying concepts to realistic projects",
            "Memorizing syntax only",
            "Never revisiting fundamentals",
        ],
        correct_index: 1,
        explanation: "Intermediate learners apply the fundamentals to realistic projects.",
    },
    QuestionTemplate {
        question: "When applying {topic} to a real project, what should come first?",
        options: [
            "Understanding the problem and its constraints",
            "Optimizing before measuring",
            "Copying a solution verbatim",
            "Skipping tests to save time",
        ],
        correct_index: 0,
        explanation: "Requirements and constraints shape every later decision.",
    },
    QuestionTemplate {
        question: "Which approach improves {topic} skills fastest at this stage?",
        options: [
            "Reading without building anything",
            "Building complete examples and reviewing them critically",
            "Switching topics every day",
            "Only watching recorded talks",
        ],
        correct_index: 1,
        explanation: "Building and then reviewing complete work surfaces real gaps.",
    },
    QuestionTemplate {
        question: "How do practitioners of {topic} weigh competing approaches?",
        options: [
            "By always picking the newest option",
            "By intuition alone",
            "By comparing alternatives against the actual requirements",
            "By avoiding the decision",
        ],
        correct_index: 2,
        explanation: "Trade-offs only resolve against concrete requirements.",
    },
    QuestionTemplate {
        question: "What signals readiness to move beyond the intermediate stage of {topic}?",
        options: [
            "Delivering working results without step-by-step guidance",
            "Finishing one tutorial",
            "Memorizing the standard library",
            "Collecting certificates",
        ],
        correct_index: 0,
        explanation: "Independent delivery is the practical bar for advancement.",
    },
];

const EXPERT_BANK: &[QuestionTemplate] = &[
    QuestionTemplate {
        question: "At the expert level, progress in {topic} comes mostly from what?",
        options: [
            "Repeating introductory exercises",
            "Synthesizing ideas across problems and mentoring others",
            "Avoiding unfamiliar problems",
            "Working only from memory",
        ],
        correct_index: 1,
        explanation: "Experts grow by synthesis and by teaching, not by repetition.",
    },
    QuestionTemplate {
        question: "How do experts usually push the boundaries of {topic}?",
        options: [
            "By studying current research and open problems",
            "By ignoring new developments",
            "By repeating what already works",
            "By delegating all hard problems",
        ],
        correct_index: 0,
        explanation: "Open problems and current research define the frontier.",
    },
    QuestionTemplate {
        question: "What characterizes expert-level problem solving in {topic}?",
        options: [
            "Applying one favorite technique everywhere",
            "Guessing quickly and moving on",
            "Deferring every decision",
            "Weighing subtle trade-offs under real constraints",
        ],
        correct_index: 3,
        explanation: "Expert judgment is mostly about trade-offs under constraints.",
    },
    QuestionTemplate {
        question: "Which contribution is typical of an expert in {topic}?",
        options: [
            "Designing approaches that others build upon",
            "Completing beginner tutorials",
            "Collecting tool licenses",
            "Avoiding code review",
        ],
        correct_index: 0,
        explanation: "Experts produce designs and frameworks that outlive single projects.",
    },
    QuestionTemplate {
        question: "What keeps expert knowledge of {topic} current?",
        options: [
            "A fixed reading list from years ago",
            "Continuous evaluation of new developments",
            "Ignoring practitioners' reports",
            "Relying on seniority",
        ],
        correct_index: 1,
        explanation: "Expertise decays without continuous evaluation of what's new.",
    },
];

/// Deterministic offline generator assembling a valid quiz from
/// difficulty-keyed templates. Keeps the whole stack usable without any
/// hosted-model credentials.
pub struct TemplateQuizGenerator;

impl QuizGenerator for TemplateQuizGenerator {
    fn generate(&self, request: &QuizRequest) -> Result<Quiz, GenerationError> {
        request.validate()?;

        let bank = match request.difficulty {
            Level::Beginner => BEGINNER_BANK,
            Level::Intermediate => INTERMEDIATE_BANK,
            Level::Expert => EXPERT_BANK,
        };

        let questions: Vec<QuizQuestion> = (0..request.num_questions)
            .map(|i| {
                let template = &bank[i % bank.len()];
                let mut question = template.question.replace("{topic}", &request.topic);
                if i >= bank.len() {
                    question = format!("{} (continued {})", question, i / bank.len() + 1);
                }
                QuizQuestion {
                    question,
                    options: template.options.iter().map(|o| o.to_string()).collect(),
                    correct_index: template.correct_index,
                    explanation: Some(template.explanation.to_string()),
                }
            })
            .collect();

        let quiz = Quiz {
            module_id: request.module_id,
            topic: request.topic.clone(),
            difficulty: request.difficulty,
            questions,
        };
        quiz.validate().map_err(GenerationError::InvalidQuiz)?;
        Ok(quiz)
    }
}

/// Render a generated quiz as agent-facing text, with the structured JSON
/// payload appended for downstream evaluation.
pub fn format_quiz_output(quiz: &Quiz) -> String {
    let mut output = vec![
        "Quiz Generated Successfully!".to_string(),
        format!("Topic: {}", quiz.topic),
        format!("Difficulty: {}", quiz.difficulty),
        format!("Questions: {}\n", quiz.questions.len()),
        "=".repeat(50),
    ];

    for (idx, question) in quiz.questions.iter().enumerate() {
        output.push(format!("\nQuestion {}: {}", idx + 1, question.question));
        for (opt_idx, option) in question.options.iter().enumerate() {
            output.push(format!("  {}. {}", option_label(opt_idx), option));
        }
        output.push(format!("Correct Answer: {}", option_label(question.correct_index)));
        if let Some(explanation) = &question.explanation {
            output.push(format!("Explanation: {}", explanation));
        }
        output.push("-".repeat(50));
    }

    match serde_json::to_string_pretty(quiz) {
        Ok(json) => {
            output.push("\n[Quiz data saved in structured format]".to_string());
            output.push(format!("Quiz JSON:\n{}", json));
        }
        Err(e) => log::warn!("failed to serialize quiz payload: {}", e),
    }

    output.join("\n")
}
