//! Learning Plan Builder
//!
//! Deterministic module-sequence generation and unlock progression.
//! Plan generation is pure: the same (skill, level) pair always yields the
//! same plan, module for module.

use chrono::Utc;

use super::types::{LearningPlan, Level, Module, ModuleStatus};

/// Generate a three-module learning plan for a skill at a starting level.
///
/// The first module starts `active`, the rest `locked`. Estimated hours grow
/// by two per module from a base of four.
pub fn generate_plan(skill: &str, level: Level) -> LearningPlan {
    let titles = module_titles(skill, level);

    let modules = titles
        .into_iter()
        .enumerate()
        .map(|(idx, title)| Module {
            id: idx as u32 + 1,
            title,
            status: if idx == 0 {
                ModuleStatus::Active
            } else {
                ModuleStatus::Locked
            },
            topics: (1..=3).map(|i| format!("Topic {}", i)).collect(),
            estimated_hours: 4 + idx as u32 * 2,
            mastery_score: 0.0,
        })
        .collect();

    LearningPlan {
        skill: skill.to_string(),
        level,
        modules,
        created: Utc::now(),
    }
}

fn module_titles(skill: &str, level: Level) -> [String; 3] {
    match level {
        Level::Beginner => [
            format!("Foundations of {}", skill),
            format!("Core Concepts in {}", skill),
            format!("Practical Applications of {}", skill),
        ],
        Level::Intermediate => [
            format!("Advanced Concepts in {}", skill),
            format!("Real-World {} Projects", skill),
            format!("Mastering {}", skill),
        ],
        Level::Expert => [
            format!("Expert-Level {}", skill),
            format!("Cutting-Edge {} Research", skill),
            format!("{} Innovation & Leadership", skill),
        ],
    }
}

/// Mark a module as completed and unlock its immediate successor.
///
/// An unmatched `module_id` leaves the plan untouched. At most one module
/// transitions to `active` per call; there is no cascading unlock.
pub fn complete_module(plan: &mut LearningPlan, module_id: u32, score: f64) {
    let Some(idx) = plan.modules.iter().position(|m| m.id == module_id) else {
        log::debug!("complete_module: no module with id {} in plan", module_id);
        return;
    };

    let module = &mut plan.modules[idx];
    module.status = ModuleStatus::Completed;
    module.mastery_score = score;

    if let Some(next) = plan.modules.get_mut(idx + 1) {
        if next.status == ModuleStatus::Locked {
            next.status = ModuleStatus::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_three_modules_with_expected_shape() {
        let plan = generate_plan("Machine Learning", Level::Beginner);

        assert_eq!(plan.modules.len(), 3);
        assert_eq!(plan.modules[0].status, ModuleStatus::Active);
        assert_eq!(plan.modules[1].status, ModuleStatus::Locked);
        assert_eq!(plan.modules[2].status, ModuleStatus::Locked);

        let hours: Vec<u32> = plan.modules.iter().map(|m| m.estimated_hours).collect();
        assert_eq!(hours, vec![4, 6, 8]);

        for module in &plan.modules {
            assert_eq!(module.topics.len(), 3);
            assert!((module.mastery_score - 0.0).abs() < f64::EPSILON);
        }
        assert_eq!(plan.modules[0].title, "Foundations of Machine Learning");
        plan.validate().unwrap();
    }

    #[test]
    fn generate_uses_level_specific_templates() {
        let intermediate = generate_plan("Rust", Level::Intermediate);
        assert_eq!(intermediate.modules[0].title, "Advanced Concepts in Rust");

        let expert = generate_plan("Rust", Level::Expert);
        assert_eq!(expert.modules[0].title, "Expert-Level Rust");
        assert_eq!(expert.modules[2].title, "Rust Innovation & Leadership");
    }

    #[test]
    fn generate_is_deterministic() {
        let a = generate_plan("SQL", Level::Beginner);
        let b = generate_plan("SQL", Level::Beginner);
        let titles_a: Vec<&str> = a.modules.iter().map(|m| m.title.as_str()).collect();
        let titles_b: Vec<&str> = b.modules.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles_a, titles_b);
    }

    #[test]
    fn complete_module_unlocks_immediate_successor() {
        let mut plan = generate_plan("Python", Level::Beginner);
        // Simulate normal progression up to module 2
        complete_module(&mut plan, 1, 70.0);
        assert_eq!(plan.modules[1].status, ModuleStatus::Active);

        complete_module(&mut plan, 2, 85.0);
        assert_eq!(plan.modules[1].status, ModuleStatus::Completed);
        assert!((plan.modules[1].mastery_score - 85.0).abs() < 1e-9);
        assert_eq!(plan.modules[2].status, ModuleStatus::Active);
        // Module 1 unaffected
        assert_eq!(plan.modules[0].status, ModuleStatus::Completed);
        assert!((plan.modules[0].mastery_score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn completing_last_module_has_no_successor_to_unlock() {
        let mut plan = generate_plan("Python", Level::Beginner);
        complete_module(&mut plan, 1, 90.0);
        complete_module(&mut plan, 2, 90.0);
        complete_module(&mut plan, 3, 90.0);

        assert!(plan.modules.iter().all(|m| m.status == ModuleStatus::Completed));
        assert!(plan.active_module().is_none());
    }

    #[test]
    fn unmatched_module_id_is_a_no_op() {
        let mut plan = generate_plan("Python", Level::Beginner);
        let before = serde_json::to_value(&plan).unwrap();
        complete_module(&mut plan, 42, 99.0);
        let after = serde_json::to_value(&plan).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn exactly_one_module_active_during_progression() {
        let mut plan = generate_plan("Go", Level::Intermediate);
        let active_count = |p: &LearningPlan| {
            p.modules
                .iter()
                .filter(|m| m.status == ModuleStatus::Active)
                .count()
        };
        assert_eq!(active_count(&plan), 1);
        complete_module(&mut plan, 1, 75.0);
        assert_eq!(active_count(&plan), 1);
        complete_module(&mut plan, 2, 75.0);
        assert_eq!(active_count(&plan), 1);
    }
}
