//! Profile Store
//!
//! Durable key-value persistence of one `UserProfile` per user id, as a
//! JSON file per user under the data directory. Saves are atomic from a
//! reader's perspective: the record is written to a temporary file in the
//! same directory and renamed over the target.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::types::{UserProfile, ValidationError};

/// Persistence failure surfaced to the caller. Not retried automatically.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to prepare profile directory {path}: {source}")]
    Init {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read profile for '{user_id}': {source}")]
    Read {
        user_id: String,
        source: std::io::Error,
    },

    #[error("profile record for '{user_id}' is corrupt: {source}")]
    Corrupt {
        user_id: String,
        source: serde_json::Error,
    },

    #[error("profile record for '{user_id}' failed validation: {source}")]
    Invalid {
        user_id: String,
        source: ValidationError,
    },

    #[error("failed to encode profile for '{user_id}': {source}")]
    Encode {
        user_id: String,
        source: serde_json::Error,
    },

    #[error("failed to write profile for '{user_id}': {source}")]
    Write {
        user_id: String,
        source: std::io::Error,
    },
}

/// Map a user id to a filesystem-safe storage key.
///
/// Plain ids pass through unchanged. Anything containing separators or other
/// unsafe characters keeps a readable alphanumeric prefix and gains a SHA-256
/// suffix, so distinct ids never collide and traversal sequences never reach
/// the filesystem.
pub fn storage_key(user_id: &str) -> String {
    let plain = !user_id.is_empty()
        && user_id.len() <= 64
        && !user_id.starts_with('.')
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if plain {
        return user_id.to_string();
    }

    let digest = hex::encode(&Sha256::digest(user_id.as_bytes())[..8]);
    let prefix: String = user_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(24)
        .collect();

    if prefix.is_empty() {
        digest
    } else {
        format!("{}-{}", prefix, digest)
    }
}

/// Flat-file JSON store, one record per user
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Init {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", storage_key(user_id)))
    }

    /// Load the persisted profile, or a fresh empty one if none exists.
    /// Absence is an expected state, never an error.
    pub fn load(&self, user_id: &str) -> Result<UserProfile, StorageError> {
        let path = self.profile_path(user_id);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UserProfile::empty(user_id));
            }
            Err(source) => {
                return Err(StorageError::Read {
                    user_id: user_id.to_string(),
                    source,
                });
            }
        };

        let profile: UserProfile =
            serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                user_id: user_id.to_string(),
                source,
            })?;
        profile.validate().map_err(|source| StorageError::Invalid {
            user_id: user_id.to_string(),
            source,
        })?;
        Ok(profile)
    }

    /// Write the full profile, overwriting any prior record. A concurrent
    /// reader sees either the old record or the new one, never a partial
    /// write.
    pub fn save(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let user_id = profile.user_id.clone();
        let path = self.profile_path(&user_id);

        let payload =
            serde_json::to_vec_pretty(profile).map_err(|source| StorageError::Encode {
                user_id: user_id.clone(),
                source,
            })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(|source| {
            StorageError::Write {
                user_id: user_id.clone(),
                source,
            }
        })?;
        tmp.write_all(&payload).map_err(|source| StorageError::Write {
            user_id: user_id.clone(),
            source,
        })?;
        tmp.persist(&path).map_err(|e| StorageError::Write {
            user_id,
            source: e.error,
        })?;

        log::debug!("saved profile to {}", path.display());
        Ok(())
    }
}

// ============================================================
// PROFILE VIEWS
// ============================================================

/// Render a full profile for the conversational layer, listing the last
/// three completed modules per skill.
pub fn profile_overview(profile: &UserProfile) -> String {
    if profile.skills.is_empty() {
        return "No learning history found for this user. This is a new learner!".to_string();
    }

    let mut output = vec![
        format!("User Profile: {}", profile.user_id),
        format!("Total Modules Completed: {}", profile.total_modules_completed),
        format!("Overall Average Score: {:.1}%\n", profile.overall_avg_score),
    ];

    for (skill, progress) in &profile.skills {
        output.push(format!("Skill: {}", skill));
        output.push(format!("  Average Score: {:.1}%", progress.avg_score));
        output.push(format!("  Modules Completed: {}", progress.modules.len()));

        let recent = progress.modules.iter().rev().take(3).rev();
        for module in recent {
            output.push(format!("    - {}: {:.1}%", module.title, module.score));
        }
    }

    output.join("\n")
}

/// Render a brief progress summary with the learner's best skill.
pub fn progress_summary(profile: &UserProfile) -> String {
    if profile.skills.is_empty() {
        return "No progress yet. Let's start learning!".to_string();
    }

    let best = profile
        .skills
        .iter()
        .max_by(|a, b| a.1.avg_score.total_cmp(&b.1.avg_score))
        .expect("skills is non-empty");

    format!(
        "Progress Summary:\n\
         Skills in progress: {}\n\
         Total modules completed: {}\n\
         Overall average: {:.1}%\n\
         Best skill: {} ({:.1}%)",
        profile.skills.len(),
        profile.total_modules_completed,
        profile.overall_avg_score,
        best.0,
        best.1.avg_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles")).unwrap();
        (dir, store)
    }

    #[test]
    fn load_missing_profile_returns_empty() {
        let (_dir, store) = store();
        let profile = store.load("newcomer").unwrap();
        assert_eq!(profile.user_id, "newcomer");
        assert!(profile.skills.is_empty());
        assert_eq!(profile.total_modules_completed, 0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let mut profile = UserProfile::empty("learner");
        profile.record_completion("Python", "Basics", 80.0).unwrap();
        profile.record_completion("Python", "Functions", 90.0).unwrap();
        store.save(&profile).unwrap();

        let loaded = store.load("learner").unwrap();
        assert_eq!(loaded.user_id, profile.user_id);
        assert_eq!(loaded.total_modules_completed, 2);
        assert!((loaded.overall_avg_score - 85.0).abs() < 1e-9);
        assert_eq!(loaded.skills["Python"].modules.len(), 2);
        assert_eq!(loaded.skills["Python"].modules[0].title, "Basics");
    }

    #[test]
    fn save_overwrites_prior_record() {
        let (_dir, store) = store();
        let mut profile = UserProfile::empty("learner");
        profile.record_completion("SQL", "Joins", 60.0).unwrap();
        store.save(&profile).unwrap();

        profile.record_completion("SQL", "Indexes", 100.0).unwrap();
        store.save(&profile).unwrap();

        let loaded = store.load("learner").unwrap();
        assert_eq!(loaded.total_modules_completed, 2);
        assert!((loaded.skills["SQL"].avg_score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn corrupt_record_surfaces_storage_error() {
        let (_dir, store) = store();
        std::fs::write(store.root().join("broken.json"), "{not json").unwrap();
        let err = store.load("broken").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn storage_key_passes_plain_ids_through() {
        assert_eq!(storage_key("alice"), "alice");
        assert_eq!(storage_key("user_42"), "user_42");
        assert_eq!(storage_key("jane.doe-1"), "jane.doe-1");
    }

    #[test]
    fn storage_key_neutralizes_traversal_sequences() {
        let key = storage_key("../../etc/passwd");
        assert!(!key.contains('/'));
        assert!(!key.contains(".."));
        assert!(!key.starts_with('.'));
    }

    #[test]
    fn storage_key_keeps_distinct_ids_distinct() {
        let ids = ["a/b", "a_b", "a\\b", "a b", "a//b"];
        let keys: std::collections::HashSet<String> =
            ids.iter().map(|id| storage_key(id)).collect();
        assert_eq!(keys.len(), ids.len());
    }

    #[test]
    fn hostile_ids_stay_inside_the_data_directory() {
        let (_dir, store) = store();
        let mut profile = UserProfile::empty("../escape");
        profile.record_completion("Python", "Basics", 70.0).unwrap();
        store.save(&profile).unwrap();

        // The record is findable through the same key mapping
        let loaded = store.load("../escape").unwrap();
        assert_eq!(loaded.total_modules_completed, 1);

        // And nothing was written outside the store root
        let entries: Vec<_> = std::fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn overview_and_summary_render_progress() {
        let mut profile = UserProfile::empty("learner");
        assert!(profile_overview(&profile).contains("new learner"));
        assert!(progress_summary(&profile).contains("No progress yet"));

        profile.record_completion("Python", "Basics", 90.0).unwrap();
        profile.record_completion("SQL", "Joins", 70.0).unwrap();

        let overview = profile_overview(&profile);
        assert!(overview.contains("Skill: Python"));
        assert!(overview.contains("Basics: 90.0%"));

        let summary = progress_summary(&profile);
        assert!(summary.contains("Best skill: Python (90.0%)"));
    }
}
