//! Persisted reproduction tokens and failure snapshots.
//!
//! Only available with the `persistence` feature. A [`ReproToken`] captures
//! everything needed to replay one trial deterministically: the seed, the
//! size, and the ordered draw log. A [`FailureSnapshot`] bundles a token with
//! the rendered counterexample so a failure can be inspected (and re-run)
//! after the process is gone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::runner::TestResult;

/// Enough structure to deterministically replay one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproToken {
    /// Seed of the failing trial.
    pub seed: u64,
    /// Size hint of the failing trial.
    pub size: u32,
    /// Ordered descriptions of the draws that were made, one per recorded
    /// pick or atom.
    pub draws: Vec<String>,
}

/// A persisted failing case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSnapshot {
    pub test_name: String,
    pub token: ReproToken,
    pub description: String,
    pub counterexample: String,
    pub num_shrinks: usize,
}

impl FailureSnapshot {
    /// Build a snapshot from a failed run. Returns `None` for non-failures.
    pub fn from_result(test_name: &str, result: &TestResult, draws: Vec<String>) -> Option<Self> {
        match result {
            TestResult::Failure {
                case,
                description,
                num_shrinks,
                counterexample,
                ..
            } => Some(FailureSnapshot {
                test_name: test_name.to_string(),
                token: ReproToken {
                    seed: case.seed,
                    size: case.size,
                    draws,
                },
                description: description.clone(),
                counterexample: counterexample.clone(),
                num_shrinks: *num_shrinks,
            }),
            _ => None,
        }
    }

    /// Write the snapshot as JSON under `dir`, one file per (test, seed).
    pub fn save_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}-{:016x}.json", self.test_name, self.token.seed));
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Load one snapshot file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Load every snapshot for a test, most recent seed order not guaranteed.
    pub fn load_all(dir: &Path, test_name: &str) -> io::Result<Vec<Self>> {
        let mut out = Vec::new();
        if !dir.exists() {
            return Ok(out);
        }
        let prefix = format!("{}-", test_name);
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(".json") {
                out.push(Self::load(&entry.path())?);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TestCase;

    fn failure() -> TestResult {
        TestResult::Failure {
            num_success: 4,
            case: TestCase {
                index: 4,
                seed: 0xdead_beef,
                size: 17,
            },
            description: "a / 10 != b / 10".to_string(),
            num_shrinks: 9,
            counterexample: "(0, 10)".to_string(),
        }
    }

    #[test]
    fn snapshot_only_from_failures() {
        let ok = TestResult::Success {
            num_success: 10,
            tags: Default::default(),
        };
        assert!(FailureSnapshot::from_result("t", &ok, vec![]).is_none());
        assert!(FailureSnapshot::from_result("t", &failure(), vec![]).is_some());
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = FailureSnapshot::from_result(
            "div10",
            &failure(),
            vec!["0".to_string(), "10".to_string()],
        )
        .unwrap();
        let path = snapshot.save_to(dir.path()).unwrap();
        let loaded = FailureSnapshot::load(&path).unwrap();
        assert_eq!(snapshot, loaded);
    }

    #[test]
    fn load_all_filters_by_test_name() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = FailureSnapshot::from_result("div10", &failure(), vec![]).unwrap();
        snapshot.save_to(dir.path()).unwrap();
        assert_eq!(
            FailureSnapshot::load_all(dir.path(), "div10").unwrap().len(),
            1
        );
        assert!(
            FailureSnapshot::load_all(dir.path(), "other")
                .unwrap()
                .is_empty()
        );
        assert!(
            FailureSnapshot::load_all(&dir.path().join("missing"), "div10")
                .unwrap()
                .is_empty()
        );
    }
}
