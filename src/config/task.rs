//! Named bundles of per-repository file paths (spec §3/§4.7 — `Task`, C7).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GmanError, GmanResult};

use super::ConfigStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFile {
    pub repository: String,
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<TaskFile>,
}

/// Find the repository whose path is the longest prefix of `absolute_path`.
///
/// Used both by `AddFilesToTask` (spec §4.1/§4.7) and is the textbook
/// "which repo owns this file" resolution referenced in spec §9's path
/// canonicalization note.
fn owning_repository<'a>(
    repositories: &'a IndexMap<String, PathBuf>,
    absolute_path: &Path,
) -> Option<(&'a str, &'a PathBuf)> {
    repositories
        .iter()
        .filter(|(_, repo_path)| absolute_path.starts_with(repo_path.as_path()))
        .max_by_key(|(_, repo_path)| repo_path.as_os_str().len())
        .map(|(alias, path)| (alias.as_str(), path))
}

impl ConfigStore {
    pub fn create_task(&self, name: &str, description: &str) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        let now = Utc::now();
        config.tasks.insert(
            name.to_string(),
            Task {
                description: description.to_string(),
                created_at: now,
                updated_at: now,
                files: Vec::new(),
            },
        );
        drop(config);
        self.save()
    }

    pub fn delete_task(&self, name: &str) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        if config.tasks.shift_remove(name).is_none() {
            return Err(GmanError::TaskNotFound { name: name.to_string() });
        }
        drop(config);
        self.save()
    }

    pub fn get_tasks(&self) -> IndexMap<String, Task> {
        self.inner.lock().unwrap().tasks.clone()
    }

    pub fn get_task(&self, name: &str) -> GmanResult<Task> {
        self.inner
            .lock()
            .unwrap()
            .tasks
            .get(name)
            .cloned()
            .ok_or_else(|| GmanError::TaskNotFound { name: name.to_string() })
    }

    /// Add files to a task, deriving each file's owning repository by
    /// longest-prefix match. Rejects any path not under a known repository.
    pub fn add_files_to_task(&self, name: &str, absolute_paths: &[PathBuf]) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();

        let mut resolved = Vec::new();
        for abs in absolute_paths {
            let canonical = dunce::canonicalize(abs).unwrap_or_else(|_| abs.clone());
            let (alias, repo_path) = owning_repository(&config.repositories, &canonical)
                .ok_or_else(|| GmanError::Internal {
                    cause: format!("{} is not under any known repository", abs.display()),
                })?;
            let relative_path = canonical
                .strip_prefix(repo_path)
                .unwrap_or(&canonical)
                .to_path_buf();
            resolved.push((alias.to_string(), relative_path, canonical));
        }

        let task = config
            .tasks
            .get_mut(name)
            .ok_or_else(|| GmanError::TaskNotFound { name: name.to_string() })?;

        for (repository, relative_path, absolute_path) in resolved {
            if !task.files.iter().any(|f| f.absolute_path == absolute_path) {
                task.files.push(TaskFile {
                    repository,
                    relative_path,
                    absolute_path,
                });
            }
        }
        task.updated_at = Utc::now();

        drop(config);
        self.save()
    }

    pub fn remove_files_from_task(&self, name: &str, absolute_paths: &[PathBuf]) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        let task = config
            .tasks
            .get_mut(name)
            .ok_or_else(|| GmanError::TaskNotFound { name: name.to_string() })?;
        task.files.retain(|f| !absolute_paths.contains(&f.absolute_path));
        task.updated_at = Utc::now();
        drop(config);
        self.save()
    }

    /// Absolute paths for a task's files, filtering out any that no longer
    /// exist on disk (spec §4.7 — "external tools never receive dead paths").
    pub fn get_task_files(&self, name: &str) -> GmanResult<Vec<PathBuf>> {
        let task = self.get_task(name)?;
        Ok(task
            .files
            .into_iter()
            .map(|f| f.absolute_path)
            .filter(|p| p.exists())
            .collect())
    }
}
