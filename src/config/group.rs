//! Named, ordered subsets of repositories (spec §3/§4.7 — `Group`, part of C7).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{GmanError, GmanResult};

use super::ConfigStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Member repository aliases, in insertion order (user-visible).
    pub repositories: Vec<String>,
}

impl ConfigStore {
    pub fn create_group(&self, name: &str, description: &str, members: &[String]) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        for alias in members {
            if !config.repositories.contains_key(alias) {
                return Err(GmanError::RepoNotFound { alias: alias.clone() });
            }
        }
        let mut repositories = Vec::new();
        for alias in members {
            if !repositories.contains(alias) {
                repositories.push(alias.clone());
            }
        }
        config.groups.insert(
            name.to_string(),
            Group {
                description: description.to_string(),
                created_at: Utc::now(),
                repositories,
            },
        );
        drop(config);
        self.save()
    }

    pub fn delete_group(&self, name: &str) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        if config.groups.shift_remove(name).is_none() {
            return Err(GmanError::GroupNotFound { name: name.to_string() });
        }
        drop(config);
        self.save()
    }

    pub fn add_to_group(&self, name: &str, members: &[String]) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        for alias in members {
            if !config.repositories.contains_key(alias) {
                return Err(GmanError::RepoNotFound { alias: alias.clone() });
            }
        }
        let group = config
            .groups
            .get_mut(name)
            .ok_or_else(|| GmanError::GroupNotFound { name: name.to_string() })?;
        for alias in members {
            if !group.repositories.contains(alias) {
                group.repositories.push(alias.clone());
            }
        }
        drop(config);
        self.save()
    }

    pub fn remove_from_group(&self, name: &str, members: &[String]) -> GmanResult<()> {
        let mut config = self.inner.lock().unwrap();
        let group = config
            .groups
            .get_mut(name)
            .ok_or_else(|| GmanError::GroupNotFound { name: name.to_string() })?;
        group.repositories.retain(|a| !members.contains(a));
        drop(config);
        self.save()
    }

    pub fn get_groups(&self) -> IndexMap<String, Group> {
        self.inner.lock().unwrap().groups.clone()
    }

    /// Member aliases mapped to their registered path.
    ///
    /// Per the "cascading deletes are undefined" design note (spec §9),
    /// dangling aliases left behind by a since-removed repository are
    /// silently skipped rather than surfaced as an error.
    pub fn get_group_repositories(&self, name: &str) -> GmanResult<IndexMap<String, PathBuf>> {
        let config = self.inner.lock().unwrap();
        let group = config
            .groups
            .get(name)
            .ok_or_else(|| GmanError::GroupNotFound { name: name.to_string() })?;
        Ok(group
            .repositories
            .iter()
            .filter_map(|alias| {
                config
                    .repositories
                    .get(alias)
                    .map(|path| (alias.clone(), path.clone()))
            })
            .collect())
    }
}
