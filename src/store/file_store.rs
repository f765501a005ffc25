use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::GuildStore;
use crate::error::StoreError;
use crate::models::guild::GuildSettings;

pub const DEFAULT_STATE_FILE: &str = "./data/state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    guilds: BTreeMap<String, GuildSettings>,
}

/// JSON document holding every guild row. Rows live in memory; each mutation
/// rewrites the file through a temp file and a rename.
pub struct FileGuildStore {
    path: PathBuf,
    guilds: Mutex<BTreeMap<String, GuildSettings>>,
}

impl FileGuildStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let guilds = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str::<StateDocument>(&raw)?.guilds
            }
        } else {
            BTreeMap::new()
        };
        info!(path = %path.display(), guilds = guilds.len(), "state loaded");
        Ok(Self {
            path,
            guilds: Mutex::new(guilds),
        })
    }

    // Reads tolerate a poisoned lock; the rows are only replaced whole.
    fn rows(&self) -> MutexGuard<'_, BTreeMap<String, GuildSettings>> {
        self.guilds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, guilds: &BTreeMap<String, GuildSettings>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let document = StateDocument {
            guilds: guilds.clone(),
        };
        let body = serde_json::to_vec_pretty(&document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

impl GuildStore for FileGuildStore {
    fn guild_settings(&self, guild_id: &str) -> GuildSettings {
        self.rows().get(guild_id).cloned().unwrap_or_default()
    }

    fn list_guild_ids(&self) -> Vec<String> {
        self.rows().keys().cloned().collect()
    }

    fn update_guild(
        &self,
        guild_id: &str,
        apply: &mut dyn FnMut(&mut GuildSettings),
    ) -> Result<(), StoreError> {
        let mut guilds = self.guilds.lock().map_err(|_| StoreError::Poisoned)?;
        let previous = guilds.get(guild_id).cloned();
        let mut row = previous.clone().unwrap_or_default();
        apply(&mut row);
        if previous.as_ref() == Some(&row) {
            return Ok(());
        }
        guilds.insert(guild_id.to_string(), row);
        if let Err(err) = self.persist(&guilds) {
            match previous {
                Some(old) => guilds.insert(guild_id.to_string(), old),
                None => guilds.remove(guild_id),
            };
            return Err(err);
        }
        Ok(())
    }
}
