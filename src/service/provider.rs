use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::async_trait;

use crate::clients::espn_client::EventSource;
use crate::error::SourceError;
use crate::models::event::Event;
use crate::models::guild::GuildSettings;
use crate::service::calendar_selector::SelectionPolicy;
use crate::service::ufc_provider::{UFC_ORG, UfcProvider};

/// Per-organization switches. Providers ignore fields that do not apply to
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderFlags {
    /// `None` keeps the provider default (exclude).
    pub ufc_ignore_contender: Option<bool>,
}

impl ProviderFlags {
    pub fn for_guild(settings: &GuildSettings) -> Self {
        Self {
            ufc_ignore_contender: settings.ufc_ignore_contender,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderContext {
    pub now: DateTime<Utc>,
    pub flags: ProviderFlags,
}

impl ProviderContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            flags: ProviderFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: ProviderFlags) -> Self {
        self.flags = flags;
        self
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// The current or next event. `Ok(None)` means nothing is scheduled.
    async fn next_event(&self, ctx: &ProviderContext) -> Result<Option<Event>, SourceError>;
}

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, org: &str, provider: Arc<dyn Provider>) {
        self.providers.insert(org.trim().to_lowercase(), provider);
    }

    pub fn get(&self, org: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(&org.trim().to_lowercase()).cloned()
    }

    pub fn contains(&self, org: &str) -> bool {
        self.providers.contains_key(&org.trim().to_lowercase())
    }

    pub fn orgs(&self) -> Vec<String> {
        let mut orgs: Vec<String> = self.providers.keys().cloned().collect();
        orgs.sort();
        orgs
    }
}

pub fn default_registry(source: Arc<dyn EventSource>) -> ProviderRegistry {
    registry_with_policy(source, SelectionPolicy::default())
}

/// Registry whose providers select calendar entries under `policy`.
pub fn registry_with_policy(source: Arc<dyn EventSource>, policy: SelectionPolicy) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(UFC_ORG, Arc::new(UfcProvider::new(source).with_policy(policy)));
    registry
}
