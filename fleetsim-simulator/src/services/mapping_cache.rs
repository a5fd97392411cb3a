use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use fleetsim_api::models::{DeviceSensorMapping, Id};

use crate::errors::TelemetryError;
use crate::services::telemetry_service::TelemetryService;

/// Which device-sensor mappings a lookup is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    AllDevices,
    /// Mappings owned by any of these devices
    Devices(BTreeSet<Id>),
    /// Mappings with any of these device-sensor ids
    Sensors(BTreeSet<Id>),
}

impl Scope {
    pub fn devices<I: IntoIterator<Item = Id>>(ids: I) -> Self {
        Scope::Devices(ids.into_iter().collect())
    }

    pub fn sensors<I: IntoIterator<Item = Id>>(ids: I) -> Self {
        Scope::Sensors(ids.into_iter().collect())
    }

    pub fn contains(&self, mapping: &DeviceSensorMapping) -> bool {
        match self {
            Scope::AllDevices => true,
            Scope::Devices(ids) => ids.contains(&mapping.device_id),
            Scope::Sensors(ids) => ids.contains(&mapping.id),
        }
    }

    fn single_device(&self) -> Option<Id> {
        match self {
            Scope::Devices(ids) if ids.len() == 1 => ids.iter().next().copied(),
            _ => None,
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Scope::AllDevices => write!(f, "all devices"),
            Scope::Devices(ids) => write!(f, "devices {ids:?}"),
            Scope::Sensors(ids) => write!(f, "sensors {ids:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub mappings: Vec<DeviceSensorMapping>,
    pub fetched_at: OffsetDateTime,
}

impl CacheEntry {
    fn new(mappings: Vec<DeviceSensorMapping>) -> Self {
        Self {
            mappings,
            fetched_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Device-sensor mappings per [`Scope`], fetched once and kept until a
/// forced refresh replaces them.
///
/// Entries are swapped whole behind an `Arc`, so a reader holding an entry
/// never sees it change underneath.
#[derive(Clone)]
pub struct MappingCache {
    service: Arc<dyn TelemetryService>,
    entries: Arc<RwLock<HashMap<Scope, Arc<CacheEntry>>>>,
}

impl MappingCache {
    pub fn new(service: Arc<dyn TelemetryService>) -> Self {
        Self {
            service,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cached mappings for `scope`, fetching them when missing or when
    /// `force_refresh` is set. A failed fetch yields an empty result and
    /// leaves the cache untouched.
    pub async fn resolve(&self, scope: &Scope, force_refresh: bool) -> Arc<CacheEntry> {
        if !force_refresh {
            if let Some(entry) = self.get(scope).await {
                tracing::debug!("using cached device-sensor mappings for {}", scope);
                return entry;
            }
        }

        tracing::debug!(
            "{} device-sensor mappings for {}",
            if force_refresh { "refreshing" } else { "caching" },
            scope
        );

        match self.fetch(scope).await {
            Ok(mappings) => {
                let entry = Arc::new(CacheEntry::new(mappings));

                let mut entries = self.entries.write().await;
                entries.insert(scope.clone(), Arc::clone(&entry));

                entry
            }
            Err(e) => {
                tracing::error!("Failed to fetch device-sensor mappings for {}: {}", scope, e);
                Arc::new(CacheEntry::new(Vec::new()))
            }
        }
    }

    pub async fn get(&self, scope: &Scope) -> Option<Arc<CacheEntry>> {
        let entries = self.entries.read().await;
        entries.get(scope).cloned()
    }

    pub async fn invalidate(&self, scope: &Scope) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(scope).is_some()
    }

    /// Keeps only the scopes `keep` accepts. Returns how many were dropped.
    pub async fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&Scope) -> bool,
    {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|scope, _| keep(scope));

        before - entries.len()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    async fn fetch(&self, scope: &Scope) -> Result<Vec<DeviceSensorMapping>, TelemetryError> {
        let mappings = self
            .service
            .list_device_sensor_mappings(scope.single_device())
            .await?;

        Ok(mappings
            .into_iter()
            .filter(|mapping| scope.contains(mapping))
            .collect())
    }
}
