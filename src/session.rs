//! The accumulated scan results and the status of the current scan.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ExtractError, Result};
use crate::model::{ItemUpdate, MenuItem};
use crate::providers::{AnalysisType, Provider};
use crate::storage::StorageBackend;

/// Progress of the current scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[default]
    Initial,
    Uploading,
    Parsing,
    Created,
    Error,
}

/// User-selectable defaults for the next scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSettings {
    pub provider: Provider,
    pub analysis_type: AnalysisType,
    pub storage_provider: StorageBackend,
}

/// Ordered, mutable list of items plus the search filter and scan status.
///
/// Items are never deduplicated; every successful scan appends its whole
/// result.
#[derive(Debug, Clone, Default)]
pub struct Session {
    items: Vec<MenuItem>,
    search: String,
    status: ScanStatus,
    last_request_items: usize,
    last_error: Option<String>,
    pub settings: ScanSettings,
}

impl Session {
    pub fn new(settings: ScanSettings) -> Self {
        Session {
            settings,
            ..Default::default()
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Items found by the most recent successful scan
    pub fn last_request_items(&self) -> usize {
        self.last_request_items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn begin_upload(&mut self) {
        self.status = ScanStatus::Uploading;
        self.last_error = None;
    }

    pub fn begin_parsing(&mut self) {
        self.status = ScanStatus::Parsing;
    }

    /// Append a scan's items and mark the scan as done
    pub fn append(&mut self, items: Vec<MenuItem>) {
        self.last_request_items = items.len();
        self.items.extend(items);
        self.status = ScanStatus::Created;
    }

    /// Mark the current scan as failed; the item list is left untouched
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ScanStatus::Error;
        self.last_error = Some(message.into());
    }

    /// Back to `initial`, ready for the next image. Items are kept.
    pub fn reset(&mut self) {
        self.status = ScanStatus::Initial;
        self.last_error = None;
    }

    pub fn update(&mut self, id: Uuid, update: ItemUpdate) -> Result<&MenuItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| ExtractError::NotFound(id.to_string()))?;
        item.apply(update);
        Ok(item)
    }

    /// Remove exactly the item with `id`
    pub fn delete(&mut self, id: Uuid) -> Result<MenuItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| ExtractError::NotFound(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Items whose name contains the current search term, ignoring case
    pub fn filtered(&self) -> Vec<&MenuItem> {
        filter_by_name(&self.items, &self.search)
    }
}

pub fn filter_by_name<'a>(items: &'a [MenuItem], term: &str) -> Vec<&'a MenuItem> {
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect()
}
