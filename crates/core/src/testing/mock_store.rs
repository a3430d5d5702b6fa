//! In-memory item store for testing.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::item::{Finding, ItemKind, ItemRecord};
use crate::store::{ItemStore, StoreError};

#[derive(Debug, Default)]
struct State {
    upserts: Vec<(ItemKind, ItemRecord)>,
    findings: Vec<(ItemKind, String, Finding)>,
    resets: usize,
    next_error: Option<StoreError>,
}

/// Mock implementation of the ItemStore trait.
///
/// Records every write. It does not enforce the relational constraints the
/// SQLite store does; use [`crate::store::SqliteStore::in_memory`] when those
/// matter.
#[derive(Debug, Clone, Default)]
pub struct MockItemStore {
    state: Arc<Mutex<State>>,
}

impl MockItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Configure the next write to fail with the given error.
    pub fn set_next_error(&self, error: StoreError) {
        self.state().next_error = Some(error);
    }

    /// Every upsert, in call order.
    pub fn upserts(&self) -> Vec<(ItemKind, ItemRecord)> {
        self.state().upserts.clone()
    }

    pub fn upserted_slugs(&self, kind: ItemKind) -> Vec<String> {
        self.state()
            .upserts
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, record)| record.slug.clone())
            .collect()
    }

    /// Every recorded finding as `(kind, slug, finding)`.
    pub fn findings(&self) -> Vec<(ItemKind, String, Finding)> {
        self.state().findings.clone()
    }

    pub fn reset_count(&self) -> usize {
        self.state().resets
    }
}

impl ItemStore for MockItemStore {
    fn upsert_item(&self, kind: ItemKind, record: &ItemRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        state.upserts.push((kind, record.clone()));
        Ok(())
    }

    fn record_finding(
        &self,
        kind: ItemKind,
        slug: &str,
        finding: &Finding,
    ) -> Result<(), StoreError> {
        self.record_findings(kind, slug, std::slice::from_ref(finding))
            .map(|_| ())
    }

    fn record_findings(
        &self,
        kind: ItemKind,
        slug: &str,
        findings: &[Finding],
    ) -> Result<usize, StoreError> {
        let mut state = self.state();
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        if kind == ItemKind::Theme {
            return Err(StoreError::UnsupportedKind(kind));
        }
        state.findings.extend(
            findings
                .iter()
                .map(|finding| (kind, slug.to_string(), finding.clone())),
        );
        Ok(findings.len())
    }

    fn reset_findings(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        state.findings.clear();
        state.resets += 1;
        Ok(())
    }
}
