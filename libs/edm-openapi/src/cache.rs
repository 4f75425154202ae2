//! Memoization of decoded capability annotations.
//!
//! One cache serves one model at a time. Presenting a different model clears
//! every entry under the write lock before the first lookup against it; all
//! lookups hold the read lock, so a switch never overlaps an in-flight
//! resolution. Decoding itself is synchronized per key.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use edm_model::{EdmModel, ElementRef, ModelId, RawValue};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::capabilities::{CapabilityRecord, DecodeIssue, FieldReport, Term};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    model: ModelId,
    element: ElementRef,
    term: Term,
}

/// Resolved record, or `None` for a known-absent annotation.
type Slot = Arc<OnceLock<Option<Arc<CapabilityRecord>>>>;

#[derive(Default)]
pub struct AnnotationCache {
    current: RwLock<Option<ModelId>>,
    entries: DashMap<CacheKey, Slot>,
    issues: Mutex<Vec<DecodeIssue>>,
}

impl AnnotationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded annotation of `term` declared directly on `element`.
    ///
    /// `decode` runs at most once per (model, element, term) for the lifetime
    /// of the entry, also under concurrent callers; every caller observes the
    /// same record.
    pub fn resolve<F>(
        &self,
        model: &EdmModel,
        element: ElementRef,
        term: Term,
        decode: F,
    ) -> Option<Arc<CapabilityRecord>>
    where
        F: FnOnce(&RawValue, &mut FieldReport) -> Option<CapabilityRecord>,
    {
        let _bound = self.bind(model.id());
        let key = CacheKey {
            model: model.id(),
            element,
            term,
        };
        let slot = self.entries.entry(key).or_default().clone();
        slot.get_or_init(|| {
            let raw = model.annotation(element, term.qualified_name())?;
            let mut report = FieldReport::new(term, model.element_name(element));
            let record = decode(raw, &mut report).map(Arc::new);
            tracing::trace!(
                element = %model.element_name(element),
                %term,
                present = record.is_some(),
                "capability annotation decoded"
            );
            let issues = report.into_issues();
            if !issues.is_empty() {
                self.issues.lock().extend(issues);
            }
            record
        })
        .clone()
    }

    /// Take the read lock for `model`, clearing the cache first when it was
    /// bound to another model.
    fn bind(&self, model: ModelId) -> RwLockReadGuard<'_, Option<ModelId>> {
        let current = self.current.read();
        if *current == Some(model) {
            return current;
        }
        drop(current);

        let mut current = self.current.write();
        if *current != Some(model) {
            tracing::debug!(
                model = %model,
                dropped = self.entries.len(),
                "annotation cache bound to a new model"
            );
            self.entries.clear();
            self.issues.lock().clear();
            *current = Some(model);
        }
        RwLockWriteGuard::downgrade(current)
    }

    /// Model the cached entries belong to.
    #[must_use]
    pub fn model(&self) -> Option<ModelId> {
        *self.current.read()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode issues collected for the current model, in decode order.
    #[must_use]
    pub fn issues(&self) -> Vec<DecodeIssue> {
        self.issues.lock().clone()
    }

    pub fn clear(&self) {
        let mut current = self.current.write();
        self.entries.clear();
        self.issues.lock().clear();
        *current = None;
    }
}
