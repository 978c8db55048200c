//! Per-run accumulator for source citations produced by tools.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::SourceCitation;

/// Shared handle to one run's citation list.
///
/// Clones point at the same list. Each orchestration run creates its own
/// sink, so concurrent runs never see each other's citations.
#[derive(Debug, Clone, Default)]
pub struct CitationSink {
    inner: Arc<Mutex<Vec<SourceCitation>>>,
}

impl CitationSink {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking tool must not take the whole run's citations with it.
    fn lock(&self) -> MutexGuard<'_, Vec<SourceCitation>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, citation: SourceCitation) {
        self.lock().push(citation);
    }

    pub fn extend(&self, citations: impl IntoIterator<Item = SourceCitation>) {
        self.lock().extend(citations);
    }

    /// Snapshot of everything recorded so far.
    pub fn collect(&self) -> Vec<SourceCitation> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Take everything recorded so far, leaving the sink empty.
    pub fn drain(&self) -> Vec<SourceCitation> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
