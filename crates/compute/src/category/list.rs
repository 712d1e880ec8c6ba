use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use slidesmith_core::FrameCode;

use super::CategoryKind;
use crate::variant::Variant;

/// Ordered variants of one category of one unit.
///
/// Readers get snapshots; a regeneration clears the list and refills it one
/// variant at a time, so a concurrent reader may observe a partial list.
#[derive(Debug)]
pub struct VariantList {
    kind: CategoryKind,
    stem: String,
    variants: RwLock<Slots>,
    generated: AtomicBool,
}

#[derive(Debug, Default)]
struct Slots {
    items: Vec<Arc<Variant>>,
    next_generation: usize,
}

impl VariantList {
    /// `stem` prefixes every variant's job name: `<stem>_<prefix><generation>`.
    pub fn new(kind: CategoryKind, stem: impl Into<String>) -> Self {
        Self {
            kind,
            stem: stem.into(),
            variants: RwLock::new(Slots::default()),
            generated: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> CategoryKind {
        self.kind
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn is_generated(&self) -> bool {
        self.generated.load(Ordering::Acquire)
    }

    pub(crate) fn mark_generated(&self) {
        self.generated.store(true, Ordering::Release);
    }

    /// Forget the generated state so the next generation starts over.
    pub fn invalidate(&self) {
        self.generated.store(false, Ordering::Release);
    }

    pub(crate) fn clear(&self) {
        let mut slots = self.variants.write().unwrap_or_else(PoisonError::into_inner);
        slots.items.clear();
        slots.next_generation = 0;
    }

    /// Wrap `code` in a new variant with the next generation index and append it.
    pub(crate) fn push_new(&self, code: FrameCode) -> Arc<Variant> {
        let mut slots = self.variants.write().unwrap_or_else(PoisonError::into_inner);
        let generation = slots.next_generation;
        slots.next_generation += 1;
        let name = format!("{}_{}{}", self.stem, self.kind.prefix(), generation);
        let variant = Arc::new(Variant::new(self.kind, generation, name, code));
        slots.items.push(Arc::clone(&variant));
        variant
    }

    pub fn snapshot(&self) -> Vec<Arc<Variant>> {
        self.variants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .clone()
    }

    pub fn get(&self, index: usize) -> Option<Arc<Variant>> {
        self.variants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .get(index)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.variants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove `variant` (by identity). Returns whether it was present.
    pub fn remove(&self, variant: &Arc<Variant>) -> bool {
        let mut slots = self.variants.write().unwrap_or_else(PoisonError::into_inner);
        let before = slots.items.len();
        slots.items.retain(|v| !Arc::ptr_eq(v, variant));
        slots.items.len() != before
    }
}
