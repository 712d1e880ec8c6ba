//! Category managers: the three improvement classes of a unit.
//!
//! Every manager owns a [`VariantList`] and generates it lazily through
//! category-specific generators. The shared protocol (generation, selection,
//! pruning, decoration) lives in the provided methods of [`Improvements`];
//! implementors only supply candidate sources and say which part of a frame
//! their variants change.

mod background;
mod global;
mod list;
mod local;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use slidesmith_beautify::{default_backgrounds, default_improvers, BackgroundSynthesizer, ContentImprover};
use slidesmith_core::FrameCode;
use tracing::debug;

use crate::collab::Compiler;
use crate::error::ComputeError;
use crate::variant::Variant;

pub use background::BackgroundImprovements;
pub use global::{GlobalContext, GlobalImprovements};
pub use list::VariantList;
pub use local::LocalImprovements;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryKind {
    /// Content layout rewrites.
    Local,
    /// Synthesized background images.
    Background,
    /// Document-wide color palettes.
    Global,
}

impl CategoryKind {
    /// Delivery order.
    pub const ALL: [CategoryKind; 3] = [CategoryKind::Local, CategoryKind::Background, CategoryKind::Global];

    /// Job-name prefix of this category's variants.
    pub fn prefix(self) -> &'static str {
        match self {
            CategoryKind::Local => "l",
            CategoryKind::Background => "b",
            CategoryKind::Global => "g",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CategoryKind::Local => "local",
            CategoryKind::Background => "background",
            CategoryKind::Global => "global",
        };
        f.write_str(name)
    }
}

/// The generators shared by every unit of a document.
pub struct Generators {
    pub improvers: Vec<Box<dyn ContentImprover>>,
    pub backgrounds: Vec<Box<dyn BackgroundSynthesizer>>,
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let improvers: Vec<&str> = self.improvers.iter().map(|i| i.name()).collect();
        f.debug_struct("Generators")
            .field("improvers", &improvers)
            .field("backgrounds", &self.backgrounds.len())
            .finish()
    }
}

impl Default for Generators {
    fn default() -> Self {
        Self {
            improvers: default_improvers(),
            backgrounds: default_backgrounds(),
        }
    }
}

/// Capability interface shared by the three category managers.
pub trait Improvements: Send + Sync {
    fn kind(&self) -> CategoryKind;

    fn variants(&self) -> &VariantList;

    /// Produce candidate sources in generation order.
    fn produce(&self, compiler: &dyn Compiler, emit: &mut dyn FnMut(FrameCode)) -> Result<(), ComputeError>;

    /// Selected index: 0 is the baseline, `i > 0` is variant `i - 1`.
    fn current_selection(&self) -> usize;

    fn store_selection(&self, index: usize);

    /// Called when the variant list is rebuilt.
    fn reset_selection(&self);

    /// Copy the part of `chosen` this category changes into `target`.
    fn apply(&self, chosen: &FrameCode, target: &mut FrameCode);

    /// Populate the variant list unless it is already generated.
    fn generate(&self, compiler: &dyn Compiler) -> Result<(), ComputeError> {
        if self.variants().is_generated() {
            return Ok(());
        }
        self.generate_streaming(compiler, &mut |_| {})
    }

    /// Rebuild the variant list from scratch, handing each new variant to
    /// `on_variant` as soon as it is stored.
    fn generate_streaming(
        &self,
        compiler: &dyn Compiler,
        on_variant: &mut dyn FnMut(&Arc<Variant>),
    ) -> Result<(), ComputeError> {
        let list = self.variants();
        list.clear();
        self.reset_selection();
        self.produce(compiler, &mut |code| {
            let variant = list.push_new(code);
            on_variant(&variant);
        })?;
        list.mark_generated();
        debug!(unit = list.stem(), category = %self.kind(), variants = list.len(), "Generated variants");
        Ok(())
    }

    /// Force the next [`generate`](Improvements::generate) to rebuild.
    fn invalidate(&self) {
        self.variants().invalidate();
    }

    fn all_variants(&self) -> Vec<Arc<Variant>> {
        self.variants().snapshot()
    }

    fn select_alternative(&self, index: usize) -> Result<(), ComputeError> {
        let max = self.variants().len();
        if index > max {
            return Err(ComputeError::InvalidAlternative { index, max });
        }
        self.store_selection(index);
        Ok(())
    }

    fn remove_variant(&self, variant: &Arc<Variant>) -> bool {
        self.variants().remove(variant)
    }

    /// Apply the current selection to `target`. The baseline selection, or a
    /// selection whose variant has been pruned, leaves it untouched.
    fn decorate(&self, target: &mut FrameCode) {
        let index = self.current_selection();
        if index == 0 {
            return;
        }
        if let Some(variant) = self.variants().get(index - 1) {
            self.apply(variant.code(), target);
        }
    }
}

/// One of the three category managers of a unit.
pub enum CategoryManager {
    Local(LocalImprovements),
    Background(BackgroundImprovements),
    Global(GlobalImprovements),
}

impl Deref for CategoryManager {
    type Target = dyn Improvements;

    fn deref(&self) -> &Self::Target {
        match self {
            CategoryManager::Local(m) => m,
            CategoryManager::Background(m) => m,
            CategoryManager::Global(m) => m,
        }
    }
}

impl fmt::Debug for CategoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryManager")
            .field("kind", &self.kind())
            .field("variants", &self.variants().len())
            .field("selection", &self.current_selection())
            .finish()
    }
}
