use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use slidesmith_beautify::PaletteSynthesizer;
use slidesmith_core::FrameCode;

use super::{CategoryKind, Improvements, VariantList};
use crate::collab::Compiler;
use crate::error::ComputeError;

/// Palettes and the palette selection of one document.
///
/// Owned by the document and handed to every unit's [`GlobalImprovements`],
/// so a selection made through any unit applies to all of them.
#[derive(Debug, Default)]
pub struct GlobalContext {
    palettes: Vec<String>,
    selected: AtomicUsize,
}

impl GlobalContext {
    pub fn new(palettes: Vec<String>) -> Self {
        Self {
            palettes,
            selected: AtomicUsize::new(0),
        }
    }

    /// Synthesize `count` palettes up front.
    pub fn synthesize(synthesizer: &dyn PaletteSynthesizer, count: usize) -> Self {
        Self::new((0..count).map(|_| synthesizer.synthesize()).collect())
    }

    pub fn palettes(&self) -> &[String] {
        &self.palettes
    }

    pub fn selection(&self) -> usize {
        self.selected.load(Ordering::Acquire)
    }

    /// Definitions of the selected palette, `None` for the baseline.
    pub fn selected_palette(&self) -> Option<&str> {
        match self.selection() {
            0 => None,
            index => self.palettes.get(index - 1).map(String::as_str),
        }
    }
}

/// One variant per document palette.
#[derive(Debug)]
pub struct GlobalImprovements {
    variants: VariantList,
    original: FrameCode,
    context: Arc<GlobalContext>,
}

impl GlobalImprovements {
    pub fn new(stem: &str, original: FrameCode, context: Arc<GlobalContext>) -> Self {
        Self {
            variants: VariantList::new(CategoryKind::Global, stem),
            original,
            context,
        }
    }

    pub fn context(&self) -> &Arc<GlobalContext> {
        &self.context
    }
}

impl Improvements for GlobalImprovements {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Global
    }

    fn variants(&self) -> &VariantList {
        &self.variants
    }

    fn produce(&self, _compiler: &dyn Compiler, emit: &mut dyn FnMut(FrameCode)) -> Result<(), ComputeError> {
        for palette in self.context.palettes() {
            emit(FrameCode {
                global_color_defs: palette.clone(),
                ..self.original.clone()
            });
        }
        Ok(())
    }

    fn current_selection(&self) -> usize {
        self.context.selection()
    }

    fn store_selection(&self, index: usize) {
        self.context.selected.store(index, Ordering::Release);
    }

    // The selection belongs to the whole document; rebuilding one unit's
    // list does not change it.
    fn reset_selection(&self) {}

    fn apply(&self, chosen: &FrameCode, target: &mut FrameCode) {
        target.global_color_defs = chosen.global_color_defs.clone();
    }

    // The selection indexes the document's palettes, not this unit's list,
    // which may have lost variants that failed to compile.
    fn select_alternative(&self, index: usize) -> Result<(), ComputeError> {
        let max = self.context.palettes().len();
        if index > max {
            return Err(ComputeError::InvalidAlternative { index, max });
        }
        self.store_selection(index);
        Ok(())
    }

    fn decorate(&self, target: &mut FrameCode) {
        if let Some(palette) = self.context.selected_palette() {
            target.global_color_defs = palette.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{Artifact, CompileJob};
    use crate::error::CompileError;

    struct NoCompiler;

    impl Compiler for NoCompiler {
        fn compile(&self, job: CompileJob<'_>) -> Result<Artifact, CompileError> {
            Err(CompileError::MissingOutput(job.name.into()))
        }
    }

    struct FixedPalette;

    impl PaletteSynthesizer for FixedPalette {
        fn synthesize(&self) -> String {
            "\\definecolor{RandomColor1}{RGB}{1,2,3}".to_string()
        }
    }

    #[test]
    fn selection_is_shared_across_units() {
        let ctx = Arc::new(GlobalContext::new(vec!["p0".into(), "p1".into()]));
        let a = GlobalImprovements::new("deck_frame1", FrameCode::new("h", "a"), Arc::clone(&ctx));
        let b = GlobalImprovements::new("deck_frame2", FrameCode::new("h", "b"), Arc::clone(&ctx));
        a.generate(&NoCompiler).unwrap();
        b.generate(&NoCompiler).unwrap();

        a.select_alternative(2).unwrap();
        assert_eq!(b.current_selection(), 2);
        assert_eq!(ctx.selected_palette(), Some("p1"));

        let mut code = FrameCode::new("h", "b");
        b.decorate(&mut code);
        assert_eq!(code.global_color_defs, "p1");

        // Regenerating one unit keeps the document-wide choice.
        b.invalidate();
        b.generate(&NoCompiler).unwrap();
        assert_eq!(a.current_selection(), 2);
    }

    #[test]
    fn one_variant_per_palette() {
        let ctx = Arc::new(GlobalContext::synthesize(&FixedPalette, 3));
        let global = GlobalImprovements::new("deck_frame1", FrameCode::new("h", "body"), ctx);
        global.generate(&NoCompiler).unwrap();
        let variants = global.all_variants();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[2].name(), "deck_frame1_g2");
        assert!(variants[0].code().global_color_defs.starts_with("\\definecolor"));
        assert_eq!(variants[0].code().base_code, "body");
    }

    #[test]
    fn pruned_palette_still_decorates_every_unit() {
        let ctx = Arc::new(GlobalContext::new(vec!["p0".into(), "p1".into()]));
        let a = GlobalImprovements::new("deck_frame1", FrameCode::new("h", "a"), Arc::clone(&ctx));
        let b = GlobalImprovements::new("deck_frame2", FrameCode::new("h", "b"), Arc::clone(&ctx));
        a.generate(&NoCompiler).unwrap();
        b.generate(&NoCompiler).unwrap();

        let first = a.all_variants()[0].clone();
        assert!(a.remove_variant(&first));
        assert_eq!(a.all_variants().len(), 1);

        // Both palettes stay selectable through the shorter list.
        a.select_alternative(2).unwrap();
        b.select_alternative(1).unwrap();

        let mut code_a = FrameCode::new("h", "a");
        let mut code_b = FrameCode::new("h", "b");
        a.decorate(&mut code_a);
        b.decorate(&mut code_b);
        assert_eq!(code_a.global_color_defs, "p0");
        assert_eq!(code_b.global_color_defs, "p0");

        b.select_alternative(0).unwrap();
        let mut untouched = FrameCode::new("h", "a");
        a.decorate(&mut untouched);
        assert_eq!(untouched.global_color_defs, FrameCode::new("h", "a").global_color_defs);
    }

    #[test]
    fn rejects_out_of_range_selection() {
        let ctx = Arc::new(GlobalContext::new(vec!["p0".into()]));
        let global = GlobalImprovements::new("x", FrameCode::default(), Arc::clone(&ctx));
        global.generate(&NoCompiler).unwrap();
        assert!(global.select_alternative(2).is_err());
        assert_eq!(ctx.selection(), 0);
    }
}
