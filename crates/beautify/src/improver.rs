//! Content rewrites of a frame's body.

use slidesmith_core::tokens;
use slidesmith_core::{CoreError, FrameCode, TokenScanner};
use tracing::debug;

/// Suggests an alternative layout for a frame.
pub trait ContentImprover: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Whether this improver applies to the given frame body.
    fn applies(&self, code: &FrameCode) -> bool;

    fn rewrite(&self, code: &FrameCode) -> FrameCode;

    /// The improved frame, or `None` when the improver does not apply.
    fn improve(&self, code: &FrameCode) -> Option<FrameCode> {
        if !self.applies(code) {
            return None;
        }
        Some(self.rewrite(code))
    }
}

/// Improvers in the order their variants are generated.
pub fn default_improvers() -> Vec<Box<dyn ContentImprover>> {
    vec![
        Box::new(ItemizeIndentIncrease::default()),
        Box::new(ListToTable::enumerate()),
        Box::new(ListToTable::itemize()),
    ]
}

/// Pushes the items of the first `itemize` list to the right.
#[derive(Debug, Clone)]
pub struct ItemizeIndentIncrease {
    indent_cm: u32,
}

impl Default for ItemizeIndentIncrease {
    fn default() -> Self {
        Self { indent_cm: 2 }
    }
}

impl ContentImprover for ItemizeIndentIncrease {
    fn name(&self) -> &str {
        "itemize_indent"
    }

    fn applies(&self, code: &FrameCode) -> bool {
        code.base_code.contains(tokens::ITEMIZE_BEGIN)
    }

    fn rewrite(&self, code: &FrameCode) -> FrameCode {
        let body = &code.base_code;
        let at = body
            .find(tokens::ITEMIZE_BEGIN)
            .map_or(body.len(), |i| i + tokens::ITEMIZE_BEGIN.len());
        let mut base_code = String::with_capacity(body.len() + 40);
        base_code.push_str(&body[..at]);
        base_code.push_str(&tokens::items_indent(self.indent_cm));
        base_code.push_str(&body[at..]);
        FrameCode {
            base_code,
            ..code.clone()
        }
    }
}

/// Turns a short top-level list (2 to 4 items) into a single table row.
#[derive(Debug, Clone)]
pub struct ListToTable {
    name: &'static str,
    list_begin: &'static str,
    list_end: &'static str,
}

/// A frame body cut around its first top-level list.
#[derive(Debug, Default, PartialEq, Eq)]
struct SplitList {
    pre: String,
    items: Vec<String>,
    post: String,
}

impl ListToTable {
    const MAX_ITEMS: usize = 4;

    const LIST_TOKENS: [&'static str; 5] = [
        tokens::ITEMIZE_BEGIN,
        tokens::ITEMIZE_END,
        tokens::ENUMERATE_BEGIN,
        tokens::ENUMERATE_END,
        tokens::ITEM,
    ];

    fn new(name: &'static str, list_begin: &'static str, list_end: &'static str) -> Self {
        Self {
            name,
            list_begin,
            list_end,
        }
    }

    pub fn enumerate() -> Self {
        Self::new("enumerate_to_table", tokens::ENUMERATE_BEGIN, tokens::ENUMERATE_END)
    }

    pub fn itemize() -> Self {
        Self::new("itemize_to_table", tokens::ITEMIZE_BEGIN, tokens::ITEMIZE_END)
    }

    fn split(&self, body: &str) -> Result<SplitList, CoreError> {
        let mut out = SplitList::default();
        let mut depth: i32 = 0;
        let mut buf = String::new();
        let mut list_done = false;
        let mut first_item = true;

        let scanner = TokenScanner::new(Self::LIST_TOKENS)?;
        for token in scanner.tokenize(body) {
            if !list_done {
                let nested_begin = token == tokens::ITEMIZE_BEGIN || token == tokens::ENUMERATE_BEGIN;
                let nested_end = token == tokens::ITEMIZE_END || token == tokens::ENUMERATE_END;
                if token == self.list_begin || (depth > 0 && nested_begin) {
                    depth += 1;
                    if depth == 1 {
                        continue;
                    }
                } else if token == self.list_end || (depth > 1 && nested_end) {
                    depth -= 1;
                    if depth == 0 {
                        if !buf.is_empty() {
                            out.items.push(std::mem::take(&mut buf));
                        }
                        list_done = true;
                        continue;
                    }
                }
            }

            if depth >= 1 {
                if depth == 1 && token == tokens::ITEM && !first_item {
                    out.items.push(std::mem::take(&mut buf));
                } else if token != tokens::ITEM || depth > 1 {
                    buf.push_str(token);
                } else if first_item && depth == 1 {
                    buf.clear();
                    first_item = false;
                }
            } else if !list_done {
                out.pre.push_str(token);
            } else {
                out.post.push_str(token);
            }
        }

        if depth != 0 {
            return Err(CoreError::UnclosedList);
        }
        Ok(out)
    }
}

impl ContentImprover for ListToTable {
    fn name(&self) -> &str {
        self.name
    }

    fn applies(&self, code: &FrameCode) -> bool {
        match self.split(&code.base_code) {
            Ok(split) => (2..=Self::MAX_ITEMS).contains(&split.items.len()),
            Err(e) => {
                debug!(improver = self.name, error = %e, "Skipping frame");
                false
            }
        }
    }

    fn rewrite(&self, code: &FrameCode) -> FrameCode {
        let Ok(split) = self.split(&code.base_code) else {
            return code.clone();
        };

        let mut table = format!("\\begin{{tabular}}{{{}}}\n", "c".repeat(split.items.len()));
        table.push_str(&split.items.join(" & "));
        table.push_str("\n\\end{tabular}");

        let trimmed = split.pre.trim_end();
        let pre = if trimmed.ends_with("\\\\") || split.pre.ends_with("\n\n") {
            split.pre
        } else {
            format!("{} \\\\", split.pre)
        };

        FrameCode {
            base_code: format!("{pre}{table}{}", split.post),
            ..code.clone()
        }
    }
}
