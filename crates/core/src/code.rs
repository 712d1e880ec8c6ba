use serde::{Deserialize, Serialize};

use crate::tokens;

/// LaTeX source of a single frame, split into the parts the improvers touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCode {
    /// Everything before `\begin{document}` in the source document.
    pub header: String,
    /// The frame itself, `\begin{frame}` through `\end{frame}`.
    pub base_code: String,
    /// Palette definitions placed right after the header.
    pub global_color_defs: String,
    /// Background image included behind this frame only.
    pub bg_img_path: String,
}

impl FrameCode {
    pub fn new(header: impl Into<String>, base_code: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            base_code: base_code.into(),
            ..Self::default()
        }
    }

    /// A complete, compilable document containing only this frame.
    pub fn full_source(&self) -> String {
        let mut code = String::with_capacity(self.header.len() + self.base_code.len() + 128);
        code.push_str(&self.header);
        code.push('\n');

        if !self.global_color_defs.is_empty() {
            code.push_str(&self.global_color_defs);
            code.push('\n');
        }

        code.push_str(tokens::DOC_BEGIN);
        code.push('\n');
        code.push_str(&self.frame_source());
        code.push_str(tokens::DOC_END);
        code.push('\n');
        code
    }

    /// The frame text as it can be inserted anywhere in a document body.
    pub fn frame_source(&self) -> String {
        let mut code = String::new();

        if !self.bg_img_path.is_empty() {
            code.push_str("{\n");
            code.push_str(&background_statement(&self.bg_img_path));
            code.push('\n');
        }

        code.push_str(&self.base_code);
        code.push('\n');

        if !self.bg_img_path.is_empty() {
            code.push_str("}\n");
        }
        code
    }
}

fn background_statement(bg_path: &str) -> String {
    format!(
        "\\setbeamertemplate{{background}}\n{{\n\t\\includegraphics[width=\\paperwidth,height=\\paperheight]{{{bg_path}}}\n}}"
    )
}
