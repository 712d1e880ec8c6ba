//! LaTeX / Beamer tokens recognised by the frame splitter and the improvers.

pub const BEAMER_DECL: &str = "{beamer}";
pub const FRAME_BEGIN: &str = "\\begin{frame}";
pub const FRAME_END: &str = "\\end{frame}";
pub const DOC_BEGIN: &str = "\\begin{document}";
pub const DOC_END: &str = "\\end{document}";

pub const ITEMIZE_BEGIN: &str = "\\begin{itemize}";
pub const ITEMIZE_END: &str = "\\end{itemize}";
pub const ENUMERATE_BEGIN: &str = "\\begin{enumerate}";
pub const ENUMERATE_END: &str = "\\end{enumerate}";
pub const ITEM: &str = "\\item";

pub fn hspace(size_cm: u32) -> String {
    format!("\\hspace{{{size_cm}cm}}")
}

pub fn items_indent(size_cm: u32) -> String {
    format!("\\addtolength{{\\itemindent}}{{{size_cm}cm}}")
}
