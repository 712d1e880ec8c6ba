use std::ops::Range;
use std::path::Path;

use tracing::debug;

use crate::code::FrameCode;
use crate::error::CoreError;
use crate::tokens;

/// One frame cut out of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    /// Position of the frame in the document, assigned at load.
    pub index: usize,
    /// Deterministic file-name stem, e.g. `talk_frame03`.
    pub name: String,
    /// Normalized frame text, `\begin{frame}` through `\end{frame}\n`.
    pub code: String,
    /// Byte range of the original frame text inside the raw document.
    pub span: Range<usize>,
}

/// A Beamer presentation split into its header and frames.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    raw: String,
    header: String,
    frames: Vec<FrameSource>,
}

impl SourceDocument {
    /// Read and split a `.tex` presentation from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CoreError::InvalidPath(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().replace(' ', "_"))
            .unwrap_or_else(|| "document".to_string());
        Self::parse(name, raw)
    }

    /// Split raw presentation text into frames.
    pub fn parse(name: impl Into<String>, raw: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        let raw = raw.into();

        if !raw.contains(tokens::BEAMER_DECL) {
            return Err(CoreError::NotBeamer);
        }
        if raw.matches(tokens::FRAME_BEGIN).count() != raw.matches(tokens::FRAME_END).count() {
            return Err(CoreError::FrameCountMismatch(
                "different numbers of frame begins and ends".into(),
            ));
        }
        let doc_begin = raw
            .find(tokens::DOC_BEGIN)
            .ok_or(CoreError::MissingToken(tokens::DOC_BEGIN))?;
        let header = raw[..doc_begin].to_string();

        let begins: Vec<usize> = raw.match_indices(tokens::FRAME_BEGIN).map(|(i, _)| i).collect();
        let idx_width = begins.len().to_string().len();
        let mut frames = Vec::with_capacity(begins.len());

        for (idx, &begin) in begins.iter().enumerate() {
            let body_start = begin + tokens::FRAME_BEGIN.len();
            let segment_end = begins.get(idx + 1).copied().unwrap_or(raw.len());
            let segment = &raw[body_start..segment_end];

            let end_rel = segment.rfind(tokens::FRAME_END).ok_or_else(|| {
                CoreError::FrameCountMismatch(format!("frame {} has no end", idx + 1))
            })?;
            let body = &segment[..end_rel];
            if body.contains(tokens::FRAME_END) {
                return Err(CoreError::FrameCountMismatch(
                    "multiple consecutive frame ends".into(),
                ));
            }

            let mut code = String::with_capacity(body.len() + 32);
            code.push_str(tokens::FRAME_BEGIN);
            code.push_str(body);
            if !body.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(tokens::FRAME_END);
            code.push('\n');

            frames.push(FrameSource {
                index: idx,
                name: format!("{name}_frame{:0idx_width$}", idx + 1),
                code,
                span: begin..body_start + end_rel + tokens::FRAME_END.len(),
            });
        }

        debug!(document = %name, frames = frames.len(), "Split presentation into frames");

        Ok(Self {
            name,
            raw,
            header,
            frames,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn frames(&self) -> &[FrameSource] {
        &self.frames
    }

    /// Baseline [`FrameCode`] for frame `idx`.
    pub fn frame_code(&self, idx: usize) -> Option<FrameCode> {
        self.frames
            .get(idx)
            .map(|f| FrameCode::new(self.header.clone(), f.code.clone()))
    }

    /// Rebuild the document with every frame replaced by `frames[i]` and the
    /// palette definitions inserted after the header.
    ///
    /// Frames beyond `frames.len()` keep their original text.
    pub fn improved_source(&self, frames: &[String], color_defs: &str) -> String {
        let mut out = String::with_capacity(self.raw.len() + color_defs.len() + 64);
        let mut cursor = 0;

        if !color_defs.is_empty() {
            let header_end = self.header.trim_end().len();
            out.push_str(&self.raw[..header_end]);
            out.push('\n');
            out.push_str(color_defs);
            cursor = header_end;
        }

        for (frame, replacement) in self.frames.iter().zip(frames) {
            out.push_str(&self.raw[cursor..frame.span.start]);
            out.push_str(replacement.trim());
            cursor = frame.span.end;
        }
        out.push_str(&self.raw[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = "\\documentclass{beamer}\n\\usepackage{x}\n\\begin{document}\n\
\\begin{frame}\nOne\n\\end{frame}\n\n\\begin{frame}{Two}\nTwo\\end{frame}\n\\end{document}\n";

    #[test]
    fn splits_frames_with_padded_names() {
        let doc = SourceDocument::parse("talk", DOC).unwrap();
        assert_eq!(doc.frames().len(), 2);
        assert_eq!(doc.header(), "\\documentclass{beamer}\n\\usepackage{x}\n");
        assert_eq!(doc.frames()[0].name, "talk_frame1");
        assert_eq!(doc.frames()[0].code, "\\begin{frame}\nOne\n\\end{frame}\n");
        // Missing newline before the end token is normalized.
        assert_eq!(doc.frames()[1].code, "\\begin{frame}{Two}\nTwo\n\\end{frame}\n");
    }

    #[test]
    fn name_padding_follows_frame_count() {
        let frames: String = (0..12).map(|i| format!("\\begin{{frame}}{i}\\end{{frame}}\n")).collect();
        let raw = format!("\\documentclass{{beamer}}\n\\begin{{document}}\n{frames}\\end{{document}}");
        let doc = SourceDocument::parse("d", raw).unwrap();
        assert_eq!(doc.frames()[0].name, "d_frame01");
        assert_eq!(doc.frames()[11].name, "d_frame12");
    }

    #[test]
    fn rejects_non_beamer() {
        let err = SourceDocument::parse("x", "\\documentclass{article}\n\\begin{document}\\end{document}");
        assert!(matches!(err, Err(CoreError::NotBeamer)));
    }

    #[test]
    fn rejects_unbalanced_frames() {
        let raw = "\\documentclass{beamer}\\begin{document}\\begin{frame}a\\end{document}";
        assert!(matches!(
            SourceDocument::parse("x", raw),
            Err(CoreError::FrameCountMismatch(_))
        ));
    }

    #[test]
    fn rejects_doubled_frame_end() {
        let raw = "\\documentclass{beamer}\\begin{document}\\begin{frame}a\\end{frame}\\end{frame}\\begin{frame}\\end{document}";
        assert!(matches!(
            SourceDocument::parse("x", raw),
            Err(CoreError::FrameCountMismatch(_))
        ));
    }

    #[test]
    fn improved_source_splices_frames_and_colors() {
        let doc = SourceDocument::parse("talk", DOC).unwrap();
        let out = doc.improved_source(
            &["\\begin{frame}\nUNO\n\\end{frame}\n".to_string()],
            "\\definecolor{c}{RGB}{1,1,1}",
        );
        assert!(out.starts_with("\\documentclass{beamer}\n\\usepackage{x}\n\\definecolor{c}{RGB}{1,1,1}\n\\begin{document}"));
        assert!(out.contains("UNO"));
        assert!(!out.contains("One"));
        assert!(out.contains("Two\\end{frame}"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my talk.tex");
        std::fs::File::create(&path).unwrap().write_all(DOC.as_bytes()).unwrap();
        let doc = SourceDocument::load(&path).unwrap();
        assert_eq!(doc.name(), "my_talk");
        assert!(matches!(
            SourceDocument::load(dir.path().join("missing.tex")),
            Err(CoreError::InvalidPath(_))
        ));
    }
}
