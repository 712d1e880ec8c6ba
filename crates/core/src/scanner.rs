//! Splits LaTeX source into known tokens and the text between them.

use crate::error::CoreError;

/// Scans a string and divides it by a fixed set of known tokens.
///
/// Text that matches no known token is returned as one slice. When one known
/// token is a prefix of another (`\item` / `\itemize`), the longest token that
/// starts at the match position wins.
#[derive(Debug, Clone)]
pub struct TokenScanner {
    tokens: Vec<String>,
}

impl TokenScanner {
    pub fn new<I, S>(tokens: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(CoreError::EmptyToken);
        }
        Ok(Self { tokens })
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut buf_start = 0;

        for (pos, ch) in text.char_indices() {
            if pos < buf_start {
                continue;
            }
            let end = pos + ch.len_utf8();
            let buf = &text[buf_start..end];

            let Some(matched) = self
                .tokens
                .iter()
                .filter(|t| buf.ends_with(t.as_str()))
                .max_by_key(|t| t.len())
            else {
                continue;
            };

            let token_start = end - matched.len();
            let token_len = self.longest_at(&text[token_start..]).unwrap_or(matched.len());

            if token_start > buf_start {
                out.push(&text[buf_start..token_start]);
            }
            out.push(&text[token_start..token_start + token_len]);
            buf_start = token_start + token_len;
        }

        if buf_start < text.len() {
            out.push(&text[buf_start..]);
        }
        out
    }

    fn longest_at(&self, rest: &str) -> Option<usize> {
        self.tokens
            .iter()
            .filter(|t| rest.starts_with(t.as_str()))
            .map(String::len)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_token() {
        assert!(matches!(TokenScanner::new(["a", ""]), Err(CoreError::EmptyToken)));
    }

    #[test]
    fn single_token() {
        let scanner = TokenScanner::new(["tkn1"]).unwrap();
        let tokens = scanner.tokenize("something tkn1 abctkn1def");
        assert_eq!(tokens, vec!["something ", "tkn1", " abc", "tkn1", "def"]);
    }

    #[test]
    fn two_tokens() {
        let scanner = TokenScanner::new(["tkn1", "tkn2"]).unwrap();
        let tokens = scanner.tokenize("something tkn1 ... tkn2tkn1 .....");
        assert_eq!(tokens, vec!["something ", "tkn1", " ... ", "tkn2", "tkn1", " ....."]);
    }

    #[test]
    fn only_tokens() {
        let scanner = TokenScanner::new(["tkn1", "tkn2"]).unwrap();
        assert_eq!(scanner.tokenize("tkn1"), vec!["tkn1"]);
        assert_eq!(scanner.tokenize("tkn1tkn2"), vec!["tkn1", "tkn2"]);
    }

    #[test]
    fn nested_tokens_prefer_longest() {
        let scanner = TokenScanner::new(["123", "123456", "123456789"]).unwrap();
        let tokens = scanner.tokenize("something 1234 123456 12345678 \n 1234567890");
        assert_eq!(
            tokens,
            vec!["something ", "123", "4 ", "123456", " ", "123456", "78 \n ", "123456789", "0"]
        );
    }

    #[test]
    fn item_is_not_confused_with_itemize() {
        let scanner = TokenScanner::new(["\\item", "\\begin{itemize}"]).unwrap();
        let tokens = scanner.tokenize("\\begin{itemize} \\item a");
        assert_eq!(tokens, vec!["\\begin{itemize}", " ", "\\item", " a"]);
    }
}
