//! Shared line splitting for the keyword-prefixed text formats (OBJ, MTL).

use std::str::SplitWhitespace;

/// One non-blank, non-comment line split into its keyword and the rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Line<'a> {
    /// 1-based line number in the source text.
    pub number: usize,
    pub keyword: &'a str,
    /// Everything after the keyword, leading whitespace removed. Filenames
    /// with embedded spaces are taken from here verbatim.
    pub rest: &'a str,
}

impl<'a> Line<'a> {
    pub fn fields(&self) -> SplitWhitespace<'a> {
        self.rest.split_whitespace()
    }
}

pub(crate) fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.lines().enumerate().filter_map(|(idx, raw)| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim_start()),
            None => (line, ""),
        };
        Some(Line {
            number: idx + 1,
            keyword,
            rest,
        })
    })
}

/// Parse every field as `f32`; on failure returns the offending token.
pub(crate) fn floats<'a>(fields: impl Iterator<Item = &'a str>) -> Result<Vec<f32>, &'a str> {
    fields
        .map(|token| token.parse::<f32>().map_err(|_| token))
        .collect()
}
