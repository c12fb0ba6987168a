use regex::Regex;

/// Highlights occurrences of the active `search` filter inside row messages.
///
/// The server does the actual filtering; this only marks where the term
/// appears so matched rows are easy to scan.
#[derive(Debug, Clone, Default)]
pub struct SearchHighlighter {
    term: String,
    regex: Option<Regex>,
}

impl SearchHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn set_term(&mut self, term: &str) {
        let term = term.trim();
        if term == self.term {
            return;
        }
        self.term = term.to_string();
        self.regex = if term.is_empty() {
            None
        } else {
            Regex::new(&format!("(?i){}", regex::escape(term))).ok()
        };
    }

    /// Byte ranges of every match in `text`.
    pub fn match_positions(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(regex) => regex
                .find_iter(text)
                .map(|mat| (mat.start(), mat.end()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Splits `text` into `(segment, is_match)` pieces covering it entirely.
    pub fn segments<'a>(&self, text: &'a str) -> Vec<(&'a str, bool)> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        for (start, end) in self.match_positions(text) {
            if start > cursor {
                segments.push((&text[cursor..start], false));
            }
            segments.push((&text[start..end], true));
            cursor = end;
        }
        if cursor < text.len() || segments.is_empty() {
            segments.push((&text[cursor..], false));
        }
        segments
    }
}
