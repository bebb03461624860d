//! Prompt search terms.
//!
//! Prompts are matched as literal substrings, never as regexes: interpreter
//! prompts like `...` or `+` are full of regex metacharacters.

use memchr::memmem::Finder;

/// A search term occurrence within a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMatch {
    /// Byte offset where the term starts.
    pub start: usize,

    /// Byte offset one past the end of the term.
    pub end: usize,

    /// Index of the term in its [`SearchTerms`].
    pub index: usize,
}

/// Ordered set of literal patterns signalling the interpreter wants input.
#[derive(Debug, Clone)]
pub struct SearchTerms {
    terms: Vec<String>,
    finders: Vec<Finder<'static>>,
}

impl SearchTerms {
    /// Build the search terms for a prompt set.
    ///
    /// Every prompt yields `<line_ending><prompt>`. With `allow_bare`, each
    /// bare `<prompt>` is appended after all line-ending-qualified terms, so
    /// a prompt that follows a real newline wins when both start at the same
    /// position.
    pub fn build<S: AsRef<str>>(prompts: &[S], line_ending: &str, allow_bare: bool) -> Self {
        let mut terms: Vec<String> = prompts
            .iter()
            .map(|p| format!("{}{}", line_ending, p.as_ref()))
            .collect();
        if allow_bare {
            terms.extend(prompts.iter().map(|p| p.as_ref().to_string()));
        }
        Self::from_terms(terms)
    }

    /// Use an explicit list of terms, in priority order.
    pub fn from_terms(terms: Vec<String>) -> Self {
        let finders = terms
            .iter()
            .map(|t| Finder::new(t.as_bytes()).into_owned())
            .collect();
        Self { terms, finders }
    }

    /// The terms in priority order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Length of the longest term, in bytes.
    pub fn longest(&self) -> usize {
        self.terms.iter().map(String::len).max().unwrap_or(0)
    }

    /// Find the earliest occurrence of any term in `data`.
    ///
    /// When several terms start at the same offset the one listed first wins.
    pub fn find(&self, data: &[u8]) -> Option<TermMatch> {
        let mut best: Option<TermMatch> = None;
        for (index, finder) in self.finders.iter().enumerate() {
            if finder.needle().is_empty() {
                continue;
            }
            // Only the part before the current best can yield an earlier hit.
            let limit = match best {
                Some(m) => (m.start + finder.needle().len()).min(data.len()),
                None => data.len(),
            };
            if let Some(start) = finder.find(&data[..limit]) {
                if best.is_none_or(|m| start < m.start) {
                    best = Some(TermMatch {
                        start,
                        end: start + finder.needle().len(),
                        index,
                    });
                }
            }
        }
        best
    }
}
