use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;
use daachorse::errors::DaachorseError;
use daachorse::DoubleArrayAhoCorasick;

/// Scans for context words around a candidate span with word-boundary awareness.
///
/// Matching is ASCII case-insensitive. A scanner built from an empty word
/// list never reports context.
pub struct ContextScanner {
    automaton: Option<DoubleArrayAhoCorasick<usize>>,
    word_count: usize,
}

impl fmt::Debug for ContextScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScanner")
         .field("automaton", &"<DoubleArrayAhoCorasick>")
         .field("word_count", &self.word_count)
         .finish()
    }
}

impl ContextScanner {
    /// Builds a scanner over the given context words.
    ///
    /// Words are lower-cased and de-duplicated before the automaton is built,
    /// since the automaton rejects duplicate patterns.
    pub fn new<I, S>(words: I) -> Result<Self, DaachorseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<Vec<u8>> = words
            .into_iter()
            .map(|w| w.as_ref().trim().as_bytes().to_ascii_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        if unique.is_empty() {
            return Ok(Self { automaton: None, word_count: 0 });
        }

        let word_count = unique.len();
        let automaton = DoubleArrayAhoCorasick::new(unique)?;
        Ok(Self { automaton: Some(automaton), word_count })
    }

    /// A scanner that never matches.
    pub fn empty() -> Self {
        Self { automaton: None, word_count: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    /// Returns true if a context word appears within `window` bytes before
    /// `start` or after `end`.
    pub fn has_context(&self, text: &[u8], start: usize, end: usize, window: usize) -> bool {
        if self.automaton.is_none() {
            return false;
        }
        let start = start.min(text.len());
        let end = end.clamp(start, text.len());

        let before = &text[start.saturating_sub(window)..start];
        let after = &text[end..end.saturating_add(window).min(text.len())];

        self.scan_window(before) || self.scan_window(after)
    }

    /// Scans a single window for any whole-word context match.
    /// Employs word-boundary checks so that "id" doesn't match "valid".
    pub fn scan_window(&self, window: &[u8]) -> bool {
        let Some(automaton) = &self.automaton else { return false; };
        if window.is_empty() {
            return false;
        }
        let lowered = window.to_ascii_lowercase();

        for matched in automaton.find_overlapping_iter(&lowered) {
            let m_start = matched.start();
            let m_end = matched.end();

            let prefix_ok = m_start == 0 || !lowered[m_start - 1].is_ascii_alphanumeric();
            let suffix_ok = m_end == lowered.len() || !lowered[m_end].is_ascii_alphanumeric();

            if prefix_ok && suffix_ok {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_word_before_span() {
        let scanner = ContextScanner::new(["phone", "call"]).unwrap();
        let text = b"my phone number is 555-123-4567";
        assert!(scanner.has_context(text, 19, 31, 32));
    }

    #[test]
    fn finds_word_after_span() {
        let scanner = ContextScanner::new(["ssn"]).unwrap();
        let text = b"123-45-6789 is my SSN";
        assert!(scanner.has_context(text, 0, 11, 16));
    }

    #[test]
    fn respects_word_boundaries() {
        let scanner = ContextScanner::new(["id"]).unwrap();
        assert!(!scanner.scan_window(b"a valid value"));
        assert!(scanner.scan_window(b"user id:"));
    }

    #[test]
    fn window_limits_the_search() {
        let scanner = ContextScanner::new(["email"]).unwrap();
        let text = b"email ............................ a@b.io";
        let start = text.len() - 6;
        assert!(!scanner.has_context(text, start, text.len(), 8));
        assert!(scanner.has_context(text, start, text.len(), 64));
    }

    #[test]
    fn empty_and_duplicate_words() {
        let scanner = ContextScanner::new(Vec::<&str>::new()).unwrap();
        assert!(scanner.is_empty());
        assert!(!scanner.scan_window(b"anything"));

        let scanner = ContextScanner::new(["Card", "card", " "]).unwrap();
        assert!(!scanner.is_empty());
        assert!(scanner.scan_window(b"CARD number"));
    }
}
