use crate::models::Snippet;
use regex::Regex;
use std::collections::HashMap;

const MAX_CACHED_PATTERNS: usize = 1024;

/// A snippet whose trigger the buffer currently ends with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetMatch {
    pub snippet: Snippet,
    /// The buffer tail the trigger matched, which is what gets erased.
    pub matched: String,
}

impl SnippetMatch {
    /// Number of backspaces needed to erase the typed trigger.
    pub fn erase_count(&self) -> usize {
        self.matched.chars().count()
    }
}

/// Finds the first snippet (registry order) whose trigger ends the buffer.
///
/// Overlapping triggers are not detected; whichever comes first in the
/// registry wins.
#[derive(Debug, Default)]
pub struct SnippetMatcher {
    patterns: HashMap<(String, bool), Option<Regex>>,
}

impl SnippetMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn pattern(&mut self, snippet: &Snippet) -> Option<&Regex> {
        if self.patterns.len() > MAX_CACHED_PATTERNS {
            self.patterns.clear();
        }

        self.patterns
            .entry((snippet.key.clone(), snippet.regex))
            .or_insert_with(|| {
                let body = if snippet.regex {
                    snippet.key.clone()
                } else {
                    regex::escape(&snippet.key)
                };
                match Regex::new(&format!("(?:{})$", body)) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        tracing::warn!(
                            key = %snippet.key,
                            error = %err,
                            "skipping snippet with invalid trigger"
                        );
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn find_match(&mut self, buffer: &str, snippets: &[Snippet]) -> Option<SnippetMatch> {
        if buffer.is_empty() {
            return None;
        }

        for snippet in snippets {
            if snippet.key.is_empty() {
                continue;
            }
            let Some(pattern) = self.pattern(snippet) else {
                continue;
            };
            if let Some(found) = pattern.find(buffer) {
                if found.as_str().is_empty() {
                    continue;
                }
                return Some(SnippetMatch {
                    snippet: snippet.clone(),
                    matched: found.as_str().to_string(),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnippetKind;

    #[test]
    fn literal_trigger_matches_buffer_tail() {
        let snippets = vec![Snippet::plain("btw", "by the way")];
        let mut matcher = SnippetMatcher::new();

        let found = matcher.find_match("said by the way btw", &snippets).unwrap();
        assert_eq!(found.matched, "btw");
        assert_eq!(found.erase_count(), 3);

        assert!(matcher.find_match("btw ", &snippets).is_none());
        assert!(matcher.find_match("bt", &snippets).is_none());
    }

    #[test]
    fn literal_trigger_escapes_metacharacters() {
        let snippets = vec![Snippet::plain("a.b", "dot")];
        let mut matcher = SnippetMatcher::new();
        assert!(matcher.find_match("axb", &snippets).is_none());
        assert_eq!(matcher.find_match("xa.b", &snippets).unwrap().matched, "a.b");
    }

    #[test]
    fn regex_trigger_captures_whole_tail_match() {
        let snippets = vec![Snippet::new(r"\d+x", true, SnippetKind::Js, "t => t")];
        let mut matcher = SnippetMatcher::new();

        let found = matcher.find_match("total: 42x", &snippets).unwrap();
        assert_eq!(found.matched, "42x");
        assert_eq!(found.erase_count(), 3);
        assert!(matcher.find_match("42xy", &snippets).is_none());
    }

    #[test]
    fn first_registered_snippet_wins() {
        let snippets = vec![
            Snippet::plain("way", "first"),
            Snippet::plain("the way", "second"),
        ];
        let mut matcher = SnippetMatcher::new();
        let found = matcher.find_match("by the way", &snippets).unwrap();
        assert_eq!(found.snippet.value, "first");
        assert_eq!(found.matched, "way");
    }

    #[test]
    fn invalid_and_empty_triggers_are_skipped() {
        let snippets = vec![
            Snippet::new("(unclosed", true, SnippetKind::Plain, "bad"),
            Snippet::plain("", "empty"),
            Snippet::new("z*", true, SnippetKind::Plain, "nullable"),
            Snippet::plain("ok", "good"),
        ];
        let mut matcher = SnippetMatcher::new();
        let found = matcher.find_match("it is ok", &snippets).unwrap();
        assert_eq!(found.snippet.value, "good");
    }

    #[test]
    fn multibyte_triggers_count_characters() {
        let snippets = vec![Snippet::plain("→é", "arrow")];
        let mut matcher = SnippetMatcher::new();
        let found = matcher.find_match("x→é", &snippets).unwrap();
        assert_eq!(found.erase_count(), 2);
    }
}
