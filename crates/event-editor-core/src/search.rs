//! Find/replace over command lists.
//!
//! A command matches when its rendered display text matches, or when any string argument does
//! (including strings one level inside an array argument). Disabled commands are searched and
//! rewritten through their decoded payload, never through the encoded envelope text.
//!
//! Replacement only touches string arguments; code, indent and structure are preserved.

use crate::command::EventCommand;
use crate::disable::DisabledPayload;
use crate::render::{DisplayText, RenderContext};
use crate::structure::terminal_index;
use event_editor_codes::CodeTable;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use thiserror::Error;

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: false,
        }
    }
}

/// Search errors.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The query is empty.
    #[error("empty search query")]
    EmptyQuery,
    /// The provided regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// A compiled query.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
    whole_word: bool,
    expand_captures: bool,
}

impl SearchPattern {
    /// Compile `query` with `options`. Literal queries are escaped.
    pub fn new(query: &str, options: SearchOptions) -> Result<Self, SearchError> {
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let pattern = if options.regex {
            query.to_string()
        } else {
            regex::escape(query)
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .multi_line(true)
            .build()?;

        Ok(Self {
            regex,
            whole_word: options.whole_word,
            expand_captures: options.regex,
        })
    }

    /// Returns `true` if `text` contains an accepted match.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex
            .find_iter(text)
            .any(|m| self.accepts(text, m.start(), m.end()))
    }

    /// Replace every accepted match. Returns the new text and the number of replacements.
    ///
    /// In regex mode `$1`-style references in `replacement` are expanded; in literal mode the
    /// replacement is inserted verbatim.
    pub fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut count = 0;

        for caps in self.regex.captures_iter(text) {
            let Some(m) = caps.get(0) else {
                continue;
            };
            if !self.accepts(text, m.start(), m.end()) {
                continue;
            }
            out.push_str(&text[last..m.start()]);
            if self.expand_captures {
                caps.expand(replacement, &mut out);
            } else {
                out.push_str(replacement);
            }
            last = m.end();
            count += 1;
        }

        if count == 0 {
            return (text.to_string(), 0);
        }
        out.push_str(&text[last..]);
        (out, count)
    }

    fn accepts(&self, text: &str, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        !self.whole_word || is_whole_word(text, start, end)
    }
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

// String arguments, plus strings one level inside array arguments.
fn string_arguments(parameters: &[Value]) -> impl Iterator<Item = &str> {
    parameters.iter().flat_map(|parameter| match parameter {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    })
}

fn rewrite_strings(
    parameters: &mut [Value],
    pattern: &SearchPattern,
    replacement: &str,
) -> usize {
    let mut count = 0;
    let mut rewrite = |slot: &mut Value| {
        if let Value::String(s) = slot {
            let (replaced, n) = pattern.replace_all(s, replacement);
            if n > 0 {
                *s = replaced;
                count += n;
            }
        }
    };

    for parameter in parameters.iter_mut() {
        match parameter {
            Value::Array(items) => items.iter_mut().for_each(&mut rewrite),
            other => rewrite(other),
        }
    }
    count
}

/// Returns `true` if the command at `index` matches `pattern`.
pub fn command_matches(
    commands: &[EventCommand],
    index: usize,
    pattern: &SearchPattern,
    render: &dyn DisplayText,
    table: &CodeTable,
) -> bool {
    let Some(command) = commands.get(index) else {
        return false;
    };
    let context = RenderContext { commands, index };
    if pattern.is_match(&render.display_text(command, &context)) {
        return true;
    }

    match DisabledPayload::from_command(command, table) {
        Some(payload) => string_arguments(&payload.parameters).any(|s| pattern.is_match(s)),
        None => string_arguments(&command.parameters).any(|s| pattern.is_match(s)),
    }
}

/// Indices of every matching command, in ascending order. The terminal is never matched.
pub fn find_matches(
    commands: &[EventCommand],
    pattern: &SearchPattern,
    render: &dyn DisplayText,
    table: &CodeTable,
) -> Vec<usize> {
    (0..terminal_index(commands))
        .filter(|&index| command_matches(commands, index, pattern, render, table))
        .collect()
}

/// Rewrite the string arguments of one command. Returns `None` when nothing matched.
pub fn replace_in_command(
    command: &EventCommand,
    pattern: &SearchPattern,
    replacement: &str,
    table: &CodeTable,
) -> Option<(EventCommand, usize)> {
    let mut updated = command.clone();

    let count = match DisabledPayload::from_command(command, table) {
        Some(mut payload) => {
            let count = rewrite_strings(&mut payload.parameters, pattern, replacement);
            if count > 0 {
                updated.parameters = vec![Value::String(payload.encode())];
            }
            count
        }
        None => rewrite_strings(&mut updated.parameters, pattern, replacement),
    };

    (count > 0).then_some((updated, count))
}

/// Replace inside the command at `index`.
pub fn replace_at(
    commands: &[EventCommand],
    index: usize,
    pattern: &SearchPattern,
    replacement: &str,
    table: &CodeTable,
) -> Option<(Vec<EventCommand>, usize)> {
    if index >= terminal_index(commands) {
        return None;
    }
    let (updated, count) = replace_in_command(&commands[index], pattern, replacement, table)?;
    let mut result = commands.to_vec();
    result[index] = updated;
    Some((result, count))
}

/// Replace in every command. Returns the new list, the replacement count and changed indices.
pub fn replace_all(
    commands: &[EventCommand],
    pattern: &SearchPattern,
    replacement: &str,
    table: &CodeTable,
) -> Option<(Vec<EventCommand>, usize, Vec<usize>)> {
    let mut result = commands.to_vec();
    let mut total = 0;
    let mut changed = Vec::new();

    for index in 0..terminal_index(commands) {
        if let Some((updated, count)) =
            replace_in_command(&commands[index], pattern, replacement, table)
        {
            result[index] = updated;
            total += count;
            changed.push(index);
        }
    }

    (total > 0).then_some((result, total, changed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word() {
        let options = SearchOptions {
            whole_word: true,
            ..SearchOptions::default()
        };
        let pattern = SearchPattern::new("cat", options).unwrap();
        assert!(pattern.is_match("a cat sat"));
        assert!(!pattern.is_match("concatenate"));
    }

    #[test]
    fn test_literal_replacement_is_not_expanded() {
        let pattern = SearchPattern::new("gold", SearchOptions::default()).unwrap();
        let (text, count) = pattern.replace_all("gold and gold", "$1");
        assert_eq!(text, "$1 and $1");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_regex_replacement_expands_groups() {
        let options = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        let pattern = SearchPattern::new(r"(\d+) gold", options).unwrap();
        let (text, _) = pattern.replace_all("pay 50 gold", "$1 silver");
        assert_eq!(text, "pay 50 silver");
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let options = SearchOptions {
            regex: true,
            ..SearchOptions::default()
        };
        assert!(matches!(
            SearchPattern::new("(", options),
            Err(SearchError::InvalidRegex(_))
        ));
        assert!(matches!(
            SearchPattern::new("", SearchOptions::default()),
            Err(SearchError::EmptyQuery)
        ));
    }
}
