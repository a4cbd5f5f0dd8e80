//! Display-text hook and fold preview labels.
//!
//! Human-readable command text is produced by the host. The core only consumes it, for search
//! matching and for the label of a collapsed fold.

use crate::command::EventCommand;
use crate::disable::DisabledPayload;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Position of the command being rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The whole command list.
    pub commands: &'a [EventCommand],
    /// Index of the command being rendered.
    pub index: usize,
}

/// Host-supplied display text. Must be a pure function of its inputs.
pub trait DisplayText {
    /// Render `command` to a single line of text.
    fn display_text(&self, command: &EventCommand, context: &RenderContext<'_>) -> String;
}

impl<F> DisplayText for F
where
    F: Fn(&EventCommand, &RenderContext<'_>) -> String,
{
    fn display_text(&self, command: &EventCommand, context: &RenderContext<'_>) -> String {
        self(command, context)
    }
}

/// Fallback renderer: the code followed by the scalar arguments.
///
/// A disabled command renders as `# ` plus the text of the command it wraps.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDisplayText;

impl DisplayText for PlainDisplayText {
    fn display_text(&self, command: &EventCommand, context: &RenderContext<'_>) -> String {
        if let [Value::String(encoded)] = command.parameters.as_slice()
            && let Some(payload) = DisabledPayload::decode(encoded)
        {
            return format!("# {}", self.display_text(&payload.restore(), context));
        }

        let mut text = command.code.to_string();
        for parameter in &command.parameters {
            match parameter {
                Value::String(s) => {
                    text.push(' ');
                    text.push_str(s);
                }
                Value::Number(n) => {
                    text.push(' ');
                    text.push_str(&n.to_string());
                }
                Value::Bool(b) => {
                    text.push(' ');
                    text.push_str(if *b { "true" } else { "false" });
                }
                _ => {}
            }
        }
        text
    }
}

/// Truncate `text` to `max_width` display columns, ending with `…` when cut.
///
/// Truncation happens on grapheme boundaries; wide characters count as two columns.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.width() <= max_width && line.len() == text.len() {
        return line.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let room = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for grapheme in line.graphemes(true) {
        let width = grapheme.width();
        if used + width > room {
            break;
        }
        used += width;
        out.push_str(grapheme);
    }
    out.push('…');
    out
}

/// Label of a collapsed fold: the header text truncated to `max_width` plus the hidden count.
pub fn fold_preview(header_text: &str, hidden: usize, max_width: usize) -> String {
    format!("{} (+{hidden})", truncate_to_width(header_text, max_width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK character takes two columns.
        assert_eq!(truncate_to_width("你好世界", 5), "你好…");
    }

    #[test]
    fn test_truncate_keeps_first_line() {
        assert_eq!(truncate_to_width("line one\nline two", 40), "line one…");
    }

    #[test]
    fn test_plain_display_text() {
        let command = EventCommand::with_parameters(101, 0, vec![json!("face"), json!(3)]);
        let context = RenderContext {
            commands: std::slice::from_ref(&command),
            index: 0,
        };
        assert_eq!(PlainDisplayText.display_text(&command, &context), "101 face 3");
        assert_eq!(fold_preview("Loop", 4, 48), "Loop (+4)");
    }

    #[test]
    fn test_plain_display_text_of_disabled_command() {
        let table = event_editor_codes::CodeTable::standard();
        let original = EventCommand::with_parameters(101, 0, vec![json!("face")]);
        let disabled = DisabledPayload::wrap(&original, "id").to_disabled_command(&table);
        let context = RenderContext {
            commands: std::slice::from_ref(&disabled),
            index: 0,
        };
        assert_eq!(PlainDisplayText.display_text(&disabled, &context), "# 101 face");
    }
}
