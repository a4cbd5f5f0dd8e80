//! Event command model.
//!
//! An event list is stored as a flat, ordered sequence of [`EventCommand`] records. Nesting is
//! encoded through `indent` and marker codes only; there is no explicit tree. The sequence
//! value handed around by the editor is a [`CommandList`], an immutable reference-counted
//! vector: every accepted mutation produces a new list, so history snapshots are cheap to keep
//! and cheap to compare by identity.

use crate::disable::DisabledPayload;
use event_editor_codes::{Code, CodeTable, code};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

/// A single event command: operation code, indent level and opaque arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCommand {
    /// Operation code.
    pub code: Code,
    /// Nesting depth (non-negative).
    #[serde(default)]
    pub indent: usize,
    /// Opaque argument list.
    #[serde(default)]
    pub parameters: Vec<Value>,
}

/// Decoded view of a command: either a live command or a disabled (comment-wrapped) one.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandState {
    /// A normal command.
    Enabled,
    /// A comment-coded command wrapping the original command.
    Disabled(DisabledPayload),
}

impl EventCommand {
    /// Create a command without arguments.
    pub fn new(code: Code, indent: usize) -> Self {
        Self {
            code,
            indent,
            parameters: Vec::new(),
        }
    }

    /// Create a command with arguments.
    pub fn with_parameters(code: Code, indent: usize, parameters: Vec<Value>) -> Self {
        Self {
            code,
            indent,
            parameters,
        }
    }

    /// Empty body placeholder (code `0`) at `indent`.
    pub fn placeholder(indent: usize) -> Self {
        Self::new(code::END, indent)
    }

    /// Returns `true` for code `0` (terminal sentinel or body placeholder).
    pub fn is_end(&self) -> bool {
        self.code == code::END
    }

    /// Decode whether this command is a disabled wrapper.
    pub fn state(&self, table: &CodeTable) -> CommandState {
        match DisabledPayload::from_command(self, table) {
            Some(payload) => CommandState::Disabled(payload),
            None => CommandState::Enabled,
        }
    }

    /// Returns `true` if this command is a disabled wrapper.
    pub fn is_disabled(&self, table: &CodeTable) -> bool {
        DisabledPayload::from_command(self, table).is_some()
    }

    /// Return a copy with the indent shifted by `delta` (clamped at zero).
    ///
    /// Nested route indents of route-carrying codes and the indent stored in a disabled
    /// payload move by the same delta.
    pub fn rebased(&self, delta: isize, table: &CodeTable) -> Self {
        let mut command = self.clone();
        command.indent = shift_indent(command.indent, delta);

        if let Some(mut payload) = DisabledPayload::from_command(self, table) {
            payload.indent = shift_indent(payload.indent, delta);
            if table.carries_route(payload.code) {
                shift_route_indents(&mut payload.parameters, delta);
            }
            command.parameters = vec![Value::String(payload.encode())];
        } else if table.carries_route(command.code) {
            shift_route_indents(&mut command.parameters, delta);
        }

        command
    }
}

fn shift_indent(indent: usize, delta: isize) -> usize {
    indent.saturating_add_signed(delta)
}

// Route lists live in the second argument: `{ "list": [{ "code", "indent", ... }] }`.
fn shift_route_indents(parameters: &mut [Value], delta: isize) {
    let Some(list) = parameters
        .get_mut(1)
        .and_then(|route| route.get_mut("list"))
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for step in list.iter_mut() {
        let Some(indent) = step.get("indent").and_then(Value::as_u64) else {
            continue;
        };
        let shifted = shift_indent(indent as usize, delta);
        if let Some(slot) = step.get_mut("indent") {
            *slot = Value::from(shifted as u64);
        }
    }
}

/// Immutable, shareable command sequence.
///
/// The final element always has code `0` (the terminal sentinel).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandList(Arc<Vec<EventCommand>>);

impl CommandList {
    /// Create a list, appending a terminal sentinel if the last command is not code `0`.
    pub fn new(mut commands: Vec<EventCommand>) -> Self {
        if commands.last().is_none_or(|last| !last.is_end()) {
            log::debug!(
                "command list of {} commands has no terminal, appending one",
                commands.len()
            );
            commands.push(EventCommand::placeholder(0));
        }
        Self(Arc::new(commands))
    }

    /// Parse a list from its persisted JSON form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let commands: Vec<EventCommand> = serde_json::from_str(json)?;
        Ok(Self::new(commands))
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self.0.as_slice())
    }

    /// Returns `true` if both lists share the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Index of the terminal sentinel.
    pub fn terminal_index(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Borrow the commands as a slice.
    pub fn as_slice(&self) -> &[EventCommand] {
        self.0.as_slice()
    }
}

impl Default for CommandList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Deref for CommandList {
    type Target = [EventCommand];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl From<Vec<EventCommand>> for CommandList {
    fn from(commands: Vec<EventCommand>) -> Self {
        Self::new(commands)
    }
}

impl Serialize for CommandList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommandList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<EventCommand>::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_is_appended() {
        let list = CommandList::new(vec![EventCommand::new(code::SHOW_TEXT, 0)]);
        assert_eq!(list.len(), 2);
        assert!(list[1].is_end());

        let list = CommandList::new(vec![EventCommand::placeholder(0)]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_json_field_names() {
        let list = CommandList::from_json_str(
            r#"[{"code":101,"indent":0,"parameters":["",0,0,2]},{"code":0,"indent":0,"parameters":[]}]"#,
        )
        .unwrap();
        assert_eq!(list[0].code, code::SHOW_TEXT);
        assert_eq!(list[0].parameters.len(), 4);

        let text = list.to_json_string().unwrap();
        assert!(text.contains(r#""code":101"#));
        assert!(text.contains(r#""indent":0"#));
    }

    #[test]
    fn test_rebased_route_indents() {
        let table = CodeTable::standard();
        let command = EventCommand::with_parameters(
            code::MOVE_ROUTE,
            2,
            vec![
                json!(-1),
                json!({ "list": [{ "code": 1, "indent": 2 }, { "code": 0, "indent": null }] }),
            ],
        );

        let rebased = command.rebased(-2, &table);
        assert_eq!(rebased.indent, 0);
        assert_eq!(rebased.parameters[1]["list"][0]["indent"], json!(0));
        assert_eq!(rebased.parameters[1]["list"][1]["indent"], Value::Null);
    }

    #[test]
    fn test_rebased_clamps_at_zero() {
        let table = CodeTable::standard();
        let command = EventCommand::new(code::EXIT_EVENT, 1);
        assert_eq!(command.rebased(-5, &table).indent, 0);
    }
}
