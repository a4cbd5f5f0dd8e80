//! Reversible disable/enable of structural groups.
//!
//! Disabling replaces every command of a group with a comment-coded command whose sole argument
//! is `DISABLED_PREFIX + JSON { blockId, code, indent, parameters }`. All commands disabled
//! together share one `blockId`, so re-enabling any part of the block restores all of it.
//! Payloads without a `blockId` (older data) still decode and restore as single commands.

use crate::command::EventCommand;
use crate::structure::{GroupRange, expand_selection_to_groups, merge_runs, terminal_index};
use event_editor_codes::{Code, CodeTable};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Prefix marking a comment argument as a disabled-command payload.
pub const DISABLED_PREFIX: &str = "@@event-editor/disabled@@";

/// The original command hidden inside a disabled (comment-coded) command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisabledPayload {
    /// Identifier shared by all commands disabled in one action.
    #[serde(rename = "blockId", default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    /// Original operation code.
    pub code: Code,
    /// Original indent.
    #[serde(default)]
    pub indent: usize,
    /// Original arguments.
    #[serde(default)]
    pub parameters: Vec<Value>,
}

impl DisabledPayload {
    /// Capture `command` under `block_id`.
    pub fn wrap(command: &EventCommand, block_id: &str) -> Self {
        Self {
            block_id: Some(block_id.to_string()),
            code: command.code,
            indent: command.indent,
            parameters: command.parameters.clone(),
        }
    }

    /// Decode a comment argument. Returns `None` for ordinary comment text.
    pub fn decode(text: &str) -> Option<Self> {
        let body = text.strip_prefix(DISABLED_PREFIX)?;
        serde_json::from_str(body).ok()
    }

    /// Decode the payload of a comment-coded command.
    pub fn from_command(command: &EventCommand, table: &CodeTable) -> Option<Self> {
        if command.code != table.comment_code() {
            return None;
        }
        match command.parameters.as_slice() {
            [Value::String(text)] => Self::decode(text),
            _ => None,
        }
    }

    /// Encode into the comment argument string.
    pub fn encode(&self) -> String {
        let mut body = json!({
            "code": self.code,
            "indent": self.indent,
            "parameters": self.parameters,
        });
        if let (Some(id), Some(map)) = (&self.block_id, body.as_object_mut()) {
            map.insert("blockId".to_string(), Value::String(id.clone()));
        }
        format!("{DISABLED_PREFIX}{body}")
    }

    /// The comment-coded command carrying this payload.
    pub fn to_disabled_command(&self, table: &CodeTable) -> EventCommand {
        EventCommand::with_parameters(
            table.comment_code(),
            self.indent,
            vec![Value::String(self.encode())],
        )
    }

    /// The original command.
    pub fn restore(&self) -> EventCommand {
        EventCommand::with_parameters(self.code, self.indent, self.parameters.clone())
    }
}

/// Generate a fresh block identifier.
pub fn new_block_id() -> String {
    Uuid::new_v4().to_string()
}

/// Result of a disable/enable toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The selection was disabled.
    Disabled {
        /// New command list.
        commands: Vec<EventCommand>,
        /// Ranges that were disabled, one block id each.
        ranges: Vec<GroupRange>,
    },
    /// The selection was re-enabled.
    Enabled {
        /// New command list.
        commands: Vec<EventCommand>,
        /// Indices that were restored.
        restored: Vec<usize>,
    },
}

/// Returns `true` if every selected, non-terminal command is disabled (and at least one is).
pub fn is_all_disabled(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> bool {
    let terminal = terminal_index(commands);
    let mut candidates = selection.iter().copied().filter(|i| *i < terminal).peekable();
    if candidates.peek().is_none() {
        return false;
    }
    candidates.all(|i| commands[i].is_disabled(table))
}

/// Disable the group-expanded selection, one fresh block id per disjoint range.
///
/// Commands that are already disabled inside a range keep their own payload. Returns `None`
/// when nothing would change.
pub fn disable_commands(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<(Vec<EventCommand>, Vec<GroupRange>)> {
    let ranges = expand_selection_to_groups(commands, selection.iter().copied(), table);
    let mut result = commands.to_vec();
    let mut disabled = Vec::new();

    for range in ranges {
        let block_id = new_block_id();
        let mut touched = false;
        for index in range.indices() {
            let command = &commands[index];
            if command.is_disabled(table) {
                continue;
            }
            result[index] = DisabledPayload::wrap(command, &block_id).to_disabled_command(table);
            touched = true;
        }
        if touched {
            disabled.push(range);
        }
    }

    (!disabled.is_empty()).then_some((result, disabled))
}

/// Re-enable every command sharing a block id with the selection.
///
/// Legacy payloads without a block id restore only when selected. Returns `None` when nothing
/// would change.
pub fn enable_commands(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<(Vec<EventCommand>, Vec<usize>)> {
    let terminal = terminal_index(commands);
    let mut block_ids: BTreeSet<String> = BTreeSet::new();
    let mut singletons: BTreeSet<usize> = BTreeSet::new();

    for &index in selection.iter().filter(|i| **i < terminal) {
        if let Some(payload) = DisabledPayload::from_command(&commands[index], table) {
            match payload.block_id {
                Some(id) => {
                    block_ids.insert(id);
                }
                None => {
                    singletons.insert(index);
                }
            }
        }
    }

    let mut result = commands.to_vec();
    let mut restored = Vec::new();
    for (index, command) in commands.iter().enumerate() {
        let Some(payload) = DisabledPayload::from_command(command, table) else {
            continue;
        };
        let selected_block = payload
            .block_id
            .as_ref()
            .is_some_and(|id| block_ids.contains(id));
        if selected_block || singletons.contains(&index) {
            result[index] = payload.restore();
            restored.push(index);
        }
    }

    (!restored.is_empty()).then_some((result, restored))
}

/// Enable if the whole selection is disabled, otherwise disable.
///
/// A mixed selection always disables.
pub fn toggle_disabled(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<ToggleOutcome> {
    if is_all_disabled(commands, selection, table) {
        enable_commands(commands, selection, table)
            .map(|(commands, restored)| ToggleOutcome::Enabled { commands, restored })
    } else {
        disable_commands(commands, selection, table)
            .map(|(commands, ranges)| ToggleOutcome::Disabled { commands, ranges })
    }
}

/// All indices sharing the disabled block of `index`, or just `index` for any other command.
pub fn disabled_block_members(
    commands: &[EventCommand],
    index: usize,
    table: &CodeTable,
) -> BTreeSet<usize> {
    let block_id = commands
        .get(index)
        .and_then(|command| DisabledPayload::from_command(command, table))
        .and_then(|payload| payload.block_id);

    let Some(block_id) = block_id else {
        return BTreeSet::from([index]);
    };

    commands
        .iter()
        .enumerate()
        .filter(|(_, command)| {
            DisabledPayload::from_command(command, table)
                .and_then(|payload| payload.block_id)
                .is_some_and(|id| id == block_id)
        })
        .map(|(i, _)| i)
        .collect()
}

/// The contiguous run around `index` sharing its disabled block id.
pub fn disabled_block_span(
    commands: &[EventCommand],
    index: usize,
    table: &CodeTable,
) -> Option<GroupRange> {
    let members = disabled_block_members(commands, index, table);
    if members.len() < 2 {
        return None;
    }
    merge_runs(members)
        .into_iter()
        .find(|run| run.contains(index))
}

/// Give every disabled block in `commands` a fresh block id (one per distinct original id).
pub(crate) fn refresh_block_ids(commands: &mut [EventCommand], table: &CodeTable) {
    let mut renamed: BTreeMap<String, String> = BTreeMap::new();
    for command in commands.iter_mut() {
        let Some(mut payload) = DisabledPayload::from_command(command, table) else {
            continue;
        };
        let Some(old_id) = payload.block_id.take() else {
            continue;
        };
        let new_id = renamed.entry(old_id).or_insert_with(new_block_id).clone();
        payload.block_id = Some(new_id);
        command.parameters = vec![Value::String(payload.encode())];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_editor_codes::code;

    #[test]
    fn test_payload_round_trip() {
        let table = CodeTable::standard();
        let original =
            EventCommand::with_parameters(code::SHOW_TEXT, 2, vec![json!(""), json!(0)]);
        let disabled = DisabledPayload::wrap(&original, "abc").to_disabled_command(&table);

        assert_eq!(disabled.code, code::COMMENT);
        assert_eq!(disabled.indent, 2);
        let payload = DisabledPayload::from_command(&disabled, &table).unwrap();
        assert_eq!(payload.block_id.as_deref(), Some("abc"));
        assert_eq!(payload.restore(), original);
    }

    #[test]
    fn test_legacy_payload_without_block_id() {
        let text = format!(r#"{DISABLED_PREFIX}{{"code":101,"indent":0,"parameters":["",0]}}"#);
        let payload = DisabledPayload::decode(&text).unwrap();
        assert_eq!(payload.block_id, None);
        assert_eq!(payload.code, code::SHOW_TEXT);
    }

    #[test]
    fn test_plain_comment_is_not_disabled() {
        let table = CodeTable::standard();
        let comment = EventCommand::with_parameters(code::COMMENT, 0, vec![json!("just a note")]);
        assert!(!comment.is_disabled(&table));
    }
}
