//! Structural copy, cut, paste and delete.
//!
//! The clipboard is process-scoped: [`SharedClipboard::global`] is shared by every editor in the
//! process, so a copy in one editor can be pasted into another. Writes are last-write-wins with
//! no versioning. Each copy also goes to the platform text clipboard as a tagged JSON envelope;
//! platform failures are ignored and the in-process value stays authoritative.

use crate::command::EventCommand;
use crate::disable::refresh_block_ids;
use crate::structure::{GroupRange, expand_selection_to_groups, terminal_index};
use event_editor_codes::CodeTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Marker identifying clipboard text written by this editor.
pub const CLIPBOARD_MARKER: &str = "event-editor/commands";

/// Tagged clipboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEnvelope {
    /// Always [`CLIPBOARD_MARKER`].
    pub marker: String,
    /// Copied commands.
    pub commands: Vec<EventCommand>,
}

impl ClipboardEnvelope {
    /// Wrap commands in an envelope.
    pub fn new(commands: Vec<EventCommand>) -> Self {
        Self {
            marker: CLIPBOARD_MARKER.to_string(),
            commands,
        }
    }

    /// Serialize to clipboard text.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse clipboard text; foreign or malformed text yields `None`.
    pub fn from_text(text: &str) -> Option<Self> {
        let envelope: Self = serde_json::from_str(text).ok()?;
        (envelope.marker == CLIPBOARD_MARKER).then_some(envelope)
    }
}

/// Platform clipboard errors.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Access was refused by the platform.
    #[error("clipboard access denied")]
    Denied,
    /// The platform clipboard is not available.
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// The platform text clipboard, supplied by the host.
pub trait PlatformClipboard: Send + Sync {
    /// Read the current clipboard text.
    fn read_text(&self) -> Result<String, ClipboardError>;
    /// Replace the clipboard text.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// In-process text clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: Mutex<Option<String>>,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlatformClipboard for MemoryClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ClipboardError::Unavailable("clipboard is empty".to_string()))
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct ClipboardSlot {
    commands: Option<Vec<EventCommand>>,
    platform: Option<Arc<dyn PlatformClipboard>>,
}

static GLOBAL_CLIPBOARD: LazyLock<SharedClipboard> = LazyLock::new(SharedClipboard::new);

/// Handle to a clipboard value shared between editors.
#[derive(Clone, Default)]
pub struct SharedClipboard {
    slot: Arc<Mutex<ClipboardSlot>>,
}

impl std::fmt::Debug for SharedClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.lock();
        f.debug_struct("SharedClipboard")
            .field("commands", &slot.commands.as_ref().map(Vec::len))
            .field("platform", &slot.platform.is_some())
            .finish()
    }
}

impl SharedClipboard {
    /// The process-wide clipboard.
    pub fn global() -> Self {
        GLOBAL_CLIPBOARD.clone()
    }

    /// A new, isolated clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new, isolated clipboard mirrored to `platform`.
    pub fn with_platform(platform: Arc<dyn PlatformClipboard>) -> Self {
        let clipboard = Self::new();
        clipboard.set_platform(Some(platform));
        clipboard
    }

    /// Attach or detach the platform text clipboard.
    pub fn set_platform(&self, platform: Option<Arc<dyn PlatformClipboard>>) {
        self.lock().platform = platform;
    }

    /// Store copied commands (last write wins) and mirror them to the platform clipboard.
    pub fn store(&self, commands: Vec<EventCommand>) {
        let envelope = ClipboardEnvelope::new(commands.clone());
        let platform = {
            let mut slot = self.lock();
            slot.commands = Some(commands);
            slot.platform.clone()
        };

        let Some(platform) = platform else {
            return;
        };
        let written = envelope
            .to_text()
            .map_err(|err| ClipboardError::Unavailable(err.to_string()))
            .and_then(|text| platform.write_text(&text));
        if let Err(err) = written {
            log::debug!("ignoring platform clipboard write failure: {err}");
        }
    }

    /// Commands to paste: a tagged platform payload if present, else the in-process value.
    pub fn load(&self) -> Option<Vec<EventCommand>> {
        let (internal, platform) = {
            let slot = self.lock();
            (slot.commands.clone(), slot.platform.clone())
        };

        if let Some(platform) = platform {
            match platform.read_text() {
                Ok(text) => match ClipboardEnvelope::from_text(&text) {
                    Some(envelope) => return Some(envelope.commands),
                    None => log::debug!("platform clipboard holds foreign text, using internal"),
                },
                Err(err) => log::debug!("platform clipboard read failed ({err}), using internal"),
            }
        }

        internal
    }

    /// The in-process value only.
    pub fn internal(&self) -> Option<Vec<EventCommand>> {
        self.lock().commands.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClipboardSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deep copy of the group-expanded selection, ranges concatenated in ascending order.
pub fn copy_commands(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Vec<EventCommand> {
    expand_selection_to_groups(commands, selection.iter().copied(), table)
        .into_iter()
        .flat_map(|range| commands[range.indices()].iter().cloned())
        .collect()
}

/// Result of a paste.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteOutcome {
    /// New command list.
    pub commands: Vec<EventCommand>,
    /// Where the pasted commands landed.
    pub inserted: GroupRange,
}

/// Insert an indent-rebased copy of `clipboard` at `anchor`.
///
/// Without an anchor the commands go right before the terminal sentinel. The indent delta is
/// the anchor command's indent minus the smallest clipboard indent, so relative nesting inside
/// the clipboard is preserved. Pasted disabled blocks receive fresh block ids.
pub fn paste_commands(
    commands: &[EventCommand],
    clipboard: &[EventCommand],
    anchor: Option<usize>,
    table: &CodeTable,
) -> Option<PasteOutcome> {
    let base = clipboard.iter().map(|c| c.indent).min()?;
    let terminal = terminal_index(commands);
    let anchor = anchor.filter(|a| *a <= terminal).unwrap_or(terminal);
    let target_indent = commands.get(anchor).map_or(0, |c| c.indent);
    let delta = target_indent as isize - base as isize;

    let mut pasted: Vec<EventCommand> = clipboard.iter().map(|c| c.rebased(delta, table)).collect();
    refresh_block_ids(&mut pasted, table);

    let inserted = GroupRange::new(anchor, anchor + pasted.len() - 1);
    let mut result = Vec::with_capacity(commands.len() + pasted.len());
    result.extend_from_slice(&commands[..anchor]);
    result.extend(pasted);
    result.extend_from_slice(&commands[anchor..]);

    Some(PasteOutcome {
        commands: result,
        inserted,
    })
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    /// New command list.
    pub commands: Vec<EventCommand>,
    /// Removed ranges (indices before removal).
    pub removed: Vec<GroupRange>,
    /// Index to select afterwards.
    pub select: usize,
}

/// Remove the group-expanded selection. The terminal sentinel is never removed.
pub fn delete_commands(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<DeleteOutcome> {
    let terminal = terminal_index(commands);
    let removed = expand_selection_to_groups(commands, selection.iter().copied(), table);
    let first = removed.first()?.start();

    let result: Vec<EventCommand> = commands
        .iter()
        .enumerate()
        .filter(|(i, _)| *i == terminal || !removed.iter().any(|range| range.contains(*i)))
        .map(|(_, c)| c.clone())
        .collect();

    let select = first.min(result.len().saturating_sub(1));
    Some(DeleteOutcome {
        commands: result,
        removed,
        select,
    })
}
