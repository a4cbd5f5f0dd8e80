//! Error types.

use event_editor_codes::Code;
use thiserror::Error;

/// Caller-visible failure of an editing operation.
///
/// Structural malformation, invalid search patterns and clipboard access failures are not
/// errors; they degrade silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// An index outside the current command list.
    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Current list length.
        len: usize,
    },
    /// The operation would remove, disable, relocate or edit the terminal command.
    #[error("the terminal command cannot be modified")]
    TerminalProtected,
    /// The drop target is at or beyond the terminal command.
    #[error("invalid drop target {target}")]
    InvalidDropTarget {
        /// Requested target index.
        target: usize,
    },
    /// The grabbed command is a marker, continuation line or placeholder.
    #[error("command at {index} cannot be dragged")]
    NotDraggable {
        /// Grabbed index.
        index: usize,
    },
    /// The clipboard holds nothing.
    #[error("nothing to paste")]
    NothingToPaste,
    /// The operation needs a selection.
    #[error("selection is empty")]
    EmptySelection,
    /// Update with branches was requested for a command that is not a block header.
    #[error("code {code} at {index} is not a block header")]
    NotABlockHeader {
        /// Index of the command.
        index: usize,
        /// Its code.
        code: Code,
    },
}

/// Errors loading an [`EditorConfig`](crate::EditorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for the config schema.
    #[error("invalid editor config: {0}")]
    Json(#[from] serde_json::Error),
}
