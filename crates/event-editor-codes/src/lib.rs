#![warn(missing_docs)]
//! `event-editor-codes` - operation codes and block classification tables for `event-editor-core`.
//!
//! An event list is a flat sequence of commands whose nesting is only implied by an indent
//! number and a handful of marker codes. This crate holds the static data that tells the
//! editor kernel how to read that structure:
//!
//! - which codes take no arguments
//! - which codes are continuation lines trailing a primary (e.g. text lines after "Show Text")
//! - which codes close a block opened by a primary
//! - which codes are interior markers (e.g. "Else") of a parent block
//!
//! The crate intentionally stays dependency-free. Hosts that use a different command set can
//! build their own [`CodeTable`] with the builder methods.

use std::collections::{BTreeMap, BTreeSet};

/// Operation code type.
pub type Code = i32;

/// Well-known operation codes of the standard (RPG Maker MZ compatible) command set.
pub mod code {
    use super::Code;

    /// Terminal sentinel / empty body placeholder.
    pub const END: Code = 0;
    /// Show Text (primary, continued by [`TEXT_LINE`]).
    pub const SHOW_TEXT: Code = 101;
    /// Show Choices (block).
    pub const SHOW_CHOICES: Code = 102;
    /// Scrolling Text (primary, continued by [`SCROLL_TEXT_LINE`]).
    pub const SCROLL_TEXT: Code = 105;
    /// Comment (primary, continued by [`COMMENT_LINE`]).
    pub const COMMENT: Code = 108;
    /// Conditional Branch (block).
    pub const CONDITIONAL: Code = 111;
    /// Loop (block).
    pub const LOOP: Code = 112;
    /// Break Loop.
    pub const BREAK_LOOP: Code = 113;
    /// Exit Event Processing.
    pub const EXIT_EVENT: Code = 115;
    /// Set Movement Route (carries a nested route, continued by [`ROUTE_STEP`]).
    pub const MOVE_ROUTE: Code = 205;
    /// Battle Processing (a block only when it has escape or lose branches).
    pub const BATTLE: Code = 301;
    /// Script (primary, continued by [`SCRIPT_LINE`]).
    pub const SCRIPT: Code = 355;
    /// Plugin Command (primary, continued by [`PLUGIN_COMMAND_LINE`]).
    pub const PLUGIN_COMMAND: Code = 357;
    /// Text line following [`SHOW_TEXT`].
    pub const TEXT_LINE: Code = 401;
    /// "When" choice branch marker.
    pub const WHEN_CHOICE: Code = 402;
    /// "When Cancel" branch marker.
    pub const WHEN_CANCEL: Code = 403;
    /// End of a choices block.
    pub const CHOICES_END: Code = 404;
    /// Text line following [`SCROLL_TEXT`].
    pub const SCROLL_TEXT_LINE: Code = 405;
    /// Comment line following [`COMMENT`].
    pub const COMMENT_LINE: Code = 408;
    /// "Else" marker of a conditional branch.
    pub const ELSE: Code = 411;
    /// End of a conditional branch.
    pub const CONDITIONAL_END: Code = 412;
    /// "Repeat Above" - end of a loop.
    pub const REPEAT_ABOVE: Code = 413;
    /// Route step following [`MOVE_ROUTE`].
    pub const ROUTE_STEP: Code = 505;
    /// "If Win" battle branch marker.
    pub const IF_WIN: Code = 601;
    /// "If Escape" battle branch marker.
    pub const IF_ESCAPE: Code = 602;
    /// "If Lose" battle branch marker.
    pub const IF_LOSE: Code = 603;
    /// End of a battle block.
    pub const BATTLE_END: Code = 604;
    /// Script line following [`SCRIPT`].
    pub const SCRIPT_LINE: Code = 655;
    /// Plugin command line following [`PLUGIN_COMMAND`].
    pub const PLUGIN_COMMAND_LINE: Code = 657;
}

/// How a code participates in block structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRole {
    /// Opens a continuation run (e.g. Show Text).
    ContinuationPrimary,
    /// Opens a block closed by an end code (e.g. Conditional Branch).
    BlockPrimary,
    /// A continuation line that only follows its primary.
    Continuation,
    /// An interior or closing marker of a block.
    Marker,
    /// Any other command.
    Plain,
}

/// Static classification tables used by the structural range resolver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeTable {
    no_argument: BTreeSet<Code>,
    continuation_of: BTreeMap<Code, Code>,
    block_end: BTreeMap<Code, BTreeSet<Code>>,
    child_to_parent: BTreeMap<Code, BTreeSet<Code>>,
    route_carrying: BTreeSet<Code>,
    comment: Code,
}

impl CodeTable {
    /// Create an empty table whose comment code is `comment`.
    pub fn new(comment: Code) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }

    /// The standard command set (RPG Maker MZ compatible).
    pub fn standard() -> Self {
        use code::*;

        Self::new(COMMENT)
            .with_no_argument([
                END, LOOP, BREAK_LOOP, EXIT_EVENT, 206, 214, 216, 217, 221, 222, 243, 244, 251,
                340, 351, 352, 353, 354, CHOICES_END, ELSE, CONDITIONAL_END, REPEAT_ABOVE,
                IF_WIN, IF_ESCAPE, IF_LOSE, BATTLE_END,
            ])
            .with_continuation(SHOW_TEXT, TEXT_LINE)
            .with_continuation(SCROLL_TEXT, SCROLL_TEXT_LINE)
            .with_continuation(COMMENT, COMMENT_LINE)
            .with_continuation(SCRIPT, SCRIPT_LINE)
            .with_continuation(PLUGIN_COMMAND, PLUGIN_COMMAND_LINE)
            .with_continuation(MOVE_ROUTE, ROUTE_STEP)
            .with_block(CONDITIONAL, [CONDITIONAL_END], [ELSE])
            .with_block(LOOP, [REPEAT_ABOVE], [])
            .with_block(SHOW_CHOICES, [CHOICES_END], [WHEN_CHOICE, WHEN_CANCEL])
            .with_block(BATTLE, [BATTLE_END], [IF_WIN, IF_ESCAPE, IF_LOSE])
            .with_route_carrying(MOVE_ROUTE)
    }

    /// Register codes that never take arguments.
    pub fn with_no_argument(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.no_argument.extend(codes);
        self
    }

    /// Register `continuation` as the continuation code of `primary`.
    ///
    /// The continuation is also registered as a child of `primary`.
    pub fn with_continuation(mut self, primary: Code, continuation: Code) -> Self {
        self.continuation_of.insert(primary, continuation);
        self.child_to_parent
            .entry(continuation)
            .or_default()
            .insert(primary);
        self
    }

    /// Register a block primary with its end codes and interior markers.
    ///
    /// End codes and markers are both registered as children of `primary`.
    pub fn with_block(
        mut self,
        primary: Code,
        end_codes: impl IntoIterator<Item = Code>,
        markers: impl IntoIterator<Item = Code>,
    ) -> Self {
        let end_codes: BTreeSet<Code> = end_codes.into_iter().collect();
        for child in end_codes.iter().copied().chain(markers) {
            self.child_to_parent
                .entry(child)
                .or_default()
                .insert(primary);
        }
        self.block_end.entry(primary).or_default().extend(end_codes);
        self
    }

    /// Register a code whose arguments carry a nested route with its own indents.
    pub fn with_route_carrying(mut self, primary: Code) -> Self {
        self.route_carrying.insert(primary);
        self
    }

    /// The comment code used to encode disabled commands.
    pub fn comment_code(&self) -> Code {
        self.comment
    }

    /// Returns `true` if `code` never takes arguments.
    pub fn takes_no_arguments(&self, code: Code) -> bool {
        self.no_argument.contains(&code)
    }

    /// Continuation code trailing `primary`, if any.
    pub fn continuation_of(&self, primary: Code) -> Option<Code> {
        self.continuation_of.get(&primary).copied()
    }

    /// End codes closing a block opened by `primary`, if it is a block primary.
    pub fn block_end_codes(&self, primary: Code) -> Option<&BTreeSet<Code>> {
        self.block_end.get(&primary).filter(|ends| !ends.is_empty())
    }

    /// Possible parents of a child code.
    pub fn parents_of(&self, child: Code) -> Option<&BTreeSet<Code>> {
        self.child_to_parent.get(&child)
    }

    /// Returns `true` if `code` is an interior marker, end code, or continuation.
    pub fn is_child(&self, code: Code) -> bool {
        self.child_to_parent.contains_key(&code)
    }

    /// Returns `true` if `code` is a continuation line of some primary.
    ///
    /// Continuation children are movable on their own; they do not pull in their parent.
    pub fn is_simple_continuation(&self, code: Code) -> bool {
        self.parents_of(code).is_some_and(|parents| {
            parents
                .iter()
                .any(|parent| self.continuation_of(*parent) == Some(code))
        })
    }

    /// Returns `true` if `code` closes any block.
    pub fn is_block_end(&self, code: Code) -> bool {
        self.block_end.values().any(|ends| ends.contains(&code))
    }

    /// Returns `true` if the arguments of `code` carry a nested route.
    pub fn carries_route(&self, code: Code) -> bool {
        self.route_carrying.contains(&code)
    }

    /// Classify a code.
    pub fn role(&self, code: Code) -> CodeRole {
        if self.block_end_codes(code).is_some() {
            CodeRole::BlockPrimary
        } else if self.continuation_of(code).is_some() {
            CodeRole::ContinuationPrimary
        } else if self.is_simple_continuation(code) {
            CodeRole::Continuation
        } else if self.is_child(code) {
            CodeRole::Marker
        } else {
            CodeRole::Plain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::code::*;
    use super::*;

    #[test]
    fn test_standard_roles() {
        let table = CodeTable::standard();
        assert_eq!(table.role(CONDITIONAL), CodeRole::BlockPrimary);
        assert_eq!(table.role(SHOW_TEXT), CodeRole::ContinuationPrimary);
        assert_eq!(table.role(TEXT_LINE), CodeRole::Continuation);
        assert_eq!(table.role(ELSE), CodeRole::Marker);
        assert_eq!(table.role(CONDITIONAL_END), CodeRole::Marker);
        assert_eq!(table.role(122), CodeRole::Plain);
    }

    #[test]
    fn test_end_codes_are_children() {
        let table = CodeTable::standard();
        assert!(table.is_block_end(REPEAT_ABOVE));
        assert!(table.parents_of(REPEAT_ABOVE).unwrap().contains(&LOOP));
        assert!(!table.is_simple_continuation(REPEAT_ABOVE));
    }

    #[test]
    fn test_custom_table() {
        let table = CodeTable::new(900)
            .with_continuation(10, 11)
            .with_block(20, [21], [22]);
        assert_eq!(table.comment_code(), 900);
        assert_eq!(table.continuation_of(10), Some(11));
        assert!(table.is_simple_continuation(11));
        assert!(table.block_end_codes(20).unwrap().contains(&21));
        assert!(table.parents_of(22).unwrap().contains(&20));
        assert!(table.block_end_codes(10).is_none());
    }

    #[test]
    fn test_no_argument_codes() {
        let table = CodeTable::standard();
        assert!(table.takes_no_arguments(ELSE));
        assert!(table.takes_no_arguments(END));
        assert!(!table.takes_no_arguments(CONDITIONAL));
    }
}
