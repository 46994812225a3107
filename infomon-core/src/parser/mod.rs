//! Line classification: free text in, fact mutations out.
//!
//! Every input line is offered to an ordered [catalogue](catalogue) of
//! shapes. The first shape whose pattern matches *and* whose captured fields
//! are well formed wins; its handler yields zero or more [`Mutation`]s.
//! Lines no shape claims are a no-op, never an error.
//!
//! Tabular listings (PSM tables, the war cry list) need a little state: the
//! header line opens a block that tells row shapes which category they
//! belong to. Blocks close on their footer, on a new header, or after a
//! bounded run of lines that nothing claims. Rows never count against that
//! bound, so a listing of any length stays open.

pub mod catalogue;
mod handlers;

use tracing::trace;

use crate::keys::FactValue;
use crate::lookup::PsmCategory;

pub use catalogue::{BlockFamily, Matcher, Scope, ShapeId};
pub use handlers::MASTER_SOCIETY_RANK;

/// Unclaimed lines an open listing tolerates before it is closed.
pub const DEFAULT_BLOCK_LINE_LIMIT: usize = 16;

/// How a parsed value is applied to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Replace the fact outright.
    Absolute(FactValue),
    /// Add to the current integer value (absent counts as 0).
    Delta(i64),
}

/// One fact update produced by a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Target fact key.
    pub key: String,
    /// How to apply it.
    pub resolution: Resolution,
}

impl Mutation {
    /// Absolute set.
    pub fn set(key: impl Into<String>, value: impl Into<FactValue>) -> Self {
        Self {
            key: key.into(),
            resolution: Resolution::Absolute(value.into()),
        }
    }

    /// Relative change.
    pub fn delta(key: impl Into<String>, amount: i64) -> Self {
        Self {
            key: key.into(),
            resolution: Resolution::Delta(amount),
        }
    }
}

/// Kind of multi-line listing currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `<name>, the following <Category> are available:` table.
    Psm(PsmCategory),
    /// `You have learned the following War Cries:` list.
    WarCries,
}

/// What a matched line does to the open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockChange {
    /// Leave it as is.
    Keep,
    /// Start a new block (replacing any open one).
    Open(BlockKind),
    /// End the open block.
    Close,
}

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Shape that claimed the line.
    pub shape: ShapeId,
    /// Updates to apply; may be empty for headers and footers.
    pub mutations: Vec<Mutation>,
}

/// Outcome of [`crate::Infomon::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A shape matched; `facts` mutations were applied.
    Ok {
        /// Shape that claimed the line.
        shape: ShapeId,
        /// Number of facts written.
        facts: usize,
    },
    /// No shape matched.
    Noop,
}

impl ParseOutcome {
    /// Whether a shape claimed the line.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    kind: BlockKind,
    /// Consecutive lines no shape claimed.
    idle: usize,
}

/// Stateful line classifier. Pure: it never touches the store.
#[derive(Debug)]
pub struct LineParser {
    block: Option<OpenBlock>,
    block_line_limit: usize,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_LINE_LIMIT)
    }
}

impl LineParser {
    /// Parser whose blocks close after `block_line_limit` consecutive
    /// unclaimed lines.
    #[must_use]
    pub fn new(block_line_limit: usize) -> Self {
        Self {
            block: None,
            block_line_limit: block_line_limit.max(1),
        }
    }

    /// The currently open block, if any.
    #[must_use]
    pub fn block(&self) -> Option<BlockKind> {
        self.block.map(|b| b.kind)
    }

    /// Forget any open block.
    pub fn reset(&mut self) {
        self.block = None;
    }

    /// Classify one line. `None` means no shape matched.
    pub fn classify(&mut self, line: &str) -> Option<Classified> {
        let line = line.trim_end_matches(['\r', '\n']);
        let block = self.block();

        for matcher in catalogue::catalogue() {
            if !matcher.scope.admits(block) {
                continue;
            }
            let Some(caps) = matcher.pattern.captures(line) else {
                continue;
            };
            let Some(hit) = (matcher.handler)(&caps, block) else {
                trace!(shape = ?matcher.shape, line, "Malformed fields, shape discarded");
                continue;
            };
            self.change_block(hit.block);
            return Some(Classified {
                shape: matcher.shape,
                mutations: hit.mutations,
            });
        }

        // A war cry list ends at the first line that is not a cry.
        if block == Some(BlockKind::WarCries) {
            self.block = None;
        } else {
            self.idle_line();
        }
        None
    }

    /// Every shape whose pattern matches `line` under the current block,
    /// in catalogue order. Diagnostic only; does not change state.
    #[must_use]
    pub fn matching_shapes(&self, line: &str) -> Vec<ShapeId> {
        let block = self.block();
        catalogue::catalogue()
            .iter()
            .filter(|m| m.scope.admits(block) && m.pattern.is_match(line))
            .map(|m| m.shape)
            .collect()
    }

    fn idle_line(&mut self) {
        if let Some(open) = self.block.as_mut() {
            open.idle += 1;
            if open.idle >= self.block_line_limit {
                trace!(block = ?open.kind, "Block line limit reached, closing");
                self.block = None;
            }
        }
    }

    fn change_block(&mut self, change: BlockChange) {
        match change {
            BlockChange::Keep => {
                if let Some(open) = self.block.as_mut() {
                    open.idle = 0;
                }
            }
            BlockChange::Open(kind) => self.block = Some(OpenBlock { kind, idle: 0 }),
            BlockChange::Close => self.block = None,
        }
    }
}
