//! Coordinate & position model (C6)
//!
//! Two distinct position types exist so the 0-based/1-based distinction is
//! unforgeable at the type level: [`OneBasedPosition`] is what the agent
//! protocol surface exchanges, [`ZeroBasedPosition`] is what the LSP wire
//! exchanges. Conversion between them is pointwise +/-1 and is the only
//! place either coordinate system is allowed to cross into the other.

use serde::{Deserialize, Serialize};
use symbols_core::{Error, Result};

/// An agent-facing position. Both fields are >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OneBasedPosition {
    line: usize,
    character: usize,
}

impl OneBasedPosition {
    /// Construct a position, enforcing the `>= 1` invariant in both fields.
    pub fn new(line: usize, character: usize) -> Result<Self> {
        if line == 0 || character == 0 {
            return Err(Error::PositionOutOfBounds { line, character });
        }
        Ok(Self { line, character })
    }

    /// Construct from a zero-based wire position without re-validating.
    ///
    /// Only safe when `zero.line() + 1` and `zero.character() + 1` are
    /// already known not to overflow, which is always true for positions
    /// that originated from a real LSP response (both fields are `u32` on
    /// the wire, well below `usize::MAX`).
    pub fn from_zero_based(zero: ZeroBasedPosition) -> Self {
        Self {
            line: zero.line + 1,
            character: zero.character + 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn character(&self) -> usize {
        self.character
    }

    /// Convert to the LSP wire representation.
    pub fn to_zero_based(self) -> ZeroBasedPosition {
        ZeroBasedPosition {
            line: self.line - 1,
            character: self.character - 1,
        }
    }
}

/// An LSP wire position. Both fields are >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZeroBasedPosition {
    line: usize,
    character: usize,
}

impl ZeroBasedPosition {
    /// Construct a zero-based position. Always succeeds: `usize` can't be negative.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn character(&self) -> usize {
        self.character
    }

    /// Convert to the agent-facing representation.
    pub fn to_one_based(self) -> OneBasedPosition {
        OneBasedPosition::from_zero_based(self)
    }
}

impl From<lsp_types::Position> for ZeroBasedPosition {
    fn from(p: lsp_types::Position) -> Self {
        Self::new(p.line as usize, p.character as usize)
    }
}

impl From<ZeroBasedPosition> for lsp_types::Position {
    fn from(p: ZeroBasedPosition) -> Self {
        lsp_types::Position {
            line: p.line as u32,
            character: p.character as u32,
        }
    }
}

/// A 1-based range, endpoint-wise converted from the LSP wire range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneBasedRange {
    pub start: OneBasedPosition,
    pub end: OneBasedPosition,
}

impl From<lsp_types::Range> for OneBasedRange {
    fn from(r: lsp_types::Range) -> Self {
        Self {
            start: ZeroBasedPosition::from(r.start).to_one_based(),
            end: ZeroBasedPosition::from(r.end).to_one_based(),
        }
    }
}

impl From<OneBasedRange> for lsp_types::Range {
    fn from(r: OneBasedRange) -> Self {
        lsp_types::Range {
            start: r.start.to_zero_based().into(),
            end: r.end.to_zero_based().into(),
        }
    }
}
