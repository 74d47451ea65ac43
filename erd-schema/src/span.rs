//! Source locations for AST nodes and diagnostics.

use serde::{Deserialize, Serialize};

/// A location in the source text.
///
/// Lines and columns are 1-based, offsets are 0-based byte offsets.
/// Locations are assigned by the lexer/parser and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Starting line number (1-based).
    pub line: u32,
    /// Starting column number (1-based).
    pub column: u32,
    /// Byte offset from the start of the source (0-based).
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// Ending line number (1-based).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// Ending column number (1-based).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

impl SourceLocation {
    /// Create a new location without end coordinates.
    pub fn new(line: u32, column: u32, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
            end_line: None,
            end_column: None,
        }
    }

    /// Attach end coordinates.
    pub fn with_end(mut self, end_line: u32, end_column: u32) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }

    /// The location of the very start of a source file.
    pub fn start_of_file() -> Self {
        Self::new(1, 1, 0, 0)
    }

    /// Merge two locations into one spanning both.
    pub fn merge(self, other: SourceLocation) -> SourceLocation {
        let (first, last) = if self.offset <= other.offset {
            (self, other)
        } else {
            (other, self)
        };
        SourceLocation {
            line: first.line,
            column: first.column,
            offset: first.offset,
            length: (last.offset + last.length).saturating_sub(first.offset),
            end_line: last.end_line.or(Some(last.line)),
            end_column: last.end_column.or(Some(last.column)),
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::start_of_file()
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_location_new() {
        let loc = SourceLocation::new(3, 7, 42, 5);
        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 7);
        assert_eq!(loc.offset, 42);
        assert_eq!(loc.length, 5);
        assert!(loc.end_line.is_none());
    }

    #[test]
    fn test_location_with_end() {
        let loc = SourceLocation::new(1, 1, 0, 20).with_end(2, 4);
        assert_eq!(loc.end_line, Some(2));
        assert_eq!(loc.end_column, Some(4));
    }

    #[test]
    fn test_location_merge_covers_both() {
        let a = SourceLocation::new(1, 1, 0, 5);
        let b = SourceLocation::new(2, 3, 10, 4);
        let merged = a.merge(b);
        assert_eq!(merged.offset, 0);
        assert_eq!(merged.length, 14);
        assert_eq!(merged.line, 1);
    }

    #[test]
    fn test_location_merge_order_independent() {
        let a = SourceLocation::new(1, 1, 0, 5);
        let b = SourceLocation::new(2, 3, 10, 4);
        assert_eq!(a.merge(b), b.merge(a));
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new(12, 8, 100, 3);
        assert_eq!(loc.to_string(), "line 12, column 8");
    }

    #[test]
    fn test_location_json_shape() {
        let loc = SourceLocation::new(2, 5, 14, 3);
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["line"], 2);
        assert_eq!(json["column"], 5);
        assert_eq!(json["offset"], 14);
        assert_eq!(json["length"], 3);
        assert!(json.get("endLine").is_none());
    }
}
