use serde::{Deserialize, Serialize};

/// Source position of a syntax-tree node (1-based line/column).
///
/// Produced by the external parser; a zero line means the node was
/// built by hand (tests, tooling) and carries no location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    #[serde(default)]
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// A position carrying only a line number.
    pub fn line(line: u32) -> Self {
        Self { line, column: 0 }
    }

    /// Placeholder for compiler-generated or hand-built nodes.
    pub fn dummy() -> Self {
        Self::default()
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0
    }

    /// Byte offset of this position within `source`, if it lies inside it.
    ///
    /// Columns are counted in characters; a missing column maps to the
    /// first character of the line.
    pub fn offset_in(&self, source: &str) -> Option<usize> {
        if self.is_dummy() {
            return None;
        }
        let mut offset = 0;
        for (idx, line) in source.split_inclusive('\n').enumerate() {
            if idx + 1 == self.line as usize {
                let column = self.column.saturating_sub(1) as usize;
                let within = line
                    .char_indices()
                    .nth(column)
                    .map(|(byte, _)| byte)
                    .unwrap_or(0);
                return Some(offset + within);
            }
            offset += line.len();
        }
        None
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.column == 0 {
            write!(f, "line {}", self.line)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_of_line_start() {
        let src = "class A {\n  INT x;\n}\n";
        assert_eq!(Position::line(1).offset_in(src), Some(0));
        assert_eq!(Position::line(2).offset_in(src), Some(10));
        assert_eq!(Position::new(2, 3).offset_in(src), Some(12));
    }

    #[test]
    fn offset_past_end_is_none() {
        assert_eq!(Position::line(9).offset_in("one line"), None);
        assert_eq!(Position::dummy().offset_in("x"), None);
    }

    #[test]
    fn display_with_and_without_column() {
        assert_eq!(Position::line(4).to_string(), "line 4");
        assert_eq!(Position::new(4, 7).to_string(), "4:7");
    }
}
