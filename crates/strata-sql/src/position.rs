//! Map a server-reported error position onto the statement text.
//!
//! PostgreSQL reports the location of a syntax or semantic error as a
//! 1-based character offset into the statement that was sent. The CLI turns
//! that into a `LINE n: ...` line followed by a caret under the column.

use crate::error::{SqlError, SqlResult};

/// The source line containing an error position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLine {
    /// 1-based line number within the statement
    pub line_num: usize,
    /// 1-based column (in characters) within the line
    pub column_num: usize,
    /// Text of the line without its line terminator
    pub text: String,
}

impl ErrorLine {
    /// Render the two-line caret diagnostic:
    ///
    /// ```text
    /// LINE 2: selct * from t
    ///         ^
    /// ```
    pub fn render_caret(&self) -> String {
        let prefix = format!("LINE {}: ", self.line_num);
        let padding = " ".repeat(prefix.chars().count() + self.column_num - 1);
        format!("{prefix}{}\n{padding}^", self.text)
    }
}

/// Find the line, column and line text for a 1-based character `position`
/// in `source`.
///
/// `length + 1` is accepted: the server uses it for errors at the end of
/// input, and the caret then lands just after the last character.
pub fn extract_error_line(source: &str, position: usize) -> SqlResult<ErrorLine> {
    let length = source.chars().count();
    if position == 0 || position > length + 1 {
        return Err(SqlError::PositionOutOfRange { position, length });
    }

    let mut remaining = position;
    let mut last = (0, "");
    for (idx, line) in source.split_inclusive('\n').enumerate() {
        let line_len = line.chars().count();
        if remaining <= line_len {
            return Ok(ErrorLine {
                line_num: idx + 1,
                column_num: remaining,
                text: line.trim_end_matches(['\n', '\r']).to_string(),
            });
        }
        remaining -= line_len;
        last = (idx, line);
    }

    // End of input
    let (idx, line) = last;
    let text = line.trim_end_matches(['\n', '\r']).to_string();
    Ok(ErrorLine {
        line_num: idx + 1,
        column_num: text.chars().count() + 1,
        text,
    })
}

#[cfg(test)]
#[path = "position_test.rs"]
mod tests;
