use crate::model::{Point, TextRange};
use std::ops::Range;

/// Byte offset to line/column translation for one text.
///
/// Columns are counted in UTF-16 code units, the unit editors speak.
pub struct LineMap<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineMap<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn offset_to_point(&self, offset: usize) -> Point {
        let offset = self.clamp(offset);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => Point::new(line as u32, 0),
            Err(next_line_idx) => {
                let line = next_line_idx - 1;
                let line_start = self.line_starts[line];
                let col = self.text[line_start..offset].encode_utf16().count();
                Point::new(line as u32, col as u32)
            }
        }
    }

    pub fn span_to_range(&self, span: Range<usize>) -> TextRange {
        TextRange::new(
            self.offset_to_point(span.start),
            self.offset_to_point(span.end),
        )
    }

    /// Offsets may come from a lexer error span past a multi-byte char; snap them back.
    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
