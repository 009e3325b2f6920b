// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A half-open byte range `[start, end)` in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Precomputed line-start offsets for O(log n) byte-offset → line:col lookup.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line. line_starts[0] is always 0.
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map by scanning source for newlines. O(n).
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    /// Convert byte offset to (line, col), both 1-based, col counted in bytes. O(log n).
    pub fn offset_to_line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = self.line_index(offset);
        let line = (line_idx + 1) as u32;
        let col = offset as u32 - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Convert byte offset to a 0-based (line, UTF-16 column) pair, the
    /// coordinate system editors speak.
    pub fn offset_to_utf16(&self, source: &str, offset: usize) -> (u32, u32) {
        let offset = clamp_to_char_boundary(source, offset);
        let line_idx = self.line_index(offset);
        let line_start = self.line_starts[line_idx] as usize;
        let col = source
            .get(line_start..offset)
            .map(|prefix| prefix.encode_utf16().count() as u32)
            .unwrap_or(0);
        (line_idx as u32, col)
    }

    /// Inverse of [`LineMap::offset_to_utf16`]. Positions past the end of a
    /// line clamp to the line end.
    pub fn utf16_to_offset(&self, source: &str, line: u32, character: u32) -> usize {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return source.len();
        };
        let start = start as usize;
        let text = self.line_text(source, line + 1).unwrap_or("");
        let mut units = 0u32;
        for (i, ch) in text.char_indices() {
            if units >= character {
                return start + i;
            }
            units += ch.len_utf16() as u32;
        }
        start + text.len()
    }

    /// Get the source text of a 1-based line number. O(1).
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| (s as usize).saturating_sub(1)) // exclude the \n
            .unwrap_or(source.len());
        source.get(start..end).map(|s| s.strip_suffix('\r').unwrap_or(s))
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    fn line_index(&self, offset: usize) -> usize {
        let offset = offset as u32;
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}

fn clamp_to_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source() {
        let lm = LineMap::new("");
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.line_count(), 1);
    }

    #[test]
    fn multi_line() {
        let src = "RouteInfo:\n  cost = 1\nTransitionInfo:";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_count(), 3);
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.offset_to_line_col(11), (2, 1));
        assert_eq!(lm.offset_to_line_col(13), (2, 3)); // 'c'
        assert_eq!(lm.line_text(src, 2), Some("  cost = 1"));
        assert_eq!(lm.line_text(src, 3), Some("TransitionInfo:"));
        assert_eq!(lm.line_text(src, 4), None);
    }

    #[test]
    fn crlf_line_text_drops_carriage_return() {
        let src = "a = 1\r\nb = 2";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_text(src, 1), Some("a = 1"));
        assert_eq!(lm.offset_to_line_col(7), (2, 1));
    }

    #[test]
    fn utf16_columns() {
        // '⊗' is 3 bytes in UTF-8 and 1 unit in UTF-16.
        let src = "x = '⊗' + y";
        let lm = LineMap::new(src);
        let y = src.find('y').unwrap();
        assert_eq!(lm.offset_to_utf16(src, y), (0, 10));
        assert_eq!(lm.utf16_to_offset(src, 0, 10), y);
    }

    #[test]
    fn utf16_offset_clamps_past_line_end() {
        let src = "ab\ncd";
        let lm = LineMap::new(src);
        assert_eq!(lm.utf16_to_offset(src, 0, 99), 2);
        assert_eq!(lm.utf16_to_offset(src, 7, 0), src.len());
    }

    #[test]
    fn span_join() {
        let a = Span::new(4, 8);
        let b = Span::new(1, 5);
        assert_eq!(a.to(b), Span::new(1, 8));
        assert!(a.contains(4));
        assert!(!a.contains(8));
    }
}
