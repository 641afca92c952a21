//! Text buffer implementation using ropey.

use ropey::Rope;

/// A text buffer backed by a rope data structure.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Creates a text buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Replaces the whole buffer content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Returns the total number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the total number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns true if the buffer holds nothing but trailing newlines.
    pub fn is_blank(&self) -> bool {
        self.rope.chars().all(|c| c == '\n')
    }

    /// Inserts a string at the given character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        let idx = char_idx.min(self.len_chars());
        self.rope.insert(idx, text);
    }

    /// Appends a string at the end of the buffer.
    pub fn append(&mut self, text: &str) {
        let end = self.len_chars();
        self.rope.insert(end, text);
    }

    /// Removes text in the given character range.
    pub fn remove(&mut self, start: usize, end: usize) {
        let start = start.min(self.len_chars());
        let end = end.min(self.len_chars());
        if start < end {
            self.rope.remove(start..end);
        }
    }

    /// Removes a whole line including its newline. Returns false if the
    /// line does not exist.
    pub fn remove_line(&mut self, line: usize) -> bool {
        if line >= self.len_lines() {
            return false;
        }
        let start = self.rope.line_to_char(line);
        let end = if line + 1 < self.len_lines() {
            self.rope.line_to_char(line + 1)
        } else {
            self.len_chars()
        };
        self.remove(start, end);
        true
    }

    /// Converts a character index to a (line, column) position.
    /// Both line and column are 0-indexed.
    pub fn char_to_line_col(&self, char_idx: usize) -> (usize, usize) {
        let char_idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        (line, char_idx - line_start)
    }

    /// Returns the line at the given index, without its newline.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.len_lines() {
            return None;
        }
        let mut s = self.rope.line(line).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Compares the buffer to `other`, ignoring trailing newlines on both sides.
    pub fn content_matches(&self, other: &str) -> bool {
        let text = self.rope.to_string();
        text.trim_end_matches('\n') == other.trim_end_matches('\n')
    }

    /// Returns the entire buffer as a string.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}
