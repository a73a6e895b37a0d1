//! Editable symptom description.

use unicode_segmentation::UnicodeSegmentation;

/// Text buffer with a grapheme-aware cursor.
///
/// The cursor is a byte offset that always sits on a grapheme boundary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftInput {
    text: String,
    cursor: usize,
}

impl DraftInput {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in graphemes from the start.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.text[..self.cursor].graphemes(true).count()
    }

    #[must_use]
    pub fn byte_index(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn enter_char(&mut self, c: char) {
        if c.is_control() && c != '\n' {
            return;
        }
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        // A combining mark joins the previous grapheme; keep the cursor on a boundary.
        self.snap_cursor_forward();
    }

    /// Insert pasted text. Line endings are normalised to `\n` and other
    /// control characters are dropped.
    pub fn enter_text(&mut self, text: &str) {
        let cleaned: String = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .chars()
            .filter(|&c| c == '\n' || !c.is_control())
            .collect();
        if cleaned.is_empty() {
            return;
        }
        self.text.insert_str(self.cursor, &cleaned);
        self.cursor += cleaned.len();
        self.snap_cursor_forward();
    }

    /// Delete the grapheme before the cursor.
    pub fn delete_char(&mut self) {
        if let Some(start) = self.prev_boundary() {
            self.text.replace_range(start..self.cursor, "");
            self.cursor = start;
        }
    }

    /// Delete the grapheme after the cursor.
    pub fn delete_char_forward(&mut self) {
        if let Some(end) = self.next_boundary() {
            self.text.replace_range(self.cursor..end, "");
        }
    }

    pub fn delete_word_backwards(&mut self) {
        let before = &self.text[..self.cursor];
        let trimmed = before.trim_end();
        let start = trimmed
            .split_word_bound_indices()
            .rev()
            .find(|(_, word)| !word.trim().is_empty())
            .map_or(0, |(i, _)| i);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }

    fn snap_cursor_forward(&mut self) {
        let mut offset = 0;
        for g in self.text.graphemes(true) {
            if offset >= self.cursor {
                break;
            }
            offset += g.len();
        }
        self.cursor = offset;
    }
}
