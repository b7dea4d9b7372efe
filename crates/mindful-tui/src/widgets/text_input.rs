//! Editable text buffer behind the input bar and the feedback comment.

/// Content plus cursor. The cursor is a character index, not a byte offset.
#[derive(Debug, Clone)]
pub struct TextInputState {
    content: String,
    cursor: usize,
    /// Sent messages for up/down recall.
    history: Vec<String>,
    /// Current history index (-1 = current input).
    history_index: isize,
    /// Draft kept while browsing history.
    saved_input: String,
}

impl Default for TextInputState {
    fn default() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_index: -1,
            saved_input: String::new(),
        }
    }
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of characters, as shown by the counter.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    /// Number of lines, for auto-resize.
    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map_or(self.content.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index();
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index();
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.content.remove(at);
        }
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index();
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Take the content into history and clear.
    pub fn submit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.history_index = -1;
        self.saved_input.clear();
        content
    }

    /// Recall the previous sent message.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_index == -1 {
            self.saved_input = self.content.clone();
        }

        let new_index = self.history_index + 1;
        #[allow(clippy::cast_sign_loss)]
        if (new_index as usize) < self.history.len() {
            self.history_index = new_index;
            self.content = self.history[self.history.len() - 1 - new_index as usize].clone();
            self.move_end();
        }
    }

    /// Move forward through history, ending at the saved draft.
    pub fn history_next(&mut self) {
        if self.history_index <= 0 {
            if self.history_index == 0 {
                self.content = std::mem::take(&mut self.saved_input);
                self.move_end();
            }
            self.history_index = -1;
            return;
        }

        self.history_index -= 1;
        #[allow(clippy::cast_sign_loss)]
        {
            self.content =
                self.history[self.history.len() - 1 - self.history_index as usize].clone();
        }
        self.move_end();
    }
}
