/// Submitted inputs with a cursor for Up/Down recall.
///
/// The cursor rests one past the newest entry until the user starts browsing.
#[derive(Debug, Default)]
pub struct InputHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl InputHistory {
    pub fn add(&mut self, text: &str) {
        self.entries.push(text.to_string());
        self.cursor = self.entries.len();
    }

    /// Steps toward the oldest entry, staying on it once reached.
    pub fn previous(&mut self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }

        self.cursor = self.cursor.saturating_sub(1);
        return self.entries.get(self.cursor).cloned();
    }

    /// Steps toward the newest entry. Stepping past it returns None.
    pub fn next(&mut self) -> Option<String> {
        if self.cursor >= self.entries.len() {
            return None;
        }

        self.cursor += 1;
        return self.entries.get(self.cursor).cloned();
    }

    pub fn is_browsing(&self) -> bool {
        return self.cursor < self.entries.len();
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }
}
