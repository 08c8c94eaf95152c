//! Navigation cursor over the ordered sequence list.

/// Current position in the sequence list, wrapping in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceNavigator {
    current_index: usize,
    len: usize,
}

impl SequenceNavigator {
    /// Create a cursor over `len` sequences, starting at the first.
    pub fn new(len: usize) -> Self {
        Self {
            current_index: 0,
            len,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move to the next sequence, wrapping around.
    /// Returns the new index, or `None` when there are no sequences.
    pub fn next(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.len;
        Some(self.current_index)
    }

    /// Move to the previous sequence, wrapping around.
    /// Returns the new index, or `None` when there are no sequences.
    pub fn previous(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.current_index = if self.current_index == 0 {
            self.len - 1
        } else {
            self.current_index - 1
        };
        Some(self.current_index)
    }

    /// Progress string like "3/15".
    pub fn progress(&self) -> String {
        if self.is_empty() {
            return "0/0".to_string();
        }
        format!("{}/{}", self.current_index + 1, self.len)
    }
}
