use std::collections::VecDeque;

/// Rolling window of the characters typed since the last reset.
#[derive(Debug, Clone, Default)]
pub struct MatchBuffer {
    chars: VecDeque<char>,
    max_len: usize,
}

impl MatchBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            chars: VecDeque::with_capacity(max_len + 1),
            max_len,
        }
    }

    /// Append `c`, dropping the oldest character if the window overflows.
    pub fn push(&mut self, c: char) {
        self.chars.push_back(c);
        if self.chars.len() > self.max_len {
            self.chars.pop_front();
        }
    }

    /// Remove up to `n` characters from the end.
    pub fn truncate_end(&mut self, n: usize) {
        let keep = self.chars.len().saturating_sub(n);
        self.chars.truncate(keep);
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    /// Change the window size, keeping the most recent characters.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
        while self.chars.len() > max_len {
            self.chars.pop_front();
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_keeps_most_recent_characters() {
        let mut buffer = MatchBuffer::new(5);
        for c in "hello world".chars() {
            buffer.push(c);
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.as_string(), "world");
    }

    #[test]
    fn truncate_end_removes_trailing_chars() {
        let mut buffer = MatchBuffer::new(10);
        "abc".chars().for_each(|c| buffer.push(c));
        buffer.truncate_end(1);
        assert_eq!(buffer.as_string(), "ab");
        buffer.truncate_end(5);
        assert!(buffer.is_empty());
        buffer.truncate_end(1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn zero_length_window_stays_empty() {
        let mut buffer = MatchBuffer::new(0);
        buffer.push('x');
        assert!(buffer.is_empty());
    }

    #[test]
    fn shrinking_window_trims_front() {
        let mut buffer = MatchBuffer::new(10);
        "abcdef".chars().for_each(|c| buffer.push(c));
        buffer.set_max_len(3);
        assert_eq!(buffer.as_string(), "def");
        assert_eq!(buffer.max_len(), 3);
    }
}
