use log::info;
use std::collections::VecDeque;

/// Most recent commentary lines, oldest first.
#[derive(Debug)]
pub struct CommentBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl CommentBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Stamps `text` with the match time and stores it, evicting the oldest
    /// line when full.
    pub fn push(&mut self, time_ms: u64, text: &str) -> &str {
        if self.capacity == 0 {
            return "";
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        let line = format!("[{:.2}] {}", time_ms as f64 / 1000.0, text);
        info!("Commentary: {}", line);
        self.lines.push_back(line);
        self.lines.back().map(String::as_str).unwrap_or_default()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
