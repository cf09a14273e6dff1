//! Rotating loading messages shown while a video renders.

/// Wrap-around cursor over a fixed list of messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingMessageCycle {
    messages: Vec<String>,
    index: usize,
}

impl LoadingMessageCycle {
    /// Starts at the first message. An empty list yields no messages.
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages, index: 0 }
    }

    /// The message currently shown.
    pub fn current(&self) -> Option<&str> {
        self.messages.get(self.index).map(String::as_str)
    }

    /// Moves to the next message, wrapping after the last one.
    pub fn advance(&mut self) -> Option<&str> {
        if self.messages.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.messages.len();
        self.current()
    }

    /// Index of the current message.
    pub fn index(&self) -> usize {
        self.index
    }
}
