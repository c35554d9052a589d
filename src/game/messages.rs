//! # Message Log
//!
//! Ordered, colour-tagged event text for the log panel.

use crate::config::MESSAGE_HISTORY_LIMIT;
use crate::game::Color;
use serde::{Deserialize, Serialize};

/// Semantic category of a log line. Presentation maps it to a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Normal,
    PlayerAttack,
    EnemyAttack,
    NeedsTarget,
    StatusEffectApplied,
    PlayerDeath,
    EnemyDeath,
    Invalid,
    Impossible,
    Error,
    Welcome,
    HealthRecovered,
    Descend,
}

impl MessageKind {
    pub fn color(self) -> Color {
        match self {
            MessageKind::Normal => Color::WHITE,
            MessageKind::PlayerAttack => Color::new(0xE0, 0xE0, 0xE0),
            MessageKind::EnemyAttack => Color::new(0xFF, 0xC0, 0xC0),
            MessageKind::NeedsTarget => Color::new(0x3F, 0xFF, 0xFF),
            MessageKind::StatusEffectApplied => Color::new(0x3F, 0xFF, 0x3F),
            MessageKind::PlayerDeath => Color::new(0xFF, 0x30, 0x30),
            MessageKind::EnemyDeath => Color::new(0xFF, 0xA0, 0x30),
            MessageKind::Invalid => Color::new(0xFF, 0xFF, 0x00),
            MessageKind::Impossible => Color::new(0x80, 0x80, 0x80),
            MessageKind::Error => Color::new(0xFF, 0x40, 0x40),
            MessageKind::Welcome => Color::new(0x20, 0xA0, 0xFF),
            MessageKind::HealthRecovered => Color::new(0x00, 0xFF, 0x00),
            MessageKind::Descend => Color::new(0x9F, 0x3F, 0xFF),
        }
    }
}

/// One log line, possibly repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
    pub count: u32,
}

impl Message {
    /// The text with a `(xN)` suffix when repeated.
    pub fn full_text(&self) -> String {
        if self.count > 1 {
            format!("{} (x{})", self.text, self.count)
        } else {
            self.text.clone()
        }
    }

    pub fn color(&self) -> Color {
        self.kind.color()
    }
}

/// Stacking log holding at most [`MESSAGE_HISTORY_LIMIT`] lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
    #[serde(default)]
    dropped: usize,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, stacking it onto an identical previous line.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{MessageKind, MessageLog};
    ///
    /// let mut log = MessageLog::new();
    /// log.add("That way is blocked.", MessageKind::Impossible);
    /// log.add("That way is blocked.", MessageKind::Impossible);
    /// assert_eq!(log.len(), 1);
    /// assert_eq!(log.last().unwrap().full_text(), "That way is blocked. (x2)");
    /// ```
    pub fn add(&mut self, text: impl Into<String>, kind: MessageKind) {
        let text = text.into();
        match self.messages.last_mut() {
            Some(last) if last.text == text => last.count += 1,
            _ => self.messages.push(Message {
                text,
                kind,
                count: 1,
            }),
        }

        let excess = self.messages.len().saturating_sub(MESSAGE_HISTORY_LIMIT);
        if excess > 0 {
            self.messages.drain(..excess);
            self.dropped += excess;
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The newest `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Lines discarded from the front since the log was created.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.text.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_different_messages_do_not_stack() {
        let mut log = MessageLog::new();
        log.add("a", MessageKind::Normal);
        log.add("b", MessageKind::Normal);
        log.add("a", MessageKind::Normal);
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(2)[0].text, "b");
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn test_history_drops_oldest_lines() {
        let mut log = MessageLog::new();
        for i in 0..MESSAGE_HISTORY_LIMIT + 3 {
            log.add(format!("line {}", i), MessageKind::Normal);
        }
        assert_eq!(log.len(), MESSAGE_HISTORY_LIMIT);
        assert_eq!(log.dropped(), 3);
        assert_eq!(log.messages()[0].text, "line 3");
        assert!(log.messages().iter().all(|m| m.text != "line 2"));

        log.add(format!("line {}", MESSAGE_HISTORY_LIMIT + 2), MessageKind::Normal);
        assert_eq!(log.len(), MESSAGE_HISTORY_LIMIT);
        assert_eq!(log.dropped(), 3);
        assert_eq!(log.last().unwrap().count, 2);
    }

    #[test]
    fn test_kind_colors() {
        assert_eq!(MessageKind::Impossible.color(), Color::new(128, 128, 128));
        assert_eq!(MessageKind::Welcome.color(), Color::new(0x20, 0xA0, 0xFF));
    }
}
