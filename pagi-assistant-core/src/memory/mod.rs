use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- 1. Utterance Structures ---

/// Tag attached to utterances and produced by classification.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageType {
    Talk,
    Problem,
    Solution,
    Skill,
}

impl MessageType {
    /// Marker literal the oracle is asked to emit for this tag.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Talk => "[TALK]:",
            Self::Problem => "[PROBLEM]:",
            Self::Solution => "[SOLUTION]:",
            Self::Skill => "[SKILL]:",
        }
    }
}

/// Who produced an utterance.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Talk,   // user input
    Answer, // agent output
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Self::Talk => "user",
            Self::Answer => "assistant",
        }
    }
}

/// A single entry of the conversation log. Never mutated after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Utterance {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<MessageType>,
}

impl Utterance {
    pub fn talk(content: impl Into<String>) -> Self {
        Self::new(Role::Talk, content, BTreeSet::from([MessageType::Talk]))
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self::new(Role::Answer, content, BTreeSet::new())
    }

    fn new(role: Role, content: impl Into<String>, tags: BTreeSet<MessageType>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            role,
            content: content.into(),
            tags,
        }
    }

    fn is_talk(&self) -> bool {
        self.role == Role::Talk && self.tags.contains(&MessageType::Talk)
    }
}

// --- 2. Conversation Memory ---

/// Append-only dialogue log of one agent.
///
/// The live `history` holds everything since the last checkpoint; checkpointed
/// entries move to `archive` and are kept for the snapshot, never deleted.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ConversationMemory {
    #[serde(default)]
    history: Vec<Utterance>,
    #[serde(default)]
    archive: Vec<Utterance>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_talk(&mut self, utterance: Utterance) {
        tracing::debug!(utterance_id = %utterance.id, "Adding talk to conversation memory");
        self.history.push(utterance);
    }

    pub fn add_answer(&mut self, utterance: Utterance) {
        tracing::debug!(utterance_id = %utterance.id, "Adding answer to conversation memory");
        self.history.push(utterance);
    }

    /// Content of the trailing talk entry, if the user spoke last.
    ///
    /// An answer after the talk consumes it.
    pub fn last_talk(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|u| u.is_talk())
            .map(|u| u.content.as_str())
    }

    /// Rendered history since the last checkpoint, excluding the pending talk.
    pub fn history_text(&self) -> String {
        let end = if self.last_talk().is_some() {
            self.history.len() - 1
        } else {
            self.history.len()
        };

        self.history[..end]
            .iter()
            .map(|u| format!("{}: {}", u.role.label(), u.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tail of `history_text()` no longer than `max_chars` characters.
    pub fn knowledge_excerpt(&self, max_chars: usize) -> String {
        let text = self.history_text();
        let total = text.chars().count();
        if total <= max_chars {
            return text;
        }
        text.chars().skip(total - max_chars).collect()
    }

    /// Archives the live history, keeping only a trailing unanswered talk so it
    /// opens the next topic. A no-op when there is nothing left to archive.
    pub fn checkpoint(&mut self) {
        let keep = usize::from(self.last_talk().is_some());
        let split = self.history.len() - keep;
        if split == 0 {
            return;
        }
        tracing::info!(archived = split, "Checkpointing conversation memory");
        let pending = self.history.split_off(split);
        self.archive.append(&mut self.history);
        self.history = pending;
    }

    pub fn history(&self) -> &[Utterance] {
        &self.history
    }

    pub fn archive(&self) -> &[Utterance] {
        &self.archive
    }
}
