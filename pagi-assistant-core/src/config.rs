use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime options shared by the agent and its collaborators.
///
/// Built once by the host and handed to each component's constructor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_goal")]
    pub goal: String,

    /// Language replies are written in.
    #[serde(default = "default_language")]
    pub language: String,

    /// Word limit for the history title used by the relatedness check.
    #[serde(default = "default_summary_max_words")]
    pub summary_max_words: usize,

    /// Upper bound on the knowledge excerpt injected into reply prompts.
    #[serde(default = "default_knowledge_max_chars")]
    pub knowledge_max_chars: usize,

    #[serde(default = "default_max_reply_tokens")]
    pub max_reply_tokens: usize,

    /// Optional YAML skill catalog.
    #[serde(default)]
    pub skill_path: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            profile: default_profile(),
            goal: default_goal(),
            language: default_language(),
            summary_max_words: default_summary_max_words(),
            knowledge_max_chars: default_knowledge_max_chars(),
            max_reply_tokens: default_max_reply_tokens(),
            skill_path: None,
        }
    }
}

fn default_name() -> String {
    "Lily".to_string()
}

fn default_profile() -> String {
    "An assistant".to_string()
}

fn default_goal() -> String {
    "Help to solve problem".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_summary_max_words() -> usize {
    20
}

fn default_knowledge_max_chars() -> usize {
    4_000
}

fn default_max_reply_tokens() -> usize {
    1_500
}
