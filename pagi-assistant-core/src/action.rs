use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::oracle::Oracle;
use crate::skills::{Capability, SkillArguments};

/// What the caller should execute next. Produced by the router, consumed by `act`.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Free-form reply about `talk`.
    Talk { talk: String, knowledge: String },
    /// Invocation of a catalog capability.
    Skill {
        skill: Capability,
        args: SkillArguments,
    },
}

impl PendingAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Talk { .. } => "talk",
            Self::Skill { .. } => "skill",
        }
    }
}

/// Result of running a pending action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutput {
    pub content: String,
    /// Structured payload returned by skills, if any.
    #[serde(default)]
    pub instruct_content: Option<serde_json::Value>,
}

impl ActionOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            instruct_content: None,
        }
    }
}

/// Runs pending actions. `Ok(None)` means the action produced nothing and the
/// conversation ends for this turn.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &PendingAction) -> Result<Option<ActionOutput>>;
}

/// Executes a single capability with resolved arguments.
#[async_trait]
pub trait SkillInvoker: Send + Sync {
    async fn invoke(&self, skill: &Capability, args: &SkillArguments)
        -> Result<Option<ActionOutput>>;
}

/// Default executor: replies through the oracle, delegates skills to a [`SkillInvoker`].
pub struct OracleExecutor {
    config: Arc<AssistantConfig>,
    oracle: Arc<dyn Oracle>,
    invoker: Arc<dyn SkillInvoker>,
}

impl OracleExecutor {
    pub fn new(
        config: Arc<AssistantConfig>,
        oracle: Arc<dyn Oracle>,
        invoker: Arc<dyn SkillInvoker>,
    ) -> Self {
        Self {
            config,
            oracle,
            invoker,
        }
    }

    pub fn reply_prompt(&self, talk: &str, knowledge: &str) -> String {
        let config = &self.config;
        let mut prompt = format!(
            "You are {}, {}. Your goal: {}.\n",
            config.name, config.profile, config.goal
        );
        if !knowledge.trim().is_empty() {
            prompt.push_str(&format!("Knowledge:\n{knowledge}\n---\n"));
        }
        prompt.push_str(&format!(
            "{talk}\n---\nAnswer strictly in {}, using Markdown. Keep the answer within {} tokens.",
            config.language, config.max_reply_tokens
        ));
        prompt
    }
}

#[async_trait]
impl ActionExecutor for OracleExecutor {
    async fn execute(&self, action: &PendingAction) -> Result<Option<ActionOutput>> {
        match action {
            PendingAction::Talk { talk, knowledge } => {
                let prompt = self.reply_prompt(talk, knowledge);
                let rsp = self.oracle.ask(&prompt).await?;
                let rsp = rsp.trim();
                if rsp.is_empty() {
                    return Ok(None);
                }
                Ok(Some(ActionOutput::text(rsp)))
            }
            PendingAction::Skill { skill, args } => {
                tracing::info!(skill_name = %skill.name, "Invoking skill");
                self.invoker.invoke(skill, args).await
            }
        }
    }
}
