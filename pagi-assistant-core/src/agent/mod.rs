use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::action::{ActionExecutor, ActionOutput, PendingAction};
use crate::classifier::{build_prompt, extract};
use crate::config::AssistantConfig;
use crate::memory::{ConversationMemory, Utterance};
use crate::oracle::Oracle;
use crate::router::{RouteContext, Router};
use crate::skills::{ArgumentResolver, CapabilityCatalog};

/// Output of memory refinement: the unit that gets classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    /// Raw last talk as the user wrote it.
    pub last_talk: String,
    /// Text actually classified (rewritten in context when the topic continues).
    pub utterance: String,
    /// The old topic is finished and history must be archived.
    pub checkpoint: bool,
}

/// Conversational agent running the cognitive cycle:
/// 1. Memory refinement (Oracle: summarize / is_related / rewrite)
/// 2. Classification (Oracle: ask)
/// 3. Routing to a pending action
/// 4. Execution, as a separate `act` phase
///
/// Callers alternate `think` and `act`, adding user input with `talk` in between.
pub struct Assistant {
    config: Arc<AssistantConfig>,
    oracle: Arc<dyn Oracle>,
    catalog: Arc<dyn CapabilityCatalog>,
    router: Router,
    executor: Arc<dyn ActionExecutor>,
    memory: ConversationMemory,
    todo: Option<PendingAction>,
}

// Manual Debug implementation since trait objects can't derive Debug
impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("name", &self.config.name)
            .field("oracle", &"Arc<dyn Oracle>")
            .field("catalog", &"Arc<dyn CapabilityCatalog>")
            .field("executor", &"Arc<dyn ActionExecutor>")
            .field("memory", &self.memory)
            .field("todo", &self.todo)
            .finish()
    }
}

impl Assistant {
    pub fn new(
        config: Arc<AssistantConfig>,
        oracle: Arc<dyn Oracle>,
        catalog: Arc<dyn CapabilityCatalog>,
        resolver: Arc<dyn ArgumentResolver>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        info!(name = %config.name, "Assistant created");
        Self {
            router: Router::new(catalog.clone(), resolver),
            config,
            oracle,
            catalog,
            executor,
            memory: ConversationMemory::new(),
            todo: None,
        }
    }

    /// Hydrates memory from a previously exported snapshot.
    pub fn with_memory_snapshot(mut self, snapshot: serde_json::Value) -> Self {
        self.load_memory(snapshot);
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.todo.as_ref()
    }

    /// Records user input.
    pub fn talk(&mut self, text: impl Into<String>) {
        self.memory.add_talk(Utterance::talk(text));
    }

    /// Decides the next action. `Ok(false)` means there is no unanswered talk.
    ///
    /// Any previous pending action is dropped first. Memory is only touched once
    /// classification and routing succeeded, so an oracle failure leaves memory
    /// as it was and nothing to act on.
    pub async fn think(&mut self) -> Result<bool> {
        self.todo = None;
        let Some(refinement) = self.refine_memory().await? else {
            debug!(name = %self.config.name, "No unanswered talk, nothing to do");
            return Ok(false);
        };

        let capabilities = self.catalog.list_descriptions();
        let prompt = build_prompt(&refinement.utterance, &capabilities);
        info!(prompt = %prompt, "Classification prompt");

        let rsp = self.oracle.ask(&prompt).await?;
        info!(response = %rsp, "Classification response");

        let result = extract(&rsp);
        // Knowledge from a finished topic is not carried into the new one.
        let knowledge = if refinement.checkpoint {
            String::new()
        } else {
            self.memory.knowledge_excerpt(self.config.knowledge_max_chars)
        };
        let ctx = RouteContext {
            last_talk: &refinement.last_talk,
            utterance: &refinement.utterance,
            knowledge: &knowledge,
        };
        let action = self.router.route(&result, &ctx).await;
        debug!(tag = ?result.tag, action = action.kind(), "Routed classification");

        if refinement.checkpoint {
            self.memory.checkpoint();
        }
        self.todo = Some(action);
        Ok(true)
    }

    /// Runs the pending action. `Ok(None)` means the action produced nothing and
    /// the conversation ended this turn; otherwise the output is remembered as an answer.
    pub async fn act(&mut self) -> Result<Option<ActionOutput>> {
        let Some(action) = self.todo.as_ref() else {
            bail!("no pending action; think() must report work before act()");
        };

        let output = self.executor.execute(action).await?;
        self.todo = None;

        let Some(output) = output else {
            info!(name = %self.config.name, "Action produced no output");
            return Ok(None);
        };
        self.memory.add_answer(Utterance::answer(output.content.clone()));
        Ok(Some(output))
    }

    /// Picks the utterance to classify. Does not mutate memory; a needed
    /// checkpoint is reported in the result.
    pub async fn refine_memory(&self) -> Result<Option<Refinement>> {
        let Some(last_talk) = self.memory.last_talk() else {
            return Ok(None);
        };
        let last_talk = last_talk.to_string();

        let history_text = self.memory.history_text();
        if history_text.is_empty() {
            return Ok(Some(Refinement {
                utterance: last_talk.clone(),
                last_talk,
                checkpoint: false,
            }));
        }

        let history_summary = self
            .oracle
            .summarize(&history_text, self.config.summary_max_words)
            .await?;
        if self.oracle.is_related(&last_talk, &history_summary).await? {
            let utterance = self.oracle.rewrite(&last_talk, &history_text).await?;
            debug!(original = %last_talk, rewritten = %utterance, "Merged talk with history");
            return Ok(Some(Refinement {
                last_talk,
                utterance,
                checkpoint: false,
            }));
        }

        info!(summary = %history_summary, "New topic, previous conversation is finished");
        Ok(Some(Refinement {
            utterance: last_talk.clone(),
            last_talk,
            checkpoint: true,
        }))
    }

    pub fn export_memory(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.memory)?)
    }

    /// Replaces memory with `snapshot`. Malformed input is logged and the
    /// current memory is kept; returns whether the snapshot was applied.
    pub fn load_memory(&mut self, snapshot: serde_json::Value) -> bool {
        match serde_json::from_value::<ConversationMemory>(snapshot.clone()) {
            Ok(memory) => {
                info!(entries = memory.history().len(), "Loaded conversation memory");
                self.memory = memory;
                true
            }
            Err(e) => {
                error!(error = %e, data = %snapshot, "Failed to load conversation memory");
                false
            }
        }
    }
}
