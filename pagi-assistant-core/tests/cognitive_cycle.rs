// Integration tests for the cognitive cycle
//
// Each test drives an Assistant through talk -> think -> act with scripted
// collaborators that record every oracle call, so both the chosen path and
// the calls it costs can be checked.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use pagi_assistant_core::{
    ActionExecutor, ActionOutput, ArgumentResolver, Assistant, AssistantConfig, Capability,
    Oracle, PendingAction, SkillArguments, SkillCatalog,
};

/// Oracle with canned answers that records which operations were used.
#[derive(Default)]
struct ScriptedOracle {
    answers: Mutex<VecDeque<String>>,
    related: bool,
    calls: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn new(answers: &[&str], related: bool) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            related,
            ..Default::default()
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn ask(&self, prompt: &str) -> Result<String> {
        self.record("ask");
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.answers.lock().unwrap().pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("oracle unavailable"),
        }
    }

    async fn summarize(&self, _text: &str, max_words: usize) -> Result<String> {
        assert_eq!(max_words, 20);
        self.record("summarize");
        Ok("apple talk".to_string())
    }

    async fn is_related(&self, _a: &str, _b: &str) -> Result<bool> {
        self.record("is_related");
        Ok(self.related)
    }

    async fn rewrite(&self, sentence: &str, _context: &str) -> Result<String> {
        self.record("rewrite");
        Ok(format!("{sentence} (about apples)"))
    }
}

struct StubResolver {
    resolves: bool,
}

#[async_trait]
impl ArgumentResolver for StubResolver {
    async fn resolve(
        &self,
        _capability: &Capability,
        utterance: &str,
    ) -> Result<Option<SkillArguments>> {
        if !self.resolves {
            return Ok(None);
        }
        let mut args = SkillArguments::new();
        args.insert("text".to_string(), serde_json::json!(utterance));
        Ok(Some(args))
    }
}

/// Executor replying with a fixed text, or nothing.
struct FixedExecutor {
    reply: Option<&'static str>,
}

#[async_trait]
impl ActionExecutor for FixedExecutor {
    async fn execute(&self, _action: &PendingAction) -> Result<Option<ActionOutput>> {
        Ok(self.reply.map(ActionOutput::text))
    }
}

fn catalog() -> SkillCatalog {
    SkillCatalog::new(vec![Capability {
        name: "text_to_image".to_string(),
        description: "Create a drawing based on the text".to_string(),
        arguments: BTreeMap::from([("text".to_string(), "What to draw".to_string())]),
        examples: vec![],
    }])
}

fn assistant(oracle: Arc<ScriptedOracle>, resolves: bool, reply: Option<&'static str>) -> Assistant {
    Assistant::new(
        Arc::new(AssistantConfig::default()),
        oracle,
        Arc::new(catalog()),
        Arc::new(StubResolver { resolves }),
        Arc::new(FixedExecutor { reply }),
    )
}

/// Assistant that already answered one question about apples.
async fn after_first_exchange(oracle: Arc<ScriptedOracle>) -> Assistant {
    let mut agent = assistant(oracle, false, Some("Apples are fruit."));
    agent.talk("what's apple");
    assert!(agent.think().await.unwrap());
    agent.act().await.unwrap();
    agent
}

#[tokio::test]
async fn test_empty_memory_has_nothing_to_do() {
    let oracle = ScriptedOracle::new(&[], false);
    let mut agent = assistant(oracle.clone(), true, Some("unused"));

    assert!(!agent.think().await.unwrap());
    assert!(agent.pending_action().is_none());
    assert!(oracle.calls().is_empty());
}

#[tokio::test]
async fn test_apple_conversation_scenario() {
    let oracle = ScriptedOracle::new(&["[TALK]: apple info]"], false);
    let mut agent = assistant(oracle.clone(), true, Some("Apples are fruit."));

    agent.talk("what's apple");
    assert!(agent.think().await.unwrap());

    // Fresh conversation: only the classification call, on the raw text.
    assert_eq!(oracle.calls(), vec!["ask"]);
    assert!(oracle.last_prompt().contains("Refer to this sentence:\n what's apple\n"));
    assert!(oracle.last_prompt().contains("`[SKILL]: text_to_image`"));
    assert_eq!(
        agent.pending_action(),
        Some(&PendingAction::Talk {
            talk: "apple info]".to_string(),
            knowledge: String::new(),
        })
    );

    let output = agent.act().await.unwrap().unwrap();
    assert_eq!(output.content, "Apples are fruit.");
    assert_eq!(agent.memory().history().len(), 2);
    assert_eq!(agent.memory().last_talk(), None);
    assert!(agent.pending_action().is_none());

    assert!(!agent.think().await.unwrap());
    assert_eq!(oracle.calls(), vec!["ask"]);
}

#[tokio::test]
async fn test_related_talk_is_rewritten_in_context() {
    let oracle = ScriptedOracle::new(&["[TALK]: x", "[TALK]: apple colors"], true);
    let mut agent = after_first_exchange(oracle.clone()).await;

    agent.talk("what colors?");
    assert!(agent.think().await.unwrap());

    assert_eq!(
        oracle.calls(),
        vec!["ask", "summarize", "is_related", "rewrite", "ask"]
    );
    assert!(oracle
        .last_prompt()
        .contains("Refer to this sentence:\n what colors? (about apples)\n"));

    match agent.pending_action() {
        Some(PendingAction::Talk { talk, knowledge }) => {
            assert_eq!(talk, "apple colors");
            assert_eq!(knowledge, "user: what's apple\nassistant: Apples are fruit.");
        }
        other => panic!("expected talk action, got {:?}", other),
    }
    assert_eq!(agent.memory().archive().len(), 0);
}

#[tokio::test]
async fn test_unrelated_talk_checkpoints_history() {
    let oracle = ScriptedOracle::new(&["[TALK]: x", "[TALK]: rockets"], false);
    let mut agent = after_first_exchange(oracle.clone()).await;

    agent.talk("how do rockets fly?");
    assert!(agent.think().await.unwrap());

    assert_eq!(oracle.calls(), vec!["ask", "summarize", "is_related", "ask"]);
    assert!(oracle
        .last_prompt()
        .contains("Refer to this sentence:\n how do rockets fly?\n"));
    assert_eq!(agent.memory().history_text(), "");
    assert_eq!(agent.memory().last_talk(), Some("how do rockets fly?"));
    assert_eq!(agent.memory().archive().len(), 2);
    assert_eq!(
        agent.pending_action(),
        Some(&PendingAction::Talk {
            talk: "rockets".to_string(),
            knowledge: String::new(),
        })
    );
}

#[tokio::test]
async fn test_unknown_skill_falls_back_to_last_talk() {
    let oracle = ScriptedOracle::new(&["[SKILL]: unknown_x]"], false);
    let mut agent = assistant(oracle, true, Some("ok"));

    agent.talk("make something weird");
    assert!(agent.think().await.unwrap());
    assert_eq!(
        agent.pending_action(),
        Some(&PendingAction::Talk {
            talk: "make something weird".to_string(),
            knowledge: String::new(),
        })
    );
}

#[tokio::test]
async fn test_unresolved_arguments_fall_back_to_last_talk() {
    let oracle = ScriptedOracle::new(&["sure, [SKILL]: text_to_image please"], false);
    let mut agent = assistant(oracle, false, Some("ok"));

    agent.talk("draw it");
    assert!(agent.think().await.unwrap());
    assert_eq!(
        agent.pending_action(),
        Some(&PendingAction::Talk {
            talk: "draw it".to_string(),
            knowledge: String::new(),
        })
    );
}

#[tokio::test]
async fn test_resolved_skill_is_executed_and_remembered() {
    let oracle = ScriptedOracle::new(&["sure, [SKILL]: text_to_image please"], false);
    let mut agent = assistant(oracle, true, Some("image.png"));

    agent.talk("draw a cat");
    assert!(agent.think().await.unwrap());
    match agent.pending_action() {
        Some(PendingAction::Skill { skill, args }) => {
            assert_eq!(skill.name, "text_to_image");
            assert_eq!(args["text"], "draw a cat");
        }
        other => panic!("expected skill action, got {:?}", other),
    }

    let output = agent.act().await.unwrap().unwrap();
    assert_eq!(output.content, "image.png");
    assert_eq!(agent.memory().history().last().unwrap().content, "image.png");
}

#[tokio::test]
async fn test_malformed_classification_degrades_to_talk() {
    let oracle = ScriptedOracle::new(&["  I think you want apples  "], false);
    let mut agent = assistant(oracle, true, Some("ok"));

    agent.talk("apples?");
    assert!(agent.think().await.unwrap());
    assert_eq!(
        agent.pending_action(),
        Some(&PendingAction::Talk {
            talk: "I think you want apples".to_string(),
            knowledge: String::new(),
        })
    );
}

#[tokio::test]
async fn test_oracle_failure_leaves_memory_untouched() {
    // Only the first exchange has an answer; the classification after an
    // unrelated talk fails.
    let oracle = ScriptedOracle::new(&["[TALK]: x"], false);
    let mut agent = after_first_exchange(oracle.clone()).await;
    agent.talk("how do rockets fly?");
    let before = agent.memory().clone();

    assert!(agent.think().await.is_err());
    assert_eq!(agent.memory(), &before);
    assert!(agent.pending_action().is_none());
    assert_eq!(agent.memory().archive().len(), 0);
}

#[tokio::test]
async fn test_failed_think_drops_previous_pending_action() {
    let oracle = ScriptedOracle::new(&["[TALK]: apples"], false);
    let mut agent = assistant(oracle, true, Some("Apples are fruit."));

    agent.talk("what's apple");
    assert!(agent.think().await.unwrap());
    assert!(agent.pending_action().is_some());

    agent.talk("how do rockets fly?");
    let before = agent.memory().clone();
    assert!(agent.think().await.is_err());
    assert!(agent.pending_action().is_none());

    assert!(agent.act().await.is_err());
    assert_eq!(agent.memory(), &before);
}

#[tokio::test]
async fn test_skill_fallback_uses_raw_talk_not_rewrite() {
    let oracle = ScriptedOracle::new(&["[TALK]: x", "[SKILL]: unknown_x"], true);
    let mut agent = after_first_exchange(oracle.clone()).await;

    agent.talk("draw it");
    assert!(agent.think().await.unwrap());
    assert!(oracle.calls().contains(&"rewrite".to_string()));
    assert_eq!(
        agent.pending_action(),
        Some(&PendingAction::Talk {
            talk: "draw it".to_string(),
            knowledge: "user: what's apple\nassistant: Apples are fruit.".to_string(),
        })
    );
}

#[tokio::test]
async fn test_act_without_pending_action_is_an_error() {
    let oracle = ScriptedOracle::new(&[], false);
    let mut agent = assistant(oracle, true, Some("ok"));
    assert!(agent.act().await.is_err());
}

#[tokio::test]
async fn test_empty_execution_result_ends_turn() {
    let oracle = ScriptedOracle::new(&["[TALK]: bye"], false);
    let mut agent = assistant(oracle, true, None);

    agent.talk("bye");
    assert!(agent.think().await.unwrap());
    assert!(agent.act().await.unwrap().is_none());
    assert_eq!(agent.memory().history().len(), 1);
    assert!(agent.pending_action().is_none());
}

#[tokio::test]
async fn test_memory_snapshot_restore() {
    let oracle = ScriptedOracle::new(&["[TALK]: x"], false);
    let agent = after_first_exchange(oracle.clone()).await;
    let snapshot = agent.export_memory().unwrap();

    let restored = assistant(oracle.clone(), true, Some("ok")).with_memory_snapshot(snapshot);
    assert_eq!(restored.memory(), agent.memory());

    let mut target = assistant(oracle, true, Some("ok"));
    target.talk("keep me");
    let before = target.memory().clone();
    assert!(!target.load_memory(serde_json::json!({"history": "not a list"})));
    assert_eq!(target.memory(), &before);
}
