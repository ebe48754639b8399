use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::Capability;
use crate::oracle::Oracle;

/// Resolved arguments for a skill invocation.
pub type SkillArguments = serde_json::Map<String, serde_json::Value>;

/// Fills in a matched capability's arguments from the refined utterance.
///
/// `Ok(None)` means the utterance does not yield usable arguments.
#[async_trait]
pub trait ArgumentResolver: Send + Sync {
    async fn resolve(&self, capability: &Capability, utterance: &str)
        -> Result<Option<SkillArguments>>;
}

/// Asks the oracle to emit the arguments as a JSON object.
pub struct OracleArgumentResolver {
    oracle: Arc<dyn Oracle>,
}

impl OracleArgumentResolver {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl ArgumentResolver for OracleArgumentResolver {
    async fn resolve(
        &self,
        capability: &Capability,
        utterance: &str,
    ) -> Result<Option<SkillArguments>> {
        let prompt = build_arguments_prompt(capability, utterance);
        tracing::debug!(skill_name = %capability.name, "Resolving skill arguments");

        let rsp = self.oracle.ask(&prompt).await?;
        let args = extract_json_object(&rsp);
        if args.is_none() {
            tracing::info!(
                skill_name = %capability.name,
                response = %rsp,
                "Oracle response did not contain a JSON argument object"
            );
        }
        Ok(args)
    }
}

pub fn build_arguments_prompt(capability: &Capability, utterance: &str) -> String {
    let mut prompt = format!(
        "Function `{}`: {}\nParameters:\n",
        capability.name, capability.description
    );
    for (name, desc) in &capability.arguments {
        prompt.push_str(&format!("- {name}: {desc}\n"));
    }
    for example in &capability.examples {
        prompt.push_str(&format!(
            "Example:\nI want you to: {}\nReturn: {}\n",
            example.ask, example.answer
        ));
    }
    prompt.push_str(&format!(
        "---\nRefer to the `{}` function description and fill in its parameters for the request \
         \"I want you to: {utterance}\". Return only a JSON object mapping parameter names to values.",
        capability.name
    ));
    prompt
}

/// Pulls a JSON object out of raw oracle text: the whole text, a fenced
/// ```json block, or the outermost `{ ... }` span, in that order.
pub fn extract_json_object(raw: &str) -> Option<SkillArguments> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        fenced_json_block(trimmed),
        outer_braces(trimmed),
    ];

    candidates.into_iter().flatten().find_map(|candidate| {
        match serde_json::from_str::<serde_json::Value>(candidate) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    })
}

fn fenced_json_block(raw: &str) -> Option<&str> {
    let start = raw.find("```json")? + "```json".len();
    let end = raw[start..].find("```")?;
    Some(raw[start..start + end].trim())
}

fn outer_braces(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
