//! pagi-assistant-core
//!
//! Single-agent conversational loop. The [`agent::Assistant`] keeps the
//! dialogue in [`memory::ConversationMemory`], asks an [`oracle::Oracle`] to
//! classify the latest user utterance and routes the classification to a
//! [`action::PendingAction`]: a free-form reply or a skill invocation.
//!
//! The oracle, the skill catalog, argument resolution and action execution
//! are traits so hosts can plug in their own services.

pub mod action;
pub mod agent;
pub mod classifier;
pub mod config;
pub mod memory;
pub mod oracle;
pub mod router;
pub mod skills;

pub use action::{ActionExecutor, ActionOutput, OracleExecutor, PendingAction, SkillInvoker};
pub use agent::{Assistant, Refinement};
pub use classifier::{build_prompt, extract, ClassificationResult};
pub use config::AssistantConfig;
pub use memory::{ConversationMemory, MessageType, Role, Utterance};
pub use oracle::Oracle;
pub use router::{RouteContext, Router};
pub use skills::{
    ArgumentResolver, Capability, CapabilityCatalog, OracleArgumentResolver, SkillArguments,
    SkillCatalog,
};
