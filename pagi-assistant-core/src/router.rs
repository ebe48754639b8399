//! Maps a classification to the next pending action.
//!
//! Every branch ends in a valid [`PendingAction`]; unknown skills and
//! unresolved arguments fall back to a talk action on the original user text.

use std::sync::Arc;
use tracing::{info, warn};

use crate::action::PendingAction;
use crate::classifier::ClassificationResult;
use crate::memory::MessageType;
use crate::skills::{ArgumentResolver, CapabilityCatalog};

/// Inputs shared by the handlers of one cycle iteration.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    /// Raw last talk, used as the reply subject on fallbacks.
    pub last_talk: &'a str,
    /// Refined utterance handed to argument resolution.
    pub utterance: &'a str,
    pub knowledge: &'a str,
}

pub struct Router {
    catalog: Arc<dyn CapabilityCatalog>,
    resolver: Arc<dyn ArgumentResolver>,
}

impl Router {
    pub fn new(catalog: Arc<dyn CapabilityCatalog>, resolver: Arc<dyn ArgumentResolver>) -> Self {
        Self { catalog, resolver }
    }

    pub async fn route(&self, result: &ClassificationResult, ctx: &RouteContext<'_>) -> PendingAction {
        match result.tag {
            MessageType::Talk | MessageType::Problem => talk_handler(&result.payload, ctx),
            // Solution is a checkpoint signal; if one reaches routing it is replied to like talk.
            MessageType::Solution => talk_handler(&result.payload, ctx),
            MessageType::Skill => self.skill_handler(&result.payload, ctx).await,
        }
    }

    async fn skill_handler(&self, identifier: &str, ctx: &RouteContext<'_>) -> PendingAction {
        let Some(skill) = self.catalog.lookup(identifier) else {
            info!(skill_name = %identifier, "skill not found");
            return talk_handler(ctx.last_talk, ctx);
        };

        let args = match self.resolver.resolve(&skill, ctx.utterance).await {
            Ok(Some(args)) => args,
            Ok(None) => {
                info!(skill_name = %skill.name, "No arguments resolved for skill");
                return talk_handler(ctx.last_talk, ctx);
            }
            Err(e) => {
                warn!(skill_name = %skill.name, error = %e, "Argument resolution failed");
                return talk_handler(ctx.last_talk, ctx);
            }
        };

        PendingAction::Skill { skill, args }
    }
}

pub fn talk_handler(text: &str, ctx: &RouteContext<'_>) -> PendingAction {
    PendingAction::Talk {
        talk: text.to_string(),
        knowledge: ctx.knowledge.to_string(),
    }
}
