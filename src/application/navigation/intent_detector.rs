//! IntentDetector - Turns free-form operator text into a running session.
//!
//! A keyword pre-filter drops ordinary chat before any decision call. Text
//! that passes is classified against the tenant's active profiles; when the
//! classifier is unavailable, a unique name or alias mention decides.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{CreateSessionCommand, NavigationEngine, SessionManager};
use crate::domain::foundation::CommandMetadata;
use crate::domain::intent::{IntentCandidate, IntentClassification, IntentFilter};
use crate::domain::profile::Profile;
use crate::domain::session::{Session, SessionError};
use crate::ports::{DecisionEngine, ProfileRepository};

/// What came of an automation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The text does not ask for automation.
    NotAutomation,
    /// It does, but names none of the tenant's active profiles.
    NoMatchingProfile,
    /// A session was created and its opening message attempted.
    Started(Box<Session>),
}

pub struct IntentDetector {
    filter: IntentFilter,
    profiles: Arc<dyn ProfileRepository>,
    decisions: Arc<dyn DecisionEngine>,
    manager: Arc<SessionManager>,
    engine: Arc<NavigationEngine>,
    classify_timeout: Duration,
}

impl IntentDetector {
    pub fn new(
        filter: IntentFilter,
        profiles: Arc<dyn ProfileRepository>,
        decisions: Arc<dyn DecisionEngine>,
        manager: Arc<SessionManager>,
        engine: Arc<NavigationEngine>,
        classify_timeout: Duration,
    ) -> Self {
        Self {
            filter,
            profiles,
            decisions,
            manager,
            engine,
            classify_timeout,
        }
    }

    pub async fn handle(&self, text: &str, metadata: &CommandMetadata) -> Result<IntentOutcome, SessionError> {
        if !self.filter.matches(text) {
            return Ok(IntentOutcome::NotAutomation);
        }

        let profiles: Vec<Profile> = self
            .profiles
            .list_by_tenant(&metadata.tenant_id)
            .await?
            .into_iter()
            .filter(Profile::is_active)
            .collect();
        if profiles.is_empty() {
            return Ok(IntentOutcome::NoMatchingProfile);
        }
        let candidates: Vec<IntentCandidate> = profiles.iter().map(candidate).collect();

        let classification = self.classify(text, &candidates, &profiles).await;
        if !classification.is_automation {
            return Ok(IntentOutcome::NotAutomation);
        }
        let Some(target) = classification.resolve(&candidates) else {
            return Ok(IntentOutcome::NoMatchingProfile);
        };

        info!(
            profile_id = %target.profile_id,
            correlation_id = %metadata.correlation_id(),
            "Automation request matched profile"
        );
        let session = self
            .manager
            .create_session(
                CreateSessionCommand {
                    profile_id: target.profile_id,
                    request_text: text.to_string(),
                    objective: classification.objective.clone(),
                },
                metadata,
            )
            .await?;
        let session = self.engine.spawn_initiate(*session.id()).await?;
        Ok(IntentOutcome::Started(Box::new(session)))
    }

    async fn classify(&self, text: &str, candidates: &[IntentCandidate], profiles: &[Profile]) -> IntentClassification {
        let classified = tokio::time::timeout(
            self.classify_timeout,
            self.decisions.classify_intent(text, candidates),
        )
        .await;
        match classified {
            Ok(Ok(classification)) => classification,
            Ok(Err(err)) => {
                warn!(error = %err, "Intent classification failed, matching by name");
                match_by_name(text, profiles)
            }
            Err(_) => {
                warn!("Intent classification timed out, matching by name");
                match_by_name(text, profiles)
            }
        }
    }
}

fn candidate(profile: &Profile) -> IntentCandidate {
    IntentCandidate {
        profile_id: *profile.id(),
        name: profile.name().to_string(),
        alias: profile.alias().map(str::to_string),
        description: profile.description().to_string(),
    }
}

/// Matches only when exactly one profile is named in `text`.
fn match_by_name(text: &str, profiles: &[Profile]) -> IntentClassification {
    let mut named = profiles.iter().filter(|p| p.is_named_in(text));
    match (named.next(), named.next()) {
        (Some(profile), None) => IntentClassification {
            is_automation: true,
            profile_id: Some(*profile.id()),
            objective: None,
        },
        _ => IntentClassification {
            is_automation: true,
            profile_id: None,
            objective: None,
        },
    }
}
