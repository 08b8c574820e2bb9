// Conversation simulator: the model plays the lead.
//
// Per agent message: append the message, ask for an in-character reply,
// append it, classify the reply's sentiment and store the resulting
// temperature. A failed reply appends one apology line and leaves the
// temperature alone.

use std::sync::Arc;

use mobi_core::config::ModelsConfig;
use mobi_core::{Lead, LeadId, MobiState, NewMessage, StoreError, Temperature};
use mobi_llm::{prompt, GenerativeModel, LlmError, TextRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Lead-side line appended when no reply could be generated.
pub const APOLOGY_REPLY: &str = "Lo siento, tuve un problema. ¿Podemos continuar más tarde?";

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("El mensaje no puede estar vacío.")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of classifying one lead reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentiment {
    pub temperature: Temperature,
    /// The classifier call failed and `temperature` is the Warm default.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    Replied { reply: String, sentiment: Sentiment },
    /// The reply call failed; the apology line was appended instead.
    Apologized,
}

pub struct ConversationSimulator {
    model: Arc<dyn GenerativeModel>,
    reply_model: String,
    sentiment_model: String,
}

impl ConversationSimulator {
    pub fn new(model: Arc<dyn GenerativeModel>, models: &ModelsConfig) -> Self {
        Self {
            model,
            reply_model: models.lead_reply.clone(),
            sentiment_model: models.sentiment.clone(),
        }
    }

    /// Run one agent turn against `lead_id`.
    ///
    /// Errors only for a blank message or an unknown lead, before anything is
    /// appended. Model failures never surface as errors.
    pub async fn send_agent_message(
        &self,
        store: &mut MobiState,
        lead_id: LeadId,
        text: &str,
    ) -> Result<SimulationOutcome, SimulatorError> {
        if text.trim().is_empty() {
            return Err(SimulatorError::EmptyMessage);
        }

        // The reply prompt sees the conversation as it was before this turn.
        let before = store
            .lead(lead_id)
            .cloned()
            .ok_or(StoreError::LeadNotFound(lead_id))?;
        store.add_message(lead_id, NewMessage::agent(text))?;

        let reply = match self.generate_reply(&before, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(lead_id, error = %e, "lead reply failed, appending apology");
                store.add_message(lead_id, NewMessage::lead(APOLOGY_REPLY))?;
                return Ok(SimulationOutcome::Apologized);
            }
        };
        store.add_message(lead_id, NewMessage::lead(reply.clone()))?;

        let sentiment = self.classify_sentiment(&reply).await;
        store.update_temperature(lead_id, sentiment.temperature)?;
        info!(
            lead_id,
            temperature = %sentiment.temperature,
            fallback = sentiment.fallback,
            "simulated turn complete"
        );

        Ok(SimulationOutcome::Replied { reply, sentiment })
    }

    /// Ask the model for the lead's next line.
    pub async fn generate_reply(&self, lead: &Lead, agent_message: &str) -> Result<String, LlmError> {
        let request = TextRequest::new(
            &self.reply_model,
            prompt::build_lead_reply_prompt(lead, agent_message),
        );
        let reply = self.model.generate_text(&request).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(LlmError::MissingContent("reply text"));
        }
        Ok(reply.to_string())
    }

    /// Classify a lead message. A failed call counts as Warm and is flagged.
    pub async fn classify_sentiment(&self, message: &str) -> Sentiment {
        let request = TextRequest::new(&self.sentiment_model, prompt::build_sentiment_prompt(message));
        match self.model.generate_text(&request).await {
            Ok(label) => {
                debug!(label = label.trim(), "sentiment label");
                Sentiment {
                    temperature: prompt::parse_sentiment(&label),
                    fallback: false,
                }
            }
            Err(e) => {
                warn!(error = %e, "sentiment classification failed, defaulting to Tibio");
                Sentiment {
                    temperature: Temperature::Warm,
                    fallback: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use mobi_core::config::Config;
    use mobi_core::{NewLead, Sender};

    fn setup(model: ScriptedModel) -> (ConversationSimulator, Arc<ScriptedModel>, MobiState, LeadId) {
        let model = Arc::new(model);
        let sim = ConversationSimulator::new(model.clone(), &Config::default().models);
        let mut store = MobiState::empty();
        let mut lead = NewLead::new("Ana", "Loft Urbano");
        lead.persona = "Joven profesional".into();
        lead.temperature = Temperature::Cold;
        let id = store.add_lead(lead);
        store.select_lead(Some(id));
        (sim, model, store, id)
    }

    #[tokio::test]
    async fn successful_turn_appends_both_and_updates_temperature() {
        let (sim, model, mut store, id) = setup(
            ScriptedModel::new()
                .with_text("  ¡Me encanta! ¿Cuándo visitamos?  ")
                .with_text("Caliente"),
        );

        let outcome = sim.send_agent_message(&mut store, id, "Hola Ana").await.unwrap();
        assert_eq!(
            outcome,
            SimulationOutcome::Replied {
                reply: "¡Me encanta! ¿Cuándo visitamos?".into(),
                sentiment: Sentiment {
                    temperature: Temperature::Hot,
                    fallback: false,
                },
            }
        );

        let lead = store.selected_lead().unwrap();
        assert_eq!(lead.conversation.len(), 2);
        assert_eq!(lead.conversation[0].sender, Sender::Agent);
        assert_eq!(lead.conversation[1].sender, Sender::Lead);
        assert_eq!(lead.temperature, Temperature::Hot);

        let requests = model.text_requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].model, "gemini-2.5-flash");
        // The agent line appears once, as the latest message, not in the history.
        assert!(requests[0].prompt.contains("acaba de decir: \"Hola Ana\""));
        assert!(!requests[0].prompt.contains("Agente: Hola Ana"));
        assert!(requests[1].prompt.contains("¡Me encanta!"));
    }

    #[tokio::test]
    async fn reply_failure_appends_single_apology_and_keeps_temperature() {
        let (sim, model, mut store, id) =
            setup(ScriptedModel::new().with_text_error("boom").with_text("Caliente"));

        let outcome = sim.send_agent_message(&mut store, id, "Hola").await.unwrap();
        assert_eq!(outcome, SimulationOutcome::Apologized);

        let lead = store.lead(id).unwrap();
        assert_eq!(lead.conversation.len(), 2);
        assert_eq!(lead.conversation[1].sender, Sender::Lead);
        assert_eq!(lead.conversation[1].text, APOLOGY_REPLY);
        assert_eq!(lead.temperature, Temperature::Cold);
        // No sentiment call was made.
        assert_eq!(model.text_requests().await.len(), 1);
    }

    #[tokio::test]
    async fn blank_reply_counts_as_failure() {
        let (sim, _model, mut store, id) = setup(ScriptedModel::new().with_text("   "));
        let outcome = sim.send_agent_message(&mut store, id, "Hola").await.unwrap();
        assert_eq!(outcome, SimulationOutcome::Apologized);
    }

    #[tokio::test]
    async fn sentiment_failure_falls_back_to_warm_and_is_flagged() {
        let (sim, _model, mut store, id) =
            setup(ScriptedModel::new().with_text("Lo pensaré").with_text_error("quota"));

        let outcome = sim.send_agent_message(&mut store, id, "¿Qué opina?").await.unwrap();
        match outcome {
            SimulationOutcome::Replied { sentiment, .. } => {
                assert_eq!(sentiment.temperature, Temperature::Warm);
                assert!(sentiment.fallback);
            }
            other => panic!("expected reply, got {other:?}"),
        }
        assert_eq!(store.lead(id).unwrap().temperature, Temperature::Warm);
    }

    #[tokio::test]
    async fn unknown_sentiment_label_is_warm_not_fallback() {
        let (sim, _model, _store, _id) = setup(ScriptedModel::new().with_text("Neutral"));
        let sentiment = sim.classify_sentiment("hmm").await;
        assert_eq!(sentiment.temperature, Temperature::Warm);
        assert!(!sentiment.fallback);
    }

    #[tokio::test]
    async fn blank_message_and_unknown_lead_mutate_nothing() {
        let (sim, model, mut store, id) = setup(ScriptedModel::new());

        let err = sim.send_agent_message(&mut store, id, "   ").await.unwrap_err();
        assert!(matches!(err, SimulatorError::EmptyMessage));

        let err = sim.send_agent_message(&mut store, 999, "Hola").await.unwrap_err();
        assert!(matches!(err, SimulatorError::Store(StoreError::LeadNotFound(999))));

        assert!(store.lead(id).unwrap().conversation.is_empty());
        assert!(model.text_requests().await.is_empty());
    }
}
