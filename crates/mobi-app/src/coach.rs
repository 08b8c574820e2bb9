// Mobi sales coach: next-step suggestions, objection rebuttals and a
// per-lead coaching chat.
//
// Every call degrades to a fixed Spanish fallback when the model fails, so
// callers always get something to show.

use std::sync::Arc;

use mobi_core::config::{Config, ModelsConfig};
use mobi_core::{Lead, LeadId, Message, MobiState, NewMessage, Objection, Sender, StoreError};
use mobi_llm::prompt::{self, ChatMessage};
use mobi_llm::{GenerativeModel, LlmEvent, TextRequest};
use tokio::sync::mpsc;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

pub const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Enviar brochure del proyecto",
    "Preguntar por su presupuesto",
    "Invitar a un café",
];

pub const OBJECTION_FALLBACK: &str =
    "No se pudo generar una respuesta. Intenta reformulando la objeción o revisa los argumentos base.";

pub const COACH_FALLBACK: &str =
    "Lo siento, tuve un problema al procesar tu solicitud. Por favor, intenta de nuevo.";

// ---------------------------------------------------------------------------
// SalesCoach
// ---------------------------------------------------------------------------

pub struct SalesCoach {
    model: Arc<dyn GenerativeModel>,
    models: ModelsConfig,
    suggestion_count: usize,
}

impl SalesCoach {
    pub fn new(model: Arc<dyn GenerativeModel>, config: &Config) -> Self {
        Self {
            model,
            models: config.models.clone(),
            suggestion_count: config.coach.suggestion_count,
        }
    }

    /// Suggested next actions for the agent. The list is returned as the
    /// model produced it, without truncation to the requested count.
    pub async fn suggestions(&self, lead: &Lead) -> Vec<String> {
        let request = TextRequest::new(
            &self.models.suggestions,
            prompt::build_suggestions_prompt(lead, self.suggestion_count),
        )
        .with_response_schema(prompt::suggestions_schema());

        let reply = match self.model.generate_text(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(lead_id = lead.id, error = %e, "suggestions failed, using fallback list");
                return fallback_suggestions();
            }
        };

        match prompt::parse_suggestions(&reply) {
            Ok(list) => {
                info!(lead_id = lead.id, count = list.len(), "suggestions generated");
                list
            }
            Err(e) => {
                warn!(lead_id = lead.id, error = %e, "malformed suggestions reply, using fallback list");
                fallback_suggestions()
            }
        }
    }

    /// A personalised rebuttal script for `objection`.
    pub async fn objection_response(&self, lead: &Lead, objection: &Objection) -> String {
        let request = TextRequest::new(
            &self.models.objection,
            prompt::build_objection_prompt(lead, objection),
        )
        .with_system_instruction(prompt::OBJECTION_SYSTEM_INSTRUCTION);

        match self.model.generate_text(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(lead_id = lead.id, objection_id = objection.id, error = %e, "objection response failed");
                OBJECTION_FALLBACK.to_string()
            }
        }
    }

    /// Request for the coach's answer to the last line of `history`.
    pub fn coach_request(&self, lead: &Lead, history: &[ChatMessage]) -> TextRequest {
        let question = history.last().map(|m| m.text.as_str()).unwrap_or_default();
        TextRequest::new(
            &self.models.coach,
            prompt::build_coach_prompt(lead, history, question),
        )
        .with_system_instruction(prompt::COACH_SYSTEM_INSTRUCTION)
    }

    /// Stream the coach's answer as `LlmEvent`s tagged with `generation`.
    pub async fn stream_coach_reply(
        &self,
        lead: &Lead,
        history: &[ChatMessage],
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) {
        let request = self.coach_request(lead, history);
        self.model.stream_text(&request, tx, generation).await;
    }
}

fn fallback_suggestions() -> Vec<String> {
    FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Coaching chat session
// ---------------------------------------------------------------------------

/// Coaching chat about one lead. History lives only as long as the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachSession {
    lead_id: LeadId,
    history: Vec<ChatMessage>,
}

impl CoachSession {
    pub fn new(lead_id: LeadId) -> Self {
        Self {
            lead_id,
            history: Vec::new(),
        }
    }

    pub fn lead_id(&self) -> LeadId {
        self.lead_id
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Append the agent's question; returns false for a blank one.
    pub fn push_question(&mut self, question: &str) -> bool {
        if question.trim().is_empty() {
            return false;
        }
        self.history.push(ChatMessage::agent(question));
        true
    }

    pub fn push_reply(&mut self, reply: impl Into<String>) {
        self.history.push(ChatMessage::mobi(reply));
    }
}

// ---------------------------------------------------------------------------
// Pinning
// ---------------------------------------------------------------------------

/// Pin a suggestion into the lead's conversation as a Mobi note.
pub fn pin_suggestion<'a>(
    store: &'a mut MobiState,
    lead_id: LeadId,
    suggestion: &str,
) -> Result<&'a Message, StoreError> {
    store.add_message(lead_id, NewMessage::new(Sender::MobiSuggestion, suggestion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use mobi_core::NewLead;

    fn lead() -> Lead {
        let mut store = MobiState::empty();
        let id = store.add_lead(NewLead::new("Luis", "Lince Moderno"));
        store
            .add_message(id, NewMessage::lead("Me parece caro"))
            .unwrap();
        store.lead(id).unwrap().clone()
    }

    fn coach(model: ScriptedModel) -> (SalesCoach, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        (SalesCoach::new(model.clone(), &Config::default()), model)
    }

    #[tokio::test]
    async fn suggestions_use_schema_and_configured_count() {
        let (coach, model) = coach(ScriptedModel::new().with_text(
            r#"{"sugerencias":["Consultar Manual de Objeciones","Ofrecer financiamiento","Agendar visita"]}"#,
        ));
        let list = coach.suggestions(&lead()).await;
        // Not truncated to the requested count.
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], "Consultar Manual de Objeciones");

        let req = &model.text_requests().await[0];
        assert_eq!(req.model, "gemini-2.5-pro");
        assert!(req.response_schema.is_some());
        assert!(req.prompt.contains("sugiere 2 acciones"));
    }

    #[tokio::test]
    async fn suggestions_fallback_on_error_and_malformed_json() {
        let (coach, _) = coach(
            ScriptedModel::new()
                .with_text_error("503")
                .with_text("esto no es json"),
        );
        assert_eq!(coach.suggestions(&lead()).await, fallback_suggestions());
        assert_eq!(coach.suggestions(&lead()).await, fallback_suggestions());
    }

    #[tokio::test]
    async fn suggestions_missing_field_is_empty() {
        let (coach, _) = coach(ScriptedModel::new().with_text("{}"));
        assert!(coach.suggestions(&lead()).await.is_empty());
    }

    #[tokio::test]
    async fn objection_response_trims_and_falls_back() {
        let objection = Objection {
            id: 1,
            title: "El precio es muy alto".into(),
            arguments: vec!["Plusvalía".into()],
        };
        let (coach, model) = coach(
            ScriptedModel::new()
                .with_text("\n  Entiendo, Luis...  \n")
                .with_text_error("down"),
        );
        assert_eq!(
            coach.objection_response(&lead(), &objection).await,
            "Entiendo, Luis..."
        );
        assert_eq!(
            coach.objection_response(&lead(), &objection).await,
            OBJECTION_FALLBACK
        );
        let req = &model.text_requests().await[0];
        assert_eq!(
            req.system_instruction.as_deref(),
            Some(prompt::OBJECTION_SYSTEM_INSTRUCTION)
        );
    }

    #[test]
    fn session_history_feeds_the_coach_request() {
        let (coach, _) = coach(ScriptedModel::new());
        let lead = lead();
        let mut session = CoachSession::new(lead.id);

        assert!(session.push_question("¿Cómo respondo?"));
        session.push_reply("Resalta la plusvalía.");
        assert!(!session.push_question("  "));
        assert!(session.push_question("¿Y si insiste?"));

        let senders: Vec<_> = session.history().iter().map(|m| m.sender).collect();
        use prompt::ChatSender::{Agent, Mobi};
        assert_eq!(senders, vec![Agent, Mobi, Agent]);

        // The request carries the earlier exchange and the new question.
        let request = coach.coach_request(&lead, session.history());
        assert_eq!(request.model, "gemini-2.5-pro");
        assert!(request
            .prompt
            .contains("Agente: ¿Cómo respondo?\nMobi: Resalta la plusvalía.\nAgente: ¿Y si insiste?"));
        assert_eq!(
            request.system_instruction.as_deref(),
            Some(prompt::COACH_SYSTEM_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn streamed_reply_completes_with_generation() {
        let (coach, _) = coach(ScriptedModel::new().with_text("Invítalo a la sala de ventas."));
        let lead = lead();
        let (tx, mut rx) = mpsc::channel(8);
        coach
            .stream_coach_reply(&lead, &[ChatMessage::agent("¿Siguiente paso?")], tx, 3)
            .await;
        assert_eq!(
            rx.recv().await,
            Some(LlmEvent::Complete {
                full_text: "Invítalo a la sala de ventas.".into(),
                generation: 3,
            })
        );
    }

    #[test]
    fn pinned_suggestion_is_mobi_message() {
        let mut store = MobiState::empty();
        let id = store.add_lead(NewLead::new("Ana", "Loft"));
        store.select_lead(Some(id));
        let msg = pin_suggestion(&mut store, id, "Invitar a un café").unwrap();
        assert_eq!(msg.sender, Sender::MobiSuggestion);
        assert_eq!(
            store.selected_lead().unwrap().last_message().unwrap().text,
            "Invitar a un café"
        );
        assert!(pin_suggestion(&mut store, 42, "x").is_err());
    }
}
