// Application state and orchestration logic.
//
// The single event loop that owns the store. It takes user commands from the
// front end and streamed coach events from spawned LLM tasks, and pushes UI
// updates back to the front end.

use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, Local};
use mobi_core::config::Config;
use mobi_core::form::{LeadField, LeadForm, ObjectionForm};
use mobi_core::{calendar, csv_import, LeadId, MobiState, ObjectionId};
use mobi_llm::{GenerativeModel, LlmEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::coach::{self, CoachSession, SalesCoach, COACH_FALLBACK};
use crate::design::{DesignCompositor, DesignError, DesignInput, FurnitureSelection, ResultState};
use crate::image_import;
use crate::protocol::{UiUpdate, UserCommand};
use crate::simulator::{ConversationSimulator, SimulationOutcome};
use crate::visualizer::DreamVisualizer;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const NO_SELECTION: &str = "Selecciona un lead primero.";

/// Events shown on the dashboard board.
pub const UPCOMING_EVENTS_SHOWN: usize = 2;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub store: MobiState,
    pub simulator: ConversationSimulator,
    /// Shared with spawned coach streaming tasks.
    pub coach: Arc<SalesCoach>,
    pub visualizer: DreamVisualizer,
    pub compositor: DesignCompositor,
    /// Coaching chat for the selected lead. Reset when the selection changes.
    pub coach_session: Option<CoachSession>,
    /// True while a coach answer is streaming into `coach_session`.
    pub coach_streaming: bool,
    /// Result of the last `Suggest`, for pinning by number.
    pub last_suggestions: Vec<String>,
    pub current_llm_task: Option<tokio::task::JoinHandle<()>>,
    /// Monotonically increasing id of the current LLM task. Events carrying
    /// an older generation are discarded in `handle_llm_event`.
    pub llm_generation: u64,
    /// Sender for LLM events; spawned tasks stream through a clone of it.
    pub llm_tx: mpsc::Sender<LlmEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: MobiState,
        model: Arc<dyn GenerativeModel>,
        llm_tx: mpsc::Sender<LlmEvent>,
    ) -> Self {
        let simulator = ConversationSimulator::new(Arc::clone(&model), &config.models);
        let coach = Arc::new(SalesCoach::new(Arc::clone(&model), &config));
        let visualizer = DreamVisualizer::new(Arc::clone(&model), &config.models);
        let compositor = DesignCompositor::new(model, &config.models);

        AppState {
            config,
            store,
            simulator,
            coach,
            visualizer,
            compositor,
            coach_session: None,
            coach_streaming: false,
            last_suggestions: Vec::new(),
            current_llm_task: None,
            llm_generation: 0,
            llm_tx,
        }
    }

    /// Cancel the current LLM task if one is running.
    pub fn cancel_llm_task(&mut self) {
        if let Some(handle) = self.current_llm_task.take() {
            handle.abort();
            info!("Cancelled previous LLM task");
        }
        self.coach_streaming = false;
    }

    /// Change the selected lead, dropping everything tied to the old one.
    pub fn select(&mut self, lead_id: Option<LeadId>) {
        self.cancel_llm_task();
        self.coach_session = None;
        self.last_suggestions.clear();
        self.store.select_lead(lead_id);
    }

    /// Ask the coach about the selected lead and stream the answer.
    ///
    /// Cancels any in-flight coach task, appends the question to the lead's
    /// coaching session (starting one if needed) and spawns a streaming task
    /// that reports through the LLM event channel. Returns `false` when no
    /// lead is selected or the question is blank.
    pub fn trigger_coach(&mut self, question: &str) -> bool {
        if question.trim().is_empty() {
            return false;
        }
        let lead = match self.store.selected_lead() {
            Some(lead) => lead.clone(),
            None => {
                warn!("trigger_coach called with no lead selected, skipping");
                return false;
            }
        };

        self.cancel_llm_task();

        if self.coach_session.as_ref().map(CoachSession::lead_id) != Some(lead.id) {
            self.coach_session = Some(CoachSession::new(lead.id));
        }
        let Some(session) = self.coach_session.as_mut() else {
            return false;
        };
        if !session.push_question(question) {
            return false;
        }
        let history = session.history().to_vec();

        let coach = Arc::clone(&self.coach);
        let tx = self.llm_tx.clone();
        let lead_id = lead.id;

        self.llm_generation += 1;
        let generation = self.llm_generation;
        self.coach_streaming = true;

        let handle = tokio::spawn(async move {
            coach.stream_coach_reply(&lead, &history, tx, generation).await;
        });
        self.current_llm_task = Some(handle);
        info!(lead_id, generation, "Triggered coach reply");
        true
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on two channels using `tokio::select!`:
/// 1. LLM streaming events from coach tasks
/// 2. User commands from the front end
///
/// Pushes UI updates through `ui_tx`.
pub async fn run(
    mut llm_rx: mpsc::Receiver<LlmEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    // When the LLM channel closes, stop polling it so select! never spins.
    let mut llm_open = true;

    loop {
        tokio::select! {
            // --- LLM events (only poll when channel is open) ---
            llm_event = llm_rx.recv(), if llm_open => {
                match llm_event {
                    Some(event) => {
                        handle_llm_event(&mut state, event, &ui_tx).await;
                    }
                    None => {
                        info!("LLM channel closed");
                        llm_open = false;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    state.cancel_llm_task();
    Ok(())
}

/// Handle a streamed coach event.
///
/// Events whose generation differs from `state.llm_generation` come from a
/// cancelled task and are dropped. After a `Complete` or `Error` the stream
/// is marked finished, so any further event for it is dropped as well.
async fn handle_llm_event(state: &mut AppState, event: LlmEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    if event.generation() != state.llm_generation {
        debug!(
            "Discarding stale LLM event (event gen: {}, current gen: {})",
            event.generation(),
            state.llm_generation
        );
        return;
    }

    let session = match state.coach_session.as_mut() {
        Some(session) if state.coach_streaming => session,
        _ => {
            debug!("Received LLM event with no active coach stream, discarding");
            return;
        }
    };

    match event {
        LlmEvent::Token { text, .. } => {
            let _ = ui_tx.send(UiUpdate::CoachToken(text)).await;
        }
        LlmEvent::Complete { full_text, .. } => {
            let reply = match full_text.trim() {
                "" => COACH_FALLBACK.to_string(),
                text => text.to_string(),
            };
            session.push_reply(reply.clone());
            state.coach_streaming = false;
            state.current_llm_task = None;
            let _ = ui_tx.send(UiUpdate::CoachComplete(reply)).await;
        }
        LlmEvent::Error { message, .. } => {
            warn!("Coach stream error: {}", message);
            session.push_reply(COACH_FALLBACK);
            state.coach_streaming = false;
            state.current_llm_task = None;
            let _ = ui_tx.send(UiUpdate::CoachError(COACH_FALLBACK.to_string())).await;
        }
    }
}

/// Handle a user command from the front end.
async fn handle_user_command(state: &mut AppState, cmd: UserCommand, ui_tx: &mpsc::Sender<UiUpdate>) {
    let update = match cmd {
        UserCommand::ListLeads(filter) => UiUpdate::Leads {
            filter,
            leads: state
                .store
                .leads_by_temperature(filter)
                .into_iter()
                .cloned()
                .collect(),
        },
        UserCommand::SelectLead(id) => match state.store.lead(id) {
            Some(lead) => {
                let lead = Box::new(lead.clone());
                state.select(Some(id));
                UiUpdate::LeadDetail(lead)
            }
            None => UiUpdate::Error(format!("No existe un lead con id {id}.")),
        },
        UserCommand::Back => {
            state.select(None);
            UiUpdate::Info("Volviendo al panel.".into())
        }
        UserCommand::ShowLead => match state.store.selected_lead() {
            Some(lead) => UiUpdate::LeadDetail(Box::new(lead.clone())),
            None => UiUpdate::Error(NO_SELECTION.into()),
        },
        UserCommand::Say(text) => {
            say(state, &text, ui_tx).await;
            return;
        }
        UserCommand::Suggest => match state.store.selected_lead() {
            Some(lead) => {
                let lead = lead.clone();
                let list = state.coach.suggestions(&lead).await;
                state.last_suggestions = list.clone();
                UiUpdate::Suggestions(list)
            }
            None => UiUpdate::Error(NO_SELECTION.into()),
        },
        UserCommand::PinSuggestion(n) => pin(state, n),
        UserCommand::ListObjections => UiUpdate::Objections(state.store.objections().to_vec()),
        UserCommand::Rebut(id) => rebut(state, id).await,
        UserCommand::AddObjection(form) => add_objection(state, form),
        UserCommand::EditObjection(id, form) => edit_objection(state, id, form),
        UserCommand::DeleteObjection(id) => match state.store.delete_objection(id) {
            Ok(removed) => UiUpdate::Info(format!("Objeción eliminada: {}", removed.title)),
            Err(e) => {
                warn!(error = %e, "delete objection failed");
                UiUpdate::Error(format!("No existe una objeción con id {id}."))
            }
        },
        UserCommand::Coach(question) => {
            if state.store.selected_lead().is_none() {
                UiUpdate::Error(NO_SELECTION.into())
            } else if state.trigger_coach(&question) {
                UiUpdate::CoachStarted
            } else {
                UiUpdate::Error("La pregunta no puede estar vacía.".into())
            }
        }
        UserCommand::AddLead(form) => add_lead(state, form),
        UserCommand::EditLead(changes) => edit_lead(state, changes),
        UserCommand::ImportCsv(path) => import_csv(state, &path),
        UserCommand::Dream(description) => {
            match state
                .visualizer
                .generate_for_selected(&mut state.store, &description)
                .await
            {
                Ok(image) => UiUpdate::DreamImage(image),
                Err(e) => UiUpdate::Error(e.to_string()),
            }
        }
        UserCommand::Design {
            image,
            furniture,
            instruction,
        } => {
            design(state, &image, &furniture, instruction, ui_tx).await;
            return;
        }
        UserCommand::ListResources => UiUpdate::Resources(
            state
                .store
                .resources_by_project()
                .into_iter()
                .map(|(project, items)| (project.to_string(), items.into_iter().cloned().collect()))
                .collect(),
        ),
        UserCommand::ListEvents => {
            let today = Local::now().date_naive();
            let events = state.store.events();
            UiUpdate::Events {
                upcoming: calendar::upcoming_events(events, today, UPCOMING_EVENTS_SHOWN)
                    .into_iter()
                    .cloned()
                    .collect(),
                this_month: calendar::events_in_month(events, today.year(), today.month())
                    .into_iter()
                    .cloned()
                    .collect(),
            }
        }
        UserCommand::EventsOn(date) => UiUpdate::DayEvents {
            date,
            events: calendar::events_on(state.store.events(), date)
                .into_iter()
                .cloned()
                .collect(),
        },
        UserCommand::Quit => {
            // Handled in the main loop
            return;
        }
    };
    let _ = ui_tx.send(update).await;
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn say(state: &mut AppState, text: &str, ui_tx: &mpsc::Sender<UiUpdate>) {
    let lead_id = match state.store.selected_lead_id().filter(|id| state.store.lead(*id).is_some()) {
        Some(id) => id,
        None => {
            let _ = ui_tx.send(UiUpdate::Error(NO_SELECTION.into())).await;
            return;
        }
    };
    let before = state.store.lead(lead_id).map_or(0, |l| l.conversation.len());

    let outcome = match state
        .simulator
        .send_agent_message(&mut state.store, lead_id, text)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let _ = ui_tx.send(UiUpdate::Error(e.to_string())).await;
            return;
        }
    };

    let messages = state
        .store
        .lead(lead_id)
        .map(|l| l.conversation.get(before..).unwrap_or_default().to_vec())
        .unwrap_or_default();
    let _ = ui_tx.send(UiUpdate::NewMessages { lead_id, messages }).await;

    if let SimulationOutcome::Replied { sentiment, .. } = outcome {
        let _ = ui_tx
            .send(UiUpdate::TemperatureChanged {
                lead_id,
                temperature: sentiment.temperature,
                fallback: sentiment.fallback,
            })
            .await;
    }
}

fn pin(state: &mut AppState, n: usize) -> UiUpdate {
    let Some(lead_id) = state.store.selected_lead().map(|l| l.id) else {
        return UiUpdate::Error(NO_SELECTION.into());
    };
    let Some(text) = n.checked_sub(1).and_then(|i| state.last_suggestions.get(i)).cloned() else {
        return UiUpdate::Error(format!("No hay una sugerencia número {n}."));
    };
    match coach::pin_suggestion(&mut state.store, lead_id, &text) {
        Ok(message) => UiUpdate::NewMessages {
            lead_id,
            messages: vec![message.clone()],
        },
        Err(e) => UiUpdate::Error(e.to_string()),
    }
}

async fn rebut(state: &mut AppState, id: ObjectionId) -> UiUpdate {
    let Some(lead) = state.store.selected_lead().cloned() else {
        return UiUpdate::Error(NO_SELECTION.into());
    };
    let Some(objection) = state.store.objection(id).cloned() else {
        return UiUpdate::Error(format!("No existe una objeción con id {id}."));
    };
    let text = state.coach.objection_response(&lead, &objection).await;
    UiUpdate::Rebuttal {
        objection: objection.title,
        text,
    }
}

fn add_objection(state: &mut AppState, form: ObjectionForm) -> UiUpdate {
    match form.into_new_objection() {
        Ok(data) => {
            let title = data.title.clone();
            let id = state.store.add_objection(data);
            UiUpdate::Info(format!("Objeción agregada: {title} (id {id})."))
        }
        Err(e) => UiUpdate::Error(e.to_string()),
    }
}

fn edit_objection(state: &mut AppState, id: ObjectionId, form: ObjectionForm) -> UiUpdate {
    let Some(objection) = state.store.objection(id) else {
        return UiUpdate::Error(format!("No existe una objeción con id {id}."));
    };
    let edited = match form.apply_to(objection) {
        Ok(edited) => edited,
        Err(e) => return UiUpdate::Error(e.to_string()),
    };
    let title = edited.title.clone();
    match state.store.update_objection(edited) {
        Ok(()) => UiUpdate::Info(format!("Objeción actualizada: {title}.")),
        Err(e) => UiUpdate::Error(e.to_string()),
    }
}

fn edit_lead(state: &mut AppState, changes: Vec<(LeadField, String)>) -> UiUpdate {
    let Some(lead) = state.store.selected_lead() else {
        return UiUpdate::Error(NO_SELECTION.into());
    };
    let mut form = LeadForm::from_lead(lead);
    for (field, value) in changes {
        form.set(field, value);
    }
    let edited = match form.apply_to(lead) {
        Ok(edited) => edited,
        Err(e) => return UiUpdate::Error(e.to_string()),
    };
    let id = edited.id;
    if let Err(e) = state.store.update_lead(edited) {
        return UiUpdate::Error(e.to_string());
    }
    info!(lead_id = id, "lead edited");
    match state.store.lead(id) {
        Some(lead) => UiUpdate::LeadDetail(Box::new(lead.clone())),
        None => UiUpdate::Error(NO_SELECTION.into()),
    }
}

fn add_lead(state: &mut AppState, form: LeadForm) -> UiUpdate {
    match form.into_new_lead() {
        Ok(data) => {
            let name = data.name.clone();
            let id = state.store.add_lead(data);
            UiUpdate::Info(format!("Lead agregado: {name} (id {id})."))
        }
        Err(e) => UiUpdate::Error(e.to_string()),
    }
}

fn import_csv(state: &mut AppState, path: &Path) -> UiUpdate {
    match csv_import::import_leads_from_path(&mut state.store, path) {
        Ok(summary) => UiUpdate::Info(summary.message()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "CSV import failed");
            UiUpdate::Error(e.to_string())
        }
    }
}

async fn design(
    state: &mut AppState,
    image: &Path,
    furniture: &[String],
    instruction: String,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let room_image = match image_import::image_from_path(image) {
        Ok(room) => room,
        Err(e) => {
            let _ = ui_tx.send(UiUpdate::Error(e.to_string())).await;
            return;
        }
    };
    let selection = match FurnitureSelection::from_ids(furniture) {
        Ok(selection) => selection,
        Err(e) => {
            let _ = ui_tx.send(UiUpdate::Error(e.to_string())).await;
            return;
        }
    };
    let input = DesignInput {
        room_image: Some(room_image),
        selection,
        instruction,
    };

    // Loading states may be dropped when the front end lags; the final state
    // is always delivered.
    let progress_tx = ui_tx.clone();
    let result = state
        .compositor
        .compose(&input, |s| {
            if s.is_loading() && progress_tx.try_send(UiUpdate::DesignProgress(s)).is_err() {
                warn!("UI channel full, design progress update dropped");
            }
        })
        .await;

    let update = match result {
        Ok(image) => UiUpdate::DesignProgress(ResultState::Success(image)),
        Err(e @ DesignError::Incomplete) => UiUpdate::Error(e.to_string()),
        Err(e) => UiUpdate::DesignProgress(ResultState::Error(e.to_string())),
    };
    let _ = ui_tx.send(update).await;
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
