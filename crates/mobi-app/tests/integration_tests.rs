// Integration tests for the Mobi application layer.
//
// These drive the app loop end-to-end through its command and update
// channels, with the seeded store and a scripted generative model standing
// in for the remote API.

use std::path::PathBuf;
use std::sync::Arc;

use mobi_app::app::{self, AppState};
use mobi_app::design::ResultState;
use mobi_app::protocol::{UiUpdate, UserCommand};
use mobi_app::testing::ScriptedModel;
use mobi_core::config::Config;
use mobi_core::form::LeadField;
use mobi_core::{ImageFile, MobiState, Sender, Temperature};
use mobi_llm::LlmClient;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Seeded lead used throughout (Ana García, Tibio).
const ANA: u64 = 1;

struct Harness {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    fn start(model: ScriptedModel) -> Self {
        Self::start_with(Arc::new(model))
    }

    fn start_with(model: Arc<dyn mobi_llm::GenerativeModel>) -> Self {
        let (llm_tx, llm_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let state = AppState::new(Config::default(), MobiState::with_seed_data(), model, llm_tx);
        let handle = tokio::spawn(app::run(llm_rx, cmd_rx, ui_tx, state));
        Harness {
            cmd_tx,
            ui_rx,
            handle,
        }
    }

    async fn send(&mut self, cmd: UserCommand) -> UiUpdate {
        self.cmd_tx.send(cmd).await.unwrap();
        self.ui_rx.recv().await.unwrap()
    }

    async fn next(&mut self) -> UiUpdate {
        self.ui_rx.recv().await.unwrap()
    }

    async fn quit(self) {
        self.cmd_tx.send(UserCommand::Quit).await.unwrap();
        assert!(self.handle.await.unwrap().is_ok());
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mobi_it_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn png(data: &str) -> ImageFile {
    ImageFile {
        base64: data.into(),
        mime_type: "image/png".into(),
    }
}

// ===========================================================================
// Conversation simulation
// ===========================================================================

#[tokio::test]
async fn simulated_conversation_cools_a_warm_lead() {
    let mut h = Harness::start(
        ScriptedModel::new()
            .with_text("Lo voy a pensar, está un poco caro.")
            .with_text("Frío"),
    );

    let detail = h.send(UserCommand::SelectLead(ANA)).await;
    let history_len = match detail {
        UiUpdate::LeadDetail(lead) => {
            assert_eq!(lead.temperature, Temperature::Warm);
            lead.conversation.len()
        }
        other => panic!("expected LeadDetail, got {other:?}"),
    };

    match h.send(UserCommand::Say("¿Le envío la cotización?".into())).await {
        UiUpdate::NewMessages { messages, .. } => {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].id as usize, history_len + 1);
            assert_eq!(messages[1].sender, Sender::Lead);
        }
        other => panic!("expected NewMessages, got {other:?}"),
    }
    assert_eq!(
        h.next().await,
        UiUpdate::TemperatureChanged {
            lead_id: ANA,
            temperature: Temperature::Cold,
            fallback: false,
        }
    );

    match h.send(UserCommand::ListLeads(Some(Temperature::Cold))).await {
        UiUpdate::Leads { leads, .. } => assert!(leads.iter().any(|l| l.id == ANA)),
        other => panic!("expected Leads, got {other:?}"),
    }
    h.quit().await;
}

#[tokio::test]
async fn unconfigured_client_degrades_to_apology() {
    // No API key: every call fails with NotConfigured and the fallbacks apply.
    let mut h = Harness::start_with(Arc::new(LlmClient::Disabled));
    h.send(UserCommand::SelectLead(ANA)).await;

    match h.send(UserCommand::Say("Hola".into())).await {
        UiUpdate::NewMessages { messages, .. } => {
            assert_eq!(
                messages[1].text,
                "Lo siento, tuve un problema. ¿Podemos continuar más tarde?"
            );
        }
        other => panic!("expected NewMessages, got {other:?}"),
    }

    match h.send(UserCommand::Suggest).await {
        UiUpdate::Suggestions(list) => assert_eq!(list.len(), 3),
        other => panic!("expected Suggestions, got {other:?}"),
    }

    h.send(UserCommand::Coach("¿Qué hago?".into())).await;
    assert!(matches!(h.next().await, UiUpdate::CoachError(_)));
    h.quit().await;
}

// ===========================================================================
// Import and forms
// ===========================================================================

#[tokio::test]
async fn csv_import_adds_leads() {
    let dir = temp_dir("csv");
    let path = dir.join("leads.csv");
    std::fs::write(
        &path,
        "nombre,proyecto,temperatura,persona\n\
         Rosa Díaz,Torre Sol,Caliente,Busca 3 dormitorios\n\
         Pedro Ruiz,Loft Urbano,,\n",
    )
    .unwrap();

    let mut h = Harness::start(ScriptedModel::new());
    assert_eq!(
        h.send(UserCommand::ImportCsv(path)).await,
        UiUpdate::Info("2 leads importados correctamente.".into())
    );

    match h.send(UserCommand::ListLeads(None)).await {
        UiUpdate::Leads { leads, .. } => {
            let rosa = leads.iter().find(|l| l.name == "Rosa Díaz").unwrap();
            assert_eq!(rosa.temperature, Temperature::Hot);
            let pedro = leads.iter().find(|l| l.name == "Pedro Ruiz").unwrap();
            assert_eq!(pedro.temperature, Temperature::Warm);
            assert_ne!(rosa.id, pedro.id);
        }
        other => panic!("expected Leads, got {other:?}"),
    }

    let missing = h.send(UserCommand::ImportCsv(dir.join("nope.csv"))).await;
    assert!(matches!(missing, UiUpdate::Error(_)));
    h.quit().await;
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn edited_lead_is_what_show_returns() {
    let mut h = Harness::start(ScriptedModel::new());
    h.send(UserCommand::SelectLead(ANA)).await;

    let edited = h
        .send(UserCommand::EditLead(vec![
            (LeadField::Stage, "Propuesta".into()),
            (LeadField::Temperature, "Frío".into()),
        ]))
        .await;
    let shown = h.send(UserCommand::ShowLead).await;
    assert_eq!(edited, shown);
    match shown {
        UiUpdate::LeadDetail(lead) => {
            assert_eq!(lead.stage.as_deref(), Some("Propuesta"));
            assert_eq!(lead.temperature, Temperature::Cold);
            assert_eq!(lead.name, "Ana García");
            assert!(!lead.conversation.is_empty());
        }
        other => panic!("expected LeadDetail, got {other:?}"),
    }

    match h.send(UserCommand::ListLeads(Some(Temperature::Cold))).await {
        UiUpdate::Leads { leads, .. } => assert!(leads.iter().any(|l| l.id == ANA)),
        other => panic!("expected Leads, got {other:?}"),
    }
    h.quit().await;
}

// ===========================================================================
// Image features
// ===========================================================================

#[tokio::test]
async fn dream_image_is_posted_to_selected_lead() {
    let mut h = Harness::start(
        ScriptedModel::new().with_images(vec![ImageFile {
            base64: "QUJD".into(),
            mime_type: "image/jpeg".into(),
        }]),
    );
    h.send(UserCommand::SelectLead(ANA)).await;

    match h.send(UserCommand::Dream("Cocina con isla de mármol".into())).await {
        UiUpdate::DreamImage(image) => {
            assert_eq!(image.data_url, "data:image/jpeg;base64,QUJD");
            assert_eq!(image.posted_to, Some(ANA));
        }
        other => panic!("expected DreamImage, got {other:?}"),
    }

    match h.send(UserCommand::ShowLead).await {
        UiUpdate::LeadDetail(lead) => {
            let last = lead.last_message().unwrap();
            assert_eq!(last.sender, Sender::MobiImage);
            assert!(last.text.starts_with("Imagen generada para: \"Cocina con isla de mármol\""));
        }
        other => panic!("expected LeadDetail, got {other:?}"),
    }

    assert_eq!(
        h.send(UserCommand::Dream("   ".into())).await,
        UiUpdate::Error("Por favor, introduce una descripción.".into())
    );
    h.quit().await;
}

#[tokio::test]
async fn design_pipeline_reports_progress() {
    let dir = temp_dir("design");
    let room = dir.join("sala.png");
    std::fs::write(&room, b"\x89PNG").unwrap();

    let mut h = Harness::start(
        ScriptedModel::new()
            .with_text("Coloca el sofá S-2 frente a la ventana.")
            .with_edit(png("RESULT")),
    );
    h.cmd_tx
        .send(UserCommand::Design {
            image: room.clone(),
            furniture: vec!["sofa-2".into(), "decor-1".into()],
            instruction: "Haz la sala acogedora".into(),
        })
        .await
        .unwrap();

    assert_eq!(
        h.next().await,
        UiUpdate::DesignProgress(ResultState::Loading("Analizando tu petición...".into()))
    );
    assert_eq!(
        h.next().await,
        UiUpdate::DesignProgress(ResultState::Loading("Creando tu diseño...".into()))
    );
    assert_eq!(
        h.next().await,
        UiUpdate::DesignProgress(ResultState::Success(png("RESULT")))
    );

    // Blank instruction: rejected up front, no progress states.
    let update = h
        .send(UserCommand::Design {
            image: room,
            furniture: vec!["sofa-2".into()],
            instruction: " ".into(),
        })
        .await;
    assert_eq!(
        update,
        UiUpdate::Error("Por favor, completa todos los pasos antes de generar.".into())
    );
    h.quit().await;
    let _ = std::fs::remove_dir_all(&dir);
}

// ===========================================================================
// Read-only views
// ===========================================================================

#[tokio::test]
async fn resources_and_events_views() {
    let mut h = Harness::start(ScriptedModel::new());

    match h.send(UserCommand::ListResources).await {
        UiUpdate::Resources(groups) => {
            assert!(!groups.is_empty());
            assert!(groups.iter().all(|(_, items)| !items.is_empty()));
        }
        other => panic!("expected Resources, got {other:?}"),
    }

    match h.send(UserCommand::ListEvents).await {
        UiUpdate::Events { upcoming, this_month } => {
            assert!(upcoming.len() <= app::UPCOMING_EVENTS_SHOWN);
            // The seed always has an event on the first of the current month.
            assert!(!this_month.is_empty());
        }
        other => panic!("expected Events, got {other:?}"),
    }

    match h.send(UserCommand::ListObjections).await {
        UiUpdate::Objections(list) => assert_eq!(list.len(), 3),
        other => panic!("expected Objections, got {other:?}"),
    }
    h.quit().await;
}
