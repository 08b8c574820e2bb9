// Plain-text rendering of UI updates.

use std::fmt::Write;

use mobi_app::design::ResultState;
use mobi_app::protocol::UiUpdate;
use mobi_core::{CalendarEvent, Lead, Message, Sender, Temperature};

/// Data URLs longer than this are abbreviated in the transcript.
const DATA_URL_PREVIEW: usize = 48;

fn sender_label<'a>(sender: Sender, lead_name: &'a str) -> &'a str {
    match sender {
        Sender::Agent => "Agente",
        Sender::Lead => lead_name,
        Sender::MobiSuggestion => "Mobi (sugerencia)",
        Sender::MobiImage => "Mobi (imagen)",
    }
}

/// Shorten `data:` URLs so a generated image does not flood the terminal.
pub fn abbreviate_data_urls(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.starts_with("data:") && line.chars().count() > DATA_URL_PREVIEW {
                let head: String = line.chars().take(DATA_URL_PREVIEW).collect();
                format!("{head}... ({} caracteres)", line.chars().count())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn message_line(message: &Message, lead_name: &str) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp,
        sender_label(message.sender, lead_name),
        abbreviate_data_urls(&message.text)
    )
}

fn lead_row(lead: &Lead) -> String {
    let last = lead
        .last_message()
        .map(|m| abbreviate_data_urls(&m.text).lines().next().unwrap_or_default().to_string())
        .unwrap_or_default();
    format!(
        "  [{}] {} · {} · {}  {}",
        lead.id, lead.name, lead.project, lead.temperature, last
    )
}

fn lead_detail(lead: &Lead) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} · {} ({})", lead.name, lead.headline(), lead.temperature);
    if !lead.persona.is_empty() {
        let _ = writeln!(out, "Perfil: {}", lead.persona);
    }
    for (label, value) in [
        ("Teléfono", &lead.phone),
        ("Email", &lead.email),
        ("Etapa", &lead.stage),
        ("Responsable", &lead.owner),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    if !lead.tags.is_empty() {
        let _ = writeln!(out, "Etiquetas: {}", lead.tags.join(", "));
    }
    let _ = writeln!(out, "--- Conversación ---");
    if lead.conversation.is_empty() {
        let _ = writeln!(out, "(sin mensajes)");
    }
    for message in &lead.conversation {
        let _ = writeln!(out, "{}", message_line(message, &lead.name));
    }
    out.trim_end().to_string()
}

fn event_line(event: &CalendarEvent) -> String {
    format!(
        "  {} {} · {} ({})",
        event.date.format("%d/%m"),
        event.time,
        event.title,
        event.description
    )
}

fn filter_label(filter: Option<Temperature>) -> &'static str {
    filter.map_or("Todos", Temperature::label)
}

/// Text for one update. Streaming coach updates are handled by the caller.
pub fn render(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Leads { filter, leads } => {
            let mut out = format!("Leads ({}): {}", filter_label(*filter), leads.len());
            for lead in leads {
                out.push('\n');
                out.push_str(&lead_row(lead));
            }
            out
        }
        UiUpdate::LeadDetail(lead) => lead_detail(lead),
        UiUpdate::NewMessages { messages, .. } => messages
            .iter()
            .map(|m| message_line(m, "Lead"))
            .collect::<Vec<_>>()
            .join("\n"),
        UiUpdate::TemperatureChanged {
            temperature,
            fallback,
            ..
        } => {
            if *fallback {
                format!("Temperatura: {temperature} (no se pudo analizar el mensaje)")
            } else {
                format!("Temperatura: {temperature}")
            }
        }
        UiUpdate::Suggestions(list) => {
            if list.is_empty() {
                return "Mobi no tiene sugerencias por ahora.".to_string();
            }
            let mut out = String::from("Sugerencias de Mobi:");
            for (i, s) in list.iter().enumerate() {
                let _ = write!(out, "\n  {}. {s}", i + 1);
            }
            out
        }
        UiUpdate::Objections(list) => {
            let mut out = String::from("Manual de objeciones:");
            for objection in list {
                let _ = write!(out, "\n  [{}] {}", objection.id, objection.title);
                for argument in &objection.arguments {
                    let _ = write!(out, "\n      - {argument}");
                }
            }
            out
        }
        UiUpdate::Rebuttal { objection, text } => format!("Respuesta a \"{objection}\":\n{text}"),
        UiUpdate::CoachStarted => "Mobi está pensando...".to_string(),
        UiUpdate::CoachToken(text) => text.clone(),
        UiUpdate::CoachComplete(text) => format!("Mobi: {text}"),
        UiUpdate::CoachError(text) => format!("Mobi: {text}"),
        UiUpdate::DesignProgress(state) => match state {
            ResultState::Welcome => "Mobi Design listo.".to_string(),
            ResultState::Loading(message) => message.clone(),
            ResultState::Success(image) => format!("Diseño listo ({}).", image.mime_type),
            ResultState::Error(message) => format!("Error: {message}"),
        },
        UiUpdate::DreamImage(image) => {
            let mut out = format!("Imagen generada: {}", abbreviate_data_urls(&image.data_url));
            if let Some(lead_id) = image.posted_to {
                let _ = write!(out, "\nEnviada a la conversación del lead {lead_id}.");
            }
            out
        }
        UiUpdate::Resources(groups) => {
            let mut out = String::from("Recursos:");
            for (project, items) in groups {
                let _ = write!(out, "\n  {project}");
                for item in items {
                    let _ = write!(out, "\n    - {} ({:?}) {}", item.name, item.kind, item.url);
                }
            }
            out
        }
        UiUpdate::Events {
            upcoming,
            this_month,
        } => {
            let mut out = String::from("Próximos eventos:");
            if upcoming.is_empty() {
                out.push_str("\n  (ninguno)");
            }
            for event in upcoming {
                out.push('\n');
                out.push_str(&event_line(event));
            }
            out.push_str("\nEste mes:");
            for event in this_month {
                out.push('\n');
                out.push_str(&event_line(event));
            }
            out
        }
        UiUpdate::DayEvents { date, events } => {
            let mut out = format!("Eventos del {}:", date.format("%d/%m/%Y"));
            if events.is_empty() {
                out.push_str("\n  (ninguno)");
            }
            for event in events {
                out.push('\n');
                out.push_str(&event_line(event));
            }
            out
        }
        UiUpdate::Info(text) => text.clone(),
        UiUpdate::Error(text) => format!("Error: {text}"),
    }
}
