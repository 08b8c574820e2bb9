// Domain types: leads, conversation messages, objections, project resources
// and calendar events.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type LeadId = u64;
pub type ObjectionId = u64;

/// Pipeline stages a lead moves through, in order.
pub const PIPELINE_STAGES: [&str; 5] = ["Nuevo", "Contactado", "Calificado", "Propuesta", "Negociación"];

/// Stage assigned to leads created without one.
pub const DEFAULT_STAGE: &str = "Nuevo";

/// Owner stamped on every lead created through the form or CSV import.
pub const DEFAULT_OWNER: &str = "Agente Principal";

// ---------------------------------------------------------------------------
// Temperature
// ---------------------------------------------------------------------------

/// Three-valued buying-intent signal for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Temperature {
    #[serde(rename = "Caliente")]
    Hot,
    #[default]
    #[serde(rename = "Tibio")]
    Warm,
    #[serde(rename = "Frío")]
    Cold,
}

impl Temperature {
    pub const ALL: [Temperature; 3] = [Temperature::Hot, Temperature::Warm, Temperature::Cold];

    /// Display label shown on lead cards and used in imported files.
    pub fn label(self) -> &'static str {
        match self {
            Temperature::Hot => "Caliente",
            Temperature::Warm => "Tibio",
            Temperature::Cold => "Frío",
        }
    }

    /// Parse a display label (`Caliente`, `Tibio`, `Frío`) or an English
    /// variant name. Matching ignores case and surrounding whitespace, and
    /// `Frio` without the accent is accepted.
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "caliente" | "hot" => Some(Temperature::Hot),
            "tibio" | "warm" => Some(Temperature::Warm),
            "frío" | "frio" | "cold" => Some(Temperature::Cold),
            _ => None,
        }
    }

    /// Only the exact display labels, as written by the lead form and
    /// expected in imported files.
    pub fn from_exact_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == s.trim())
    }

    /// Like [`from_label`](Self::from_label) but falls back to `Warm`.
    pub fn from_label_or_warm(s: &str) -> Self {
        Self::from_label(s).unwrap_or(Temperature::Warm)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sender {
    Agent,
    Lead,
    MobiSuggestion,
    MobiImage,
}

impl Sender {
    /// Speaker label used when a conversation is rendered as a transcript.
    /// Everything that is not the agent is attributed to the lead.
    pub fn transcript_label(self) -> &'static str {
        match self {
            Sender::Agent => "Agente",
            _ => "Lead",
        }
    }
}

/// One entry in a lead's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// 1-based position in the conversation at append time.
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    /// Display timestamp (e.g. "10:02").
    pub timestamp: String,
}

/// A message before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender: Sender,
    pub text: String,
}

impl NewMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text)
    }

    pub fn lead(text: impl Into<String>) -> Self {
        Self::new(Sender::Lead, text)
    }
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

/// A sales prospect tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub project: String,
    pub temperature: Temperature,
    /// Free-text profile used to condition generated dialogue.
    pub persona: String,
    pub conversation: Vec<Message>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Lead {
    /// Headline shown under the lead's name: "job at company" when both are
    /// known, otherwise the project.
    pub fn headline(&self) -> String {
        match (&self.job_title, &self.company) {
            (Some(job), Some(company)) => format!("{job} en {company}"),
            _ => self.project.clone(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.conversation.last()
    }
}

/// Lead data before the store assigns an id and an empty conversation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewLead {
    pub name: String,
    pub project: String,
    pub temperature: Temperature,
    pub persona: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub stage: Option<String>,
    pub owner: Option<String>,
    pub tags: Vec<String>,
}

impl NewLead {
    /// Minimal record with the pipeline defaults filled in.
    pub fn new(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            stage: Some(DEFAULT_STAGE.to_string()),
            owner: Some(DEFAULT_OWNER.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn into_lead(self, id: LeadId) -> Lead {
        Lead {
            id,
            name: self.name,
            project: self.project,
            temperature: self.temperature,
            persona: self.persona,
            conversation: Vec::new(),
            job_title: self.job_title,
            company: self.company,
            phone: self.phone,
            email: self.email,
            stage: self.stage,
            owner: self.owner,
            tags: self.tags,
        }
    }
}

// ---------------------------------------------------------------------------
// Objections
// ---------------------------------------------------------------------------

/// A named sales objection with reusable rebuttal arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objection {
    pub id: ObjectionId,
    pub title: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewObjection {
    pub title: String,
    pub arguments: Vec<String>,
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pdf,
    Folder,
    Xlsx,
    Docx,
}

/// A document or folder attached to a project. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectResource {
    pub id: u64,
    pub project: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

/// A team calendar entry. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: u64,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    /// Free-form time label ("9:00 AM", "10:00 AM - 4:00 PM").
    pub time: String,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// An image held as base64 text together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub base64: String,
    pub mime_type: String,
}

impl ImageFile {
    /// Render as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}
