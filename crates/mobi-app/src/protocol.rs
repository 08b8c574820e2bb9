// Messages exchanged between the front end and the app loop.
//
// The front end sends `UserCommand`s; the app loop answers with `UiUpdate`s.
// Both travel over tokio mpsc channels.

use std::path::PathBuf;

use chrono::NaiveDate;
use mobi_core::form::{LeadField, LeadForm, ObjectionForm};
use mobi_core::{
    CalendarEvent, Lead, LeadId, Message, Objection, ObjectionId, ProjectResource, Temperature,
};

use crate::design::ResultState;
use crate::visualizer::DreamImage;

/// Commands from the front end to the app loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Dashboard list, optionally filtered by temperature.
    ListLeads(Option<Temperature>),
    SelectLead(LeadId),
    /// Clear the selection.
    Back,
    /// Show the selected lead with its conversation.
    ShowLead,
    /// Send an agent message to the selected lead.
    Say(String),
    /// Ask the coach for next-step suggestions for the selected lead.
    Suggest,
    /// Pin the n-th (1-based) suggestion of the last `Suggest`.
    PinSuggestion(usize),
    ListObjections,
    /// Rebuttal for an objection, tailored to the selected lead.
    Rebut(ObjectionId),
    AddObjection(ObjectionForm),
    /// Replace an objection's title and arguments.
    EditObjection(ObjectionId, ObjectionForm),
    DeleteObjection(ObjectionId),
    /// Question for the coaching chat about the selected lead.
    Coach(String),
    AddLead(LeadForm),
    /// Change fields of the selected lead; the others keep their values.
    EditLead(Vec<(LeadField, String)>),
    ImportCsv(PathBuf),
    Dream(String),
    Design {
        image: PathBuf,
        furniture: Vec<String>,
        instruction: String,
    },
    ListResources,
    ListEvents,
    /// Calendar events on one day.
    EventsOn(NaiveDate),
    Quit,
}

/// Updates from the app loop to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Leads {
        filter: Option<Temperature>,
        leads: Vec<Lead>,
    },
    LeadDetail(Box<Lead>),
    /// Messages appended to a lead's conversation by the last command.
    NewMessages {
        lead_id: LeadId,
        messages: Vec<Message>,
    },
    TemperatureChanged {
        lead_id: LeadId,
        temperature: Temperature,
        /// The classifier failed and the default was applied.
        fallback: bool,
    },
    Suggestions(Vec<String>),
    Objections(Vec<Objection>),
    Rebuttal {
        objection: String,
        text: String,
    },
    CoachStarted,
    CoachToken(String),
    CoachComplete(String),
    /// The coach call failed; carries the fallback line shown instead.
    CoachError(String),
    DesignProgress(ResultState),
    DreamImage(DreamImage),
    Resources(Vec<(String, Vec<ProjectResource>)>),
    Events {
        upcoming: Vec<CalendarEvent>,
        this_month: Vec<CalendarEvent>,
    },
    DayEvents {
        date: NaiveDate,
        events: Vec<CalendarEvent>,
    },
    Info(String),
    Error(String),
}
