// In-memory application state: leads, the selected lead, the objection
// library and project resources.
//
// The selected lead is stored as an id and resolved against `leads` on every
// read, so it always reflects the latest mutation of that lead.

use chrono::Local;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{
    CalendarEvent, Lead, LeadId, Message, NewLead, NewMessage, NewObjection, Objection,
    ObjectionId, ProjectResource, Temperature,
};
use crate::seed;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("lead {0} not found")]
    LeadNotFound(LeadId),

    #[error("objection {0} not found")]
    ObjectionNotFound(ObjectionId),
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Timestamp-based id source. Ids are milliseconds since the epoch, bumped
/// past the previous id whenever the clock has not advanced, so every id
/// handed out by one generator is unique and increasing.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let now = u64::try_from(Local::now().timestamp_millis()).unwrap_or(0);
        self.last = now.max(self.last + 1);
        self.last
    }
}

// ---------------------------------------------------------------------------
// MobiState
// ---------------------------------------------------------------------------

/// Process-local, single-writer store. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct MobiState {
    leads: Vec<Lead>,
    selected_lead_id: Option<LeadId>,
    objections: Vec<Objection>,
    resources: Vec<ProjectResource>,
    events: Vec<CalendarEvent>,
    ids: IdGenerator,
}

impl Default for MobiState {
    fn default() -> Self {
        Self::empty()
    }
}

impl MobiState {
    /// A store with no data at all.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn new(
        leads: Vec<Lead>,
        objections: Vec<Objection>,
        resources: Vec<ProjectResource>,
        events: Vec<CalendarEvent>,
    ) -> Self {
        Self {
            leads,
            selected_lead_id: None,
            objections,
            resources,
            events,
            ids: IdGenerator::new(),
        }
    }

    /// A store populated with the demo leads, objections, resources and
    /// calendar events.
    pub fn with_seed_data() -> Self {
        let today = Local::now().date_naive();
        Self::new(
            seed::initial_leads(),
            seed::initial_objections(),
            seed::initial_resources(),
            seed::initial_events(today),
        )
    }

    // -- Reads --

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, id: LeadId) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    /// Leads matching a temperature filter; `None` returns all of them.
    pub fn leads_by_temperature(&self, filter: Option<Temperature>) -> Vec<&Lead> {
        self.leads
            .iter()
            .filter(|l| filter.map_or(true, |t| l.temperature == t))
            .collect()
    }

    pub fn selected_lead_id(&self) -> Option<LeadId> {
        self.selected_lead_id
    }

    /// The selected lead as it currently exists in the collection.
    pub fn selected_lead(&self) -> Option<&Lead> {
        self.selected_lead_id.and_then(|id| self.lead(id))
    }

    pub fn objections(&self) -> &[Objection] {
        &self.objections
    }

    pub fn objection(&self, id: ObjectionId) -> Option<&Objection> {
        self.objections.iter().find(|o| o.id == id)
    }

    pub fn resources(&self) -> &[ProjectResource] {
        &self.resources
    }

    pub fn resources_for_project(&self, project: &str) -> Vec<&ProjectResource> {
        self.resources.iter().filter(|r| r.project == project).collect()
    }

    /// Resources grouped by project, in order of first appearance.
    pub fn resources_by_project(&self) -> Vec<(&str, Vec<&ProjectResource>)> {
        let mut groups: Vec<(&str, Vec<&ProjectResource>)> = Vec::new();
        for res in &self.resources {
            match groups.iter_mut().find(|(p, _)| *p == res.project) {
                Some((_, items)) => items.push(res),
                None => groups.push((res.project.as_str(), vec![res])),
            }
        }
        groups
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    // -- Lead mutations --

    /// Point the selection at a lead, or clear it. No validation: selecting an
    /// unknown id simply resolves to no lead.
    pub fn select_lead(&mut self, id: Option<LeadId>) {
        debug!(?id, "select lead");
        self.selected_lead_id = id;
    }

    /// Append a message to a lead's conversation, stamping its id and the
    /// current local time.
    pub fn add_message(&mut self, lead_id: LeadId, message: NewMessage) -> Result<&Message, StoreError> {
        let timestamp = Local::now().format("%H:%M").to_string();
        self.add_message_at(lead_id, message, timestamp)
    }

    /// Like [`add_message`](Self::add_message) with an explicit timestamp.
    pub fn add_message_at(
        &mut self,
        lead_id: LeadId,
        message: NewMessage,
        timestamp: String,
    ) -> Result<&Message, StoreError> {
        let lead = self.lead_mut(lead_id)?;
        let msg = Message {
            id: lead.conversation.len() as u64 + 1,
            sender: message.sender,
            text: message.text,
            timestamp,
        };
        debug!(lead_id, msg_id = msg.id, sender = ?msg.sender, "append message");
        lead.conversation.push(msg);
        let last = lead.conversation.len() - 1;
        Ok(&lead.conversation[last])
    }

    pub fn update_temperature(&mut self, lead_id: LeadId, temperature: Temperature) -> Result<(), StoreError> {
        let lead = self.lead_mut(lead_id)?;
        if lead.temperature != temperature {
            info!(lead_id, from = %lead.temperature, to = %temperature, "lead temperature changed");
        }
        lead.temperature = temperature;
        Ok(())
    }

    /// Insert a new lead with a fresh id and an empty conversation.
    pub fn add_lead(&mut self, data: NewLead) -> LeadId {
        let id = self.ids.next_id();
        info!(id, name = %data.name, project = %data.project, "lead added");
        self.leads.push(data.into_lead(id));
        id
    }

    /// Insert several leads, each with its own fresh id. Returns the ids in
    /// input order.
    pub fn add_multiple_leads(&mut self, data: Vec<NewLead>) -> Vec<LeadId> {
        let mut ids = Vec::with_capacity(data.len());
        for item in data {
            let id = self.ids.next_id();
            self.leads.push(item.into_lead(id));
            ids.push(id);
        }
        info!(count = ids.len(), "leads added in bulk");
        ids
    }

    /// Replace the lead with the same id.
    pub fn update_lead(&mut self, updated: Lead) -> Result<(), StoreError> {
        let lead = self.lead_mut(updated.id)?;
        *lead = updated;
        Ok(())
    }

    fn lead_mut(&mut self, id: LeadId) -> Result<&mut Lead, StoreError> {
        self.leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::LeadNotFound(id))
    }

    // -- Objection CRUD --

    pub fn add_objection(&mut self, data: NewObjection) -> ObjectionId {
        let id = self.ids.next_id();
        info!(id, title = %data.title, "objection added");
        self.objections.push(Objection {
            id,
            title: data.title,
            arguments: data.arguments,
        });
        id
    }

    pub fn update_objection(&mut self, updated: Objection) -> Result<(), StoreError> {
        let obj = self
            .objections
            .iter_mut()
            .find(|o| o.id == updated.id)
            .ok_or(StoreError::ObjectionNotFound(updated.id))?;
        *obj = updated;
        Ok(())
    }

    pub fn delete_objection(&mut self, id: ObjectionId) -> Result<Objection, StoreError> {
        let idx = self
            .objections
            .iter()
            .position(|o| o.id == id)
            .ok_or(StoreError::ObjectionNotFound(id))?;
        info!(id, "objection deleted");
        Ok(self.objections.remove(idx))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
