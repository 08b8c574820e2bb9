// Lead and objection form handling: validation and conversion into store
// records.

use thiserror::Error;

use crate::model::{Lead, NewLead, NewObjection, Objection, Temperature, DEFAULT_OWNER, DEFAULT_STAGE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("El nombre y el proyecto son obligatorios.")]
    MissingNameOrProject,

    #[error("El título y al menos un argumento son obligatorios.")]
    IncompleteObjection,
}

// ---------------------------------------------------------------------------
// Lead form
// ---------------------------------------------------------------------------

/// Raw text fields of the add/edit lead form.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadForm {
    pub name: String,
    pub project: String,
    /// Temperature label; unknown labels become `Tibio`.
    pub temperature: String,
    pub persona: String,
    pub phone: String,
    pub email: String,
    pub stage: String,
    pub owner: String,
    /// Comma-separated tags.
    pub tags: String,
}

impl Default for LeadForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            project: String::new(),
            temperature: Temperature::Warm.label().to_string(),
            persona: String::new(),
            phone: String::new(),
            email: String::new(),
            stage: DEFAULT_STAGE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            tags: String::new(),
        }
    }
}

impl LeadForm {
    /// Pre-fill the form from an existing lead for editing.
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            project: lead.project.clone(),
            temperature: lead.temperature.label().to_string(),
            persona: lead.persona.clone(),
            phone: lead.phone.clone().unwrap_or_default(),
            email: lead.email.clone().unwrap_or_default(),
            stage: lead.stage.clone().unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            owner: lead.owner.clone().unwrap_or_else(|| DEFAULT_OWNER.to_string()),
            tags: lead.tags.join(", "),
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() || self.project.trim().is_empty() {
            return Err(FormError::MissingNameOrProject);
        }
        Ok(())
    }

    fn parsed_tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn non_empty(s: &str) -> Option<String> {
        (!s.trim().is_empty()).then(|| s.to_string())
    }

    /// Validate and convert into a new lead record.
    pub fn into_new_lead(self) -> Result<NewLead, FormError> {
        self.validate()?;
        let tags = self.parsed_tags();
        Ok(NewLead {
            temperature: Temperature::from_label_or_warm(&self.temperature),
            phone: Self::non_empty(&self.phone),
            email: Self::non_empty(&self.email),
            stage: Some(Self::non_empty(&self.stage).unwrap_or_else(|| DEFAULT_STAGE.to_string())),
            owner: Some(Self::non_empty(&self.owner).unwrap_or_else(|| DEFAULT_OWNER.to_string())),
            name: self.name,
            project: self.project,
            persona: self.persona,
            job_title: None,
            company: None,
            tags,
        })
    }

    /// Validate and merge the form into a copy of `lead`, keeping its id,
    /// conversation and fields the form does not cover.
    pub fn apply_to(self, lead: &Lead) -> Result<Lead, FormError> {
        let new = self.into_new_lead()?;
        Ok(Lead {
            id: lead.id,
            conversation: lead.conversation.clone(),
            job_title: lead.job_title.clone(),
            company: lead.company.clone(),
            name: new.name,
            project: new.project,
            temperature: new.temperature,
            persona: new.persona,
            phone: new.phone,
            email: new.email,
            stage: new.stage,
            owner: new.owner,
            tags: new.tags,
        })
    }
}

/// One field of the lead form, addressed by its Spanish key in text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Project,
    Persona,
    Temperature,
    Phone,
    Email,
    Stage,
    Owner,
    Tags,
}

impl LeadField {
    pub const ALL: [LeadField; 9] = [
        LeadField::Name,
        LeadField::Project,
        LeadField::Persona,
        LeadField::Temperature,
        LeadField::Phone,
        LeadField::Email,
        LeadField::Stage,
        LeadField::Owner,
        LeadField::Tags,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LeadField::Name => "nombre",
            LeadField::Project => "proyecto",
            LeadField::Persona => "persona",
            LeadField::Temperature => "temperatura",
            LeadField::Phone => "telefono",
            LeadField::Email => "email",
            LeadField::Stage => "etapa",
            LeadField::Owner => "responsable",
            LeadField::Tags => "etiquetas",
        }
    }

    /// Case-insensitive; `teléfono` is accepted with the accent.
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if s == "teléfono" {
            return Some(LeadField::Phone);
        }
        Self::ALL.into_iter().find(|f| f.key() == s)
    }
}

impl LeadForm {
    pub fn set(&mut self, field: LeadField, value: impl Into<String>) {
        let value = value.into();
        match field {
            LeadField::Name => self.name = value,
            LeadField::Project => self.project = value,
            LeadField::Persona => self.persona = value,
            LeadField::Temperature => self.temperature = value,
            LeadField::Phone => self.phone = value,
            LeadField::Email => self.email = value,
            LeadField::Stage => self.stage = value,
            LeadField::Owner => self.owner = value,
            LeadField::Tags => self.tags = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Objection form
// ---------------------------------------------------------------------------

/// Title plus a block of rebuttal arguments, one per line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectionForm {
    pub title: String,
    pub arguments: String,
}

impl ObjectionForm {
    pub fn from_objection(objection: &Objection) -> Self {
        Self {
            title: objection.title.clone(),
            arguments: objection.arguments.join("\n"),
        }
    }

    fn parsed_arguments(&self) -> Vec<String> {
        self.arguments
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn into_new_objection(self) -> Result<NewObjection, FormError> {
        let arguments = self.parsed_arguments();
        if self.title.trim().is_empty() || arguments.is_empty() {
            return Err(FormError::IncompleteObjection);
        }
        Ok(NewObjection {
            title: self.title,
            arguments,
        })
    }

    pub fn apply_to(self, objection: &Objection) -> Result<Objection, FormError> {
        let new = self.into_new_objection()?;
        Ok(Objection {
            id: objection.id,
            title: new.title,
            arguments: new.arguments,
        })
    }
}
