// Core domain for the Mobi sales assistant: data model, in-memory store,
// CSV lead import, forms, seed data, calendar queries and configuration.

pub mod calendar;
pub mod config;
pub mod csv_import;
pub mod form;
pub mod model;
pub mod seed;
pub mod store;

pub use model::{
    CalendarEvent, ImageFile, Lead, LeadId, Message, NewLead, NewMessage, NewObjection, Objection,
    ObjectionId, ProjectResource, ResourceKind, Sender, Temperature,
};
pub use store::{MobiState, StoreError};
