// Line command parsing.
//
// One command per line: a keyword, then free text or `|`-separated fields.

use std::path::PathBuf;

use mobi_app::protocol::UserCommand;
use chrono::NaiveDate;
use mobi_core::form::{LeadField, LeadForm, ObjectionForm};
use mobi_core::Temperature;
use thiserror::Error;

pub const HELP: &str = "\
Comandos:
  leads [caliente|tibio|frio]       lista de leads (filtro opcional)
  select <id>                       abrir un lead
  back                              volver al panel
  show                              ver el lead seleccionado
  say <texto>                       escribir al lead (simulación)
  suggest                           sugerencias de Mobi para el lead
  pin <n>                           fijar la sugerencia n en la conversación
  objections                        manual de objeciones
  rebut <id>                        respuesta a una objeción para el lead
  objection add <título> | <arg>; <arg>...
  objection edit <id> <título> | <arg>; <arg>...
  objection delete <id>
  coach <pregunta>                  chatear con Mobi sobre el lead
  add <nombre> | <proyecto> [| persona | temperatura | teléfono | email | etapa | etiquetas,con,coma]
  edit <campo>=<valor> [| <campo>=<valor>...]
                                    editar el lead seleccionado; campos: nombre, proyecto,
                                    persona, temperatura, telefono, email, etapa,
                                    responsable, etiquetas
  import <archivo.csv>              importar leads
  dream <descripción>               visualizar un espacio soñado
  design <foto> | <muebles,separados,por,coma> | <instrucción>
  resources                         recursos por proyecto
  events [aaaa-mm-dd]               próximos eventos, o los de un día
  help                              esta ayuda
  quit                              salir";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Comando desconocido: {0}. Escribe 'help' para ver los comandos.")]
    UnknownCommand(String),

    #[error("Uso: {0}")]
    Usage(&'static str),

    #[error("Número inválido: {0}")]
    InvalidNumber(String),

    #[error("Temperatura inválida: {0}. Usa caliente, tibio o frio.")]
    InvalidTemperature(String),

    #[error("Campo desconocido: {0}.")]
    UnknownField(String),

    #[error("Fecha inválida: {0}. Usa aaaa-mm-dd.")]
    InvalidDate(String),
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Empty,
    Help,
    Command(UserCommand),
}

pub fn parse_command(line: &str) -> Result<Input, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (line, ""),
    };

    let cmd = match keyword.to_lowercase().as_str() {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => UserCommand::Quit,
        "leads" => {
            if rest.is_empty() {
                UserCommand::ListLeads(None)
            } else {
                let t = Temperature::from_label(rest)
                    .ok_or_else(|| ParseError::InvalidTemperature(rest.to_string()))?;
                UserCommand::ListLeads(Some(t))
            }
        }
        "select" => UserCommand::SelectLead(number(rest, "select <id>")?),
        "back" => UserCommand::Back,
        "show" => UserCommand::ShowLead,
        "say" => UserCommand::Say(text(rest, "say <texto>")?),
        "suggest" => UserCommand::Suggest,
        "pin" => UserCommand::PinSuggestion(number(rest, "pin <n>")?),
        "objections" => UserCommand::ListObjections,
        "rebut" => UserCommand::Rebut(number(rest, "rebut <id>")?),
        "objection" => parse_objection(rest)?,
        "coach" => UserCommand::Coach(text(rest, "coach <pregunta>")?),
        "add" => parse_add_lead(rest)?,
        "edit" => parse_edit_lead(rest)?,
        "import" => UserCommand::ImportCsv(PathBuf::from(text(rest, "import <archivo.csv>")?)),
        "dream" => UserCommand::Dream(text(rest, "dream <descripción>")?),
        "design" => parse_design(rest)?,
        "resources" => UserCommand::ListResources,
        "events" if rest.is_empty() => UserCommand::ListEvents,
        "events" => UserCommand::EventsOn(
            NaiveDate::parse_from_str(rest, "%Y-%m-%d")
                .map_err(|_| ParseError::InvalidDate(rest.to_string()))?,
        ),
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Input::Command(cmd))
}

fn text(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    Ok(rest.to_string())
}

fn number<T: std::str::FromStr>(rest: &str, usage: &'static str) -> Result<T, ParseError> {
    let raw = text(rest, usage)?;
    raw.parse().map_err(|_| ParseError::InvalidNumber(raw))
}

fn fields(rest: &str) -> Vec<&str> {
    rest.split('|').map(str::trim).collect()
}

const ADD_USAGE: &str =
    "add <nombre> | <proyecto> [| persona | temperatura | teléfono | email | etapa | etiquetas]";

/// Positional fields of `add`, after name and project.
const ADD_FIELDS: [LeadField; 8] = [
    LeadField::Name,
    LeadField::Project,
    LeadField::Persona,
    LeadField::Temperature,
    LeadField::Phone,
    LeadField::Email,
    LeadField::Stage,
    LeadField::Tags,
];

fn parse_add_lead(rest: &str) -> Result<UserCommand, ParseError> {
    let parts = fields(rest);
    if !(2..=ADD_FIELDS.len()).contains(&parts.len()) {
        return Err(ParseError::Usage(ADD_USAGE));
    }
    // Blank name or project is left to the form validation; other blank
    // segments keep the form defaults.
    let mut form = LeadForm::default();
    for (i, (field, value)) in ADD_FIELDS.into_iter().zip(parts).enumerate() {
        if i < 2 || !value.is_empty() {
            form.set(field, value);
        }
    }
    Ok(UserCommand::AddLead(form))
}

const EDIT_USAGE: &str = "edit <campo>=<valor> [| <campo>=<valor>...]";

fn parse_edit_lead(rest: &str) -> Result<UserCommand, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::Usage(EDIT_USAGE));
    }
    let mut changes = Vec::new();
    for part in fields(rest) {
        let (key, value) = part.split_once('=').ok_or(ParseError::Usage(EDIT_USAGE))?;
        let field = LeadField::from_key(key).ok_or_else(|| ParseError::UnknownField(key.trim().to_string()))?;
        changes.push((field, value.trim().to_string()));
    }
    Ok(UserCommand::EditLead(changes))
}

const OBJECTION_USAGE: &str =
    "objection add <título> | <arg>; <arg>...  |  objection edit <id> <título> | <arg>; <arg>...  |  objection delete <id>";

fn objection_form(args: &str) -> Result<ObjectionForm, ParseError> {
    let (title, arguments) = args.split_once('|').ok_or(ParseError::Usage(OBJECTION_USAGE))?;
    let arguments = arguments
        .split(';')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(ObjectionForm {
        title: title.trim().to_string(),
        arguments,
    })
}

fn parse_objection(rest: &str) -> Result<UserCommand, ParseError> {
    let (action, args) = match rest.split_once(char::is_whitespace) {
        Some((a, r)) => (a, r.trim()),
        None => (rest, ""),
    };
    match action.to_lowercase().as_str() {
        "add" => Ok(UserCommand::AddObjection(objection_form(args)?)),
        "edit" => {
            let (id, form) = args
                .split_once(char::is_whitespace)
                .ok_or(ParseError::Usage(OBJECTION_USAGE))?;
            let id = number(id, OBJECTION_USAGE)?;
            Ok(UserCommand::EditObjection(id, objection_form(form)?))
        }
        "delete" => Ok(UserCommand::DeleteObjection(number(args, OBJECTION_USAGE)?)),
        _ => Err(ParseError::Usage(OBJECTION_USAGE)),
    }
}

const DESIGN_USAGE: &str = "design <foto> | <muebles,separados,por,coma> | <instrucción>";

fn parse_design(rest: &str) -> Result<UserCommand, ParseError> {
    let parts = fields(rest);
    let [image, furniture, instruction] = parts.as_slice() else {
        return Err(ParseError::Usage(DESIGN_USAGE));
    };
    if image.is_empty() {
        return Err(ParseError::Usage(DESIGN_USAGE));
    }
    let furniture = furniture
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok(UserCommand::Design {
        image: PathBuf::from(*image),
        furniture,
        instruction: instruction.to_string(),
    })
}
