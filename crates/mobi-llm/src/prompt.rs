// Prompt templates for the lead simulator, sentiment classification, the
// Mobi sales coach, the dream visualizer and the design compositor.
//
// All prompts are in Spanish; the model replies in the same language.

use mobi_core::{Lead, Message, Objection, Temperature};
use serde::Deserialize;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Conversation rendering
// ---------------------------------------------------------------------------

/// Render a conversation as `Agente: ...` / `Lead: ...` lines.
pub fn conversation_transcript(conversation: &[Message]) -> String {
    conversation
        .iter()
        .map(|m| format!("{}: {}", m.sender.transcript_label(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Lead simulator
// ---------------------------------------------------------------------------

/// Prompt asking the model to answer in character as the lead.
///
/// `lead` is the state before `agent_message` was appended, so the message
/// appears once, after the history.
pub fn build_lead_reply_prompt(lead: &Lead, agent_message: &str) -> String {
    format!(
        "Eres el lead de esta conversación. Tu perfil es: \"{persona}\".\n\
         La conversación hasta ahora es:\n\
         {history}\n\
         ---\n\
         El agente inmobiliario acaba de decir: \"{agent_message}\"\n\
         ---\n\
         Responde de forma natural y coherente con tu perfil y la conversación. \
         Tu respuesta debe ser breve (1-3 frases) y debe hacer avanzar la conversación \
         o plantear una pregunta relevante.\n\
         NO uses markdown. Solo texto plano.",
        persona = lead.persona,
        history = conversation_transcript(&lead.conversation),
    )
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

pub fn build_sentiment_prompt(message: &str) -> String {
    format!(
        "Analiza el sentimiento de este mensaje de un potencial comprador de vivienda: \"{message}\".\n\
         Responde únicamente con una de estas tres palabras, sin puntuación ni texto adicional: \
         Caliente, Tibio, Frío.\n\
         - 'Caliente' si muestra claro interés, entusiasmo o intención de compra.\n\
         - 'Frío' si muestra desinterés, una objeción fuerte o es negativo.\n\
         - 'Tibio' si es neutral, hace preguntas informativas o no está claro."
    )
}

/// Map the classifier's one-word answer to a temperature. Anything other
/// than exactly `Caliente` or `Frío` (after trimming) is Warm.
pub fn parse_sentiment(reply: &str) -> Temperature {
    match reply.trim() {
        "Caliente" => Temperature::Hot,
        "Frío" => Temperature::Cold,
        _ => Temperature::Warm,
    }
}

// ---------------------------------------------------------------------------
// Coach: next-step suggestions
// ---------------------------------------------------------------------------

pub fn build_suggestions_prompt(lead: &Lead, count: usize) -> String {
    format!(
        "Eres Mobi, un co-piloto de IA para agentes inmobiliarios. Tu objetivo es guiar al agente \
         a través del embudo de ventas: Conectar -> Entender -> Visualizar -> Resolver -> Cerrar.\n\
         \n\
         Analiza la siguiente conversación con un lead:\n\
         Perfil del Lead: \"{persona}\"\n\
         Historial de Conversación:\n\
         {history}\n\
         \n\
         Basado en el estado actual de la conversación, sugiere {count} acciones cortas y concretas \
         para el agente.\n\
         Si el lead ha mencionado una objeción, una de las sugerencias debe ser \
         \"Consultar Manual de Objeciones\".\n\
         Si el lead duda sobre el espacio, una sugerencia debe ser \"Usar 'Visualizador de Sueños'\".",
        persona = lead.persona,
        history = conversation_transcript(&lead.conversation),
    )
}

/// Response schema: `{ "sugerencias": [string] }`.
pub fn suggestions_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "sugerencias": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct SuggestionsReply {
    sugerencias: Option<Vec<String>>,
}

/// Decode the structured suggestions reply. A missing or null
/// `sugerencias` field yields an empty list.
pub fn parse_suggestions(reply: &str) -> Result<Vec<String>, serde_json::Error> {
    let parsed: SuggestionsReply = serde_json::from_str(reply.trim())?;
    Ok(parsed.sugerencias.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Coach: objection rebuttal
// ---------------------------------------------------------------------------

pub const OBJECTION_SYSTEM_INSTRUCTION: &str = "Eres Mobi, un coach de ventas inmobiliarias experto. \
Tu tono es directo, útil y estratégico. Proporciona guiones listos para usar.";

pub fn build_objection_prompt(lead: &Lead, objection: &Objection) -> String {
    format!(
        "Un agente está hablando con un lead y se ha encontrado con una objeción. \
         Tu tarea es generar la respuesta perfecta y personalizada.\n\
         \n\
         ## Contexto del Lead\n\
         - **Perfil:** {persona}\n\
         - **Conversación hasta ahora:**\n\
         {history}\n\
         \n\
         ## Objeción Presentada\n\
         - **Título:** {title}\n\
         - **Argumentos genéricos disponibles:** {arguments}\n\
         \n\
         ## Tu Misión\n\
         Genera un guion corto y directo que el agente pueda usar ahora mismo para responder a esta \
         objeción. La respuesta debe ser altamente personalizada para el perfil del lead y el contexto \
         de la conversación. No te limites a repetir los argumentos genéricos; adáptalos o crea uno \
         nuevo que sea más efectivo para este cliente en particular.",
        persona = lead.persona,
        history = conversation_transcript(&lead.conversation),
        title = objection.title,
        arguments = objection.arguments.join("; "),
    )
}

// ---------------------------------------------------------------------------
// Coach: chat
// ---------------------------------------------------------------------------

/// Who wrote a line of the coaching chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    Agent,
    Mobi,
}

impl ChatSender {
    pub fn label(self) -> &'static str {
        match self {
            ChatSender::Agent => "Agente",
            ChatSender::Mobi => "Mobi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
}

impl ChatMessage {
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            sender: ChatSender::Agent,
            text: text.into(),
        }
    }

    pub fn mobi(text: impl Into<String>) -> Self {
        Self {
            sender: ChatSender::Mobi,
            text: text.into(),
        }
    }
}

pub const COACH_SYSTEM_INSTRUCTION: &str = "Eres Mobi, un co-piloto de IA y coach experto en ventas \
inmobiliarias. Tu tono es amigable, profesional y de gran ayuda. Tu objetivo es proporcionar \
estrategias y guiones accionables para ayudar a un agente a cerrar una venta. NO respondas como el \
lead. Responde siempre como el coach Mobi.";

/// `history` is the coaching chat so far, already ending with the agent's
/// `question`.
pub fn build_coach_prompt(lead: &Lead, history: &[ChatMessage], question: &str) -> String {
    let chat = history
        .iter()
        .map(|m| format!("{}: {}", m.sender.label(), m.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Estás asesorando a un agente sobre cómo interactuar con un lead específico.\n\
         \n\
         ## Contexto del Lead:\n\
         - **Nombre:** {name}\n\
         - **Perfil:** {persona}\n\
         - **Historial de conversación con el agente:**\n\
         {history}\n\
         \n\
         ## Tu conversación de coaching con el agente hasta ahora:\n\
         {chat}\n\
         \n\
         ## Nueva pregunta del agente:\n\
         \"{question}\"\n\
         \n\
         ## Tu Tarea:\n\
         Basado en TODO el contexto anterior, proporciona una respuesta detallada y útil. Ofrece \
         consejos, posibles guiones de conversación, y explica el razonamiento detrás de tus \
         sugerencias. Mantén tus respuestas enfocadas y prácticas.",
        name = lead.name,
        persona = lead.persona,
        history = conversation_transcript(&lead.conversation),
    )
}

// ---------------------------------------------------------------------------
// Dream visualizer
// ---------------------------------------------------------------------------

pub fn build_dream_prompt(description: &str) -> String {
    format!(
        "Foto realista y de alta calidad de un interior de departamento moderno. {description}. \
         Estilo de revista de arquitectura, iluminación natural brillante."
    )
}

// ---------------------------------------------------------------------------
// Design compositor
// ---------------------------------------------------------------------------

const REPLACEMENT_KEYWORDS: [&str; 4] = ["reemplaza", "cambia", "en lugar de", "sustituye"];

/// How the enhancer should rewrite an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignMode {
    /// Remove an existing object and put the new one in its exact place.
    PreciseReplacement,
    /// Choose the best placement freely.
    CreativeDesigner,
}

impl DesignMode {
    /// Replacement if the instruction mentions a replacement keyword
    /// (case-insensitive substring).
    pub fn detect(instruction: &str) -> Self {
        let lower = instruction.to_lowercase();
        if REPLACEMENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            DesignMode::PreciseReplacement
        } else {
            DesignMode::CreativeDesigner
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DesignMode::PreciseReplacement => "Reemplazo Preciso",
            DesignMode::CreativeDesigner => "Diseñador Creativo",
        }
    }
}

pub fn enhancement_system_instruction(mode: DesignMode) -> String {
    format!(
        "Eres un asistente de diseño de interiores experto. Tu tarea es reescribir la instrucción del \
         usuario en un prompt detallado y profesional para un modelo de IA de edición de imágenes.\n\
         \n\
         Modo Actual: {mode}.\n\
         \n\
         - Si el modo es \"Diseñador Creativo\", mejora la instrucción para sugerir la mejor ubicación \
         posible, considerando escala, proporciones, iluminación realista y flujo del espacio. \
         Sé descriptivo y artístico.\n\
         - Si el modo es \"Reemplazo Preciso\", genera un prompt técnico y literal en dos pasos: \
         1) Inpainting para eliminar el objeto antiguo, y 2) Colocación exacta del nuevo objeto.",
        mode = mode.label(),
    )
}

pub fn build_enhancement_prompt(instruction: &str) -> String {
    format!("Instrucción del usuario: \"{instruction}\"")
}

pub const IMAGE_EDIT_SYSTEM_INSTRUCTION: &str = "Eres un editor de fotos experto en diseño de interiores. \
Sigue estas reglas críticas:\n\
1.  **Integración Realista:** Sigue las reglas de perspectiva, escala, iluminación y sombras de la foto \
original para un resultado fotorrealista.\n\
2.  **Inpainting Limpio:** Si se pide reemplazar un objeto, elimínalo por completo sin dejar rastro \
antes de insertar el nuevo.\n\
3.  **No Alteración:** El resto de la imagen del cliente debe permanecer intacta. No añadas, elimines \
ni modifiques ningún otro elemento de la habitación.";

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
