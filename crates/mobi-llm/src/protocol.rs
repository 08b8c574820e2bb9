// Events emitted by streamed text generation.

/// One event of a streamed generation.
///
/// Every variant carries the `generation` counter of the request that
/// produced it so the consumer can drop events from superseded requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmEvent {
    /// An incremental chunk of text.
    Token { text: String, generation: u64 },
    /// The stream finished; `full_text` is the concatenation of all tokens.
    Complete { full_text: String, generation: u64 },
    /// The request failed. No further events follow for this generation.
    Error { message: String, generation: u64 },
}

impl LlmEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LlmEvent::Token { generation, .. }
            | LlmEvent::Complete { generation, .. }
            | LlmEvent::Error { generation, .. } => *generation,
        }
    }

    /// True for `Complete` and `Error`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LlmEvent::Token { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_and_terminal() {
        let token = LlmEvent::Token {
            text: "Ho".into(),
            generation: 3,
        };
        let done = LlmEvent::Complete {
            full_text: "Hola".into(),
            generation: 3,
        };
        let err = LlmEvent::Error {
            message: "x".into(),
            generation: 4,
        };
        assert_eq!(token.generation(), 3);
        assert_eq!(err.generation(), 4);
        assert!(!token.is_terminal());
        assert!(done.is_terminal());
        assert!(err.is_terminal());
    }
}
