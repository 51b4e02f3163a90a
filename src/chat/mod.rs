use crate::language::Language;
use serde::{Deserialize, Serialize};

pub mod session;

pub use session::ChatSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn speaker(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub language: Language,
    pub history: Vec<ChatTurn>,
}

pub const GREETING: &str =
    "Hello! I'm your educational assistant. Ask me anything about your studies!";

pub fn suggested_questions(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => &[
            "What is photosynthesis?",
            "Explain the water cycle",
            "How do plants grow?",
            "What are cells?",
            "Tell me about gravity",
        ],
        Language::Ar => &[
            "ما هو البناء الضوئي؟",
            "اشرح دورة الماء",
            "كيف تنمو النباتات؟",
            "ما هي الخلايا؟",
            "حدثني عن الجاذبية",
        ],
        Language::Fr => &[
            "Qu'est-ce que la photosynthèse?",
            "Expliquez le cycle de l'eau",
            "Comment les plantes poussent-elles?",
            "Qu'est-ce que les cellules?",
            "Parlez-moi de la gravité",
        ],
    }
}
