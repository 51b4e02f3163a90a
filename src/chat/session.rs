use crate::chat::{ChatRequest, ChatTurn, Role};
use crate::language::Language;
use thiserror::Error;

/// Number of most recent turns sent along with each request.
pub const CONTEXT_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please enter a message")]
    Empty,
    #[error("Please wait for the current response")]
    InFlight,
}

/// Session-long chat log plus the single request that may be outstanding.
#[derive(Debug, Default)]
pub struct ChatSession {
    log: Vec<ChatTurn>,
    pending: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(log: Vec<ChatTurn>) -> Self {
        Self { log, pending: None }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.log
    }

    pub fn pending_message(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        self.log.push(ChatTurn::new(role, content));
    }

    pub fn context_window(&self) -> Vec<ChatTurn> {
        let start = self.log.len().saturating_sub(CONTEXT_WINDOW);
        self.log[start..].to_vec()
    }

    /// Validates `message` and marks it in flight.
    ///
    /// The returned request carries the context window as it was before this
    /// message; the user turn joins the log only once a reply arrives.
    pub fn submit(&mut self, message: &str, language: Language) -> Result<ChatRequest, SubmitError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SubmitError::Empty);
        }
        if self.pending.is_some() {
            return Err(SubmitError::InFlight);
        }

        self.pending = Some(message.to_string());
        Ok(ChatRequest {
            message: message.to_string(),
            language,
            history: self.context_window(),
        })
    }

    pub fn finish(&mut self, reply: impl Into<String>) {
        if let Some(message) = self.pending.take() {
            self.append_turn(Role::User, message);
        }
        self.append_turn(Role::Assistant, reply);
    }

    /// Drops the outstanding request and hands back its message.
    pub fn abandon(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    pub fn export_text(&self, language: Language, date: &str) -> Option<String> {
        if self.log.is_empty() {
            return None;
        }

        let mut out = String::from("Herotopia Chat History\n");
        out.push_str(&format!("Language: {}\n", language.code()));
        out.push_str(&format!("Date: {date}\n"));
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");
        for turn in &self.log {
            out.push_str(&format!("{}:\n{}\n\n", turn.role.speaker(), turn.content));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatSession, SubmitError, CONTEXT_WINDOW};
    use crate::chat::{ChatTurn, Role};
    use crate::language::Language;

    fn session_with(turns: usize) -> ChatSession {
        let mut session = ChatSession::new();
        for index in 1..=turns {
            let role = if index % 2 == 1 { Role::User } else { Role::Assistant };
            session.append_turn(role, format!("turn {index}"));
        }
        session
    }

    #[test]
    fn context_window_keeps_most_recent_turns_in_order() {
        let session = session_with(12);
        let window = session.context_window();
        assert_eq!(window.len(), CONTEXT_WINDOW);
        let contents: Vec<&str> = window.iter().map(|turn| turn.content.as_str()).collect();
        let expected: Vec<String> = (3..=12).map(|index| format!("turn {index}")).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn context_window_of_short_log_is_whole_log() {
        let session = session_with(3);
        assert_eq!(session.context_window(), session.turns().to_vec());
    }

    #[test]
    fn submit_rejects_blank_message() {
        let mut session = ChatSession::new();
        assert_eq!(session.submit("   ", Language::En), Err(SubmitError::Empty));
        assert!(!session.is_waiting());
    }

    #[test]
    fn second_submit_while_pending_is_rejected_without_duplicate_turn() {
        let mut session = session_with(2);
        let request = session
            .submit("  What are cells? ", Language::Fr)
            .expect("first submit should be accepted");
        assert_eq!(request.message, "What are cells?");
        assert_eq!(request.language, Language::Fr);
        assert_eq!(request.history.len(), 2);

        assert_eq!(
            session.submit("What is gravity?", Language::Fr),
            Err(SubmitError::InFlight)
        );
        assert_eq!(session.turns().len(), 2);
        assert_eq!(session.pending_message(), Some("What are cells?"));
    }

    #[test]
    fn finish_appends_user_then_assistant_turn() {
        let mut session = ChatSession::new();
        session
            .submit("What are cells?", Language::En)
            .expect("submit should be accepted");
        session.finish("Cells are the basic unit of life.");

        assert!(!session.is_waiting());
        assert_eq!(
            session.turns(),
            &[
                ChatTurn::new(Role::User, "What are cells?"),
                ChatTurn::new(Role::Assistant, "Cells are the basic unit of life."),
            ]
        );
        assert!(session.submit("next", Language::En).is_ok());
    }

    #[test]
    fn abandon_returns_message_and_leaves_log_untouched() {
        let mut session = session_with(1);
        session
            .submit("lost question", Language::En)
            .expect("submit should be accepted");
        assert_eq!(session.abandon().as_deref(), Some("lost question"));
        assert_eq!(session.turns().len(), 1);
        assert!(!session.is_waiting());
    }

    #[test]
    fn export_text_lists_turns_under_header() {
        let mut session = ChatSession::new();
        assert!(session.export_text(Language::En, "today").is_none());

        session.append_turn(Role::User, "hi");
        session.append_turn(Role::Assistant, "hello");
        let text = session
            .export_text(Language::Ar, "2026-10-19 10:00")
            .expect("non-empty log should export");
        let expected = format!(
            "Herotopia Chat History\nLanguage: ar\nDate: 2026-10-19 10:00\n{}\n\nYou:\nhi\n\nAssistant:\nhello\n\n",
            "=".repeat(50)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn clear_empties_log() {
        let mut session = session_with(4);
        session.clear();
        assert!(session.turns().is_empty());
    }
}
