use crate::chat::{suggested_questions, ChatSession, Role, GREETING};
use crate::language::Language;
use crate::theme::Theme;
use eframe::egui::{self, RichText, ScrollArea};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub role: Role,
    pub content: String,
}

impl TranscriptLine {
    pub fn avatar(&self) -> &'static str {
        match self.role {
            Role::User => "👤",
            Role::Assistant => "🤖",
        }
    }
}

/// Lines to draw for `session`: the greeting when the log is empty, the
/// logged turns, then the message still waiting for a reply.
pub fn transcript_lines(session: &ChatSession) -> Vec<TranscriptLine> {
    let mut lines: Vec<TranscriptLine> = session
        .turns()
        .iter()
        .map(|turn| TranscriptLine {
            role: turn.role,
            content: turn.content.clone(),
        })
        .collect();

    if lines.is_empty() {
        lines.push(TranscriptLine {
            role: Role::Assistant,
            content: GREETING.to_string(),
        });
    }

    if let Some(pending) = session.pending_message() {
        lines.push(TranscriptLine {
            role: Role::User,
            content: pending.to_string(),
        });
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatIntent {
    Send,
    Suggest(String),
    Clear,
    Export,
}

pub fn render_chat(
    ui: &mut egui::Ui,
    theme: &Theme,
    session: &ChatSession,
    language: Language,
    input: &mut String,
    scroll_to_bottom: bool,
) -> Option<ChatIntent> {
    let mut intent = None;

    ui.horizontal(|ui| {
        ui.heading("Chat");
        ui.label(RichText::new(language.display_name()).color(theme.text_muted));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("🗑 Clear").clicked() {
                intent = Some(ChatIntent::Clear);
            }
            if ui.button("💾 Export").clicked() {
                intent = Some(ChatIntent::Export);
            }
        });
    });
    ui.separator();

    let transcript_height = (ui.available_height() - 150.0).max(120.0);
    ScrollArea::vertical()
        .id_salt("chat_transcript")
        .max_height(transcript_height)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for line in transcript_lines(session) {
                let from_user = line.role == Role::User;
                let layout = if from_user {
                    egui::Layout::right_to_left(egui::Align::TOP)
                } else {
                    egui::Layout::left_to_right(egui::Align::TOP)
                };
                ui.with_layout(layout, |ui| {
                    ui.label(line.avatar());
                    theme.bubble_frame(from_user).show(ui, |ui| {
                        ui.set_max_width(ui.available_width() * 0.75);
                        let text = RichText::new(&line.content);
                        let text = if from_user {
                            text.color(theme.text_on_accent)
                        } else {
                            text
                        };
                        ui.add(egui::Label::new(text).wrap());
                    });
                });
            }

            if session.is_waiting() {
                ui.horizontal(|ui| {
                    ui.label("🤖");
                    ui.spinner();
                });
            }

            if scroll_to_bottom {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    ui.separator();
    ui.horizontal_wrapped(|ui| {
        for question in suggested_questions(language) {
            if ui.small_button(*question).clicked() {
                intent = Some(ChatIntent::Suggest((*question).to_string()));
            }
        }
    });

    let waiting = session.is_waiting();
    let hint = if waiting {
        "Waiting for response..."
    } else {
        "Type a message..."
    };
    theme.composer_frame().show(ui, |ui| {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(input)
                    .desired_width(ui.available_width() - 80.0)
                    .hint_text(hint),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                intent = Some(ChatIntent::Send);
            }
            if ui.button("Send").clicked() {
                intent = Some(ChatIntent::Send);
            }
        });
    });

    intent
}

#[cfg(test)]
mod tests {
    use super::transcript_lines;
    use crate::chat::{ChatSession, Role, GREETING};
    use crate::language::Language;

    #[test]
    fn empty_session_shows_greeting() {
        let lines = transcript_lines(&ChatSession::new());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].role, Role::Assistant);
        assert_eq!(lines[0].content, GREETING);
    }

    #[test]
    fn pending_message_is_shown_after_logged_turns() {
        let mut session = ChatSession::new();
        session.append_turn(Role::User, "hi");
        session.append_turn(Role::Assistant, "hello");
        session
            .submit("What is gravity?", Language::En)
            .expect("submit should be accepted");

        let lines = transcript_lines(&session);
        let contents: Vec<&str> = lines.iter().map(|line| line.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello", "What is gravity?"]);
        assert_eq!(lines[2].avatar(), "👤");
    }
}
