use crate::api::dispatch::unique_destination;
use crate::api::{ApiError, Backend};
use crate::chat::ChatSession;
use crate::event::{AppEvent, TaskKind};
use crate::language::Language;
use crate::library::navigator::{FolderNavigator, LoadState};
use crate::library::FileAction;
use crate::storage::LocalState;
use crate::theme::{Theme, ThemePreference};
use crate::ui::chat_view::{render_chat, ChatIntent};
use crate::ui::library_view::{render_library, LibraryIntent};
use crate::ui::toast::{ToastKind, Toasts};
use eframe::egui::{self, RichText};
use std::fs;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const IN_FLIGHT_REPAINT: Duration = Duration::from_millis(100);
const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Chatbot,
    Library,
    About,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Self::Chatbot => "🤖 Chatbot",
            Self::Library => "📚 Library",
            Self::About => "ℹ About",
        }
    }
}

pub struct HerotopiaApp {
    rx: Receiver<AppEvent>,
    backend: Backend,
    local_state: LocalState,
    theme: Theme,
    theme_preference: Option<ThemePreference>,
    theme_applied: bool,
    system_theme: Option<egui::Theme>,
    section: Section,
    language: Language,
    chat: ChatSession,
    navigator: FolderNavigator,
    toasts: Toasts,
    input_buffer: String,
    library_search: String,
    scroll_to_bottom: bool,
    confirm_clear: bool,
    downloads_in_flight: usize,
    autosave_interval: Duration,
    last_autosave: Instant,
}

impl HerotopiaApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        backend: Backend,
        local_state: LocalState,
        autosave_interval: Duration,
    ) -> Self {
        let chat = match local_state.load_chat_log() {
            Some(turns) => {
                info!(messages = turns.len(), "restored chat history");
                ChatSession::restore(turns)
            }
            None => ChatSession::new(),
        };
        let language = local_state.load_language().unwrap_or_default();
        let theme_preference = local_state.load_theme();

        let mut app = Self {
            rx,
            backend,
            local_state,
            theme: Theme::default(),
            theme_preference,
            theme_applied: false,
            system_theme: None,
            section: Section::Chatbot,
            language,
            chat,
            navigator: FolderNavigator::new(),
            toasts: Toasts::default(),
            input_buffer: String::new(),
            library_search: String::new(),
            scroll_to_bottom: true,
            confirm_clear: false,
            downloads_in_flight: 0,
            autosave_interval,
            last_autosave: Instant::now(),
        };

        // Warm the library so the first visit to the panel is instant.
        app.load_library();
        app
    }

    fn load_library(&mut self) {
        self.navigator.mark_loading();
        self.backend.load_library();
    }

    fn show_section(&mut self, section: Section) {
        if self.section == section {
            return;
        }
        debug!(?section, "switching section");
        self.section = section;
        if section == Section::Library {
            self.navigator.reset();
            self.library_search.clear();
            if self.navigator.needs_load() {
                self.load_library();
            }
        }
    }

    fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        self.language = language;
        self.local_state.save_language(language);
        info!(language = language.display_name(), "language changed");
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        let next = self.theme.preference().toggled();
        self.theme_preference = Some(next);
        self.local_state.save_theme(next);
        self.theme = Theme::resolve(Some(next), ctx.system_theme());
        self.theme.apply_visuals(ctx);
        ctx.set_theme(self.theme.egui_theme());
    }

    fn ensure_theme(&mut self, ctx: &egui::Context) {
        if !self.sync_theme(ctx.system_theme()) {
            return;
        }
        self.theme.apply_visuals(ctx);
        match self.theme_preference {
            Some(_) => ctx.set_theme(self.theme.egui_theme()),
            None => ctx.set_theme(egui::ThemePreference::System),
        }
    }

    /// Resolves the palette on the first frame and, until the user picks a
    /// theme, again whenever the OS theme changes. Returns whether it changed.
    fn sync_theme(&mut self, system: Option<egui::Theme>) -> bool {
        let follows_system = self.theme_preference.is_none();
        if self.theme_applied && !(follows_system && system != self.system_theme) {
            return false;
        }
        self.system_theme = system;
        self.theme = Theme::resolve(self.theme_preference, system);
        self.theme_applied = true;
        true
    }

    fn submit_prompt(&mut self) {
        match self.chat.submit(&self.input_buffer, self.language) {
            Ok(request) => {
                self.backend.send_chat(request);
                self.input_buffer.clear();
                self.scroll_to_bottom = true;
            }
            Err(err) => self.toasts.push(ToastKind::Warning, err.to_string()),
        }
    }

    fn clear_chat(&mut self) {
        self.chat.clear();
        self.local_state.forget_chat_log();
        self.toasts.push(ToastKind::Info, "Chat history cleared");
    }

    fn export_chat(&mut self) {
        let now = chrono::Local::now();
        let date = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let Some(text) = self.chat.export_text(self.language, &date) else {
            self.toasts.push(ToastKind::Warning, "No messages to export");
            return;
        };

        let dir = self.backend.download_dir().to_path_buf();
        let file_name = format!("herotopia-chat-{}.txt", now.timestamp_millis());
        let result = fs::create_dir_all(&dir).and_then(|()| {
            let path = unique_destination(&dir, &file_name);
            fs::write(&path, text).map(|()| path)
        });
        match result {
            Ok(path) => {
                info!(path = %path.display(), "chat exported");
                self.toasts.push(ToastKind::Success, "Chat exported successfully");
            }
            Err(err) => self
                .toasts
                .push(ToastKind::Error, format!("Failed to export chat: {err}")),
        }
    }

    fn autosave(&mut self) {
        if self.last_autosave.elapsed() < self.autosave_interval {
            return;
        }
        self.last_autosave = Instant::now();
        if self.persist_chat() {
            debug!(messages = self.chat.turns().len(), "chat history auto-saved");
        }
    }

    fn persist_chat(&self) -> bool {
        if self.chat.turns().is_empty() {
            return false;
        }
        self.local_state.save_chat_log(self.chat.turns());
        self.local_state.save_language(self.language);
        true
    }

    fn restore_pending_message(&mut self) {
        if let Some(message) = self.chat.abandon() {
            if self.input_buffer.is_empty() {
                self.input_buffer = message;
            }
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChatReplied(Ok(reply)) => {
                self.chat.finish(reply);
                self.scroll_to_bottom = true;
            }
            AppEvent::ChatReplied(Err(err)) => {
                self.restore_pending_message();
                let text = match err {
                    ApiError::Application(message) => format!("Error: {message}"),
                    other => format!("Failed to send message: {other}"),
                };
                self.toasts.push(ToastKind::Error, text);
                self.scroll_to_bottom = true;
            }
            AppEvent::LibraryLoaded(Ok(items)) => {
                info!(entries = items.len(), "library loaded");
                self.navigator.install(items);
            }
            AppEvent::LibraryLoaded(Err(err)) => {
                let message = match &err {
                    ApiError::Application(message) => format!("Library Error: {message}"),
                    other => other.to_string(),
                };
                warn!(error = %err, "library load failed");
                if self.section == Section::Library {
                    self.toasts
                        .push(ToastKind::Error, format!("Failed to load library. {message}"));
                }
                self.navigator.fail(message);
            }
            AppEvent::FileSaved { name, result } => {
                self.downloads_in_flight = self.downloads_in_flight.saturating_sub(1);
                match result {
                    Ok(path) => self.toasts.push(
                        ToastKind::Success,
                        format!("Saved {name} to {}", path.display()),
                    ),
                    Err(err) => self
                        .toasts
                        .push(ToastKind::Error, format!("Failed to download {name}: {err}")),
                }
            }
            AppEvent::TaskFailed { task, reason } => {
                warn!(?task, %reason, "releasing state of failed task");
                match task {
                    TaskKind::Chat => self.restore_pending_message(),
                    TaskKind::Library => self.navigator.fail(UNEXPECTED_ERROR),
                    TaskKind::Download { .. } => {
                        self.downloads_in_flight = self.downloads_in_flight.saturating_sub(1);
                    }
                }
                self.toasts.push(ToastKind::Error, UNEXPECTED_ERROR);
            }
        }
    }

    fn apply_library_intent(&mut self, ctx: &egui::Context, intent: LibraryIntent) {
        match intent {
            LibraryIntent::Home => {
                self.navigator.reset();
                self.library_search.clear();
            }
            LibraryIntent::Back => {
                self.navigator.ascend();
                self.library_search.clear();
            }
            LibraryIntent::JumpTo(index) => {
                self.navigator.jump_to(index);
                self.library_search.clear();
            }
            LibraryIntent::Descend(path) => {
                self.navigator.descend(&path);
                self.library_search.clear();
            }
            LibraryIntent::Open { path, name, action } => {
                if action == FileAction::Download {
                    self.start_download(path, name);
                } else {
                    self.open_remote(&path, &name, action);
                }
            }
            LibraryIntent::Download { path, name } => self.start_download(path, name),
            LibraryIntent::CopyPath(path) => {
                ctx.copy_text(path);
                self.toasts.push(ToastKind::Success, "Copied to clipboard!");
            }
            LibraryIntent::Retry => self.load_library(),
        }
    }

    fn start_download(&mut self, path: String, name: String) {
        self.toasts
            .push(ToastKind::Info, format!("Downloading {name}..."));
        self.downloads_in_flight += 1;
        self.backend.download(path, name);
    }

    fn open_remote(&mut self, path: &str, name: &str, action: FileAction) {
        let url = match self.backend.file_url(path) {
            Ok(url) => url,
            Err(err) => {
                self.toasts.push(ToastKind::Error, err.to_string());
                return;
            }
        };
        debug!(%url, action = action.label(), "opening library file");
        if let Err(err) = open::that(url.as_str()) {
            self.toasts
                .push(ToastKind::Error, format!("Failed to open {name}: {err}"));
        }
    }

    fn apply_chat_intent(&mut self, intent: ChatIntent) {
        match intent {
            ChatIntent::Send => self.submit_prompt(),
            ChatIntent::Suggest(question) => self.input_buffer = question,
            ChatIntent::Clear => self.confirm_clear = true,
            ChatIntent::Export => self.export_chat(),
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut selected_section = None;
        let mut selected_language = None;
        let mut toggle_theme = false;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Herotopia");
                ui.separator();
                for section in [Section::Chatbot, Section::Library, Section::About] {
                    if ui
                        .selectable_label(self.section == section, section.label())
                        .clicked()
                    {
                        selected_section = Some(section);
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_icon = if self.theme.dark { "☀" } else { "🌙" };
                    if ui.button(theme_icon).clicked() {
                        toggle_theme = true;
                    }
                    egui::ComboBox::from_id_salt("language")
                        .selected_text(self.language.display_name())
                        .show_ui(ui, |ui| {
                            for language in Language::ALL {
                                if ui
                                    .selectable_label(
                                        self.language == language,
                                        language.display_name(),
                                    )
                                    .clicked()
                                {
                                    selected_language = Some(language);
                                }
                            }
                        });
                });
            });
        });

        if let Some(section) = selected_section {
            self.show_section(section);
        }
        if let Some(language) = selected_language {
            self.set_language(language);
        }
        if toggle_theme {
            self.toggle_theme(ctx);
        }
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        let fill = self.theme.surface_0;
        let mut library_intent = None;
        let mut chat_intent = None;

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(fill).inner_margin(self.theme.spacing_16))
            .show(ctx, |ui| match self.section {
                Section::Chatbot => {
                    chat_intent = render_chat(
                        ui,
                        &self.theme,
                        &self.chat,
                        self.language,
                        &mut self.input_buffer,
                        self.scroll_to_bottom,
                    );
                    self.scroll_to_bottom = false;
                }
                Section::Library => {
                    ui.heading("Digital Library");
                    library_intent = render_library(
                        ui,
                        &self.theme,
                        &self.navigator,
                        &mut self.library_search,
                    );
                }
                Section::About => render_about(ui, &self.theme, &self.backend),
            });

        if let Some(intent) = library_intent {
            self.apply_library_intent(ctx, intent);
        }
        if let Some(intent) = chat_intent {
            self.apply_chat_intent(intent);
        }
    }

    fn render_clear_confirmation(&mut self, ctx: &egui::Context) {
        if !self.confirm_clear {
            return;
        }

        let mut decision = None;
        egui::Window::new("Clear chat history")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Are you sure you want to clear the chat history?");
                ui.horizontal(|ui| {
                    if ui.button("Clear").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });

        if let Some(confirmed) = decision {
            self.confirm_clear = false;
            if confirmed {
                self.clear_chat();
            }
        }
    }

    fn busy(&self) -> bool {
        self.chat.is_waiting()
            || self.downloads_in_flight > 0
            || *self.navigator.load_state() == LoadState::Loading
    }
}

fn render_about(ui: &mut egui::Ui, theme: &Theme, backend: &Backend) {
    theme.card_frame().show(ui, |ui| {
        ui.heading(format!("Herotopia v{}", env!("CARGO_PKG_VERSION")));
        ui.label("Educational Chatbot & Digital Library");
        ui.add_space(theme.spacing_8);
        ui.label(RichText::new(format!("Backend: {}", backend.base_url())).color(theme.text_muted));
        ui.label(
            RichText::new(format!("Downloads: {}", backend.download_dir().display()))
                .color(theme.text_muted),
        );
    });
}

impl eframe::App for HerotopiaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_theme(ctx);
        self.drain_events();
        self.autosave();

        self.render_top_bar(ctx);
        self.render_center_panel(ctx);
        self.render_clear_confirmation(ctx);
        self.toasts.render(ctx, &self.theme);

        if self.busy() {
            ctx.request_repaint_after(IN_FLIGHT_REPAINT);
        } else {
            ctx.request_repaint_after(self.autosave_interval);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.persist_chat() {
            info!(messages = self.chat.turns().len(), "chat history saved on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HerotopiaApp, Section, UNEXPECTED_ERROR};
    use crate::api::{ApiClient, ApiError, Backend};
    use crate::chat::session::SubmitError;
    use crate::chat::{ChatTurn, Role};
    use crate::event::{AppEvent, TaskKind};
    use crate::library::fixtures::{file, folder};
    use crate::library::navigator::LoadState;
    use crate::storage::{KeyValueStore, LocalState};
    use crate::theme::ThemePreference;
    use crate::ui::toast::ToastKind;
    use eframe::egui;
    use reqwest::Url;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::runtime::{Builder, Runtime};

    struct Harness {
        app: HerotopiaApp,
        _runtime: Runtime,
        dir: TempDir,
    }

    // The current-thread runtime is never driven, so spawned requests stay
    // queued and every event is fed in by hand.
    fn harness() -> Harness {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build");
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let (tx, rx) = mpsc::channel();
        let backend = {
            let _guard = runtime.enter();
            let api = ApiClient::new(Url::parse("http://127.0.0.1:9/").expect("valid url"));
            Backend::new(api, tx, dir.path().join("downloads"))
                .expect("runtime should be current")
        };
        let local_state = LocalState::new(KeyValueStore::new(dir.path().join("state")));
        let app = HerotopiaApp::new(rx, backend, local_state, Duration::from_secs(30));
        Harness {
            app,
            _runtime: runtime,
            dir,
        }
    }

    fn last_toast(app: &HerotopiaApp) -> (ToastKind, String) {
        let toast = app.toasts.active().last().expect("a toast should be shown");
        (toast.kind, toast.message.clone())
    }

    fn submit(app: &mut HerotopiaApp, message: &str) {
        app.input_buffer = message.to_string();
        app.submit_prompt();
    }

    #[test]
    fn failed_reply_restores_input_and_reports_error() {
        let mut h = harness();
        submit(&mut h.app, "What are cells?");
        assert!(h.app.input_buffer.is_empty());
        assert!(h.app.chat.is_waiting());

        h.app
            .apply_event(AppEvent::ChatReplied(Err(ApiError::HttpStatus(500))));

        assert!(!h.app.chat.is_waiting());
        assert!(h.app.chat.turns().is_empty());
        assert_eq!(h.app.input_buffer, "What are cells?");
        assert_eq!(
            last_toast(&h.app),
            (
                ToastKind::Error,
                "Failed to send message: HTTP error! status: 500".to_string()
            )
        );
    }

    #[test]
    fn application_error_reply_is_shown_verbatim() {
        let mut h = harness();
        submit(&mut h.app, "hi");
        h.app.apply_event(AppEvent::ChatReplied(Err(ApiError::Application(
            "Model not loaded".to_string(),
        ))));
        assert_eq!(last_toast(&h.app).1, "Error: Model not loaded");
    }

    #[test]
    fn successful_reply_logs_both_turns() {
        let mut h = harness();
        submit(&mut h.app, "hi");
        h.app
            .apply_event(AppEvent::ChatReplied(Ok("hello".to_string())));
        assert_eq!(
            h.app.chat.turns(),
            &[
                ChatTurn::new(Role::User, "hi"),
                ChatTurn::new(Role::Assistant, "hello"),
            ]
        );
    }

    #[test]
    fn panicked_chat_task_releases_single_flight_guard() {
        let mut h = harness();
        submit(&mut h.app, "What are cells?");

        h.app.apply_event(AppEvent::TaskFailed {
            task: TaskKind::Chat,
            reason: "task panicked".to_string(),
        });

        assert!(!h.app.chat.is_waiting());
        assert_eq!(h.app.input_buffer, "What are cells?");
        assert_eq!(
            last_toast(&h.app),
            (ToastKind::Error, UNEXPECTED_ERROR.to_string())
        );
        assert_ne!(
            h.app.chat.submit("Explain the water cycle", h.app.language),
            Err(SubmitError::InFlight)
        );
    }

    #[test]
    fn panicked_library_task_leaves_retryable_failure() {
        let mut h = harness();
        assert_eq!(*h.app.navigator.load_state(), LoadState::Loading);

        h.app.apply_event(AppEvent::TaskFailed {
            task: TaskKind::Library,
            reason: "task panicked".to_string(),
        });

        assert!(h.app.navigator.needs_load());
        assert!(!h.app.busy());
    }

    #[test]
    fn panicked_download_is_no_longer_in_flight() {
        let mut h = harness();
        h.app.apply_event(AppEvent::LibraryLoaded(Ok(Vec::new())));
        h.app
            .start_download("Science/cell.png".to_string(), "cell.png".to_string());
        assert!(h.app.busy());

        h.app.apply_event(AppEvent::TaskFailed {
            task: TaskKind::Download {
                name: "cell.png".to_string(),
            },
            reason: "task panicked".to_string(),
        });

        assert_eq!(h.app.downloads_in_flight, 0);
        assert!(!h.app.busy());
    }

    #[test]
    fn library_application_error_is_recorded() {
        let mut h = harness();
        h.app.apply_event(AppEvent::LibraryLoaded(Err(ApiError::Application(
            "disk missing".to_string(),
        ))));
        assert_eq!(
            *h.app.navigator.load_state(),
            LoadState::Failed("Library Error: disk missing".to_string())
        );
        // Not on the library panel, so no toast.
        assert!(h.app.toasts.active().is_empty());
    }

    #[test]
    fn opening_library_resets_breadcrumb_without_refetching() {
        let mut h = harness();
        h.app.apply_event(AppEvent::LibraryLoaded(Ok(vec![folder(
            "Science",
            vec![file("Science/cell.png")],
        )])));
        h.app.show_section(Section::Library);
        h.app.navigator.descend("Science");
        h.app.show_section(Section::Chatbot);

        h.app.show_section(Section::Library);

        assert!(h.app.navigator.breadcrumb().is_empty());
        assert_eq!(*h.app.navigator.load_state(), LoadState::Ready);
    }

    #[test]
    fn opening_library_after_failure_reloads() {
        let mut h = harness();
        h.app
            .apply_event(AppEvent::LibraryLoaded(Err(ApiError::HttpStatus(503))));
        assert!(h.app.navigator.needs_load());

        h.app.show_section(Section::Library);

        assert_eq!(*h.app.navigator.load_state(), LoadState::Loading);
    }

    #[test]
    fn clearing_chat_removes_stored_history() {
        let mut h = harness();
        submit(&mut h.app, "hi");
        h.app
            .apply_event(AppEvent::ChatReplied(Ok("hello".to_string())));
        assert!(h.app.persist_chat());
        assert!(h.app.local_state.load_chat_log().is_some());

        h.app.clear_chat();

        assert!(h.app.chat.turns().is_empty());
        assert_eq!(h.app.local_state.load_chat_log(), None);
        assert_eq!(last_toast(&h.app).1, "Chat history cleared");
    }

    #[test]
    fn unsaved_turns_are_persisted_for_the_next_session() {
        let mut h = harness();
        assert!(!h.app.persist_chat());
        submit(&mut h.app, "hi");
        h.app
            .apply_event(AppEvent::ChatReplied(Ok("hello".to_string())));
        assert!(h.app.persist_chat());

        let restored = LocalState::new(KeyValueStore::new(h.dir.path().join("state")));
        assert_eq!(restored.load_chat_log().map(|turns| turns.len()), Some(2));
    }

    #[test]
    fn theme_follows_system_until_user_picks_one() {
        let mut h = harness();
        assert!(h.app.sync_theme(Some(egui::Theme::Light)));
        assert!(!h.app.theme.dark);
        assert!(!h.app.sync_theme(Some(egui::Theme::Light)));

        assert!(h.app.sync_theme(Some(egui::Theme::Dark)));
        assert!(h.app.theme.dark);

        h.app.theme_preference = Some(ThemePreference::Dark);
        assert!(!h.app.sync_theme(Some(egui::Theme::Light)));
        assert!(h.app.theme.dark);
    }
}
