use crate::library::navigator::{FolderNavigator, LoadState};
use crate::library::{EntryKind, FileAction, LibraryEntry};
use crate::theme::Theme;
use eframe::egui::{self, RichText, ScrollArea};

const CARD_WIDTH: f32 = 180.0;

/// What a library card shows, independent of egui.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCard {
    pub name: String,
    pub path: String,
    pub icon: String,
    pub subtitle: String,
    pub badge: Option<String>,
    pub size: Option<String>,
    pub is_folder: bool,
}

impl EntryCard {
    pub fn from_entry(entry: &LibraryEntry) -> Self {
        match &entry.kind {
            EntryKind::Folder { children } => Self {
                name: entry.name.clone(),
                path: entry.path.clone(),
                icon: "📁".to_string(),
                subtitle: format!("{} items", children.len()),
                badge: None,
                size: None,
                is_folder: true,
            },
            EntryKind::File {
                size,
                size_human,
                category,
                icon,
            } => Self {
                name: entry.name.clone(),
                path: entry.path.clone(),
                icon: icon.clone(),
                subtitle: category.clone(),
                badge: Some(entry.extension().to_ascii_uppercase()),
                size: Some(
                    size_human
                        .clone()
                        .unwrap_or_else(|| format_file_size(*size)),
                ),
                is_folder: false,
            },
        }
    }
}

/// Binary-prefixed size with at most two decimals, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Labels for the breadcrumb bar, root first.
pub fn breadcrumb_trail(navigator: &FolderNavigator) -> Vec<String> {
    let mut trail = vec!["📚 Library".to_string()];
    trail.extend(
        navigator
            .breadcrumb()
            .iter()
            .map(|entry| entry.name.clone()),
    );
    trail
}

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryIntent {
    Home,
    Back,
    JumpTo(usize),
    Descend(String),
    Open { path: String, name: String, action: FileAction },
    Download { path: String, name: String },
    CopyPath(String),
    Retry,
}

pub fn render_library(
    ui: &mut egui::Ui,
    theme: &Theme,
    navigator: &FolderNavigator,
    search: &mut String,
) -> Option<LibraryIntent> {
    let mut intent = None;

    ui.horizontal(|ui| {
        let trail = breadcrumb_trail(navigator);
        for (index, label) in trail.iter().enumerate() {
            if index > 0 {
                ui.label(RichText::new(">").color(theme.text_muted));
            }
            if ui.link(label).clicked() {
                intent = Some(if index == 0 {
                    LibraryIntent::Home
                } else {
                    LibraryIntent::JumpTo(index - 1)
                });
            }
        }
    });

    ui.horizontal(|ui| {
        if ui
            .add_enabled(!navigator.breadcrumb().is_empty(), egui::Button::new("⬅ Back"))
            .clicked()
        {
            intent = Some(LibraryIntent::Back);
        }
        ui.add(
            egui::TextEdit::singleline(search)
                .hint_text("Search this folder...")
                .desired_width(260.0),
        );
    });
    ui.separator();

    match navigator.load_state() {
        LoadState::NotLoaded | LoadState::Loading => {
            ui.vertical_centered(|ui| {
                ui.add_space(theme.spacing_16);
                ui.spinner();
                ui.label("Loading library...");
            });
            return intent;
        }
        LoadState::Failed(message) => {
            theme.card_frame().show(ui, |ui| {
                ui.label(RichText::new("❌ Error: Failed to load library.").color(theme.danger));
                ui.label(RichText::new(message).color(theme.text_muted));
                if ui.button("Retry").clicked() {
                    intent = Some(LibraryIntent::Retry);
                }
            });
            return intent;
        }
        LoadState::Ready => {}
    }

    let entries = navigator.filter(search);
    if navigator.current_view().is_empty() {
        ui.vertical_centered(|ui| {
            ui.add_space(theme.spacing_16);
            ui.label(RichText::new("📚").size(40.0));
            ui.heading("Library is empty");
            ui.label(
                RichText::new("Add files and folders to the library directory to get started.")
                    .color(theme.text_muted),
            );
        });
        return intent;
    }

    ScrollArea::vertical()
        .id_salt("library_grid")
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for entry in entries {
                    if let Some(card_intent) = render_card(ui, theme, entry) {
                        intent = Some(card_intent);
                    }
                }
            });
        });

    intent
}

fn render_card(ui: &mut egui::Ui, theme: &Theme, entry: &LibraryEntry) -> Option<LibraryIntent> {
    let card = EntryCard::from_entry(entry);
    let mut intent = None;

    let response = theme
        .card_frame()
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                ui.label(RichText::new(&card.icon).size(28.0));
                ui.strong(&card.name);
                ui.label(RichText::new(&card.subtitle).color(theme.text_muted).small());
                if let (Some(badge), Some(size)) = (&card.badge, &card.size) {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(badge).color(theme.accent_primary).small());
                        ui.label(RichText::new(size).color(theme.text_muted).small());
                    });
                }
            });
        })
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);

    if response.clicked() {
        intent = Some(if card.is_folder {
            LibraryIntent::Descend(card.path.clone())
        } else {
            LibraryIntent::Open {
                path: card.path.clone(),
                name: card.name.clone(),
                action: FileAction::for_entry(entry),
            }
        });
    }

    response.context_menu(|ui| {
        if !card.is_folder {
            if ui.button("📂 Open").clicked() {
                intent = Some(LibraryIntent::Open {
                    path: card.path.clone(),
                    name: card.name.clone(),
                    action: FileAction::for_entry(entry),
                });
                ui.close_menu();
            }
            if ui.button("📥 Download").clicked() {
                intent = Some(LibraryIntent::Download {
                    path: card.path.clone(),
                    name: card.name.clone(),
                });
                ui.close_menu();
            }
        }
        if ui.button("📋 Copy Path").clicked() {
            intent = Some(LibraryIntent::CopyPath(card.path.clone()));
            ui.close_menu();
        }
    });

    intent
}
