use crate::theme::Theme;
use eframe::egui::{self, Align2, RichText};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    expires_at: Instant,
}

/// Transient notifications stacked in the top-right corner.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.push_at(kind, message, DEFAULT_TOAST_DURATION, Instant::now());
    }

    pub fn push_at(
        &mut self,
        kind: ToastKind,
        message: impl Into<String>,
        duration: Duration,
        now: Instant,
    ) {
        let message = message.into();
        match kind {
            ToastKind::Error | ToastKind::Warning => warn!(?kind, %message, "toast"),
            ToastKind::Success | ToastKind::Info => info!(?kind, %message, "toast"),
        }
        self.items.push(Toast {
            kind,
            message,
            expires_at: now + duration,
        });
    }

    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|toast| toast.expires_at > now);
    }

    pub fn active(&self) -> &[Toast] {
        &self.items
    }

    pub fn render(&mut self, ctx: &egui::Context, theme: &Theme) {
        self.prune(Instant::now());
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_TOP, egui::vec2(-theme.spacing_16, theme.spacing_16))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in self.active() {
                    let fill = match toast.kind {
                        ToastKind::Success => theme.success,
                        ToastKind::Error => theme.danger,
                        ToastKind::Warning => theme.warning,
                        ToastKind::Info => theme.info,
                    };
                    theme.panel_frame(fill, theme.spacing_8 as i8).show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.label(RichText::new(&toast.message).color(theme.text_on_accent));
                    });
                    ui.add_space(theme.spacing_4);
                }
            });

        // Keep frames coming so expired toasts disappear on time.
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

#[cfg(test)]
mod tests {
    use super::{ToastKind, Toasts};
    use std::time::{Duration, Instant};

    #[test]
    fn prune_drops_expired_toasts_only() {
        let mut toasts = Toasts::default();
        let start = Instant::now();
        toasts.push_at(ToastKind::Info, "short", Duration::from_secs(1), start);
        toasts.push_at(ToastKind::Error, "long", Duration::from_secs(5), start);

        toasts.prune(start + Duration::from_secs(2));
        let remaining: Vec<&str> = toasts
            .active()
            .iter()
            .map(|toast| toast.message.as_str())
            .collect();
        assert_eq!(remaining, vec!["long"]);

        toasts.prune(start + Duration::from_secs(5));
        assert!(toasts.active().is_empty());
    }
}
