use crate::error::AppError;
use ratatui::prelude::{Color, Style};
use std::time::{Duration, Instant};

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Short status message shown after a user action.
#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
    shown_at: Instant,
}

impl Toast {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            title: title.to_string(),
            description: description.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            title: title.to_string(),
            description: description.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn from_error(title: &str, error: &AppError) -> Self {
        Self::error(title, error.to_string())
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_TTL
    }

    pub fn style(&self) -> Style {
        match self.kind {
            ToastKind::Success => Style::default().fg(Color::Green),
            ToastKind::Error => Style::default().fg(Color::Red),
        }
    }

    pub fn text(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{}: {}", self.title, self.description)
        }
    }

    /// CLI rendering; errors go to stderr.
    pub fn print(&self) {
        match self.kind {
            ToastKind::Success => println!("{}", self.text()),
            ToastKind::Error => eprintln!("{}", self.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_text() {
        let toast = Toast::success("Import successful", "12 transactions imported.");
        assert_eq!(toast.text(), "Import successful: 12 transactions imported.");
        assert!(!toast.is_expired());

        let bare = Toast::error("Export failed", "");
        assert_eq!(bare.text(), "Export failed");
        assert_eq!(bare.kind, ToastKind::Error);
    }

    #[test]
    fn test_toast_from_error() {
        let error = AppError::NotFound("Transaction 9".to_string());
        let toast = Toast::from_error("Delete failed", &error);
        assert_eq!(toast.description, "Transaction 9 not found");
    }
}
