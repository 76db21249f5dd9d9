//! UI seams
//!
//! The coordinators talk to the page only through these traits. The DOM
//! implementations live in `platform::dom`; tests use recording fakes.

/// Who a chat bubble belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// CSS class of the message row
    pub fn css_class(&self) -> &'static str {
        match self {
            Role::User => "user-message",
            Role::Assistant => "assistant-message",
        }
    }
}

/// Chat transcript
pub trait ChatView {
    fn show_message(&self, role: Role, text: &str);

    /// Drop every rendered message
    fn clear(&self);

    /// Label of the conversation phase the backend reports
    fn show_phase(&self, label: &str);
}

/// Answer to the "continue where you left off?" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreChoice {
    Continue,
    StartNew,
}

/// Asks the user whether to restore saved data. Resolves only once the user
/// answers; there is no timeout.
#[allow(async_fn_in_trait)]
pub trait RestorePrompt {
    async fn ask(&self) -> RestoreChoice;
}

/// State of the save indicator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving(String),
    Success(String),
    Error(String),
}

impl SaveStatus {
    /// Save button is disabled while this is true
    pub fn is_busy(&self) -> bool {
        matches!(self, SaveStatus::Saving(_))
    }

    pub fn message(&self) -> &str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Saving(m) | SaveStatus::Success(m) | SaveStatus::Error(m) => m,
        }
    }

    /// CSS class of the status element
    pub fn css_class(&self) -> &'static str {
        match self {
            SaveStatus::Idle | SaveStatus::Saving(_) => "save-status",
            SaveStatus::Success(_) => "save-status success",
            SaveStatus::Error(_) => "save-status error",
        }
    }
}

/// Save button + status text
pub trait SaveStatusView {
    fn show_status(&self, status: &SaveStatus);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_saving_is_busy() {
        assert!(SaveStatus::Saving("Saving...".into()).is_busy());
        assert!(!SaveStatus::Idle.is_busy());
        assert!(!SaveStatus::Error("x".into()).is_busy());
    }

    #[test]
    fn test_status_presentation() {
        let err = SaveStatus::Error("not enough data".into());
        assert_eq!(err.message(), "not enough data");
        assert_eq!(err.css_class(), "save-status error");
        assert_eq!(SaveStatus::Idle.message(), "");
    }
}
