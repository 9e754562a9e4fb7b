use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slack::SlackClient;

/// One mode of the navigation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    ManualStatus,
    EditCurrent,
    CreateTemplate,
    DeleteConfirm,
    Settings,
}

/// A named, reusable status preset stored in templates.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub label: String,
    pub text: String,
    pub emoji: String,
    #[serde(rename = "durationInMinutes", skip_serializing_if = "Option::is_none")]
    pub duration_in_minutes: Option<u32>,
    #[serde(
        rename = "untilTime",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub until_time: String,
}

/// On-disk shape of templates.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesFile {
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// Persisted settings. Overwritten wholesale on every save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "slackToken")]
    pub slack_token: String,
    #[serde(rename = "confirmDelete", default, skip_serializing_if = "Option::is_none")]
    pub confirm_delete: Option<bool>,
}

impl Config {
    /// Absent confirmDelete means "ask before deleting".
    pub fn effective_confirm_delete(&self) -> bool {
        self.confirm_delete.unwrap_or(true)
    }
}

/// Read-only snapshot of the remote status; replaced on fetch, never edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusInfo {
    pub user: String,
    pub text: String,
    pub emoji: String,
    /// Preformatted local HH:MM, empty when the status has no expiration.
    pub expiration: String,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("config: {0}")]
    Config(String),
    #[error("templates: {0}")]
    TemplateIo(String),
    #[error("{0}")]
    Validation(String),
    #[error("slack: {0}")]
    Remote(String),
    #[error("save failed: {0}")]
    Persist(String),
}

/// Completion of a previously issued one-shot operation, fed back into the
/// event loop. Every variant updates a disjoint slice of the model, so a
/// stale result arriving after the user navigated away is safe to apply.
#[derive(Debug)]
pub enum AppEvent {
    StatusLoaded(StatusInfo),
    StatusSet,
    TemplatesLoaded(Vec<Template>),
    TemplatesSaved(Vec<Template>),
    ConfigUpdated {
        config: Config,
        client: SlackClient,
        message: String,
        path: PathBuf,
    },
    Failed(Error),
}

/// Side effect requested by a transition. Handlers return these instead of
/// spawning tasks themselves; the dispatcher in main turns each into one
/// background task reporting back as an `AppEvent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchStatus,
    LoadTemplates,
    SetStatus {
        text: String,
        emoji: String,
        expiration: i64,
    },
    SaveTemplate(Template),
    DeleteTemplate(String),
    SaveConfig {
        token: String,
        confirm_delete: bool,
    },
    Quit,
}
