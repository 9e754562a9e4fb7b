use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use throbber_widgets_tui::ThrobberState;
use tracing::debug;

use crate::form::{Form, parse_optional_int, parse_positive_int};
use crate::model::{AppEvent, Command, Config, Error, Screen, StatusInfo, Template};
use crate::slack::SlackClient;
use crate::store;

const DEFAULT_HINT: &str = "Tab to switch, Enter to use, ? for help";

pub struct App {
    pub screen: Screen,
    pub client: Option<SlackClient>,
    pub status: StatusInfo,
    pub templates: Vec<Template>,
    pub selected: usize,
    pub list_state: ListState,
    pub form: Option<Form>,
    pub config: Config,
    pub confirm_delete: bool,
    pub config_path: PathBuf,
    pub templates_path: Option<PathBuf>,
    pub message: String,
    pub err: Option<Error>,
    pub loading: bool,
    pub throbber_state: ThrobberState,
}

impl App {
    /// Build the starting model from the files around `base_dir`. Load
    /// failures are advisory: the app still comes up, with the affected
    /// feature (remote calls, template actions) disabled.
    pub fn new(base_dir: &Path) -> (Self, Vec<Command>) {
        let mut err: Option<Error> = None;
        let mut config = Config::default();
        let mut client = None;

        let config_path = match store::resolve_path(base_dir, store::CONFIG_NAME) {
            Some(path) => {
                match store::load_config(&path) {
                    Ok(cfg) => {
                        match SlackClient::new(&cfg.slack_token) {
                            Ok(c) => client = Some(c),
                            Err(e) => err = Some(e),
                        }
                        config = cfg;
                    }
                    Err(e) => err = Some(e),
                }
                path
            }
            None => {
                err = Some(Error::Config(format!(
                    "{} not found in current or parent directory",
                    store::CONFIG_NAME
                )));
                base_dir.join("..").join(store::CONFIG_NAME)
            }
        };

        let templates_path = match store::ensure_templates_file(base_dir) {
            Ok(path) => Some(path),
            Err(e) => {
                err = Some(match err.take() {
                    Some(prev) => Error::TemplateIo(format!("{prev}; {e}")),
                    None => e,
                });
                None
            }
        };

        let mut list_state = ListState::default();
        list_state.select(Some(0));
        let confirm_delete = config.effective_confirm_delete();
        let app = Self {
            screen: Screen::Dashboard,
            client,
            status: StatusInfo::default(),
            templates: Vec::new(),
            selected: 0,
            list_state,
            form: None,
            config,
            confirm_delete,
            config_path,
            templates_path,
            message: DEFAULT_HINT.into(),
            err,
            loading: false,
            throbber_state: ThrobberState::default(),
        };

        let mut commands = Vec::new();
        if app.client.is_some() {
            commands.push(Command::FetchStatus);
        }
        if app.templates_path.is_some() {
            commands.push(Command::LoadTemplates);
        }
        (app, commands)
    }

    pub fn selected_template(&self) -> Option<&Template> {
        self.templates.get(self.selected)
    }

    /// Transition function for keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::DeleteConfirm => self.handle_delete_confirm_key(key),
            _ => self.handle_form_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Command::Quit];
        }
        match key.code {
            KeyCode::Char('q') => vec![Command::Quit],
            KeyCode::Char('r') => {
                self.loading = true;
                self.message = "Refreshing...".into();
                vec![Command::FetchStatus, Command::LoadTemplates]
            }
            KeyCode::Enter => {
                let Some(t) = self.selected_template().cloned() else {
                    return Vec::new();
                };
                match compute_expiration(t.duration_in_minutes, &t.until_time, Local::now()) {
                    Ok(expiration) => {
                        self.loading = true;
                        self.message = format!("Applying '{}'...", t.label);
                        vec![Command::SetStatus {
                            text: t.text,
                            emoji: t.emoji,
                            expiration,
                        }]
                    }
                    Err(e) => {
                        self.err = Some(e);
                        Vec::new()
                    }
                }
            }
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.screen = Screen::ManualStatus;
                self.message = "Set a custom status".into();
                self.form = Some(Form::status("", ""));
                Vec::new()
            }
            KeyCode::Char('e') => {
                self.screen = Screen::EditCurrent;
                self.message = "Modify current status".into();
                self.form = Some(Form::status(&self.status.text, &self.status.emoji));
                Vec::new()
            }
            KeyCode::Char('c') => {
                self.screen = Screen::CreateTemplate;
                self.message = "Create a reusable template".into();
                self.form = Some(Form::template());
                Vec::new()
            }
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                let Some(t) = self.selected_template() else {
                    return Vec::new();
                };
                if !self.confirm_delete {
                    let label = t.label.clone();
                    return vec![Command::DeleteTemplate(label)];
                }
                self.screen = Screen::DeleteConfirm;
                self.message = "Delete selected template? (y/n)".into();
                Vec::new()
            }
            KeyCode::Char('s') => {
                self.screen = Screen::Settings;
                self.message = "Update settings".into();
                self.form = Some(Form::settings(&self.config.slack_token));
                Vec::new()
            }
            KeyCode::Char('?') => {
                self.message = "Keys: enter use template | a manual | e edit current | \
                                c create template | x delete | s settings | r refresh | q quit"
                    .into();
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.templates.is_empty() {
                    self.selected = (self.selected + 1).min(self.templates.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                self.list_state.select(Some(self.selected));
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_delete_confirm_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
        let label = self.selected_template().map(|t| t.label.clone());
        self.back_to_dashboard();
        match (confirmed, label) {
            (true, Some(label)) => vec![Command::DeleteTemplate(label)],
            _ => Vec::new(),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let backward = key.code == KeyCode::BackTab
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('p'));
        let forward = key.code == KeyCode::Tab
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('n'));

        match key.code {
            KeyCode::Esc => {
                self.back_to_dashboard();
                return Vec::new();
            }
            KeyCode::Enter => {
                return if self.screen == Screen::Settings {
                    self.submit_settings()
                } else {
                    self.submit_form()
                };
            }
            // the toggle wins over text entry on the single-field token
            // form, where a bare 't' or space is never part of a token
            KeyCode::Char('t') | KeyCode::Char(' ') if self.screen == Screen::Settings => {
                self.confirm_delete = !self.confirm_delete;
                return Vec::new();
            }
            _ => {}
        }

        if forward || backward {
            if let Some(form) = &mut self.form {
                form.cycle_focus(forward);
            }
            return Vec::new();
        }

        if let Some(form) = &mut self.form {
            form.handle_key(key.code);
        }
        Vec::new()
    }

    fn submit_form(&mut self) -> Vec<Command> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        match self.screen {
            Screen::ManualStatus | Screen::EditCurrent => {
                let text = form.value(0);
                let emoji = form.value(1);
                let duration = match parse_optional_int(&form.value(2)) {
                    Ok(d) => d,
                    Err(e) => {
                        self.err = Some(Error::Validation(format!("duration: {e}")));
                        return Vec::new();
                    }
                };
                let until = form.value(3);
                if text.is_empty() || emoji.is_empty() {
                    self.err = Some(Error::Validation("text and emoji are required".into()));
                    return Vec::new();
                }
                let expiration = match compute_expiration(duration, &until, Local::now()) {
                    Ok(exp) => exp,
                    Err(e) => {
                        self.err = Some(e);
                        return Vec::new();
                    }
                };
                self.back_to_dashboard();
                self.loading = true;
                self.message = "Updating status...".into();
                vec![Command::SetStatus {
                    text,
                    emoji,
                    expiration,
                }]
            }
            Screen::CreateTemplate => {
                let label = form.value(0);
                let text = form.value(1);
                let emoji = form.value(2);
                // a stored template carries a positive duration or none
                let duration_raw = form.value(3);
                let duration = if duration_raw.is_empty() {
                    None
                } else {
                    match parse_positive_int(&duration_raw) {
                        Ok(d) => Some(d),
                        Err(e) => {
                            self.err = Some(Error::Validation(format!("duration: {e}")));
                            return Vec::new();
                        }
                    }
                };
                let until = form.value(4);
                if label.is_empty() || text.is_empty() || emoji.is_empty() {
                    self.err =
                        Some(Error::Validation("label, text, and emoji are required".into()));
                    return Vec::new();
                }
                self.back_to_dashboard();
                self.loading = true;
                self.message = "Saving template...".into();
                vec![Command::SaveTemplate(Template {
                    label,
                    text,
                    emoji,
                    duration_in_minutes: duration,
                    until_time: until,
                })]
            }
            _ => Vec::new(),
        }
    }

    /// Stays on the settings screen until the config update (or its
    /// failure) comes back from the background task.
    fn submit_settings(&mut self) -> Vec<Command> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        let token = form.value(0);
        if token.is_empty() {
            self.err = Some(Error::Validation("slack token is required".into()));
            return Vec::new();
        }
        self.loading = true;
        self.message = "Validating token...".into();
        vec![Command::SaveConfig {
            token,
            confirm_delete: self.confirm_delete,
        }]
    }

    /// Transition function for async results. Applied whatever the current
    /// screen is; each event touches its own slice of the model.
    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::StatusLoaded(info) => {
                debug!("Status refreshed for '{}'", info.user);
                self.status = info;
                self.message = "Status refreshed".into();
                self.err = None;
                self.loading = false;
                Vec::new()
            }
            AppEvent::StatusSet => {
                self.message = "Status updated".into();
                self.err = None;
                if self.client.is_some() {
                    vec![Command::FetchStatus]
                } else {
                    self.loading = false;
                    Vec::new()
                }
            }
            AppEvent::TemplatesLoaded(templates) => {
                debug!("Loaded {} template(s)", templates.len());
                self.templates = templates;
                if self.templates.is_empty() {
                    self.selected = 0;
                } else if self.selected >= self.templates.len() {
                    self.selected = self.templates.len() - 1;
                }
                self.list_state.select(Some(self.selected));
                self.message = "Templates loaded".into();
                self.err = None;
                self.loading = false;
                Vec::new()
            }
            AppEvent::TemplatesSaved(_) => {
                self.back_to_dashboard();
                self.message = "Templates saved".into();
                vec![Command::LoadTemplates]
            }
            AppEvent::ConfigUpdated {
                config,
                client,
                message,
                path,
            } => {
                self.confirm_delete = config.effective_confirm_delete();
                self.config = config;
                self.client = Some(client);
                self.config_path = path;
                self.message = message;
                self.err = None;
                self.loading = false;
                self.back_to_dashboard();
                vec![Command::FetchStatus]
            }
            AppEvent::Failed(e) => {
                debug!("Operation failed: {}", e);
                self.err = Some(e);
                self.message.clear();
                self.loading = false;
                Vec::new()
            }
        }
    }

    fn back_to_dashboard(&mut self) {
        self.screen = Screen::Dashboard;
        self.form = None;
    }
}

/// Unix expiration for a status, computed at the instant of submission.
/// An empty `until` with no duration means "no expiration" (0). When both
/// are set, the duration wins: until is parsed (and validated) first, the
/// duration then overwrites the same slot.
pub fn compute_expiration(
    duration: Option<u32>,
    until: &str,
    now: DateTime<Local>,
) -> Result<i64, Error> {
    let mut expiration = 0i64;
    if !until.is_empty() {
        let t = NaiveTime::parse_from_str(until, "%H:%M")
            .map_err(|_| Error::Validation("until time must be HH:MM".into()))?;
        let target = now.date_naive().and_time(t);
        if let Some(local) = Local.from_local_datetime(&target).single() {
            expiration = local.timestamp();
        }
    }
    if let Some(minutes) = duration {
        expiration = (now + Duration::minutes(i64::from(minutes))).timestamp();
    }
    Ok(expiration)
}
