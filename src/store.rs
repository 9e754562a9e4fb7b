use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::{Config, Error, Template, TemplatesFile};

pub const CONFIG_NAME: &str = "config.json";
pub const TEMPLATES_NAME: &str = "templates.json";

/// Look for `name` in `dir` and its parent, in that order.
pub fn resolve_path(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidates = [dir.join(name), dir.join("..").join(name)];
    candidates.into_iter().find(|p| p.exists())
}

/// Find the templates file, creating an empty one on first run. A new file
/// lands next to an existing config.json ({dir, parent}), falling back to
/// `dir` when neither location has one.
pub fn ensure_templates_file(dir: &Path) -> Result<PathBuf, Error> {
    if let Some(path) = resolve_path(dir, TEMPLATES_NAME) {
        return Ok(path);
    }
    let root = if dir.join(CONFIG_NAME).exists() {
        dir.to_path_buf()
    } else if dir.join("..").join(CONFIG_NAME).exists() {
        dir.join("..")
    } else {
        dir.to_path_buf()
    };
    let target = root.join(TEMPLATES_NAME);
    debug!("Creating empty templates file at {}", target.display());
    write_templates(&target, &[])?;
    Ok(target)
}

pub fn load_config(path: &Path) -> Result<Config, Error> {
    let data = fs::read_to_string(path).map_err(|e| Error::Config(e.to_string()))?;
    let cfg: Config = serde_json::from_str(&data).map_err(|e| Error::Config(e.to_string()))?;
    if cfg.slack_token.is_empty() {
        return Err(Error::Config(format!("slackToken missing in {CONFIG_NAME}")));
    }
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<(), Error> {
    let data = serde_json::to_string_pretty(cfg).map_err(|e| Error::Persist(e.to_string()))?;
    fs::write(path, data).map_err(|e| Error::Persist(e.to_string()))
}

pub fn load_templates(path: &Path) -> Result<Vec<Template>, Error> {
    let data = fs::read_to_string(path).map_err(|e| Error::TemplateIo(e.to_string()))?;
    let payload: TemplatesFile =
        serde_json::from_str(&data).map_err(|e| Error::TemplateIo(e.to_string()))?;
    Ok(payload.templates)
}

/// Labels are not guaranteed unique, so deletion removes every template
/// carrying the label. An unknown label yields the list unchanged.
pub fn remove_by_label(templates: &[Template], label: &str) -> Vec<Template> {
    templates
        .iter()
        .filter(|t| t.label != label)
        .cloned()
        .collect()
}

/// Whole-document overwrite; the on-disk list is always complete.
pub fn write_templates(path: &Path, templates: &[Template]) -> Result<(), Error> {
    let payload = TemplatesFile {
        templates: templates.to_vec(),
    };
    let data = serde_json::to_string_pretty(&payload).map_err(|e| Error::Persist(e.to_string()))?;
    fs::write(path, data).map_err(|e| Error::Persist(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_templates() -> Vec<Template> {
        vec![
            Template {
                label: "Lunch".into(),
                text: "At lunch".into(),
                emoji: ":fork_and_knife:".into(),
                duration_in_minutes: Some(30),
                until_time: String::new(),
            },
            Template {
                label: "Focus".into(),
                text: "Deep work".into(),
                emoji: ":headphones:".into(),
                duration_in_minutes: None,
                until_time: "17:00".into(),
            },
        ]
    }

    #[test]
    fn test_templates_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TEMPLATES_NAME);
        let templates = sample_templates();

        write_templates(&path, &templates).unwrap();
        let loaded = load_templates(&path).unwrap();
        assert_eq!(loaded, templates);

        // loading again without an intervening write gives the same list
        let again = load_templates(&path).unwrap();
        assert_eq!(again, loaded);
    }

    #[test]
    fn test_optional_fields_omitted_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TEMPLATES_NAME);
        write_templates(&path, &sample_templates()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entries = value["templates"].as_array().unwrap();
        // first entry has a duration but no untilTime key
        assert_eq!(entries[0]["durationInMinutes"], 30);
        assert!(entries[0].get("untilTime").is_none());
        // second entry is the other way round
        assert!(entries[1].get("durationInMinutes").is_none());
        assert_eq!(entries[1]["untilTime"], "17:00");
    }

    #[test]
    fn test_load_templates_absent_array_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TEMPLATES_NAME);
        fs::write(&path, "{}").unwrap();
        assert_eq!(load_templates(&path).unwrap(), vec![]);
    }

    #[test]
    fn test_load_templates_malformed_is_template_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TEMPLATES_NAME);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_templates(&path),
            Err(Error::TemplateIo(_))
        ));
    }

    #[test]
    fn test_ensure_templates_file_creates_next_to_config() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("app");
        fs::create_dir(&nested).unwrap();
        // marker config lives in the parent
        fs::write(dir.path().join(CONFIG_NAME), "{}").unwrap();

        let path = ensure_templates_file(&nested).unwrap();
        assert!(path.exists());
        assert_eq!(path.parent().unwrap().canonicalize().unwrap(), dir.path().canonicalize().unwrap());
        assert_eq!(load_templates(&path).unwrap(), vec![]);
    }

    #[test]
    fn test_ensure_templates_file_defaults_to_current_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("app");
        fs::create_dir(&nested).unwrap();
        let path = ensure_templates_file(&nested).unwrap();
        assert_eq!(path, nested.join(TEMPLATES_NAME));
        assert!(path.exists());
    }

    #[test]
    fn test_ensure_templates_file_prefers_existing() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("app");
        fs::create_dir(&nested).unwrap();
        let existing = nested.join(TEMPLATES_NAME);
        write_templates(&existing, &sample_templates()).unwrap();

        let path = ensure_templates_file(&nested).unwrap();
        assert_eq!(path, existing);
        assert_eq!(load_templates(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_by_label_removes_all_matches() {
        let mut templates = sample_templates();
        templates.push(Template {
            label: "Lunch".into(),
            text: "Second lunch".into(),
            emoji: ":pizza:".into(),
            duration_in_minutes: None,
            until_time: String::new(),
        });

        let remaining = remove_by_label(&templates, "Lunch");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].label, "Focus");
    }

    #[test]
    fn test_remove_by_unknown_label_keeps_file_equal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(TEMPLATES_NAME);
        let templates = sample_templates();
        write_templates(&path, &templates).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // a no-op delete still rewrites an equal document
        let remaining = remove_by_label(&templates, "Nope");
        assert_eq!(remaining, templates);
        write_templates(&path, &remaining).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_load_config_defaults_confirm_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_NAME);
        fs::write(&path, r#"{"slackToken": "xoxp-123"}"#).unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.slack_token, "xoxp-123");
        assert_eq!(cfg.confirm_delete, None);
        assert!(cfg.effective_confirm_delete());
    }

    #[test]
    fn test_load_config_missing_token_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_NAME);
        fs::write(&path, r#"{"slackToken": ""}"#).unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));

        fs::write(&path, "{}").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_NAME);
        let cfg = Config {
            slack_token: "xoxp-456".into(),
            confirm_delete: Some(false),
        };
        save_config(&path, &cfg).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }
}
