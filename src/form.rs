use crossterm::event::KeyCode;

use crate::model::Error;

const CHAR_LIMIT: usize = 128;

/// A single labeled text field.
#[derive(Debug, Clone)]
pub struct Field {
    pub placeholder: &'static str,
    pub value: String,
    pub focused: bool,
}

/// Ordered list of text fields with one input focus. The field count and
/// order are fixed at construction and never change while the form is open.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    fn build(placeholders: &[&'static str], values: &[&str]) -> Self {
        let fields = placeholders
            .iter()
            .enumerate()
            .map(|(i, placeholder)| Field {
                placeholder: *placeholder,
                value: values.get(i).map(|v| v.to_string()).unwrap_or_default(),
                focused: i == 0,
            })
            .collect();
        Self { fields, focus: 0 }
    }

    /// Fields for the manual and edit-current status forms.
    pub fn status(text: &str, emoji: &str) -> Self {
        Self::build(
            &[
                "Status text",
                "Emoji (:coffee:)",
                "Duration (minutes, optional)",
                "Until time (HH:MM, optional)",
            ],
            &[text, emoji],
        )
    }

    /// Fields for the create-template form.
    pub fn template() -> Self {
        Self::build(
            &[
                "Template name",
                "Status text",
                "Emoji (:house:)",
                "Duration (minutes, optional)",
                "Until time (HH:MM, optional)",
            ],
            &[],
        )
    }

    /// Single token field for the settings form.
    pub fn settings(token: &str) -> Self {
        Self::build(&["Slack token"], &[token])
    }

    /// Move focus by one field, wrapping in both directions.
    pub fn cycle_focus(&mut self, forward: bool) {
        if self.fields.is_empty() {
            return;
        }
        self.fields[self.focus].focused = false;
        let len = self.fields.len();
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
        self.fields[self.focus].focused = true;
    }

    /// Field text trimmed of surrounding whitespace. Trimming happens at
    /// read time only; the raw value keeps whatever was typed.
    pub fn value(&self, i: usize) -> String {
        self.fields
            .get(i)
            .map(|f| f.value.trim().to_string())
            .unwrap_or_default()
    }

    /// Route a keystroke to the focused field.
    pub fn handle_key(&mut self, code: KeyCode) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        match code {
            KeyCode::Char(c) => {
                if field.value.chars().count() < CHAR_LIMIT {
                    field.value.push(c);
                }
            }
            KeyCode::Backspace => {
                field.value.pop();
            }
            _ => {}
        }
    }
}

/// Blank input means "no value"; anything else must be a number.
pub fn parse_optional_int(v: &str) -> Result<Option<u32>, Error> {
    let v = v.trim();
    if v.is_empty() {
        return Ok(None);
    }
    v.parse::<u32>()
        .map(Some)
        .map_err(|_| Error::Validation(format!("'{v}' is not a number")))
}

pub fn parse_positive_int(v: &str) -> Result<u32, Error> {
    let v = v.trim();
    if v.is_empty() {
        return Err(Error::Validation("value required".into()));
    }
    let n = v
        .parse::<u32>()
        .map_err(|_| Error::Validation(format!("'{v}' is not a number")))?;
    if n == 0 {
        return Err(Error::Validation("value must be greater than 0".into()));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycles_and_wraps() {
        let mut form = Form::status("", "");
        assert_eq!(form.focus, 0);
        assert!(form.fields[0].focused);

        form.cycle_focus(true);
        assert_eq!(form.focus, 1);
        assert!(!form.fields[0].focused);
        assert!(form.fields[1].focused);

        // backward from field 0 wraps to the last field
        form.cycle_focus(false);
        form.cycle_focus(false);
        assert_eq!(form.focus, 3);
        assert!(form.fields[3].focused);

        // forward from the last field wraps to 0
        form.cycle_focus(true);
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_keystrokes_go_to_focused_field() {
        let mut form = Form::status("", "");
        form.handle_key(KeyCode::Char('h'));
        form.handle_key(KeyCode::Char('i'));
        form.cycle_focus(true);
        form.handle_key(KeyCode::Char(':'));
        form.handle_key(KeyCode::Backspace);
        assert_eq!(form.fields[0].value, "hi");
        assert_eq!(form.fields[1].value, "");
    }

    #[test]
    fn test_value_is_trimmed_at_read_time() {
        let mut form = Form::settings("");
        for c in "  xoxp-token  ".chars() {
            form.handle_key(KeyCode::Char(c));
        }
        assert_eq!(form.value(0), "xoxp-token");
        // raw text keeps the padding
        assert_eq!(form.fields[0].value, "  xoxp-token  ");
    }

    #[test]
    fn test_seeded_values() {
        let form = Form::status("At lunch", ":fork_and_knife:");
        assert_eq!(form.value(0), "At lunch");
        assert_eq!(form.value(1), ":fork_and_knife:");
        assert_eq!(form.value(2), "");
        assert_eq!(form.value(3), "");
    }

    #[test]
    fn test_parse_optional_int() {
        assert_eq!(parse_optional_int(""), Ok(None));
        assert_eq!(parse_optional_int("   "), Ok(None));
        assert_eq!(parse_optional_int(" 30 "), Ok(Some(30)));
        assert!(matches!(
            parse_optional_int("soon"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(parse_optional_int("-5"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_parse_positive_int() {
        assert_eq!(parse_positive_int("45"), Ok(45));
        assert!(matches!(parse_positive_int(""), Err(Error::Validation(_))));
        assert!(matches!(parse_positive_int("0"), Err(Error::Validation(_))));
        assert!(matches!(
            parse_positive_int("abc"),
            Err(Error::Validation(_))
        ));
    }
}
