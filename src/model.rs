use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_NOTE_TITLE: &str = "Title";
pub const DEFAULT_NOTE_BODY: &str = "Content";
pub const DEFAULT_NOTE_COLOR: &str = "#fff9a6";
pub const DEFAULT_CATEGORY_COLOR: &str = "rgba(36, 183, 252, 0.1)";

/// Days before a deadline during which a note counts as approaching.
pub const APPROACHING_WINDOW_DAYS: i64 = 3;

pub const NOTE_PALETTE: [(&str, &str); 4] = [
    ("Yellow", "#fff9a6"),
    ("Blue", "#a6e7ff"),
    ("Green", "#b5f5c5"),
    ("Pink", "#ffd1dc"),
];

pub const CATEGORY_PALETTE: [(&str, &str); 5] = [
    ("Bright Blue", "#00bfff"),
    ("Bright Green", "#00ff00"),
    ("Bright Pink", "#ff69b4"),
    ("Bright Purple", "rgba(138, 43, 226, 0.7)"),
    ("Bright Orange", "#ffa500"),
];

const DEADLINE_FORMAT: &str = "%d/%m-%Y";
const ISO_FORMAT: &str = "%Y-%m-%d";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid deadline {0:?} (use dd/mm-yyyy or yyyy-mm-dd)")]
pub struct ParseDeadlineError(pub String);

/// A whole-day deadline, written `dd/mm-yyyy` in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(NaiveDate);

impl Deadline {
    pub fn new(date: NaiveDate) -> Self {
        Deadline(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parses user input. Accepts the stored form and the ISO form a date
    /// picker produces.
    pub fn parse_input(input: &str) -> Result<Self, ParseDeadlineError> {
        let trimmed = input.trim();
        trimmed.parse::<Deadline>().or_else(|_| {
            NaiveDate::parse_from_str(trimmed, ISO_FORMAT)
                .map(Deadline)
                .map_err(|_| ParseDeadlineError(trimmed.to_string()))
        })
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.0 - today).num_days()
    }

    pub fn status_on(&self, today: NaiveDate) -> DeadlineStatus {
        let days = self.days_remaining(today);
        if days < 0 {
            DeadlineStatus::Overdue
        } else if days <= APPROACHING_WINDOW_DAYS {
            DeadlineStatus::Approaching
        } else {
            DeadlineStatus::None
        }
    }
}

impl FromStr for Deadline {
    type Err = ParseDeadlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DEADLINE_FORMAT)
            .map(Deadline)
            .map_err(|_| ParseDeadlineError(s.to_string()))
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DEADLINE_FORMAT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    None,
    Approaching,
    Overdue,
}

impl DeadlineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeadlineStatus::None => "",
            DeadlineStatus::Approaching => "approaching",
            DeadlineStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub body: String,
    pub color: String,
    pub category: String,
    pub deadline: Option<Deadline>,
}

impl Note {
    pub fn new(category: impl Into<String>) -> Self {
        Note {
            title: DEFAULT_NOTE_TITLE.to_string(),
            body: DEFAULT_NOTE_BODY.to_string(),
            color: DEFAULT_NOTE_COLOR.to_string(),
            category: category.into(),
            deadline: None,
        }
    }

    pub fn status_on(&self, today: NaiveDate) -> DeadlineStatus {
        self.deadline
            .map(|d| d.status_on(today))
            .unwrap_or(DeadlineStatus::None)
    }

    pub fn status(&self) -> DeadlineStatus {
        self.status_on(today())
    }

    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            title: self.title.clone(),
            body: self.body.clone(),
            color: self.color.clone(),
            category: self.category.clone(),
            deadline: self.deadline.map(|d| d.to_string()).unwrap_or_default(),
        }
    }

    /// Rebuilds a note from its stored form. A deadline that does not parse
    /// is dropped.
    pub fn from_record(record: NoteRecord) -> Self {
        let raw = record.deadline.trim();
        let deadline = if raw.is_empty() {
            None
        } else {
            match raw.parse::<Deadline>() {
                Ok(d) => Some(d),
                Err(err) => {
                    tracing::warn!(title = %record.title, "{}; treating note as undated", err);
                    None
                }
            }
        };
        Note {
            title: record.title,
            body: record.body,
            color: record.color,
            category: record.category,
            deadline,
        }
    }
}

/// Persisted shape of a note under the `stickyNotes` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub title: String,
    pub body: String,
    pub color: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub deadline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("enabled") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn stored_value(&self) -> &'static str {
        match self {
            Theme::Dark => "enabled",
            Theme::Light => "disabled",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolves a palette name (case-insensitive) to its value, otherwise
/// returns the input unchanged.
pub fn resolve_color(palette: &[(&str, &str)], input: &str) -> String {
    let trimmed = input.trim();
    palette
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        .map(|(_, value)| value.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_thresholds() {
        let today = date(2026, 10, 14);
        let on = |offset: i64| Deadline::new(today + Duration::days(offset)).status_on(today);
        assert_eq!(on(0), DeadlineStatus::Approaching);
        assert_eq!(on(3), DeadlineStatus::Approaching);
        assert_eq!(on(4), DeadlineStatus::None);
        assert_eq!(on(-1), DeadlineStatus::Overdue);
    }

    #[test]
    fn undated_note_has_no_status() {
        let note = Note::new("Work");
        assert_eq!(note.status_on(date(2026, 1, 1)), DeadlineStatus::None);
    }

    #[test]
    fn deadline_uses_day_slash_month_dash_year() {
        let d: Deadline = "01/02-2030".parse().unwrap();
        assert_eq!(d.date(), date(2030, 2, 1));
        assert_eq!(d.to_string(), "01/02-2030");
    }

    #[test]
    fn input_accepts_iso_dates() {
        let d = Deadline::parse_input(" 2030-02-01 ").unwrap();
        assert_eq!(d.to_string(), "01/02-2030");
        let err = Deadline::parse_input("31/02-2030").unwrap_err();
        assert_eq!(err, ParseDeadlineError("31/02-2030".to_string()));
    }

    #[test]
    fn malformed_stored_deadline_is_dropped() {
        let record = NoteRecord {
            title: "t".into(),
            body: "b".into(),
            color: DEFAULT_NOTE_COLOR.into(),
            category: "Work".into(),
            deadline: "12/1".into(),
        };
        assert_eq!(Note::from_record(record).deadline, None);
    }

    #[test]
    fn record_without_deadline_field_decodes() {
        let raw = r##"{"title":"a","body":"<b>x</b>","color":"#fff9a6","category":"Ideas"}"##;
        let record: NoteRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.deadline, "");
        assert_eq!(Note::from_record(record).body, "<b>x</b>");
    }

    #[test]
    fn theme_round_trips_through_stored_value() {
        assert_eq!(Theme::from_stored(Some("enabled")), Theme::Dark);
        assert_eq!(Theme::from_stored(Some("disabled")), Theme::Light);
        assert_eq!(Theme::from_stored(None), Theme::Light);
        assert_eq!(Theme::Dark.toggled().stored_value(), "disabled");
    }

    #[test]
    fn palette_names_resolve() {
        assert_eq!(resolve_color(&NOTE_PALETTE, "pink"), "#ffd1dc");
        assert_eq!(resolve_color(&NOTE_PALETTE, "#123456"), "#123456");
    }
}
