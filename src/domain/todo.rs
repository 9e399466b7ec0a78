use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PRIORITY: &str = "medium";
pub const DEFAULT_CATEGORY: &str = "other";
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Fully resolved creation input; defaults are already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodo {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub category: String,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            due_date: None,
            priority: DEFAULT_PRIORITY.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Creation input as the client sent it, before presence checks and defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: Option<String>,
    pub due_date: DueDateInput,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl TodoDraft {
    /// `None` when the title is missing; an empty title is accepted.
    pub fn resolve(self) -> Option<CreateTodo> {
        Some(CreateTodo {
            title: self.title?,
            due_date: self.due_date.on_create(),
            priority: self.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            category: self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        })
    }
}

/// Partial update. `None` leaves a field untouched; `due_date: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl UpdateTodo {
    pub fn apply(self, todo: &mut Todo) {
        if let Some(t) = self.title { todo.title = t; }
        if let Some(c) = self.completed { todo.completed = c; }
        if let Some(d) = self.due_date { todo.due_date = d; }
        if let Some(p) = self.priority { todo.priority = p; }
        if let Some(c) = self.category { todo.category = c; }
    }
}

/// What a client-supplied `due_date` turned out to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueDateInput {
    /// null, "", false, 0 and other falsy JSON.
    #[default]
    Clear,
    Date(NaiveDate),
    /// Present and truthy but not a `YYYY-MM-DD` string.
    Unparseable,
}

impl DueDateInput {
    pub fn from_json(value: &Value) -> Self {
        if is_falsy(value) {
            return Self::Clear;
        }
        match value.as_str().and_then(parse_due_date) {
            Some(date) => Self::Date(date),
            None => Self::Unparseable,
        }
    }

    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Clear;
        }
        parse_due_date(raw).map_or(Self::Unparseable, Self::Date)
    }

    /// Creation policy: anything that is not a valid date becomes unscheduled.
    pub fn on_create(self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(date),
            Self::Clear | Self::Unparseable => None,
        }
    }

    /// Update policy: a valid date sets, falsy clears, garbage keeps the stored value.
    pub fn on_update(self) -> Option<Option<NaiveDate>> {
        match self {
            Self::Date(date) => Some(Some(date)),
            Self::Clear => Some(None),
            Self::Unparseable => None,
        }
    }
}

/// Strict `YYYY-MM-DD`: four-digit year (not 0000), one- or two-digit month and
/// day, no sign and no surrounding whitespace. Chrono alone accepts all of those.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    let digits = |s: &str, min: usize, max: usize| (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if parts.next().is_some() || !digits(year, 4, 4) || !digits(month, 1, 2) || !digits(day, 1, 2) || year == "0000" {
        return None;
    }
    NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT).ok()
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn due_date_inputs() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(DueDateInput::from_json(&json!("2024-03-15")), DueDateInput::Date(date));
        assert_eq!(DueDateInput::from_json(&json!(null)), DueDateInput::Clear);
        assert_eq!(DueDateInput::from_json(&json!("")), DueDateInput::Clear);
        assert_eq!(DueDateInput::from_json(&json!(0)), DueDateInput::Clear);
        assert_eq!(DueDateInput::from_json(&json!("not-a-date")), DueDateInput::Unparseable);
        assert_eq!(DueDateInput::from_json(&json!("15/03/2024")), DueDateInput::Unparseable);
        assert_eq!(DueDateInput::from_json(&json!(20240315)), DueDateInput::Unparseable);
        assert_eq!(DueDateInput::from_json(&json!("2024-3-5")), DueDateInput::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
    }

    #[test]
    fn due_date_rejects_loose_shapes() {
        for raw in [" 2024-03-15", "2024-03-15 ", "+2024-03-15", "0000-01-01", "12024-03-15", "2024-03-15-01", "2024-003-15", "2024-02-30"] {
            assert_eq!(DueDateInput::from_json(&json!(raw)), DueDateInput::Unparseable, "{raw:?}");
        }
        assert_eq!(DueDateInput::from_text("+2024-03-15"), DueDateInput::Unparseable);
    }

    #[test]
    fn create_and_update_policies_differ_on_garbage() {
        assert_eq!(DueDateInput::Unparseable.on_create(), None);
        assert_eq!(DueDateInput::Unparseable.on_update(), None);
        assert_eq!(DueDateInput::Clear.on_update(), Some(None));
    }

    #[test]
    fn draft_applies_defaults_and_requires_title() {
        assert_eq!(TodoDraft::default().resolve(), None);
        let resolved = TodoDraft { title: Some(String::new()), ..Default::default() }.resolve().unwrap();
        assert_eq!(resolved, CreateTodo::new(""));
        let resolved = TodoDraft {
            title: Some("X".into()),
            due_date: DueDateInput::Unparseable,
            priority: Some("low".into()),
            category: None,
        }
        .resolve()
        .unwrap();
        assert_eq!(resolved.due_date, None);
        assert_eq!(resolved.priority, "low");
        assert_eq!(resolved.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn update_touches_only_present_fields() {
        let mut todo = Todo {
            id: TodoId(1),
            title: "Buy milk".into(),
            completed: false,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            priority: "high".into(),
            category: "errands".into(),
            created_at: Utc::now(),
        };
        let before = todo.clone();
        UpdateTodo { completed: Some(true), ..Default::default() }.apply(&mut todo);
        assert!(todo.completed);
        assert_eq!(Todo { completed: false, ..todo }, before);
    }
}
