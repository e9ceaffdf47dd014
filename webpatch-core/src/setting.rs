//! Typed per-patch settings.
//!
//! Each patch declares an ordered set of [`SettingDef`]s. At dispatch time
//! the declarations are resolved against the persistence backend into a
//! [`PatchSettings`] map, falling back to each setting's declared default
//! (including when a stored value exists but has the wrong shape).

use std::collections::HashMap;

/// One choice in a select / multi-select setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    /// Label displayed to the user.
    pub label: String,
    /// Value passed to the patch.
    pub value: String,
}

impl SelectOption {
    /// Create an option whose label and value differ.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The type of a setting, together with its declared default and
/// constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingKind {
    /// Free-form text input.
    Text {
        /// Default value.
        default: String,
    },
    /// On/off switch.
    Boolean {
        /// Default value.
        default: bool,
    },
    /// Color picker; values are CSS color strings.
    Color {
        /// Default value.
        default: String,
    },
    /// Numeric input with optional range constraints.
    Number {
        /// Default value.
        default: f64,
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
        /// Granularity hint.
        step: Option<f64>,
    },
    /// Single choice among fixed options.
    Select {
        /// Default value.
        default: String,
        /// Available options.
        options: Vec<SelectOption>,
    },
    /// Any subset of fixed options.
    MultiSelect {
        /// Default value.
        default: Vec<String>,
        /// Available options.
        options: Vec<SelectOption>,
    },
}

impl SettingKind {
    /// The declared default as a [`SettingValue`].
    pub fn default_value(&self) -> SettingValue {
        match self {
            SettingKind::Text { default } => SettingValue::Text(default.clone()),
            SettingKind::Boolean { default } => SettingValue::Boolean(*default),
            SettingKind::Color { default } => SettingValue::Color(default.clone()),
            SettingKind::Number { default, .. } => SettingValue::Number(*default),
            SettingKind::Select { default, .. } => SettingValue::Select(default.clone()),
            SettingKind::MultiSelect { default, .. } => {
                SettingValue::MultiSelect(default.clone())
            }
        }
    }

    /// Whether a stored value has the shape this kind expects.
    ///
    /// Resolution discards stored values that fail this check and uses the
    /// declared default instead.
    pub fn accepts(&self, value: &SettingValue) -> bool {
        matches!(
            (self, value),
            (SettingKind::Text { .. }, SettingValue::Text(_))
                | (SettingKind::Boolean { .. }, SettingValue::Boolean(_))
                | (SettingKind::Color { .. }, SettingValue::Color(_))
                | (SettingKind::Number { .. }, SettingValue::Number(_))
                | (SettingKind::Select { .. }, SettingValue::Select(_))
                | (SettingKind::MultiSelect { .. }, SettingValue::MultiSelect(_))
        )
    }
}

/// Declaration of a single patch setting.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDef {
    /// Identifier, unique within the patch.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Brief description of what the setting changes.
    pub description: String,
    /// Type, default, and constraints.
    pub kind: SettingKind,
}

impl SettingDef {
    /// Create a setting declaration with an empty description.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: SettingKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A concrete setting value, stored or resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Free-form text.
    Text(String),
    /// On/off switch state.
    Boolean(bool),
    /// CSS color string.
    Color(String),
    /// Numeric value.
    Number(f64),
    /// Selected option value.
    Select(String),
    /// Selected option values.
    MultiSelect(Vec<String>),
}

/// Resolved settings handed to a patch's initialization entry point.
///
/// Every declared setting id is present; values are either the stored ones
/// or the declared defaults. The typed accessors return `None` for ids the
/// patch never declared (or declared with a different type), which in
/// correct patch code means a typo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSettings {
    values: HashMap<String, SettingValue>,
}

impl PatchSettings {
    /// The empty settings object, used for patches without a schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a resolved value.
    pub fn insert(&mut self, id: impl Into<String>, value: SettingValue) {
        self.values.insert(id.into(), value);
    }

    /// Raw access to a resolved value.
    pub fn get(&self, id: &str) -> Option<&SettingValue> {
        self.values.get(id)
    }

    /// A resolved boolean setting.
    pub fn boolean(&self, id: &str) -> Option<bool> {
        match self.values.get(id) {
            Some(SettingValue::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    /// A resolved text setting.
    pub fn text(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(SettingValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    /// A resolved color setting.
    pub fn color(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(SettingValue::Color(v)) => Some(v),
            _ => None,
        }
    }

    /// A resolved number setting.
    pub fn number(&self, id: &str) -> Option<f64> {
        match self.values.get(id) {
            Some(SettingValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// A resolved select setting.
    pub fn select(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(SettingValue::Select(v)) => Some(v),
            _ => None,
        }
    }

    /// A resolved multi-select setting.
    pub fn multi_select(&self, id: &str) -> Option<&[String]> {
        match self.values.get(id) {
            Some(SettingValue::MultiSelect(v)) => Some(v),
            _ => None,
        }
    }

    /// Number of resolved settings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the patch declared no settings.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_value_matches_kind() {
        let kind = SettingKind::Number {
            default: 2.5,
            min: Some(0.0),
            max: Some(10.0),
            step: None,
        };
        assert_eq!(kind.default_value(), SettingValue::Number(2.5));
        assert!(kind.accepts(&SettingValue::Number(7.0)));
        assert!(!kind.accepts(&SettingValue::Text("7".into())));
    }

    #[test]
    fn typed_accessors() {
        let mut settings = PatchSettings::empty();
        settings.insert("dark", SettingValue::Boolean(true));
        settings.insert("label", SettingValue::Text("avg".into()));

        assert_eq!(settings.boolean("dark"), Some(true));
        assert_eq!(settings.text("label"), Some("avg"));
        assert_eq!(settings.boolean("label"), None);
        assert_eq!(settings.number("missing"), None);
        assert_eq!(settings.len(), 2);
    }
}
