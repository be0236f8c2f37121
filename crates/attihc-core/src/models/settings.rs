//! User settings, persisted as a single JSON object.
//!
//! Decoding is lenient field by field: a stored object with one bad field
//! keeps every other field and only that one falls back to its default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::lenient;

/// Stored appearance preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}' (expected light, dark or system)", other)),
        }
    }
}

/// Optional dashboard widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    FocusTimer,
    QuickNotes,
    DailyInspiration,
    WaterTracker,
    PriorityMatrix,
    QuickActions,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::FocusTimer,
        Feature::QuickNotes,
        Feature::DailyInspiration,
        Feature::WaterTracker,
        Feature::PriorityMatrix,
        Feature::QuickActions,
    ];

    /// The key used for this feature in the persisted settings object.
    pub fn key(&self) -> &'static str {
        match self {
            Feature::FocusTimer => "focusTimer",
            Feature::QuickNotes => "quickNotes",
            Feature::DailyInspiration => "dailyInspiration",
            Feature::WaterTracker => "waterTracker",
            Feature::PriorityMatrix => "priorityMatrix",
            Feature::QuickActions => "quickActions",
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    /// Accepts the persisted key (`focusTimer`) or a kebab/snake spelling
    /// (`focus-timer`, `focus_timer`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        Feature::ALL
            .into_iter()
            .find(|f| f.key().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown feature '{}'", s))
    }
}

/// On/off flags for the optional widgets. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    #[serde(deserialize_with = "lenient::or_default")]
    pub focus_timer: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub quick_notes: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub daily_inspiration: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub water_tracker: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub priority_matrix: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub quick_actions: bool,
}

impl Features {
    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::FocusTimer => self.focus_timer,
            Feature::QuickNotes => self.quick_notes,
            Feature::DailyInspiration => self.daily_inspiration,
            Feature::WaterTracker => self.water_tracker,
            Feature::PriorityMatrix => self.priority_matrix,
            Feature::QuickActions => self.quick_actions,
        }
    }

    pub fn set(&mut self, feature: Feature, on: bool) {
        let slot = match feature {
            Feature::FocusTimer => &mut self.focus_timer,
            Feature::QuickNotes => &mut self.quick_notes,
            Feature::DailyInspiration => &mut self.daily_inspiration,
            Feature::WaterTracker => &mut self.water_tracker,
            Feature::PriorityMatrix => &mut self.priority_matrix,
            Feature::QuickActions => &mut self.quick_actions,
        };
        *slot = on;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Hour (0-23) at which the logical day rolls over.
    #[serde(deserialize_with = "lenient::hour")]
    pub reset_hour: u8,
    /// Suppresses hints and animation.
    #[serde(deserialize_with = "lenient::or_default")]
    pub quiet: bool,
    #[serde(deserialize_with = "lenient::bool_or_true")]
    pub shortcuts: bool,
    /// Plaintext UI lock. Not a security boundary.
    #[serde(
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub passcode: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub theme: Theme,
    #[serde(deserialize_with = "lenient::object_or_default")]
    pub features: Features,
    /// Dashboard card order, by widget identifier.
    #[serde(
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub layout_order: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub tutorial_completed: bool,
    #[serde(deserialize_with = "lenient::or_default")]
    pub tutorial_step: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reset_hour: 0,
            quiet: false,
            shortcuts: true,
            passcode: None,
            theme: Theme::System,
            features: Features::default(),
            layout_order: None,
            tutorial_completed: false,
            tutorial_step: 0,
        }
    }
}

impl Settings {
    /// Decode a persisted settings blob. Never fails: unparseable text or a
    /// non-object yields the defaults.
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str::<serde_json::Value>(raw)
            .ok()
            .and_then(lenient::decode_object)
            .unwrap_or_default()
    }

    /// Shallow-merge a patch into these settings.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(h) = patch.reset_hour {
            self.reset_hour = h.min(23);
        }
        if let Some(q) = patch.quiet {
            self.quiet = q;
        }
        if let Some(s) = patch.shortcuts {
            self.shortcuts = s;
        }
        if let Some(p) = patch.passcode {
            self.passcode = p;
        }
        if let Some(t) = patch.theme {
            self.theme = t;
        }
        if let Some(f) = patch.features {
            self.features = f;
        }
        if let Some(l) = patch.layout_order {
            self.layout_order = Some(l);
        }
        if let Some(c) = patch.tutorial_completed {
            self.tutorial_completed = c;
        }
        if let Some(step) = patch.tutorial_step {
            self.tutorial_step = step;
        }
    }
}

/// A partial update to [`Settings`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub reset_hour: Option<u8>,
    pub quiet: Option<bool>,
    pub shortcuts: Option<bool>,
    /// `Some(None)` clears the passcode.
    pub passcode: Option<Option<String>>,
    pub theme: Option<Theme>,
    pub features: Option<Features>,
    pub layout_order: Option<Vec<String>>,
    pub tutorial_completed: Option<bool>,
    pub tutorial_step: Option<u32>,
}

impl SettingsPatch {
    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record_fields_use_defaults() {
        let s = Settings::from_json("{}");
        assert_eq!(s, Settings::default());
        assert!(s.shortcuts);
        assert_eq!(s.theme, Theme::System);
    }

    #[test]
    fn test_corrupt_record_uses_defaults() {
        assert_eq!(Settings::from_json("not json"), Settings::default());
        assert_eq!(Settings::from_json("[1,2]"), Settings::default());
        assert_eq!(Settings::from_json("42"), Settings::default());
        assert_eq!(Settings::from_json("null"), Settings::default());
        assert_eq!(Settings::from_json("[5, true, false]"), Settings::default());
    }

    #[test]
    fn test_features_array_is_ignored() {
        let s = Settings::from_json(r#"{"quiet": true, "features": [true, true]}"#);
        assert!(s.quiet);
        assert_eq!(s.features, Features::default());
    }

    #[test]
    fn test_one_bad_field_keeps_the_rest() {
        let raw = r#"{
            "resetHour": "noon",
            "quiet": true,
            "shortcuts": false,
            "passcode": "1234",
            "theme": "dark",
            "features": {"focusTimer": true, "waterTracker": "yes"},
            "layoutOrder": ["today", "focus"],
            "tutorialCompleted": true,
            "tutorialStep": 3
        }"#;
        let s = Settings::from_json(raw);
        assert_eq!(s.reset_hour, 0);
        assert!(s.quiet);
        assert!(!s.shortcuts);
        assert_eq!(s.passcode.as_deref(), Some("1234"));
        assert_eq!(s.theme, Theme::Dark);
        assert!(s.features.focus_timer);
        assert!(!s.features.water_tracker);
        assert_eq!(
            s.layout_order,
            Some(vec!["today".to_string(), "focus".to_string()])
        );
        assert!(s.tutorial_completed);
        assert_eq!(s.tutorial_step, 3);
    }

    #[test]
    fn test_invalid_types_per_field() {
        let raw = r#"{"shortcuts": 1, "theme": "purple", "features": 7, "passcode": 99, "tutorialStep": -1}"#;
        let s = Settings::from_json(raw);
        assert!(s.shortcuts);
        assert_eq!(s.theme, Theme::System);
        assert_eq!(s.features, Features::default());
        assert_eq!(s.passcode, None);
        assert_eq!(s.tutorial_step, 0);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let raw = r#"{"resetHour": 3, "quiet": "x", "theme": "light"}"#;
        let once = Settings::from_json(raw);
        let again = Settings::from_json(&serde_json::to_string(&once).unwrap());
        assert_eq!(once, again);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["resetHour"], 0);
        assert_eq!(json["theme"], "system");
        assert_eq!(json["features"]["focusTimer"], false);
        assert!(json.get("passcode").is_none());
    }

    #[test]
    fn test_apply_patch() {
        let mut s = Settings::default();
        s.apply(SettingsPatch {
            reset_hour: Some(3),
            passcode: Some(Some("0000".to_string())),
            ..SettingsPatch::default()
        });
        assert_eq!(s.reset_hour, 3);
        assert_eq!(s.passcode.as_deref(), Some("0000"));
        assert_eq!(s.theme, Theme::System);

        s.apply(SettingsPatch {
            passcode: Some(None),
            ..SettingsPatch::default()
        });
        assert_eq!(s.passcode, None);
        assert_eq!(s.reset_hour, 3);
    }

    #[test]
    fn test_feature_names() {
        assert_eq!("focusTimer".parse::<Feature>(), Ok(Feature::FocusTimer));
        assert_eq!("water-tracker".parse::<Feature>(), Ok(Feature::WaterTracker));
        assert_eq!("quick_actions".parse::<Feature>(), Ok(Feature::QuickActions));
        assert!("jetpack".parse::<Feature>().is_err());

        let mut f = Features::default();
        f.set(Feature::QuickNotes, true);
        assert!(f.get(Feature::QuickNotes));
        assert!(!f.get(Feature::FocusTimer));
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Light.to_string(), "light");
    }
}
