//! Resolving the stored theme preference into an effective appearance.

use serde::Serialize;

use crate::models::Theme;

/// Effective light/dark appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    Light,
    Dark,
}

impl Appearance {
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark {
            Appearance::Dark
        } else {
            Appearance::Light
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Appearance::Dark)
    }

    /// The explicit theme that produces the opposite appearance.
    pub fn toggled_theme(&self) -> Theme {
        match self {
            Appearance::Dark => Theme::Light,
            Appearance::Light => Theme::Dark,
        }
    }
}

/// `dark` and `light` win outright; `system` follows the platform.
pub fn resolve_is_dark(theme: Theme, platform_prefers_dark: bool) -> bool {
    match theme {
        Theme::Dark => true,
        Theme::Light => false,
        Theme::System => platform_prefers_dark,
    }
}

pub fn resolve(theme: Theme, platform_prefers_dark: bool) -> Appearance {
    Appearance::from_dark(resolve_is_dark(theme, platform_prefers_dark))
}
