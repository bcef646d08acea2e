use serde::{Deserialize, Serialize};

/// Colors of one card variant. Every variant shares the same layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub background_top: String,
    pub background_bottom: String,
    pub panel: String,
    pub text: String,
    pub muted_text: String,
    pub accent: String,
    pub accent_soft: String,
    pub frame: String,
    pub qr_foreground: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            background_top: "#86c5da".to_string(),
            background_bottom: "#5a9bbd".to_string(),
            panel: "#ffffff".to_string(),
            text: "#000000".to_string(),
            muted_text: "#374151".to_string(),
            accent: "#2563eb".to_string(),
            accent_soft: "#dbeafe".to_string(),
            frame: "#93c5fd".to_string(),
            qr_foreground: "#3b82f6".to_string(),
        }
    }

    pub fn sakura() -> Self {
        Self {
            name: "sakura".to_string(),
            background_top: "#fbcfe8".to_string(),
            background_bottom: "#f472b6".to_string(),
            panel: "#fff7fb".to_string(),
            text: "#1f2937".to_string(),
            muted_text: "#6b7280".to_string(),
            accent: "#db2777".to_string(),
            accent_soft: "#fce7f3".to_string(),
            frame: "#f9a8d4".to_string(),
            qr_foreground: "#be185d".to_string(),
        }
    }

    pub fn midnight() -> Self {
        Self {
            name: "midnight".to_string(),
            background_top: "#1e293b".to_string(),
            background_bottom: "#0f172a".to_string(),
            panel: "#f8fafc".to_string(),
            text: "#0f172a".to_string(),
            muted_text: "#475569".to_string(),
            accent: "#7c3aed".to_string(),
            accent_soft: "#ede9fe".to_string(),
            frame: "#a78bfa".to_string(),
            qr_foreground: "#6d28d9".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "classic" => Some(Self::classic()),
            "sakura" => Some(Self::sakura()),
            "midnight" => Some(Self::midnight()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

/// Card sizes in CSS pixels. Both keep the ID-1 aspect ratio (~1.586:1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionPreset {
    #[default]
    Standard,
    Compact,
}

impl DimensionPreset {
    pub const fn size(self) -> (u32, u32) {
        match self {
            DimensionPreset::Standard => (860, 540),
            DimensionPreset::Compact => (500, 315),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_lookup() {
        assert_eq!(Theme::by_name("Sakura").unwrap().name, "sakura");
        assert!(Theme::by_name("neon").is_none());
        assert_eq!(Theme::default(), Theme::classic());
    }

    #[test]
    fn test_presets_keep_id1_ratio() {
        for preset in [DimensionPreset::Standard, DimensionPreset::Compact] {
            let (w, h) = preset.size();
            let ratio = w as f32 / h as f32;
            assert!((ratio - 1.586).abs() < 0.01, "{:?} ratio {}", preset, ratio);
        }
    }
}
