//! Theme resolution: preset names and raw color values to a concrete style.

use serde::{Deserialize, Serialize};

use crate::record::lenient;

// ============================================================================
// COLOR
// ============================================================================

/// An RGB color as drawn by the painter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub fn black() -> Self {
        Color::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Color::rgb(255, 255, 255)
    }
}

/// A color literal of the form `#RRGGBB`.
///
/// The only constructor validates the pattern, so a `HexColor` is always
/// drawable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(HexColor(value.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_color(&self) -> Color {
        let channel = |i: usize| u8::from_str_radix(&self.0[i..i + 2], 16).unwrap_or(0);
        Color::rgb(channel(1), channel(3), channel(5))
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Light,
    Dark,
}

impl Mode {
    /// Exact match only: `"Dark"` or `" dark"` are not modes.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Mode::Light),
            "dark" => Some(Mode::Dark),
            _ => None,
        }
    }
}

// ============================================================================
// STATIC CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct NamedColor {
    pub name: &'static str,
    pub hex: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetName {
    Professional,
    Modern,
    Elegant,
    Vibrant,
    Night,
}

impl PresetName {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "professional" => Some(PresetName::Professional),
            "modern" => Some(PresetName::Modern),
            "elegant" => Some(PresetName::Elegant),
            "vibrant" => Some(PresetName::Vibrant),
            "night" => Some(PresetName::Night),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: PresetName,
    pub primary: &'static str,
    pub accent: &'static str,
    pub mode: Mode,
}

pub const PALETTE: &[NamedColor] = &[
    NamedColor { name: "blue", hex: "#2E86DE" },
    NamedColor { name: "red", hex: "#D7263D" },
    NamedColor { name: "green", hex: "#2ECC71" },
    NamedColor { name: "purple", hex: "#7D3C98" },
    NamedColor { name: "orange", hex: "#E67E22" },
    NamedColor { name: "teal", hex: "#17A589" },
    NamedColor { name: "gray", hex: "#566573" },
];

pub const PRESETS: &[Preset] = &[
    Preset { name: PresetName::Professional, primary: "blue", accent: "gray", mode: Mode::Light },
    Preset { name: PresetName::Modern, primary: "purple", accent: "teal", mode: Mode::Light },
    Preset { name: PresetName::Elegant, primary: "green", accent: "gray", mode: Mode::Light },
    Preset { name: PresetName::Vibrant, primary: "orange", accent: "red", mode: Mode::Light },
    Preset { name: PresetName::Night, primary: "teal", accent: "purple", mode: Mode::Dark },
];

const DEFAULT_PRIMARY: &str = "#2E86DE";
const DEFAULT_ACCENT: &str = "#7D3C98";

// ============================================================================
// REQUEST / RESOLVED STYLE
// ============================================================================

/// A theme as requested by the caller. Values are kept raw; anything the
/// resolver does not recognise is ignored rather than rejected.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub preset: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub primary_color: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub accent_color: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStyle {
    pub primary: HexColor,
    pub accent: HexColor,
    pub mode: Mode,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        ResolvedStyle {
            primary: HexColor(DEFAULT_PRIMARY.to_string()),
            accent: HexColor(DEFAULT_ACCENT.to_string()),
            mode: Mode::Light,
        }
    }
}

impl ResolvedStyle {
    pub fn is_dark(&self) -> bool {
        self.mode == Mode::Dark
    }

    /// Concrete ink colors for every element the layout draws.
    pub fn tones(&self) -> Tones {
        let dark = self.is_dark();
        Tones {
            primary: self.primary.to_color(),
            accent: self.accent.to_color(),
            text: if dark { Color::white() } else { Color::black() },
            muted: Color::rgb(0x6b, 0x72, 0x80),
            rule: Color::rgb(0xd1, 0xd5, 0xdb),
            page_fill: dark.then_some(Color::rgb(0x11, 0x11, 0x11)),
            sidebar_fill: if dark { Color::rgb(0x0f, 0x1e, 0x2e) } else { Color::rgb(0xf0, 0xf6, 0xff) },
            sidebar_text: if dark { Color::rgb(0xe6, 0xf1, 0xff) } else { Color::rgb(0x0f, 0x17, 0x2a) },
            pill_text: Color::white(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tones {
    pub primary: Color,
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub rule: Color,
    /// Full-page fill; `None` leaves the viewer's default background.
    pub page_fill: Option<Color>,
    pub sidebar_fill: Color,
    pub sidebar_text: Color,
    pub pill_text: Color,
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Merges a [`ThemeRequest`] over the defaults using a fixed palette and
/// preset table.
#[derive(Debug, Clone, Copy)]
pub struct ThemeResolver<'a> {
    palette: &'a [NamedColor],
    presets: &'a [Preset],
}

impl Default for ThemeResolver<'static> {
    fn default() -> Self {
        ThemeResolver::new(PALETTE, PRESETS)
    }
}

impl<'a> ThemeResolver<'a> {
    pub fn new(palette: &'a [NamedColor], presets: &'a [Preset]) -> Self {
        ThemeResolver { palette, presets }
    }

    /// Later steps override earlier ones: defaults, preset, explicit colors,
    /// explicit mode.
    pub fn resolve(&self, request: &ThemeRequest) -> ResolvedStyle {
        let mut style = ResolvedStyle::default();

        if let Some(preset) = request.preset.as_deref().and_then(|name| self.preset(name)) {
            if let Some(color) = self.named(preset.primary) {
                style.primary = color;
            }
            if let Some(color) = self.named(preset.accent) {
                style.accent = color;
            }
            style.mode = preset.mode;
        }

        if let Some(color) = request.primary_color.as_deref().and_then(|v| self.color(v)) {
            style.primary = color;
        }
        if let Some(color) = request.accent_color.as_deref().and_then(|v| self.color(v)) {
            style.accent = color;
        }
        if let Some(mode) = request.mode.as_deref().and_then(Mode::parse) {
            style.mode = mode;
        }

        style
    }

    fn preset(&self, name: &str) -> Option<&Preset> {
        let name = PresetName::parse(name)?;
        self.presets.iter().find(|p| p.name == name)
    }

    fn named(&self, name: &str) -> Option<HexColor> {
        self.palette
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| HexColor::parse(c.hex))
    }

    /// A hex literal wins over a palette name of the same spelling.
    fn color(&self, value: &str) -> Option<HexColor> {
        HexColor::parse(value).or_else(|| self.named(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(preset: Option<&str>, primary: Option<&str>, accent: Option<&str>, mode: Option<&str>) -> ThemeRequest {
        ThemeRequest {
            preset: preset.map(String::from),
            primary_color: primary.map(String::from),
            accent_color: accent.map(String::from),
            mode: mode.map(String::from),
        }
    }

    fn is_hex(value: &str) -> bool {
        HexColor::parse(value).is_some()
    }

    #[test]
    fn test_empty_request_gives_defaults() {
        let style = ThemeResolver::default().resolve(&ThemeRequest::default());
        assert_eq!(style.primary.as_str(), "#2E86DE");
        assert_eq!(style.accent.as_str(), "#7D3C98");
        assert_eq!(style.mode, Mode::Light);
    }

    #[test]
    fn test_explicit_accent_beats_night_preset() {
        let style = ThemeResolver::default().resolve(&request(Some("night"), None, Some("#123456"), None));
        assert_eq!(style.accent.as_str(), "#123456");
        assert_eq!(style.primary.as_str(), "#17A589");
        assert_eq!(style.mode, Mode::Dark);
    }

    #[test]
    fn test_unknown_preset_is_ignored() {
        let resolver = ThemeResolver::default();
        let with = resolver.resolve(&request(Some("nonexistent"), Some("red"), None, Some("dark")));
        let without = resolver.resolve(&request(None, Some("red"), None, Some("dark")));
        assert_eq!(with, without);
    }

    #[test]
    fn test_palette_names_and_garbage() {
        let resolver = ThemeResolver::default();
        let style = resolver.resolve(&request(Some("vibrant"), Some("teal"), Some("chartreuse"), Some("DARK")));
        assert_eq!(style.primary.as_str(), "#17A589");
        // unresolvable accent keeps the preset's value, bad mode keeps the preset's mode
        assert_eq!(style.accent.as_str(), "#D7263D");
        assert_eq!(style.mode, Mode::Light);
    }

    #[test]
    fn test_output_always_valid() {
        let resolver = ThemeResolver::default();
        let presets = [None, Some("professional"), Some("modern"), Some("elegant"), Some("vibrant"), Some("night"), Some("x")];
        let colors = [None, Some("#abcdef"), Some("#ABCDEG"), Some("abcdef"), Some("#abc"), Some("gray"), Some(""), Some("<script>")];
        let modes = [None, Some("light"), Some("dark"), Some("dim")];

        for preset in presets {
            for primary in colors {
                for accent in colors {
                    for mode in modes {
                        let style = resolver.resolve(&request(preset, primary, accent, mode));
                        assert!(is_hex(style.primary.as_str()));
                        assert!(is_hex(style.accent.as_str()));
                        assert!(matches!(style.mode, Mode::Light | Mode::Dark));
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_tables() {
        let palette = [NamedColor { name: "ink", hex: "#010203" }];
        let presets = [Preset { name: PresetName::Modern, primary: "ink", accent: "missing", mode: Mode::Dark }];
        let style = ThemeResolver::new(&palette, &presets).resolve(&request(Some("modern"), None, None, None));
        assert_eq!(style.primary.as_str(), "#010203");
        assert_eq!(style.accent.as_str(), "#7D3C98");
        assert!(style.is_dark());
    }

    #[test]
    fn test_hex_to_color() {
        let color = HexColor::parse("#2E86DE").unwrap().to_color();
        assert_eq!(color, Color::rgb(0x2e, 0x86, 0xde));
        assert!(HexColor::parse("#2E86D").is_none());
        assert!(HexColor::parse("2E86DE0").is_none());
    }

    #[test]
    fn test_dark_tones() {
        let style = ThemeResolver::default().resolve(&request(Some("night"), None, None, None));
        let tones = style.tones();
        assert_eq!(tones.text, Color::white());
        assert_eq!(tones.page_fill, Some(Color::rgb(0x11, 0x11, 0x11)));
        assert_eq!(ResolvedStyle::default().tones().page_fill, None);
    }
}
