//! Persistent editor preferences.
//!
//! The record is stored as nine tab-separated fields in a fixed order:
//! background, foreground, font, tab size, font size, opacity, bold flag,
//! window state and wrap mode. Each field is validated on its own; a bad
//! or missing field falls back to its default without disturbing the rest.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Colors accepted for background and foreground.
pub const COLORS: &[&str] = &[
    "bisque", "black", "blue", "coral", "gray", "green", "lime", "pink", "purple", "red",
    "silver", "sky blue", "white", "yellow",
];

/// Accepted font families.
pub const FONTS: &[&str] = &[
    "Cascadia Mono",
    "Consolas",
    "Courier New",
    "Lucida Console",
    "MS Gothic",
    "NSimSun",
];

/// Accepted font sizes.
pub const FONT_SIZES: &[u32] = &[8, 10, 11, 12, 14, 16, 18, 20, 22, 24, 26, 32, 48, 64, 72, 96];

/// Number of fields in a serialized record.
pub const FIELD_COUNT: usize = 9;

/// Font weight flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Bold,
    Normal,
}

/// Window state restored on launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Zoomed,
}

/// Line wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Word,
    None,
}

impl FontWeight {
    pub fn as_str(self) -> &'static str {
        match self {
            FontWeight::Bold => "bold",
            FontWeight::Normal => "normal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bold" => Some(FontWeight::Bold),
            "normal" => Some(FontWeight::Normal),
            _ => None,
        }
    }
}

impl WindowState {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowState::Normal => "normal",
            WindowState::Zoomed => "zoomed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(WindowState::Normal),
            "zoomed" => Some(WindowState::Zoomed),
            _ => None,
        }
    }
}

impl WrapMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WrapMode::Word => "word",
            WrapMode::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "word" => Some(WrapMode::Word),
            "none" => Some(WrapMode::None),
            _ => None,
        }
    }
}

/// Names of the individually editable settings fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Background,
    Foreground,
    Font,
    TabSize,
    FontSize,
    Opacity,
    Bold,
    WindowState,
    Wrap,
}

impl SettingsField {
    /// All fields in on-disk order.
    pub const ALL: [SettingsField; FIELD_COUNT] = [
        SettingsField::Background,
        SettingsField::Foreground,
        SettingsField::Font,
        SettingsField::TabSize,
        SettingsField::FontSize,
        SettingsField::Opacity,
        SettingsField::Bold,
        SettingsField::WindowState,
        SettingsField::Wrap,
    ];

    /// Short key used by the command front end.
    pub fn key(self) -> &'static str {
        match self {
            SettingsField::Background => "bg",
            SettingsField::Foreground => "fg",
            SettingsField::Font => "font",
            SettingsField::TabSize => "tab-size",
            SettingsField::FontSize => "font-size",
            SettingsField::Opacity => "opacity",
            SettingsField::Bold => "bold",
            SettingsField::WindowState => "window-state",
            SettingsField::Wrap => "wrap",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// A settings edit that was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownField(String),
    #[error("'{value}' is not an allowed value for {field}")]
    InvalidValue { field: &'static str, value: String },
}

/// The nine user preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRecord {
    pub background: String,
    pub foreground: String,
    pub font: String,
    pub tab_size: u32,
    pub font_size: u32,
    pub opacity: u32,
    pub bold: FontWeight,
    pub window_state: WindowState,
    pub wrap: WrapMode,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            background: "black".to_string(),
            foreground: "white".to_string(),
            font: "Consolas".to_string(),
            tab_size: 4,
            font_size: 20,
            opacity: 100,
            bold: FontWeight::Normal,
            window_state: WindowState::Normal,
            wrap: WrapMode::Word,
        }
    }
}

/// Parses a field made only of ASCII digits.
fn parse_decimal(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn is_tab_size(n: u32) -> bool {
    (4..=16).contains(&n) && n % 2 == 0
}

fn is_opacity(n: u32) -> bool {
    (30..=100).contains(&n)
}

impl SettingsRecord {
    /// Builds a record from raw serialized text, defaulting every field that
    /// is missing or invalid.
    pub fn parse(raw: &str) -> Self {
        let mut record = Self::default();
        let values: Vec<&str> = raw.split('\t').collect();
        for (i, field) in SettingsField::ALL.into_iter().enumerate() {
            let value = values.get(i).copied().unwrap_or("");
            if let Err(e) = record.set_field(field, value) {
                if !value.is_empty() {
                    log::warn!("Ignoring stored setting: {}", e);
                }
            }
        }
        record
    }

    /// Updates one field after validating `value`. The record is unchanged
    /// on error.
    pub fn set_field(&mut self, field: SettingsField, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            field: field.key(),
            value: value.to_string(),
        };
        match field {
            SettingsField::Background | SettingsField::Foreground | SettingsField::Font => {
                let allowed = if field == SettingsField::Font { FONTS } else { COLORS };
                if !allowed.contains(&value) {
                    return Err(invalid());
                }
                let slot = match field {
                    SettingsField::Background => &mut self.background,
                    SettingsField::Foreground => &mut self.foreground,
                    _ => &mut self.font,
                };
                *slot = value.to_string();
            }
            SettingsField::TabSize => {
                self.tab_size = parse_decimal(value).filter(|&n| is_tab_size(n)).ok_or_else(invalid)?;
            }
            SettingsField::FontSize => {
                self.font_size = parse_decimal(value)
                    .filter(|n| FONT_SIZES.contains(n))
                    .ok_or_else(invalid)?;
            }
            SettingsField::Opacity => {
                self.opacity = parse_decimal(value).filter(|&n| is_opacity(n)).ok_or_else(invalid)?;
            }
            SettingsField::Bold => self.bold = FontWeight::parse(value).ok_or_else(invalid)?,
            SettingsField::WindowState => {
                self.window_state = WindowState::parse(value).ok_or_else(invalid)?
            }
            SettingsField::Wrap => self.wrap = WrapMode::parse(value).ok_or_else(invalid)?,
        }
        Ok(())
    }

    /// Like [`set_field`](Self::set_field), addressed by front-end key.
    pub fn set_by_key(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let field =
            SettingsField::from_key(key).ok_or_else(|| SettingsError::UnknownField(key.to_string()))?;
        self.set_field(field, value)
    }

    /// Returns the serialized value of one field.
    pub fn field(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Background => self.background.clone(),
            SettingsField::Foreground => self.foreground.clone(),
            SettingsField::Font => self.font.clone(),
            SettingsField::TabSize => self.tab_size.to_string(),
            SettingsField::FontSize => self.font_size.to_string(),
            SettingsField::Opacity => self.opacity.to_string(),
            SettingsField::Bold => self.bold.as_str().to_string(),
            SettingsField::WindowState => self.window_state.as_str().to_string(),
            SettingsField::Wrap => self.wrap.as_str().to_string(),
        }
    }

    /// Serializes the record as one tab-separated line.
    pub fn serialize(&self) -> String {
        SettingsField::ALL
            .iter()
            .map(|&f| self.field(f))
            .collect::<Vec<_>>()
            .join("\t")
    }
}

impl fmt::Display for SettingsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in SettingsField::ALL {
            writeln!(f, "{:>12}: {}", field.key(), self.field(field))?;
        }
        Ok(())
    }
}

/// Reads and writes the settings record file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, correcting bad fields, and immediately rewrites the
    /// corrected record.
    pub fn load(&self) -> io::Result<SettingsRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        let record = SettingsRecord::parse(&raw);
        self.save(&record)?;
        Ok(record)
    }

    /// Writes the record.
    pub fn save(&self, record: &SettingsRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, record.serialize())
    }
}
