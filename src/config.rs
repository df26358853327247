//! Layered configuration: defaults, then `bfvm.toml`, then `BFVM_*` environment
//! variables. Command-line flags are applied last by the commands themselves.
//!
//! The config file lives in the XDG config home (`~/.config/bfvm.toml` on most
//! systems) unless `BFVM_CONFIG` points somewhere else:
//!
//! ```toml
//! [vm]
//! tape_len = 30000
//! bounds = "wrap"        # fail | wrap | clamp
//! trace_marker = "#"
//! max_steps = 1000000
//! timeout_ms = 2000
//! tape_window = 30
//!
//! [colors]
//! tape_cell_pointer = "#f9e2af"
//! code_ip = "yellow"
//! ```
//!
//! A `#` begins a comment only at the start of a line or after whitespace.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use ratatui::style::Color;

use crate::engine::DEFAULT_WINDOW;
use crate::error::ConfigError;
use crate::tape::{BoundsPolicy, DEFAULT_TAPE_LEN};

/// Wall-clock limit for `bfvm run` when nothing else is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// Debugger palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colors {
    pub title_focused: Color,
    pub title_unfocused: Color,
    pub code_ip: Color,
    pub code_marker: Color,
    pub tape_cell_empty: Color,
    pub tape_cell_nonzero: Color,
    pub tape_cell_pointer: Color,
    pub status_text: Color,
    pub status_error: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            title_focused: Color::Cyan,
            title_unfocused: Color::Gray,
            code_ip: Color::Yellow,
            code_marker: Color::LightMagenta,
            tape_cell_empty: Color::DarkGray,
            tape_cell_nonzero: Color::White,
            tape_cell_pointer: Color::Yellow,
            status_text: Color::White,
            status_error: Color::Red,
        }
    }
}

/// Everything a run can be tuned with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tape_len: usize,
    pub bounds: BoundsPolicy,
    pub trace_marker: char,
    pub max_steps: Option<u64>,
    pub timeout_ms: u64,
    pub tape_window: usize,
    pub colors: Colors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tape_len: DEFAULT_TAPE_LEN,
            bounds: BoundsPolicy::Fail,
            trace_marker: '#',
            max_steps: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            tape_window: DEFAULT_WINDOW,
            colors: Colors::default(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the config file (if any) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match config_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "loaded config file");
                Self::from_toml_str(&content)?
            }
            _ => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Defaults overlaid with the `[vm]` and `[colors]` tables of `content`.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let tables = parse_tables(content);
        let mut settings = Self::default();

        if let Some(vm) = tables.get("vm") {
            for (key, value) in vm {
                settings.set(&format!("vm.{key}"), key, value)?;
            }
        }
        if let Some(colors) = tables.get("colors") {
            settings.colors.apply(colors);
        }
        Ok(settings)
    }

    /// Apply `BFVM_*` overrides, looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        const VARS: [(&str, &str); 6] = [
            ("BFVM_TAPE_LEN", "tape_len"),
            ("BFVM_BOUNDS", "bounds"),
            ("BFVM_TRACE_MARKER", "trace_marker"),
            ("BFVM_MAX_STEPS", "max_steps"),
            ("BFVM_TIMEOUT_MS", "timeout_ms"),
            ("BFVM_TAPE_WINDOW", "tape_window"),
        ];
        for (env_key, key) in VARS {
            if let Some(value) = var(env_key) {
                self.set(env_key, key, &value)?;
            }
        }
        Ok(())
    }

    fn set(&mut self, origin: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &'static str| ConfigError::InvalidValue {
            key: origin.to_string(),
            value: value.to_string(),
            reason,
        };
        let value = value.trim();

        match key {
            "tape_len" => {
                self.tape_len = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid("expected a positive integer"))?;
            }
            "bounds" => {
                self.bounds = value.parse::<BoundsPolicy>().map_err(invalid)?;
            }
            "trace_marker" => {
                let mut chars = value.chars();
                self.trace_marker = match (chars.next(), chars.next()) {
                    (Some(ch), None) if crate::instruction::Instruction::from_char(ch).is_none() => ch,
                    _ => return Err(invalid("expected a single non-instruction character")),
                };
            }
            "max_steps" => {
                self.max_steps = match value {
                    "" | "none" | "unlimited" => None,
                    n => Some(n.parse::<u64>().map_err(|_| invalid("expected an integer"))?),
                };
            }
            "timeout_ms" => {
                self.timeout_ms = value.parse::<u64>().map_err(|_| invalid("expected an integer"))?;
            }
            "tape_window" => {
                self.tape_window = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid("expected a positive integer"))?;
            }
            other => {
                tracing::warn!(key = other, "ignoring unknown config key");
            }
        }
        Ok(())
    }
}

impl Colors {
    fn apply(&mut self, map: &HashMap<String, String>) {
        let cfg = self;

        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = map.get(stringify!($field)).and_then(|s| parse_color(s)) {
                    cfg.$field = v;
                }
            };
        }

        set!(title_focused);
        set!(title_unfocused);
        set!(code_ip);
        set!(code_marker);
        set!(tape_cell_empty);
        set!(tape_cell_nonzero);
        set!(tape_cell_pointer);
        set!(status_text);
        set!(status_error);
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("BFVM_CONFIG") {
        return Some(PathBuf::from(explicit));
    }
    let base_dirs = BaseDirs::new().ok()?;

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bfvm.toml");
    Some(path)
}

/// Very small reader for `[table]` headers and `key = value` pairs.
/// Values may be quoted; `#` starts a comment outside quotes.
fn parse_tables(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut tables: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            current = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        let Some(eq) = line.find('=') else { continue };
        let key = line[..eq].trim().to_string();
        let val_raw = line[eq + 1..].trim();
        let val = if let Some(rest) = val_raw.strip_prefix('"') {
            match rest.find('"') {
                Some(end) => rest[..end].to_string(),
                None => rest.to_string(),
            }
        } else {
            // `#` starts a comment only after whitespace, so `trace_marker = #` works.
            match val_raw.find(" #").or_else(|| val_raw.find("\t#")) {
                Some(hash) => val_raw[..hash].trim().to_string(),
                None => val_raw.to_string(),
            }
        };
        tables.entry(current.clone()).or_default().insert(key, val);
    }
    tables
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    // Named colors matching ratatui::style::Color variants
    Some(match s.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "dark_grey" | "darkgrey" | "dark_gray" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightyellow" | "light_yellow" => Color::LightYellow,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightmagenta" | "light_magenta" => Color::LightMagenta,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        "white" => Color::White,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn vm_table_overrides_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            # tuned for tests
            [vm]
            tape_len = 64
            bounds = "wrap"   # wrap around
            trace_marker = "@"
            max_steps = 500
            timeout_ms = 10
            "#,
        )
        .unwrap();
        assert_eq!(settings.tape_len, 64);
        assert_eq!(settings.bounds, BoundsPolicy::Wrap);
        assert_eq!(settings.trace_marker, '@');
        assert_eq!(settings.max_steps, Some(500));
        assert_eq!(settings.timeout_ms, 10);
        assert_eq!(settings.tape_window, DEFAULT_WINDOW);
    }

    #[test]
    fn colors_accept_hex_and_names() {
        let settings = Settings::from_toml_str(
            "[colors]\ncode_ip = \"#102030\"\ntape_cell_pointer = light_blue\nstatus_text = nope\n",
        )
        .unwrap();
        assert_eq!(settings.colors.code_ip, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(settings.colors.tape_cell_pointer, Color::LightBlue);
        assert_eq!(settings.colors.status_text, Colors::default().status_text);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = Settings::from_toml_str("[vm]\ntape_len = 0\n").unwrap_err();
        assert!(err.to_string().contains("vm.tape_len"), "{err}");

        let err = Settings::from_toml_str("[vm]\ntrace_marker = \"+\"\n").unwrap_err();
        assert!(err.to_string().contains("vm.trace_marker"), "{err}");
    }

    #[test]
    fn environment_wins_over_file() {
        let mut settings = Settings::from_toml_str("[vm]\nbounds = \"wrap\"\n").unwrap();
        settings
            .apply_env(|key| match key {
                "BFVM_BOUNDS" => Some("clamp".into()),
                "BFVM_MAX_STEPS" => Some("unlimited".into()),
                "BFVM_TAPE_LEN" => Some("128".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(settings.bounds, BoundsPolicy::Clamp);
        assert_eq!(settings.max_steps, None);
        assert_eq!(settings.tape_len, 128);
    }

    #[test]
    fn bad_environment_value_is_reported() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|key| (key == "BFVM_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("BFVM_TIMEOUT_MS"), "{err}");
    }

    #[test]
    fn hash_is_a_value_unless_after_whitespace() {
        let settings = Settings::from_toml_str(
            "[vm]\ntrace_marker = #\ntape_len = 16 # small\n[colors]\ncode_ip = #f9e2af\n",
        )
        .unwrap();
        assert_eq!(settings.trace_marker, '#');
        assert_eq!(settings.tape_len, 16);
        assert_eq!(settings.colors.code_ip, Color::Rgb(0xf9, 0xe2, 0xaf));
    }
}
