//! Runtime environment detection.
//!
//! Read-only. Detection only influences diagnostics output and the locale of
//! dispatcher messages, never routing.

use serde::{Deserialize, Serialize};

/// Host editor the server was launched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ide {
    Cursor,
    VsCode,
    JetBrains,
    Zed,
    Unknown,
}

/// How requests reach the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Stdio,
    Http,
}

/// Message language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    /// Parse a POSIX-style locale tag (`ko_KR.UTF-8`, `en-US`, `ko`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag
            .split(|c: char| c == '_' || c == '-' || c == '.' || c == '@')
            .next()?
            .to_ascii_lowercase();
        match lang.as_str() {
            "ko" => Some(Locale::Ko),
            "en" | "c" | "posix" => Some(Locale::En),
            _ => None,
        }
    }
}

/// Snapshot of the environment taken at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub ide: Ide,
    pub transport: Transport,
    pub locale: Locale,
    pub platform: String,
    pub arch: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            ide: Ide::Unknown,
            transport: Transport::Stdio,
            locale: Locale::En,
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

impl Environment {
    /// Detect from the process environment.
    pub fn detect() -> Self {
        Self::detect_with(|key| std::env::var(key).ok())
    }

    /// Detect using the given variable lookup.
    pub fn detect_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ide = if get("CURSOR_TRACE_ID").is_some() {
            Ide::Cursor
        } else if get("ZED_TERM").is_some() {
            Ide::Zed
        } else if get("TERMINAL_EMULATOR").is_some_and(|v| v.contains("JetBrains")) {
            Ide::JetBrains
        } else if get("TERM_PROGRAM").is_some_and(|v| v.eq_ignore_ascii_case("vscode")) {
            Ide::VsCode
        } else {
            Ide::Unknown
        };

        let transport = match get("TOOLHUB_TRANSPORT").as_deref() {
            Some(t) if t.eq_ignore_ascii_case("http") => Transport::Http,
            _ => Transport::Stdio,
        };

        // First non-empty variable decides, matching POSIX precedence.
        let locale = ["TOOLHUB_LOCALE", "LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .find_map(|key| get(*key))
            .and_then(|tag| Locale::from_tag(&tag))
            .unwrap_or_default();

        Self {
            ide,
            transport,
            locale,
            ..Self::default()
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}
