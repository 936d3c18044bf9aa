//! Localized dispatcher messages.

use crate::environment::Locale;

/// Message catalog for one locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn unknown_tool(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("Unknown tool: '{name}'"),
            Locale::Ko => format!("알 수 없는 도구입니다: '{name}'"),
        }
    }

    /// Appended to an unknown-tool message when suggestions exist.
    pub fn did_you_mean(&self, candidates: &[&str]) -> String {
        let list = candidates.join(", ");
        match self.locale {
            Locale::En => format!("Did you mean: {list}?"),
            Locale::Ko => format!("혹시 다음 도구를 찾으셨나요: {list}?"),
        }
    }

    pub fn tool_not_found(&self, name: &str) -> String {
        match self.locale {
            Locale::En => format!("No handler registered for tool '{name}'"),
            Locale::Ko => format!("도구 '{name}'에 등록된 핸들러가 없습니다"),
        }
    }

    pub fn invalid_arguments(&self, name: &str, error_count: usize) -> String {
        match self.locale {
            Locale::En => format!("Invalid arguments for tool '{name}' ({error_count} errors)"),
            Locale::Ko => format!("도구 '{name}'의 인자가 올바르지 않습니다 (오류 {error_count}개)"),
        }
    }

    pub fn circuit_open(&self, name: &str) -> String {
        match self.locale {
            Locale::En => {
                format!("Tool '{name}' is temporarily unavailable after repeated failures")
            }
            Locale::Ko => format!("도구 '{name}'이(가) 반복된 실패로 일시적으로 사용할 수 없습니다"),
        }
    }

    pub fn method_not_found(&self, method: &str) -> String {
        match self.locale {
            Locale::En => format!("Method not found: '{method}'"),
            Locale::Ko => format!("지원하지 않는 메서드입니다: '{method}'"),
        }
    }

    pub fn invalid_request(&self, detail: &str) -> String {
        match self.locale {
            Locale::En => format!("Invalid request: {detail}"),
            Locale::Ko => format!("잘못된 요청입니다: {detail}"),
        }
    }
}
