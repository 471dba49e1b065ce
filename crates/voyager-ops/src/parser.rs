//! Turning pasted schema text into an introspection result.

use voyager_core::{Introspection, ParseError};

use crate::sdl::SdlParser;

/// Parses schema text (introspection JSON, and SDL where supported).
pub trait SchemaParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Introspection, ParseError>;
}

/// Accepts introspection JSON or SDL, picked by the first non-blank character.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaTextParser;

impl SchemaParser for SchemaTextParser {
    fn parse(&self, text: &str) -> Result<Introspection, ParseError> {
        if text.trim_start().starts_with('{') {
            IntrospectionJsonParser.parse(text)
        } else {
            SdlParser.parse(text)
        }
    }
}

/// Leading keywords of SDL documents.
const SDL_KEYWORDS: &[&str] = &[
    "schema",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "scalar",
    "directive",
    "extend",
];

/// Accepts introspection JSON only, wrapped in `data` or bare.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrospectionJsonParser;

impl SchemaParser for IntrospectionJsonParser {
    fn parse(&self, text: &str) -> Result<Introspection, ParseError> {
        let trimmed = text.trim_start();

        if trimmed.starts_with('{') {
            return Introspection::from_json_str(trimmed);
        }

        if looks_like_sdl(trimmed) {
            return Err(ParseError::SdlUnsupported);
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(_) => Err(ParseError::InvalidIntrospection {
                message: "expected a JSON object".to_string(),
            }),
            Err(err) => Err(ParseError::Syntax {
                message: err.to_string(),
            }),
        }
    }
}

fn looks_like_sdl(text: &str) -> bool {
    let first = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'));

    match first {
        Some(line) if line.starts_with("\"\"\"") => true,
        Some(line) => {
            let word = line
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .next()
                .unwrap_or_default();
            SDL_KEYWORDS.contains(&word)
        }
        None => false,
    }
}
