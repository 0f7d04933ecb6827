use std::fmt;
use std::str::FromStr;

use convert_case::{Boundary, Case, Converter};
use serde::{Deserialize, Serialize};

/// A naming convention for multi-word names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseStyle {
    #[serde(rename = "kebab-case")]
    Kebab,
    #[serde(rename = "PascalCase")]
    Pascal,
    #[serde(rename = "camelCase")]
    Camel,
    #[serde(rename = "snake_case")]
    Snake,
}

impl CaseStyle {
    pub const ALL: [CaseStyle; 4] = [
        CaseStyle::Kebab,
        CaseStyle::Pascal,
        CaseStyle::Camel,
        CaseStyle::Snake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStyle::Kebab => "kebab-case",
            CaseStyle::Pascal => "PascalCase",
            CaseStyle::Camel => "camelCase",
            CaseStyle::Snake => "snake_case",
        }
    }

    fn case(&self) -> Case {
        match self {
            CaseStyle::Kebab => Case::Kebab,
            CaseStyle::Pascal => Case::Pascal,
            CaseStyle::Camel => Case::Camel,
            CaseStyle::Snake => Case::Snake,
        }
    }
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown case style '{0}' (expected one of: kebab-case, PascalCase, camelCase, snake_case)")]
pub struct UnknownCaseStyle(pub String);

impl FromStr for CaseStyle {
    type Err = UnknownCaseStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| UnknownCaseStyle(s.to_string()))
    }
}

// Word boundaries: explicit delimiters, a lower-to-upper transition, and the last
// capital of an uppercase run when a lowercase letter follows (`XRay` is `X|Ray`).
// A digit followed by an uppercase letter also splits, so digits stay with the
// word before.
const BOUNDARIES: [Boundary; 6] = [
    Boundary::Hyphen,
    Boundary::Underscore,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::Acronym,
    Boundary::DigitUpper,
];

/// Rewrites `name` in the target style.
///
/// The name is split into words on `-`, `_`, spaces and case transitions,
/// lower-cased, then joined the way `style` joins words. Digit/letter transitions
/// are not word boundaries.
///
/// Joining can glue single-letter words onto their neighbours (`a-b` becomes
/// `AB`, which reads back as one word), so the conversion is repeated until the
/// result reads back as itself. Each extra pass only merges words, so this stops.
pub fn convert(name: &str, style: CaseStyle) -> String {
    let converter = Converter::new()
        .set_boundaries(&BOUNDARIES)
        .to_case(style.case());

    let mut current = converter.convert(name);
    loop {
        let next = converter.convert(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// True when `name` already reads as `style`, i.e. converting it is a no-op.
pub fn conforms(name: &str, style: CaseStyle) -> bool {
    convert(name, style) == name
}

/// Every style `name` round-trips through. An empty result means the name
/// matches no known style.
///
/// A single lowercase word such as `button` satisfies kebab, camel and snake at
/// once, so callers should test membership rather than expect one answer.
pub fn classify(name: &str) -> Vec<CaseStyle> {
    CaseStyle::ALL
        .into_iter()
        .filter(|style| conforms(name, *style))
        .collect()
}

/// The part of a basename a style rule applies to, plus whatever must be kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub subject: &'a str,
    pub extension: Option<&'a str>,
}

impl<'a> NameParts<'a> {
    /// Splits a file basename at its last `.`. Dotfiles like `.gitignore` have an
    /// empty stem, so the whole name becomes the subject.
    pub fn file(name: &'a str) -> Self {
        match name.rfind('.') {
            Some(idx) if idx > 0 => Self {
                subject: &name[..idx],
                extension: Some(&name[idx + 1..]),
            },
            _ => Self {
                subject: name,
                extension: None,
            },
        }
    }

    pub fn folder(name: &'a str) -> Self {
        Self {
            subject: name,
            extension: None,
        }
    }

    /// Reassembles a basename around a new subject.
    pub fn with_subject(&self, subject: &str) -> String {
        match self.extension {
            Some(ext) => format!("{}.{}", subject, ext),
            None => subject.to_string(),
        }
    }
}
