//! Data model shared by the parser and the renderer.
//!
//! The parsed document is an ordered `Vec<Block>`; it is the only artefact
//! handed from [`crate::pipeline::parse`] to [`crate::pipeline::render`].
//! Blocks are plain owned values, serialisable so the CLI can dump them as
//! JSON for debugging.

use serde::{Deserialize, Serialize};

/// Title-page metadata decoded from the YAML frontmatter.
///
/// Every field defaults to the empty string. Callers may patch fields after
/// parsing (e.g. fill in a missing author) before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub group: String,
    pub teacher: String,
    pub subject: String,
    pub university: String,
    pub year: String,
    pub work_number: String,
    pub institute: String,
    pub department: String,
    pub city: String,
}

impl Metadata {
    /// Frontmatter keys recognised by [`Metadata::set`].
    pub const KEYS: [&'static str; 11] = [
        "title",
        "author",
        "group",
        "teacher",
        "subject",
        "university",
        "year",
        "work_number",
        "institute",
        "department",
        "city",
    ];

    /// Assign a field by its frontmatter key. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            "title" => &mut self.title,
            "author" => &mut self.author,
            "group" => &mut self.group,
            "teacher" => &mut self.teacher,
            "subject" => &mut self.subject,
            "university" => &mut self.university,
            "year" => &mut self.year,
            "work_number" => &mut self.work_number,
            "institute" => &mut self.institute,
            "department" => &mut self.department,
            "city" => &mut self.city,
            _ => return false,
        };
        *slot = value.into();
        true
    }

    /// Read a field by its frontmatter key.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "title" => &self.title,
            "author" => &self.author,
            "group" => &self.group,
            "teacher" => &self.teacher,
            "subject" => &self.subject,
            "university" => &self.university,
            "year" => &self.year,
            "work_number" => &self.work_number,
            "institute" => &self.institute,
            "department" => &self.department,
            "city" => &self.city,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Copy every non-empty field of `overrides` over `self`.
    pub fn apply_overrides(&mut self, overrides: &Metadata) {
        for key in Self::KEYS {
            if let Some(value) = overrides.get(key) {
                if !value.is_empty() {
                    self.set(key, value);
                }
            }
        }
    }
}

/// The smallest styled span of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub code: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: true,
            ..Self::default()
        }
    }

    /// The synthetic run standing for a soft or hard line break.
    pub fn line_break() -> Self {
        Self::plain("\n")
    }

    pub fn is_line_break(&self) -> bool {
        self.text == "\n"
    }
}

/// One typed unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<Run> },
    List { ordered: bool, items: Vec<Vec<Run>> },
    CodeBlock { language: String, code: String },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Image { alt: String, url: String },
    Blockquote { runs: Vec<Run> },
}

impl Block {
    /// `(level, text)` if this block is a heading.
    pub fn as_heading(&self) -> Option<(u8, &str)> {
        match self {
            Block::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        }
    }
}

/// Category of academic work; selects the wording of the title page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    #[default]
    Lab,
    Coursework,
    Practice,
    Report,
}

impl WorkType {
    pub const ALL: [WorkType; 4] = [
        WorkType::Lab,
        WorkType::Coursework,
        WorkType::Practice,
        WorkType::Report,
    ];

    /// Parse a work-type key; unknown keys fall back to [`WorkType::Lab`].
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "coursework" => WorkType::Coursework,
            "practice" => WorkType::Practice,
            "report" => WorkType::Report,
            _ => WorkType::Lab,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            WorkType::Lab => "lab",
            WorkType::Coursework => "coursework",
            WorkType::Practice => "practice",
            WorkType::Report => "report",
        }
    }

    /// Display label, e.g. "Лабораторная работа".
    pub fn label(self) -> &'static str {
        match self {
            WorkType::Lab => "Лабораторная работа",
            WorkType::Coursework => "Курсовая работа",
            WorkType::Practice => "Отчёт по практике",
            WorkType::Report => "Отчёт",
        }
    }

    /// Form used after "по" on the title page, e.g. "лабораторной работе".
    pub fn genitive(self) -> &'static str {
        match self {
            WorkType::Lab => "лабораторной работе",
            WorkType::Coursework => "курсовой работе",
            WorkType::Practice => "практике",
            WorkType::Report => "работе",
        }
    }
}
