//! Cell classification: turning an addressed cell into a typed survey datum.

use crate::table::Cell;
use serde::Serialize;
use std::fmt;

/// Stable, coordinate-derived identifier of a survey datum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DatumId(String);

impl DatumId {
    pub fn at(line: u32, col: u32) -> Self {
        DatumId(format!("comp_{}_{}", line, col))
    }

    /// Key of the synthetic option injected into free-text questions.
    pub fn freetext() -> Self {
        DatumId("freetext".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatumValue {
    Text { text: String },
    Number { raw: String, value: f64 },
    /// An HTML/XML fragment, passed through to presentation untouched.
    Markup { markup: String },
}

impl DatumValue {
    /// Source text exactly as it appeared in the cell.
    pub fn raw(&self) -> &str {
        match self {
            DatumValue::Text { text } => text,
            DatumValue::Number { raw, .. } => raw,
            DatumValue::Markup { markup } => markup,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyDatum {
    pub id: DatumId,
    pub value: DatumValue,
    pub line: u32,
    pub col: u32,
    /// Position among the options of the owning question. `None` for the
    /// synthetic free-text option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl SurveyDatum {
    pub fn raw(&self) -> &str {
        self.value.raw()
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }
}

/// Classify raw cell contents. Never fails: absent contents give an empty
/// text datum.
pub fn classify(contents: Option<&str>, line: u32, col: u32, index: usize) -> SurveyDatum {
    SurveyDatum {
        id: DatumId::at(line, col),
        value: infer_value(contents.unwrap_or("")),
        line,
        col,
        index: Some(index),
    }
}

pub fn classify_cell(cell: &Cell, index: usize) -> SurveyDatum {
    classify(cell.contents.as_deref(), cell.line, cell.col, index)
}

pub(crate) fn freetext_option(line: u32, col: u32) -> SurveyDatum {
    SurveyDatum {
        id: DatumId::freetext(),
        value: DatumValue::Text {
            text: String::new(),
        },
        line,
        col,
        index: None,
    }
}

fn infer_value(contents: &str) -> DatumValue {
    let trimmed = contents.trim();
    if trimmed.len() > 1 && trimmed.starts_with('<') && trimmed.ends_with('>') {
        return DatumValue::Markup {
            markup: contents.to_owned(),
        };
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() {
            return DatumValue::Number {
                raw: contents.to_owned(),
                value,
            };
        }
    }
    DatumValue::Text {
        text: contents.to_owned(),
    }
}
