//! Flag column resolution.
//!
//! The four flag columns hold boolean literals. FREETEXT is special: a cell
//! that is not a boolean is never an error there, it is either a `#{...}`
//! validation pattern or a literal default answer.

use crate::columns;
use crate::error::ParseError;
use crate::model::FreetextPattern;
use crate::table::TokenTable;

const TRUE_LITERALS: [&str; 5] = ["true", "t", "yes", "y", "1"];
const FALSE_LITERALS: [&str; 5] = ["false", "f", "no", "n", "0"];

pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if TRUE_LITERALS.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE_LITERALS.iter().any(|f| f.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

/// Explicit value of a flag cell: `None` when the column is absent or the
/// cell is blank, so the caller can fall back to later rows or the column
/// default. Text that is not a boolean literal is a malformed-boolean error.
pub fn explicit_bool(
    table: &TokenTable,
    column: &str,
    row: usize,
    survey: &str,
) -> Result<Option<bool>, ParseError> {
    let Some(cell) = table.cell(column, row) else {
        return Ok(None);
    };
    if cell.is_blank() {
        return Ok(None);
    }
    parse_bool(cell.text()).map(Some).ok_or_else(|| {
        ParseError::syntax(
            1,
            survey,
            format!("malformed boolean '{}' in column {}", cell.text(), column),
        )
        .at(column, cell.line, cell.col)
    })
}

/// Outcome of resolving one FREETEXT cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Freetext {
    /// Column absent or cell blank.
    Unset,
    Bool(bool),
    /// `#{...}`: answers must match this pattern. Implies free text.
    Pattern(FreetextPattern),
    /// Any other text: the default answer. Implies free text.
    Literal(String),
}

impl Freetext {
    /// The flag value this resolution implies, if any.
    pub fn flag(&self) -> Option<bool> {
        match self {
            Freetext::Unset => None,
            Freetext::Bool(b) => Some(*b),
            Freetext::Pattern(_) | Freetext::Literal(_) => Some(true),
        }
    }
}

pub fn resolve_freetext(table: &TokenTable, row: usize, survey: &str) -> Result<Freetext, ParseError> {
    let Some(cell) = table.cell(columns::FREETEXT, row) else {
        return Ok(Freetext::Unset);
    };
    if cell.is_blank() {
        return Ok(Freetext::Unset);
    }
    let text = cell.text();
    if let Some(b) = parse_bool(text) {
        return Ok(Freetext::Bool(b));
    }
    tracing::debug!(
        line = cell.line,
        col = cell.col,
        "FREETEXT cell is not a boolean, reading it as a pattern or default"
    );
    match text
        .trim()
        .strip_prefix("#{")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(body) => FreetextPattern::new(body).map(Freetext::Pattern).map_err(|e| {
            ParseError::syntax(1, survey, format!("invalid free-text pattern '{}': {}", body, e))
                .at(columns::FREETEXT, cell.line, cell.col)
        }),
        None => Ok(Freetext::Literal(text.to_owned())),
    }
}
