use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a failure comes from malformed input or from a broken invariant
/// inside the pipeline itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Syntax,
    Internal,
}

/// A unification error. Every failure is terminal: no partial survey is
/// produced once one of these is raised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Error)]
#[error("{}", self.render())]
pub struct ParseError {
    /// Pipeline pass that raised the error (0 = table shape checks).
    pub pass: u8,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
    pub survey: String,
    pub message: String,
}

impl ParseError {
    pub fn new(
        pass: u8,
        kind: ErrorKind,
        column: Option<&str>,
        line: Option<u32>,
        col: Option<u32>,
        survey: &str,
        message: impl Into<String>,
    ) -> Self {
        ParseError {
            pass,
            kind,
            column: column.map(str::to_owned),
            line,
            col,
            survey: survey.to_owned(),
            message: message.into(),
        }
    }

    pub fn syntax(pass: u8, survey: &str, message: impl Into<String>) -> Self {
        ParseError::new(pass, ErrorKind::Syntax, None, None, None, survey, message)
    }

    pub fn internal(pass: u8, survey: &str, message: impl Into<String>) -> Self {
        ParseError::new(pass, ErrorKind::Internal, None, None, None, survey, message)
    }

    /// Attach the offending cell's coordinate.
    pub fn at(mut self, column: &str, line: u32, col: u32) -> Self {
        self.column = Some(column.to_owned());
        self.line = Some(line);
        self.col = Some(col);
        self
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }

    /// Serialize with every field present (null for missing).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "col":     self.col,
            "column":  self.column,
            "kind":    self.kind,
            "line":    self.line,
            "message": self.message,
            "pass":    self.pass,
            "survey":  self.survey,
        })
    }

    /// `survey:line:col: message (column X)`, dropping whichever parts
    /// are unknown.
    fn render(&self) -> String {
        let mut out = match (self.line, self.col) {
            (Some(line), Some(col)) => format!("{}:{}:{}: {}", self.survey, line, col, self.message),
            (Some(line), None) => format!("{}:{}: {}", self.survey, line, self.message),
            _ => format!("{}: {}", self.survey, self.message),
        };
        if let Some(column) = &self.column {
            out.push_str(&format!(" (column {})", column));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_coordinates_when_present() {
        let err = ParseError::syntax(1, "colors.csv", "no question indicated").at("QUESTION", 4, 1);
        assert_eq!(
            err.to_string(),
            "colors.csv:4:1: no question indicated (column QUESTION)"
        );
    }

    #[test]
    fn display_without_coordinates() {
        let err = ParseError::internal(2, "colors.csv", "block hierarchy did not converge");
        assert_eq!(err.to_string(), "colors.csv: block hierarchy did not converge");
        assert!(err.is_internal());
    }

    #[test]
    fn usable_as_boxed_std_error() {
        let err: Box<dyn std::error::Error> =
            Box::new(ParseError::syntax(3, "colors.csv", "boom").at("BLOCK", 2, 3));
        assert_eq!(err.to_string(), "colors.csv:2:3: boom (column BLOCK)");
        assert!(err.source().is_none());
    }

    #[test]
    fn json_value_keeps_null_fields() {
        let err = ParseError::syntax(4, "s", "boom");
        let v = err.to_json_value();
        assert!(v["line"].is_null());
        assert_eq!(v["kind"], "syntax");
        assert_eq!(v["pass"], 4);
    }
}
