//! Pass 1: Question building -- fold the rows into logical questions.
//!
//! A row opens a new question when its QUESTION cell is filled; a row with
//! a blank QUESTION cell continues the open question as another option row.

use crate::columns;
use crate::config::ParseOptions;
use crate::datum::{self, DatumId, SurveyDatum};
use crate::error::ParseError;
use crate::model::{FreetextPattern, Question, QuestionIdx};
use crate::resolve::{self, Freetext};
use crate::table::{Cell, TokenTable};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Pass 1 output: questions in source order plus the correlation groups
/// discovered while building them.
#[derive(Debug)]
pub struct QuestionList {
    pub questions: Vec<Question>,
    pub correlation: IndexMap<String, Vec<QuestionIdx>>,
}

enum RowState {
    AwaitQuestion,
    InQuestion(QuestionBuilder),
}

struct QuestionBuilder {
    idx: QuestionIdx,
    text: SurveyDatum,
    id: String,
    exclusive: Option<bool>,
    ordered: Option<bool>,
    randomize: Option<bool>,
    freetext: Option<bool>,
    freetext_default: Option<String>,
    freetext_pattern: Option<FreetextPattern>,
    options: IndexMap<DatumId, SurveyDatum>,
    answer: Option<SurveyDatum>,
    correlation: Option<String>,
    source_lines: BTreeSet<u32>,
    passthrough: IndexMap<String, Option<String>>,
}

/// Read-only inputs shared by every row.
struct RowContext<'a> {
    table: &'a TokenTable,
    options: &'a ParseOptions,
    passthrough: &'a [String],
    survey: &'a str,
}

pub fn build_questions(
    table: &TokenTable,
    options: &ParseOptions,
    survey: &str,
) -> Result<QuestionList, ParseError> {
    check_table_shape(table, survey)?;

    let passthrough = table.passthrough_headers();
    let ctx = RowContext {
        table,
        options,
        passthrough: &passthrough,
        survey,
    };

    let mut questions: Vec<Question> = Vec::new();
    let mut correlation: IndexMap<String, Vec<QuestionIdx>> = IndexMap::new();
    let mut state = RowState::AwaitQuestion;

    for row in 0..table.row_count() {
        state = step(state, row, &ctx, &mut questions, &mut correlation)?;
    }
    if let RowState::InQuestion(open) = state {
        questions.push(open.finish(&ctx));
    }

    tracing::debug!(
        questions = questions.len(),
        correlation_groups = correlation.len(),
        "built questions"
    );
    Ok(QuestionList {
        questions,
        correlation,
    })
}

/// QUESTION and OPTIONS are mandatory; every column must cover every row.
fn check_table_shape(table: &TokenTable, survey: &str) -> Result<(), ParseError> {
    for required in [columns::QUESTION, columns::OPTIONS] {
        if !table.has_column(required) {
            return Err(ParseError::syntax(
                0,
                survey,
                format!(
                    "surveys must have at a minimum a {} column and an {} column; the {} column is missing",
                    columns::QUESTION,
                    columns::OPTIONS,
                    required
                ),
            ));
        }
    }
    let rows = table.row_count();
    for header in table.headers() {
        let len = table.column(header).map_or(0, <[Cell]>::len);
        if len != rows {
            return Err(ParseError::new(
                0,
                crate::error::ErrorKind::Syntax,
                Some(header),
                None,
                None,
                survey,
                format!(
                    "column {} has {} cells but {} has {}",
                    header,
                    len,
                    columns::QUESTION,
                    rows
                ),
            ));
        }
    }
    Ok(())
}

fn step(
    state: RowState,
    row: usize,
    ctx: &RowContext<'_>,
    questions: &mut Vec<Question>,
    correlation: &mut IndexMap<String, Vec<QuestionIdx>>,
) -> Result<RowState, ParseError> {
    let (question, option) = row_cells(ctx, row)?;
    if question.line != option.line {
        return Err(ParseError::syntax(
            1,
            ctx.survey,
            format!(
                "CSV entries not properly aligned: question cell on line {} but option cell on line {}",
                question.line, option.line
            ),
        )
        .at(columns::OPTIONS, option.line, option.col));
    }

    let mut open = match (state, question.is_blank()) {
        (RowState::AwaitQuestion, true) => {
            return Err(ParseError::syntax(1, ctx.survey, "no question indicated").at(
                columns::QUESTION,
                question.line,
                question.col,
            ));
        }
        (RowState::InQuestion(open), true) => open,
        (RowState::InQuestion(open), false) => {
            questions.push(open.finish(ctx));
            QuestionBuilder::open(QuestionIdx(questions.len()), question)
        }
        (RowState::AwaitQuestion, false) => {
            QuestionBuilder::open(QuestionIdx(questions.len()), question)
        }
    };

    open.absorb_row(row, option, ctx, correlation)?;
    Ok(RowState::InQuestion(open))
}

fn row_cells<'a>(ctx: &RowContext<'a>, row: usize) -> Result<(&'a Cell, &'a Cell), ParseError> {
    let question = ctx.table.cell(columns::QUESTION, row);
    let option = ctx.table.cell(columns::OPTIONS, row);
    match (question, option) {
        (Some(q), Some(o)) => Ok((q, o)),
        _ => Err(ParseError::internal(
            1,
            ctx.survey,
            format!("row {} is missing its question or option cell", row),
        )),
    }
}

impl QuestionBuilder {
    fn open(idx: QuestionIdx, question: &Cell) -> Self {
        tracing::trace!(line = question.line, text = question.text(), "new question");
        QuestionBuilder {
            idx,
            text: datum::classify_cell(question, 0),
            id: format!("q_{}_{}", question.line, question.col),
            exclusive: None,
            ordered: None,
            randomize: None,
            freetext: None,
            freetext_default: None,
            freetext_pattern: None,
            options: IndexMap::new(),
            answer: None,
            correlation: None,
            source_lines: BTreeSet::new(),
            passthrough: IndexMap::new(),
        }
    }

    fn absorb_row(
        &mut self,
        row: usize,
        option: &Cell,
        ctx: &RowContext<'_>,
        correlation: &mut IndexMap<String, Vec<QuestionIdx>>,
    ) -> Result<(), ParseError> {
        let table = ctx.table;

        // A flag left blank on earlier rows may still arrive on this one.
        for (column, slot) in [
            (columns::EXCLUSIVE, &mut self.exclusive),
            (columns::ORDERED, &mut self.ordered),
            (columns::RANDOMIZE, &mut self.randomize),
        ] {
            if slot.is_none() {
                *slot = resolve::explicit_bool(table, column, row, ctx.survey)?;
            }
        }
        if self.freetext.is_none() {
            let resolved = resolve::resolve_freetext(table, row, ctx.survey)?;
            self.freetext = resolved.flag();
            match resolved {
                Freetext::Pattern(p) => self.freetext_pattern = Some(p),
                Freetext::Literal(text) => self.freetext_default = Some(text),
                Freetext::Unset | Freetext::Bool(_) => {}
            }
        }

        let freetext = self.freetext.unwrap_or(ctx.options.defaults.freetext);
        if freetext {
            self.options
                .insert(DatumId::freetext(), datum::freetext_option(option.line, option.col));
        } else if !option.is_blank() {
            let opt = datum::classify_cell(option, self.options.len());
            if self.options.contains_key(&opt.id) {
                return Err(ParseError::internal(
                    1,
                    ctx.survey,
                    format!("duplicate option id {} in question {}", opt.id, self.id),
                )
                .at(columns::OPTIONS, option.line, option.col));
            }
            self.options.insert(opt.id.clone(), opt);
        }

        if let Some(cell) = table.cell(columns::CORRELATION, row).filter(|c| !c.is_blank()) {
            let tag = cell.text().trim();
            if self.correlation.is_none() {
                self.correlation = Some(tag.to_owned());
                correlation.entry(tag.to_owned()).or_default().push(self.idx);
            } else if self.correlation.as_deref() != Some(tag) {
                tracing::warn!(
                    line = cell.line,
                    question = %self.id,
                    ignored = tag,
                    "question already carries a correlation tag"
                );
            }
        }

        if self.answer.is_none() {
            if let Some(cell) = table.cell(columns::ANSWER, row).filter(|c| !c.is_blank()) {
                self.answer = Some(datum::classify_cell(cell, 0));
            }
        }

        self.source_lines.insert(option.line);

        for column in ctx.passthrough {
            let value = table
                .cell(column, row)
                .filter(|c| !c.is_blank())
                .map(|c| c.text().to_owned());
            let slot = self.passthrough.entry(column.clone()).or_insert(None);
            if slot.is_none() {
                *slot = value;
            }
        }
        Ok(())
    }

    fn finish(self, ctx: &RowContext<'_>) -> Question {
        let defaults = &ctx.options.defaults;
        let line = self.text.line;
        let flag = |value: Option<bool>, column: &str| {
            value.unwrap_or_else(|| {
                tracing::debug!(line, column, "supplying column default");
                defaults.for_column(column).unwrap_or(false)
            })
        };
        Question {
            exclusive: flag(self.exclusive, columns::EXCLUSIVE),
            ordered: flag(self.ordered, columns::ORDERED),
            randomize: flag(self.randomize, columns::RANDOMIZE),
            freetext: flag(self.freetext, columns::FREETEXT),
            id: self.id,
            text: self.text,
            freetext_default: self.freetext_default,
            freetext_pattern: self.freetext_pattern,
            options: self.options,
            answer: self.answer,
            correlation: self.correlation,
            branch_map: IndexMap::new(),
            block: None,
            source_lines: self.source_lines,
            passthrough: self
                .passthrough
                .into_iter()
                .map(|(k, v)| (k, v.unwrap_or_default()))
                .collect(),
        }
    }
}
