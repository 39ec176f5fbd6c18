//! Pass 3: Block binding -- attach each question to the block named on its
//! rows.

use crate::block_id::BlockId;
use crate::columns;
use crate::config::ParseOptions;
use crate::error::ParseError;
use crate::model::{BlockIdx, Question, QuestionIdx};
use crate::pass2_blocks::BlockForest;
use crate::table::TokenTable;

pub fn bind_questions(
    table: &TokenTable,
    questions: &mut [Question],
    forest: &mut BlockForest,
    options: &ParseOptions,
    survey: &str,
) -> Result<(), ParseError> {
    for (row, cell) in table.non_blank(columns::BLOCK) {
        let line = cell.line;
        let question_cell = table.cell(columns::QUESTION, row).ok_or_else(|| {
            ParseError::internal(3, survey, format!("no question cell on row {}", row))
        })?;
        if question_cell.line != line {
            return Err(ParseError::syntax(
                3,
                survey,
                format!(
                    "misaligned line numbers: block cell on line {} but question cell on line {}",
                    line, question_cell.line
                ),
            )
            .at(columns::BLOCK, line, cell.col));
        }

        let q = find_question(questions, line).ok_or_else(|| {
            ParseError::syntax(3, survey, format!("no question found at line {} in {}", line, survey))
                .at(columns::BLOCK, line, cell.col)
        })?;

        let b = BlockId::parse(cell.text(), options.randomize_marker)
            .ok()
            .and_then(|id| forest.get(&id.clean()))
            .ok_or_else(|| {
                ParseError::syntax(
                    3,
                    survey,
                    format!("no block found corresponding to {} in {}", cell.text(), survey),
                )
                .at(columns::BLOCK, line, cell.col)
            })?;

        match questions[q.0].block {
            Some(existing) if existing == b => {}
            Some(existing) => {
                return Err(ParseError::syntax(
                    3,
                    survey,
                    format!(
                        "question at line {} is assigned to both block {} and block {}",
                        questions[q.0].first_line(),
                        forest.blocks[existing.0].id,
                        forest.blocks[b.0].id
                    ),
                )
                .at(columns::BLOCK, line, cell.col));
            }
            None => attach(questions, forest, q, b),
        }
    }
    Ok(())
}

/// Put every question into `block`, in source order.
pub fn bind_all(questions: &mut [Question], forest: &mut BlockForest, block: BlockIdx) {
    for q in 0..questions.len() {
        attach(questions, forest, QuestionIdx(q), block);
    }
}

pub(crate) fn find_question(questions: &[Question], line: u32) -> Option<QuestionIdx> {
    questions
        .iter()
        .position(|q| q.spans_line(line))
        .map(QuestionIdx)
}

fn attach(questions: &mut [Question], forest: &mut BlockForest, q: QuestionIdx, b: BlockIdx) {
    questions[q.0].block = Some(b);
    forest.blocks[b.0].questions.push(q);
}
