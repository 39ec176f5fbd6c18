//! Pass 4: Branch resolution -- turn BRANCH cells into option -> block
//! edges and record how many questions of each block branch.

use crate::block_id::BlockId;
use crate::columns;
use crate::config::ParseOptions;
use crate::datum::DatumId;
use crate::error::ParseError;
use crate::model::{BranchDest, BranchParadigm, Question};
use crate::pass2_blocks::BlockForest;
use crate::pass3_bind::find_question;
use crate::table::TokenTable;

pub fn resolve_branches(
    table: &TokenTable,
    questions: &mut [Question],
    forest: &mut BlockForest,
    options: &ParseOptions,
    survey: &str,
) -> Result<(), ParseError> {
    for (row, cell) in table.non_blank(columns::BRANCH) {
        let line = cell.line;
        let at = |err: ParseError| err.at(columns::BRANCH, line, cell.col);

        let q = find_question(questions, line).ok_or_else(|| {
            at(ParseError::syntax(
                4,
                survey,
                format!("no question found at line {} in {}", line, survey),
            ))
        })?;
        let b = questions[q.0].block.ok_or_else(|| {
            at(ParseError::syntax(
                4,
                survey,
                format!("question at line {} branches but belongs to no block", line),
            ))
        })?;

        let block = &mut forest.blocks[b.0];
        match block.branch_question {
            None => {
                block.branch_question = Some(q);
                block.declared_paradigm = block.declared_paradigm.escalate(BranchParadigm::One);
            }
            Some(existing) if existing != q => {
                if block.declared_paradigm != BranchParadigm::All {
                    tracing::debug!(block = %block.clean_id, line, "block branches on every question");
                }
                block.declared_paradigm = BranchParadigm::All;
            }
            Some(_) => {}
        }

        let option_cell = table.cell(columns::OPTIONS, row);
        if let Some(o) = option_cell.filter(|o| o.line != line) {
            return Err(at(ParseError::syntax(
                4,
                survey,
                format!(
                    "misaligned line numbers: branch cell on line {} but option cell on line {}",
                    line, o.line
                ),
            )));
        }
        let option_id = option_cell
            .map(|o| DatumId::at(o.line, o.col))
            .filter(|id| questions[q.0].options.contains_key(id))
            .ok_or_else(|| {
                at(ParseError::syntax(
                    4,
                    survey,
                    format!("branch at line {} has no option to branch from", line),
                ))
            })?;

        let target = cell.text().trim();
        let dest = if target.eq_ignore_ascii_case(&options.next_sentinel) {
            BranchDest::Next
        } else {
            BlockId::parse(target, options.randomize_marker)
                .ok()
                .and_then(|id| forest.get(&id.clean()))
                .map(BranchDest::Block)
                .ok_or_else(|| {
                    at(ParseError::syntax(
                        4,
                        survey,
                        format!(
                            "branch to block ({}) at line {} matches no known block",
                            target, line
                        ),
                    ))
                })?
        };
        questions[q.0].branch_map.insert(option_id, dest);
    }
    Ok(())
}
