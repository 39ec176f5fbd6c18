//! Pass 5: Paradigm propagation -- settle each block's effective branch
//! paradigm and check the forest invariants.
//!
//! Rule: top-down and monotonic. A block whose effective paradigm is ALL
//! forces ALL onto every descendant, so every question beneath it may
//! branch independently. NONE and ONE do not flow downward; a child keeps
//! its own declarations. No paradigm ever drops below its declared value.

use crate::error::ParseError;
use crate::model::{BlockIdx, BranchParadigm};
use crate::pass2_blocks::BlockForest;

pub fn propagate_paradigms(forest: &mut BlockForest, survey: &str) -> Result<(), ParseError> {
    check_forest(forest, survey)?;

    let mut stack: Vec<(BlockIdx, bool)> = forest.top_level.iter().map(|b| (*b, false)).collect();
    while let Some((idx, inherit_all)) = stack.pop() {
        let block = &mut forest.blocks[idx.0];
        block.paradigm = if inherit_all {
            BranchParadigm::All
        } else {
            block.paradigm.escalate(block.declared_paradigm)
        };
        if inherit_all && block.declared_paradigm != BranchParadigm::All {
            tracing::debug!(block = %block.clean_id, "inheriting ALL paradigm from ancestor");
        }
        let all = block.paradigm == BranchParadigm::All;
        stack.extend(block.children.iter().map(|c| (*c, all)));
    }
    Ok(())
}

/// Every block is reached exactly once from the top-level list, every
/// non-top-level block has a parent, and phantoms own no questions.
fn check_forest(forest: &BlockForest, survey: &str) -> Result<(), ParseError> {
    let mut seen = vec![false; forest.blocks.len()];
    let mut stack: Vec<BlockIdx> = forest.top_level.clone();
    while let Some(idx) = stack.pop() {
        if std::mem::replace(&mut seen[idx.0], true) {
            return Err(ParseError::internal(
                5,
                survey,
                format!("block {} is reachable twice", forest.blocks[idx.0].id),
            ));
        }
        stack.extend(forest.blocks[idx.0].children.iter().copied());
    }
    for (i, block) in forest.blocks.iter().enumerate() {
        if !seen[i] {
            return Err(ParseError::internal(
                5,
                survey,
                format!("block {} is not reachable from any top-level block", block.id),
            ));
        }
        if block.parent.is_none() != block.is_top_level() {
            return Err(ParseError::internal(
                5,
                survey,
                format!("block {} has an inconsistent parent link", block.id),
            ));
        }
        if block.phantom && !block.questions.is_empty() {
            return Err(ParseError::internal(
                5,
                survey,
                format!("phantom block {} owns questions", block.id),
            ));
        }
    }
    Ok(())
}
