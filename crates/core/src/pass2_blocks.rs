//! Pass 2: Block hierarchy -- rebuild the block forest from dotted ids,
//! synthesizing phantom blocks for intermediate levels nobody declared.

use crate::block_id::BlockId;
use crate::columns;
use crate::config::ParseOptions;
use crate::error::ParseError;
use crate::model::{Block, BlockIdx};
use crate::table::TokenTable;
use indexmap::IndexMap;

/// Arena of blocks under construction, keyed by clean id.
#[derive(Debug, Default)]
pub struct BlockForest {
    pub blocks: Vec<Block>,
    pub index: IndexMap<String, BlockIdx>,
    pub top_level: Vec<BlockIdx>,
}

impl BlockForest {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, clean_id: &str) -> Option<BlockIdx> {
        self.index.get(clean_id).copied()
    }

    fn insert(&mut self, id: BlockId, phantom: bool) -> BlockIdx {
        let idx = BlockIdx(self.blocks.len());
        self.index.insert(id.clean(), idx);
        self.blocks.push(Block::new(id, phantom));
        idx
    }

    fn link(&mut self, parent: BlockIdx, child: BlockIdx) {
        self.blocks[child.0].parent = Some(parent);
        self.blocks[parent.0].children.push(child);
    }

    fn place_top_level(&mut self, idx: BlockIdx) {
        if !self.top_level.contains(&idx) {
            self.top_level.push(idx);
        }
    }

    /// Fetch the block with this id, or synthesize a phantom for it. A new
    /// phantom is attached to its own parent straight away (itself fetched
    /// or synthesized), so gaps of any height are filled.
    fn fetch_or_phantom(&mut self, id: BlockId) -> BlockIdx {
        if let Some(idx) = self.get(&id.clean()) {
            return idx;
        }
        tracing::debug!(block = %id.clean(), "synthesizing phantom block");
        let parent = id.parent();
        let idx = self.insert(id, true);
        match parent {
            Some(parent_id) => {
                let parent = self.fetch_or_phantom(parent_id);
                self.link(parent, idx);
            }
            None => self.place_top_level(idx),
        }
        idx
    }

    fn sort_siblings(&mut self) {
        let keys: Vec<Vec<u32>> = self.blocks.iter().map(|b| b.id.sort_key()).collect();
        self.top_level.sort_by(|a, b| keys[a.0].cmp(&keys[b.0]));
        for block in &mut self.blocks {
            block.children.sort_by(|a, b| keys[a.0].cmp(&keys[b.0]));
        }
    }
}

pub fn build_blocks(
    table: &TokenTable,
    options: &ParseOptions,
    survey: &str,
) -> Result<BlockForest, ParseError> {
    let mut forest = BlockForest::default();

    // Phase 1: one block per distinct declared id.
    for (_, cell) in table.non_blank(columns::BLOCK) {
        let id = BlockId::parse(cell.text(), options.randomize_marker).map_err(|msg| {
            ParseError::syntax(2, survey, msg).at(columns::BLOCK, cell.line, cell.col)
        })?;
        if let Some(existing) = forest.get(&id.clean()) {
            let first = &forest.blocks[existing.0].id;
            if first.raw() != id.raw() {
                tracing::warn!(
                    line = cell.line,
                    kept = first.raw(),
                    ignored = id.raw(),
                    "block declared with two spellings"
                );
            }
            continue;
        }
        let top = id.is_top_level();
        let idx = forest.insert(id, false);
        if top {
            forest.top_level.push(idx);
        }
    }

    // Phase 2: place blocks level by level; a block of depth d is attached
    // to its parent when sweeping level d - 1.
    let max_depth = forest.blocks.iter().map(Block::depth).max().unwrap_or(0);
    let mut pending: Vec<BlockIdx> = (0..forest.blocks.len()).map(BlockIdx).collect();
    let mut level = 1;
    while !pending.is_empty() {
        if level > max_depth {
            let stuck: Vec<&str> = pending
                .iter()
                .map(|idx| forest.blocks[idx.0].id.raw())
                .collect();
            return Err(ParseError::internal(
                2,
                survey,
                format!("block hierarchy did not converge; unplaced: {}", stuck.join(", ")),
            ));
        }
        let mut still_pending = Vec::new();
        for idx in pending {
            let block = &forest.blocks[idx.0];
            if block.is_top_level() {
                forest.place_top_level(idx);
            } else if block.depth() == level + 1 {
                let Some(parent_id) = block.id.parent() else {
                    return Err(ParseError::internal(
                        2,
                        survey,
                        format!("block {} has no parent id", block.id),
                    ));
                };
                let parent = forest.fetch_or_phantom(parent_id);
                forest.link(parent, idx);
            } else {
                still_pending.push(idx);
            }
        }
        pending = still_pending;
        level += 1;
    }

    forest.sort_siblings();
    tracing::debug!(
        blocks = forest.blocks.len(),
        top_level = forest.top_level.len(),
        phantoms = forest.blocks.iter().filter(|b| b.phantom).count(),
        "built block hierarchy"
    );
    Ok(forest)
}

/// The single top-level block used when the input declares no blocks.
pub fn implicit_forest(options: &ParseOptions, survey: &str) -> Result<BlockForest, ParseError> {
    let id = BlockId::parse(&options.implicit_block_id, options.randomize_marker)
        .map_err(|msg| ParseError::internal(2, survey, format!("implicit block id: {}", msg)))?;
    if !id.is_top_level() {
        return Err(ParseError::internal(
            2,
            survey,
            format!("implicit block id '{}' must be top-level", id),
        ));
    }
    let mut forest = BlockForest::default();
    let idx = forest.insert(id, false);
    forest.top_level.push(idx);
    Ok(forest)
}
