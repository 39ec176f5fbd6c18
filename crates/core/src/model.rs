//! The unified survey model.
//!
//! Blocks live in an arena owned by the [`Survey`]; parent/child links and
//! question ownership are indices into the arenas, so the tree carries no
//! reference cycles.

use crate::block_id::{self, BlockId};
use crate::datum::{DatumId, SurveyDatum};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuestionIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockIdx(pub usize);

// ──────────────────────────────────────────────
// Branching
// ──────────────────────────────────────────────

/// How many questions of a block may redirect survey flow. Ordered so that
/// escalation is a `max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BranchParadigm {
    #[default]
    None,
    One,
    All,
}

impl BranchParadigm {
    /// Monotonic update: a paradigm never regresses.
    pub fn escalate(self, to: BranchParadigm) -> BranchParadigm {
        self.max(to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "block", rename_all = "snake_case")]
pub enum BranchDest {
    Block(BlockIdx),
    /// Advance to the next block in sequence.
    Next,
}

// ──────────────────────────────────────────────
// Questions
// ──────────────────────────────────────────────

/// Validation pattern for free-text answers, written `#{...}` in the source.
#[derive(Clone)]
pub struct FreetextPattern {
    source: String,
    full: Regex,
}

impl FreetextPattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let full = Regex::new(&format!("^(?:{})$", source))?;
        Ok(FreetextPattern {
            source: source.to_owned(),
            full,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the whole answer matches.
    pub fn is_match(&self, answer: &str) -> bool {
        self.full.is_match(answer)
    }
}

impl fmt::Debug for FreetextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FreetextPattern").field(&self.source).finish()
    }
}

impl PartialEq for FreetextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for FreetextPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    /// `q_<line>_<col>` of the first row's question cell.
    pub id: String,
    pub text: SurveyDatum,
    pub exclusive: bool,
    pub ordered: bool,
    pub randomize: bool,
    pub freetext: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freetext_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freetext_pattern: Option<FreetextPattern>,
    pub options: IndexMap<DatumId, SurveyDatum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<SurveyDatum>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    pub branch_map: IndexMap<DatumId, BranchDest>,
    pub block: Option<BlockIdx>,
    pub source_lines: BTreeSet<u32>,
    pub passthrough: IndexMap<String, String>,
}

impl Question {
    pub fn option(&self, id: &DatumId) -> Option<&SurveyDatum> {
        self.options.get(id)
    }

    pub fn spans_line(&self, line: u32) -> bool {
        self.source_lines.contains(&line)
    }

    pub fn first_line(&self) -> u32 {
        self.text.line
    }

    pub fn has_branches(&self) -> bool {
        !self.branch_map.is_empty()
    }
}

// ──────────────────────────────────────────────
// Blocks
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: BlockId,
    pub clean_id: String,
    pub parent: Option<BlockIdx>,
    pub children: Vec<BlockIdx>,
    pub questions: Vec<QuestionIdx>,
    /// Paradigm implied by this block's own branch declarations.
    pub declared_paradigm: BranchParadigm,
    /// Paradigm after propagation through the hierarchy.
    pub paradigm: BranchParadigm,
    /// The designated branching question once the block branches.
    pub branch_question: Option<QuestionIdx>,
    /// Synthesized to fill a gap in the hierarchy; never owns questions.
    pub phantom: bool,
}

impl Block {
    pub(crate) fn new(id: BlockId, phantom: bool) -> Self {
        Block {
            clean_id: id.clean(),
            id,
            parent: None,
            children: Vec::new(),
            questions: Vec::new(),
            declared_paradigm: BranchParadigm::None,
            paradigm: BranchParadigm::None,
            branch_question: None,
            phantom,
        }
    }

    pub fn depth(&self) -> usize {
        self.id.depth()
    }

    pub fn is_top_level(&self) -> bool {
        self.id.is_top_level()
    }

    pub fn is_randomized(&self) -> bool {
        self.id.is_randomized()
    }
}

// ──────────────────────────────────────────────
// Survey
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyMeta {
    pub origin: Option<String>,
    pub encoding: String,
    /// Final path segment of the origin up to its first `.`.
    pub short_name: Option<String>,
}

impl SurveyMeta {
    pub fn new(origin: Option<&str>, encoding: &str) -> Self {
        SurveyMeta {
            origin: origin.map(str::to_owned),
            encoding: encoding.to_owned(),
            short_name: origin.map(short_name),
        }
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> &str {
        self.origin.as_deref().unwrap_or("<survey>")
    }
}

pub(crate) fn short_name(origin: &str) -> String {
    let last = origin.rsplit(['/', '\\']).next().unwrap_or(origin);
    last.split('.').next().unwrap_or(last).to_owned()
}

/// A fully unified survey. Built once by [`crate::parse`] and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Survey {
    meta: SurveyMeta,
    questions: Vec<Question>,
    blocks: Vec<Block>,
    block_index: IndexMap<String, BlockIdx>,
    top_level: Vec<BlockIdx>,
    correlation: IndexMap<String, Vec<QuestionIdx>>,
    passthrough_columns: Vec<String>,
    #[serde(skip)]
    randomize_marker: char,
}

impl Survey {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        meta: SurveyMeta,
        questions: Vec<Question>,
        blocks: Vec<Block>,
        block_index: IndexMap<String, BlockIdx>,
        top_level: Vec<BlockIdx>,
        correlation: IndexMap<String, Vec<QuestionIdx>>,
        passthrough_columns: Vec<String>,
        randomize_marker: char,
    ) -> Self {
        Survey {
            meta,
            questions,
            blocks,
            block_index,
            top_level,
            correlation,
            passthrough_columns,
            randomize_marker,
        }
    }

    pub fn meta(&self) -> &SurveyMeta {
        &self.meta
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, idx: QuestionIdx) -> &Question {
        &self.questions[idx.0]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, idx: BlockIdx) -> &Block {
        &self.blocks[idx.0]
    }

    /// Every block id (clean spelling, phantoms included) to its index.
    pub fn block_index(&self) -> &IndexMap<String, BlockIdx> {
        &self.block_index
    }

    pub fn top_level_blocks(&self) -> &[BlockIdx] {
        &self.top_level
    }

    pub fn correlation_map(&self) -> &IndexMap<String, Vec<QuestionIdx>> {
        &self.correlation
    }

    pub fn correlation_group(&self, tag: &str) -> &[QuestionIdx] {
        self.correlation.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn passthrough_columns(&self) -> &[String] {
        &self.passthrough_columns
    }

    /// Strip randomization markers from a raw block id.
    pub fn clean_block_id(&self, raw: &str) -> Option<String> {
        block_id::clean_block_id(raw, self.randomize_marker).ok()
    }

    /// Look a block up by raw or clean id.
    pub fn block_by_id(&self, raw: &str) -> Option<BlockIdx> {
        let clean = self.clean_block_id(raw)?;
        self.block_index.get(&clean).copied()
    }

    pub fn question_by_line(&self, line: u32) -> Option<QuestionIdx> {
        self.questions
            .iter()
            .position(|q| q.spans_line(line))
            .map(QuestionIdx)
    }

    pub fn question_by_id(&self, id: &str) -> Option<QuestionIdx> {
        self.questions.iter().position(|q| q.id == id).map(QuestionIdx)
    }

    pub fn block_questions(&self, idx: BlockIdx) -> impl Iterator<Item = &Question> + '_ {
        self.block(idx).questions.iter().map(|q| self.question(*q))
    }

    /// Parent chain from the immediate parent up to the top-level block.
    pub fn ancestors(&self, idx: BlockIdx) -> Vec<BlockIdx> {
        let mut out = Vec::new();
        let mut cur = self.block(idx).parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.block(p).parent;
        }
        out
    }

    /// All blocks, depth-first, children in sibling order.
    pub fn walk_blocks(&self) -> Vec<BlockIdx> {
        let mut out = Vec::with_capacity(self.blocks.len());
        let mut stack: Vec<BlockIdx> = self.top_level.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.block(idx).children.iter().rev().copied());
        }
        out
    }

    /// A question may branch when its block branches on every question,
    /// or when it is the block's designated branching question.
    pub fn is_branch_eligible(&self, idx: QuestionIdx) -> bool {
        match self.question(idx).block {
            Some(b) => {
                let block = self.block(b);
                block.paradigm == BranchParadigm::All || block.branch_question == Some(idx)
            }
            None => false,
        }
    }

    /// Destination of answering `option` on question `idx`, if it branches.
    pub fn branch_destination(&self, idx: QuestionIdx, option: &DatumId) -> Option<BranchDest> {
        self.question(idx).branch_map.get(option).copied()
    }
}
