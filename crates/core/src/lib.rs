#![allow(clippy::result_large_err)]
//! survey-core: unification of tabular survey sources.
//!
//! Takes a tokenized, cell-addressed survey table and produces a validated
//! [`Survey`]: questions grouped from rows, a block forest rebuilt from
//! dotted ids, and a branch graph from options to blocks.
//!
//! # Public API
//!
//! - [`parse()`] -- run the full five-pass pipeline
//! - [`TokenTable`] / [`Cell`] -- pipeline input
//! - [`ParseOptions`] -- column defaults and syntax settings
//! - [`ParseError`] -- terminal unification error
//! - model types: [`Survey`], [`Question`], [`Block`], [`SurveyDatum`],
//!   [`BranchDest`], [`BranchParadigm`]
//!
//! Individual pass entry functions are re-exported for selective pipeline
//! execution.

pub mod assemble;
pub mod block_id;
pub mod columns;
pub mod config;
pub mod datum;
pub mod error;
pub mod model;
pub mod pass1_questions;
pub mod pass2_blocks;
pub mod pass3_bind;
pub mod pass4_branch;
pub mod pass5_paradigm;
pub mod resolve;
pub mod table;

// ── Convenience re-exports: key types ────────────────────────────────

pub use block_id::BlockId;
pub use config::{ColumnDefaults, ConfigError, ParseOptions};
pub use datum::{DatumId, DatumValue, SurveyDatum};
pub use error::{ErrorKind, ParseError};
pub use model::{
    Block, BlockIdx, BranchDest, BranchParadigm, FreetextPattern, Question, QuestionIdx, Survey,
    SurveyMeta,
};
pub use table::{Cell, TokenTable};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use assemble::parse;
pub use pass1_questions::build_questions;
pub use pass2_blocks::build_blocks;
pub use pass3_bind::bind_questions;
pub use pass4_branch::resolve_branches;
pub use pass5_paradigm::propagate_paradigms;
