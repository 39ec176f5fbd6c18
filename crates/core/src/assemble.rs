//! Five-pass unifier: token table -> Survey.
//!
//! A thin orchestrator that calls each pass module in order. Passes 1 and 2
//! are independent; both finish before binding, binding finishes before
//! branch resolution, and paradigm propagation runs last.

use crate::columns;
use crate::config::ParseOptions;
use crate::error::ParseError;
use crate::model::{Survey, SurveyMeta};
use crate::pass1_questions::{self, QuestionList};
use crate::pass2_blocks::{self, BlockForest};
use crate::pass3_bind;
use crate::pass4_branch;
use crate::pass5_paradigm;
use crate::table::TokenTable;

/// Unify a token table into a survey, or return the first error found.
/// No partial survey is ever returned.
pub fn parse(table: &TokenTable, options: &ParseOptions) -> Result<Survey, ParseError> {
    let meta = SurveyMeta::new(table.origin(), table.encoding());
    let span = tracing::info_span!("unify", survey = meta.display_name());
    let _guard = span.enter();

    unify(table, options, meta).inspect_err(|err| {
        tracing::error!(pass = err.pass, kind = ?err.kind, "{}", err);
    })
}

fn unify(table: &TokenTable, options: &ParseOptions, meta: SurveyMeta) -> Result<Survey, ParseError> {
    let survey = meta.display_name().to_owned();

    let mut table = table.clone();
    table.sort_rows();

    // Pass 1: questions
    let QuestionList {
        mut questions,
        correlation,
    } = pass1_questions::build_questions(&table, options, &survey)?;

    // Pass 2: block hierarchy
    let mut forest = if table.has_column(columns::BLOCK) {
        pass2_blocks::build_blocks(&table, options, &survey)?
    } else {
        BlockForest::default()
    };

    // Pass 3: binding, or one implicit block owning everything
    if forest.is_empty() {
        tracing::debug!("no blocks declared, using a single implicit block");
        forest = pass2_blocks::implicit_forest(options, &survey)?;
        let top = forest.top_level[0];
        pass3_bind::bind_all(&mut questions, &mut forest, top);
    } else {
        pass3_bind::bind_questions(&table, &mut questions, &mut forest, options, &survey)?;
    }

    // Pass 4: branch edges and local paradigms
    pass4_branch::resolve_branches(&table, &mut questions, &mut forest, options, &survey)?;

    // Pass 5: paradigm propagation
    pass5_paradigm::propagate_paradigms(&mut forest, &survey)?;

    tracing::info!(
        questions = questions.len(),
        blocks = forest.blocks.len(),
        "survey unified"
    );

    let BlockForest {
        blocks,
        index,
        top_level,
    } = forest;
    Ok(Survey::new(
        meta,
        questions,
        blocks,
        index,
        top_level,
        correlation,
        table.passthrough_headers(),
        options.randomize_marker,
    ))
}
