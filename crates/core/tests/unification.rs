//! End-to-end tests: token tables in, unified surveys (or errors) out.

use survey_core::{
    parse, BranchDest, BranchParadigm, DatumId, ParseOptions, QuestionIdx, Survey, TokenTable,
};

fn unify(headers: &[&str], rows: &[Vec<&str>]) -> Survey {
    let table = TokenTable::from_rows(Some("surveys/colors.v1.csv"), headers, rows);
    parse(&table, &ParseOptions::default()).unwrap_or_else(|e| panic!("unification failed: {}", e))
}

fn unify_err(headers: &[&str], rows: &[Vec<&str>]) -> survey_core::ParseError {
    let table = TokenTable::from_rows(Some("surveys/colors.v1.csv"), headers, rows);
    match parse(&table, &ParseOptions::default()) {
        Ok(_) => panic!("expected unification to fail"),
        Err(e) => e,
    }
}

fn block_ids(survey: &Survey, idxs: &[survey_core::BlockIdx]) -> Vec<String> {
    idxs.iter().map(|b| survey.block(*b).clean_id.clone()).collect()
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn continuation_row_adds_option() {
    let survey = unify(
        &["QUESTION", "OPTIONS"],
        &[vec!["Color?", "Red"], vec!["", "Blue"]],
    );
    assert_eq!(survey.questions().len(), 1);
    let q = &survey.questions()[0];
    let opts: Vec<&str> = q.options.values().map(|d| d.raw()).collect();
    assert_eq!(opts, vec!["Red", "Blue"]);
    assert!(q.exclusive);
    assert!(!q.ordered);
    assert!(q.randomize);
    assert!(!q.freetext);
}

#[test]
fn freetext_pattern_cell() {
    let survey = unify(
        &["QUESTION", "OPTIONS", "FREETEXT"],
        &[vec!["Age?", "", "#{^[0-9]+$}"]],
    );
    let q = &survey.questions()[0];
    assert!(q.freetext);
    assert_eq!(q.freetext_default, None);
    let pattern = q.freetext_pattern.as_ref().expect("pattern stored");
    assert!(pattern.is_match("42"));
    assert!(!pattern.is_match("forty-two"));
    let synthetic = q.option(&DatumId::freetext()).expect("synthetic option");
    assert!(synthetic.is_empty());
    assert_eq!(q.options.len(), 1);
}

#[test]
fn phantom_block_fills_gap() {
    let survey = unify(
        &["QUESTION", "OPTIONS", "BLOCK"],
        &[
            vec!["A?", "x", "1"],
            vec!["B?", "x", "1.1"],
            vec!["C?", "x", "1.2.1"],
        ],
    );
    let phantom = survey.block_by_id("1.2").expect("phantom 1.2");
    let block = survey.block(phantom);
    assert!(block.phantom);
    assert!(block.questions.is_empty());
    assert_eq!(block.parent, survey.block_by_id("1"));
    assert_eq!(block_ids(&survey, &block.children), vec!["1.2.1"]);
    let one = survey.block_by_id("1").unwrap();
    assert_eq!(block_ids(&survey, &survey.block(one).children), vec!["1.1", "1.2"]);
}

#[test]
fn branch_to_unknown_block_fails() {
    let err = unify_err(
        &["QUESTION", "OPTIONS", "BLOCK", "BRANCH"],
        &[vec!["A?", "yes", "1", "9"], vec!["", "no", "1", "NEXT"]],
    );
    assert!(err.message.contains('9'));
    assert_eq!(err.line, Some(2));
    assert!(!err.is_internal());
    assert!(err.to_string().starts_with("surveys/colors.v1.csv:2:"));
}

#[test]
fn no_block_column_gives_one_implicit_block() {
    let survey = unify(
        &["QUESTION", "OPTIONS"],
        &[vec!["A?", "1"], vec!["B?", "1"], vec!["", "2"], vec!["C?", "1"]],
    );
    assert_eq!(survey.top_level_blocks().len(), 1);
    let top = survey.top_level_blocks()[0];
    assert_eq!(
        survey.block(top).questions,
        vec![QuestionIdx(0), QuestionIdx(1), QuestionIdx(2)]
    );
    assert!(survey.questions().iter().all(|q| q.block == Some(top)));
    assert!(!survey.block(top).phantom);
}

// ──────────────────────────────────────────────
// Properties
// ──────────────────────────────────────────────

#[test]
fn paradigms_follow_branching_question_count() {
    let survey = unify(
        &["QUESTION", "OPTIONS", "BLOCK", "BRANCH"],
        &[
            vec!["A?", "a", "1", "2"],
            vec!["", "b", "1", "3"],
            vec!["B?", "a", "2", "3"],
            vec!["C?", "a", "2", "NEXT"],
            vec!["D?", "a", "3", ""],
        ],
    );
    let paradigm = |id: &str| survey.block(survey.block_by_id(id).unwrap()).paradigm;
    assert_eq!(paradigm("1"), BranchParadigm::One);
    assert_eq!(paradigm("2"), BranchParadigm::All);
    assert_eq!(paradigm("3"), BranchParadigm::None);

    let one = survey.block(survey.block_by_id("1").unwrap());
    assert_eq!(one.branch_question, Some(QuestionIdx(0)));
    assert!(survey.is_branch_eligible(QuestionIdx(0)));
    assert!(survey.is_branch_eligible(QuestionIdx(2)));
    assert!(!survey.is_branch_eligible(QuestionIdx(3)));
    assert!(survey.question(QuestionIdx(0)).has_branches());
    assert!(!survey.question(QuestionIdx(3)).has_branches());
    assert_eq!(
        survey.branch_destination(QuestionIdx(0), &DatumId::at(3, 2)),
        survey.block_by_id("3").map(BranchDest::Block)
    );
}

#[test]
fn all_paradigm_propagates_to_sub_blocks() {
    let survey = unify(
        &["QUESTION", "OPTIONS", "BLOCK", "BRANCH"],
        &[
            vec!["A?", "a", "1", "2"],
            vec!["B?", "a", "1", "2"],
            vec!["C?", "a", "1.1", ""],
            vec!["D?", "a", "2", ""],
        ],
    );
    let sub = survey.block(survey.block_by_id("1.1").unwrap());
    assert_eq!(sub.declared_paradigm, BranchParadigm::None);
    assert_eq!(sub.paradigm, BranchParadigm::All);
    assert!(survey.is_branch_eligible(QuestionIdx(2)));
    assert_eq!(
        survey.block(survey.block_by_id("2").unwrap()).paradigm,
        BranchParadigm::None
    );
}

#[test]
fn unifying_twice_gives_equal_surveys() {
    let headers = ["QUESTION", "OPTIONS", "BLOCK", "BRANCH", "CORRELATION", "Notes"];
    let rows = vec![
        vec!["A?", "a", "_1", "2", "g", "n1"],
        vec!["", "b", "_1", "NEXT", "", ""],
        vec!["B?", "a", "2.1", "", "g", "n2"],
        vec!["C?", "a", "2", "", "", ""],
    ];
    let first = unify(&headers, &rows);
    let second = unify(&headers, &rows);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn absent_flag_columns_take_configured_defaults() {
    let table = TokenTable::from_rows(
        None,
        &["QUESTION", "OPTIONS"],
        &[vec!["A?", "1"], vec!["B?", "1"]],
    );
    let options = ParseOptions::from_toml_str(
        "[defaults]\nexclusive = false\nordered = true\nrandomize = false\n",
    )
    .unwrap();
    let survey = parse(&table, &options).unwrap();
    for q in survey.questions() {
        assert!(!q.exclusive);
        assert!(q.ordered);
        assert!(!q.randomize);
        assert!(!q.freetext);
    }
}

#[test]
fn option_ids_unique_within_each_question() {
    let survey = unify(
        &["QUESTION", "OPTIONS"],
        &[
            vec!["A?", "same"],
            vec!["", "same"],
            vec!["", "same"],
            vec!["B?", "same"],
        ],
    );
    let q = &survey.questions()[0];
    assert_eq!(q.options.len(), 3);
    let indices: Vec<Option<usize>> = q.options.values().map(|d| d.index).collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
}

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

#[test]
fn malformed_flag_fails_but_freetext_reinterprets() {
    let err = unify_err(
        &["QUESTION", "OPTIONS", "RANDOMIZE"],
        &[vec!["A?", "1", "often"]],
    );
    assert_eq!(err.column.as_deref(), Some("RANDOMIZE"));

    let survey = unify(
        &["QUESTION", "OPTIONS", "FREETEXT"],
        &[vec!["Name?", "", "Jane Doe"]],
    );
    assert_eq!(survey.questions()[0].freetext_default.as_deref(), Some("Jane Doe"));
}

#[test]
fn leading_continuation_row_fails() {
    let err = unify_err(&["QUESTION", "OPTIONS"], &[vec!["", "Red"]]);
    assert_eq!(err.message, "no question indicated");
}

#[test]
fn missing_question_column_fails() {
    let err = unify_err(&["OPTIONS"], &[vec!["Red"]]);
    assert_eq!(err.pass, 0);
    assert!(err.message.contains("QUESTION column is missing"));
}

#[test]
fn branch_from_unblocked_question_fails() {
    let err = unify_err(
        &["QUESTION", "OPTIONS", "BLOCK", "BRANCH"],
        &[vec!["A?", "a", "1", ""], vec!["B?", "a", "", "NEXT"]],
    );
    assert!(err.message.contains("belongs to no block"));
}

#[test]
fn malformed_block_id_fails() {
    let err = unify_err(
        &["QUESTION", "OPTIONS", "BLOCK"],
        &[vec!["A?", "a", "one"]],
    );
    assert_eq!(err.pass, 2);
    assert_eq!(err.column.as_deref(), Some("BLOCK"));
}

// ──────────────────────────────────────────────
// Metadata and queries
// ──────────────────────────────────────────────

#[test]
fn metadata_and_passthrough_columns() {
    let survey = unify(
        &["Notes", "QUESTION", "OPTIONS", "CORRELATION", "Tag"],
        &[
            vec!["first", "A?", "1", "c", ""],
            vec!["", "B?", "1", "c", "t"],
        ],
    );
    let meta = survey.meta();
    assert_eq!(meta.short_name.as_deref(), Some("colors"));
    assert_eq!(meta.encoding, "UTF-8");
    assert_eq!(survey.passthrough_columns(), &["Notes".to_string(), "Tag".to_string()]);
    assert_eq!(survey.questions()[0].passthrough["Notes"], "first");
    assert_eq!(survey.questions()[0].passthrough["Tag"], "");
    assert_eq!(survey.questions()[1].passthrough["Tag"], "t");
    assert_eq!(survey.correlation_group("c"), &[QuestionIdx(0), QuestionIdx(1)]);
    assert!(survey.correlation_group("missing").is_empty());
}

#[test]
fn block_queries() {
    let survey = unify(
        &["QUESTION", "OPTIONS", "BLOCK"],
        &[
            vec!["A?", "a", "2"],
            vec!["B?", "a", "1._1.1"],
            vec!["C?", "a", "1"],
        ],
    );
    let deep = survey.block_by_id("1.1.1").unwrap();
    assert_eq!(survey.block_by_id("1._1._1"), Some(deep));
    assert_eq!(block_ids(&survey, &survey.ancestors(deep)), vec!["1.1", "1"]);
    assert_eq!(
        block_ids(&survey, &survey.walk_blocks()),
        vec!["1", "1.1", "1.1.1", "2"]
    );
    assert!(survey.block(survey.block_by_id("1.1").unwrap()).is_randomized());
    assert_eq!(survey.clean_block_id("_2._3").as_deref(), Some("2.3"));
    let texts: Vec<&str> = survey.block_questions(deep).map(|q| q.text.raw()).collect();
    assert_eq!(texts, vec!["B?"]);
    assert_eq!(survey.question_by_line(3), Some(QuestionIdx(1)));
    assert_eq!(survey.question_by_id("q_4_1"), Some(QuestionIdx(2)));
}
