//! Reserved column names. Any header not listed here is a passthrough
//! column and is carried verbatim per question.

pub const QUESTION: &str = "QUESTION";
pub const OPTIONS: &str = "OPTIONS";
pub const EXCLUSIVE: &str = "EXCLUSIVE";
pub const ORDERED: &str = "ORDERED";
pub const RANDOMIZE: &str = "RANDOMIZE";
pub const FREETEXT: &str = "FREETEXT";
pub const CORRELATION: &str = "CORRELATION";
pub const ANSWER: &str = "ANSWER";
pub const BLOCK: &str = "BLOCK";
pub const BRANCH: &str = "BRANCH";

pub const KNOWN_HEADERS: [&str; 10] = [
    QUESTION,
    OPTIONS,
    EXCLUSIVE,
    ORDERED,
    RANDOMIZE,
    FREETEXT,
    CORRELATION,
    ANSWER,
    BLOCK,
    BRANCH,
];

/// Map a reserved header to its canonical upper-case spelling; leave every
/// other header untouched.
pub fn normalize_header(name: &str) -> String {
    let trimmed = name.trim();
    match KNOWN_HEADERS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(trimmed))
    {
        Some(known) => (*known).to_owned(),
        None => name.to_owned(),
    }
}

pub fn is_known(name: &str) -> bool {
    KNOWN_HEADERS.contains(&name)
}
