//! Parsing of the operator's execution confirmation.

/// The only answer that lets generated code run.
pub const AFFIRMATIVE: &str = "yes";

/// Returns `true` when `answer` is exactly `yes`, ignoring ASCII case.
///
/// Only the trailing line terminator is stripped; surrounding spaces or
/// abbreviations such as `y` are rejected.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim_end_matches(['\n', '\r']);
    answer.eq_ignore_ascii_case(AFFIRMATIVE)
}
