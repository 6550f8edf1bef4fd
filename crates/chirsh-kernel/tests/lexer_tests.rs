//! Lexer tests using rstest for parameterization.

use chirsh_kernel::lexer::tokenize;
use rstest::rstest;

fn stages(line: &str) -> Vec<Vec<String>> {
    tokenize(line)
        .stages()
        .iter()
        .map(|stage| stage.args().to_vec())
        .collect()
}

fn run_lexer_test(input: &str, expected: Vec<Vec<&str>>, background: bool) {
    let pipeline = tokenize(input);
    let expected: Vec<Vec<String>> = expected
        .into_iter()
        .map(|stage| stage.into_iter().map(String::from).collect())
        .collect();
    assert_eq!(stages(input), expected, "input: {input:?}");
    assert_eq!(pipeline.is_background(), background, "input: {input:?}");
}

// =============================================================================
// Stages and background
// =============================================================================

#[rstest]
#[case::three_stages("a | b | c", vec![vec!["a"], vec!["b"], vec!["c"]], false)]
#[case::no_spaces("a|b", vec![vec!["a"], vec!["b"]], false)]
#[case::trailing_background("sleep 1 &", vec![vec!["sleep", "1"]], true)]
#[case::background_without_space("sleep 1&", vec![vec!["sleep", "1"]], true)]
#[case::background_pipeline("yes | head -n 1 &", vec![vec!["yes"], vec!["head", "-n", "1"]], true)]
#[case::mid_line_ampersand("a & b", vec![vec!["a"], vec!["b"]], true)]
#[case::empty_stages_dropped("| a || b |", vec![vec!["a"], vec!["b"]], false)]
#[case::only_ampersand("&", vec![], true)]
fn lexer_stages(#[case] input: &str, #[case] expected: Vec<Vec<&str>>, #[case] background: bool) {
    run_lexer_test(input, expected, background);
}

// =============================================================================
// Quotes and escapes
// =============================================================================

#[rstest]
#[case::double_quotes(r#"echo "a b" c"#, vec![vec!["echo", "a b", "c"]])]
#[case::escaped_space(r"echo a\ b", vec![vec!["echo", "a b"]])]
#[case::single_quotes_keep_backslash(r"echo 'a\ b'", vec![vec!["echo", r"a\ b"]])]
#[case::double_quote_escape(r#"echo "\"q\"""#, vec![vec!["echo", r#""q""#]])]
#[case::quoted_pipe(r#"echo "a | b""#, vec![vec!["echo", "a | b"]])]
#[case::quoted_ampersand("echo 'a & b'", vec![vec!["echo", "a & b"]])]
#[case::escaped_pipe(r"echo a\|b", vec![vec!["echo", "a|b"]])]
#[case::adjacent_quotes(r#"echo "a"'b'c"#, vec![vec!["echo", "abc"]])]
#[case::trailing_backslash(r"echo \", vec![vec!["echo", r"\"]])]
#[case::empty_quotes_vanish(r#"echo "" x"#, vec![vec!["echo", "x"]])]
#[case::tabs_separate("echo\ta\tb", vec![vec!["echo", "a", "b"]])]
fn lexer_quoting(#[case] input: &str, #[case] expected: Vec<Vec<&str>>) {
    run_lexer_test(input, expected, false);
}

// =============================================================================
// Permissive unterminated quotes
// =============================================================================

#[rstest]
#[case::single("echo 'a | b", vec![vec!["echo", "a | b"]])]
#[case::double(r#"echo "a & b"#, vec![vec!["echo", "a & b"]])]
#[case::double_trailing_escape(r#"echo "a\"#, vec![vec!["echo", r"a\"]])]
fn lexer_unterminated(#[case] input: &str, #[case] expected: Vec<Vec<&str>>) {
    run_lexer_test(input, expected, false);
}

#[test]
fn lexer_blank_line_is_noop() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("  \t  ").is_empty());
}

#[test]
fn lexer_display_round_trip() {
    assert_eq!(tokenize("ls -l | wc -l &").to_string(), "ls -l | wc -l &");
}
