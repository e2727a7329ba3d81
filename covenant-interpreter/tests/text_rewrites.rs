//! Properties of keyword substitution, `$old` extraction and evaluation

use covenant_core::TestContext;
use covenant_interpreter::{
    extract_old_references, ExpressionInterpreter, KeywordSubstitutions, ScriptInterpreter,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

proptest! {
    #[test]
    fn keyword_apply_never_panics(source in "\\PC{0,64}") {
        let _ = KeywordSubstitutions::default().apply(&source);
    }

    #[test]
    fn text_without_keywords_is_unchanged(source in "[a-z0-9 .()<>=!&|+-]{0,64}") {
        let applied = KeywordSubstitutions::default().apply(&source);
        prop_assert_eq!(applied.as_ref(), source.as_str());
    }

    #[test]
    fn old_extraction_never_panics(source in "\\PC{0,64}") {
        let refs = extract_old_references(&source);
        prop_assert_eq!(refs.is_empty(), refs.captures.is_empty());
    }

    #[test]
    fn old_references_become_symbols(inner in "[a-z]{1,8}", other in "[a-z]{1,8}") {
        let refs = extract_old_references(&format!("$old({}) == {}", inner, other));
        prop_assert_eq!(refs.rewritten, format!("__old0 == {}", other));
        prop_assert_eq!(refs.captures.get("__old0"), Some(&inner));
    }

    #[test]
    fn evaluate_never_panics(source in "\\PC{0,48}") {
        let mut interpreter = ScriptInterpreter::script();
        let _ = interpreter.evaluate(&source, &TestContext::new("f"));
    }

    #[test]
    fn chains_of_any_length_fail_softly(terms in 1usize..3_000) {
        let mut interpreter = ScriptInterpreter::script();
        let expression = vec!["true"; terms].join(" || ");
        let result = interpreter.evaluate(&expression, &TestContext::new("f"));
        prop_assert_eq!(result.passed(), result.failure_cause().is_none());
    }
}

#[test]
fn keywords_respect_identifier_boundaries() {
    let applied = KeywordSubstitutions::default().apply("$this.x == $thisx && $result");
    assert_eq!(applied, "this.x == $thisx && result");
}
