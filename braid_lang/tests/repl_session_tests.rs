//! REPL session behavior: persistence, isolation, file execution.

use std::io::Write;

use braid_lang::repl::ReplSession;

#[test]
fn test_session_persists_functions_and_methods() {
    let mut session = ReplSession::new();
    assert!(session.eval("(defn inc [x] (+ x 1))").success);
    let result = session.eval("(inc 41)");
    assert_eq!(result.value.as_deref(), Some("42"));

    assert!(session.eval("(defmethod ^string shout [s] (.ToUpper s))").success);
    let result = session.eval("(.shout \"quietly\")");
    assert_eq!(result.value.as_deref(), Some("\"QUIETLY\""));
}

#[test]
fn test_sessions_are_isolated() {
    let mut a = ReplSession::new();
    let mut b = ReplSession::new();
    a.eval("(def shared 1)");
    let result = b.eval("shared");
    assert_eq!(result.value.as_deref(), Some("nil"));
}

#[test]
fn test_multi_form_input_returns_last_value() {
    let mut session = ReplSession::new();
    let result = session.eval("(def a 1) (def b 2) (+ a b)");
    assert_eq!(result.value.as_deref(), Some("3"));
}

#[test]
fn test_error_keeps_session_usable() {
    let mut session = ReplSession::new();
    assert!(!session.eval("(.Missing 1)").success);
    assert!(session.eval("(+ 1 1)").success);
}

#[test]
fn test_parse_error_is_reported_not_panicked() {
    let mut session = ReplSession::new();
    let result = session.eval("(]");
    assert!(!result.success);
    assert!(result.error.unwrap().contains("SyntaxError"));
}

#[test]
fn test_output_and_value_are_separate() {
    let mut session = ReplSession::new();
    let result = session.eval("(print \"side\") (* 2 2)");
    assert_eq!(result.output, "side");
    assert_eq!(result.value.as_deref(), Some("4"));
}

#[test]
fn test_cancel_token_interrupts_rendering() {
    let mut session = ReplSession::new();
    session.eval("(def big [1 2 3])");
    let token = session.cancel_token();
    token.request();
    // Rendering of the next result observes the cancelled token.
    let result = session.eval("big");
    // eval resets the token at entry, so this succeeds...
    assert!(result.success);
    // ...but an externally fired token mid-render surfaces as an error.
    token.request();
    let value = session.get_global("big").unwrap();
    let err = braid_lang::value::render(&value, Some(&token)).unwrap_err();
    assert!(err.to_string().contains("Cancelled"));
}

#[test]
fn test_run_file_through_session() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "(defn square [x] (* x x))").unwrap();
    writeln!(file, "(square 9)").unwrap();

    let source = std::fs::read_to_string(file.path()).unwrap();
    let mut session = ReplSession::new();
    let result = session.eval(&source);
    assert_eq!(result.value.as_deref(), Some("81"));
}

#[test]
fn test_variable_names_listing() {
    let mut session = ReplSession::new();
    session.eval("(def zebra 1)");
    let names = session.variable_names();
    assert!(names.contains(&"zebra".to_string()));
    // Builtins live in the same global frame.
    assert!(names.contains(&"print".to_string()));
}

#[test]
fn test_completion_tracks_new_definitions() {
    let mut session = ReplSession::new();
    assert!(session.completion_candidates("frobni").is_empty());
    session.eval("(def frobnicate 1)");
    assert_eq!(
        session.completion_candidates("frobni"),
        vec!["frobnicate".to_string()]
    );
}
