//! End-to-end tests for the literal evaluate/invoke protocol.

use braid_lang::{Braid, BraidResult, Frame, FrameRef, Value};

fn session() -> (Braid, FrameRef) {
    let braid = Braid::new();
    let frame = Frame::root();
    braid_lang::builtins::install(&braid, &frame);
    (braid, frame)
}

fn run(braid: &Braid, frame: &FrameRef, source: &str) -> BraidResult<Value> {
    braid_lang::eval_source(braid, frame, source, "<test>")
}

fn eval_ok(source: &str) -> Value {
    let (braid, frame) = session();
    run(&braid, &frame, source).unwrap()
}

fn eval_err(source: &str) -> String {
    let (braid, frame) = session();
    run(&braid, &frame, source).unwrap_err().to_string()
}

// ── end-to-end scenarios ──────────────────────────────────────────────────

#[test]
fn test_soft_cast_scenario() {
    assert_eq!(eval_ok("((^int?) \"42\")"), Value::Int(42));
}

#[test]
fn test_member_scenario() {
    assert_eq!(
        eval_ok("(.ToUpper \"hello\")"),
        Value::Str("HELLO".to_string())
    );
}

#[test]
fn test_vector_negative_index_scenario() {
    assert_eq!(eval_ok("([1 2 3] -1)"), Value::Int(3));
}

#[test]
fn test_dictionary_lookup_scenario() {
    assert_eq!(eval_ok("({:a 1 :b 2} :b)"), Value::Int(2));
}

#[test]
fn test_set_containment_scenario() {
    assert_eq!(eval_ok("(#{1 2 3} 2)"), Value::Bool(true));
    assert_eq!(eval_ok("(#{1 2 3} 4)"), Value::Bool(false));
}

#[test]
fn test_dictionary_write_scenario() {
    assert_eq!(eval_ok("(let d {:a 1}) (d :a 99) (d :a)"), Value::Int(99));
}

// ── properties ────────────────────────────────────────────────────────────

#[test]
fn test_property_vector_round_trip() {
    // v(i) == v(i - n) for every valid i
    let (braid, frame) = session();
    run(&braid, &frame, "(def v [10 20 30 40])").unwrap();
    for i in 0..4 {
        let pos = run(&braid, &frame, &format!("(v {})", i)).unwrap();
        let neg = run(&braid, &frame, &format!("(v {})", i - 4)).unwrap();
        assert_eq!(pos, neg);
    }
}

#[test]
fn test_property_dictionary_idempotent_set() {
    let (braid, frame) = session();
    run(&braid, &frame, "(def d {})").unwrap();
    run(&braid, &frame, "(d :k \"x\")").unwrap();
    assert_eq!(
        run(&braid, &frame, "(d :k)").unwrap(),
        Value::Str("x".to_string())
    );
}

#[test]
fn test_property_set_toggle() {
    let (braid, frame) = session();
    run(&braid, &frame, "(def s #{})").unwrap();
    run(&braid, &frame, "(s 5 true)").unwrap();
    assert_eq!(run(&braid, &frame, "(s 5)").unwrap(), Value::Bool(true));
    run(&braid, &frame, "(s 5 false)").unwrap();
    assert_eq!(run(&braid, &frame, "(s 5)").unwrap(), Value::Bool(false));
}

#[test]
fn test_property_duplicate_literal_key_rejection() {
    let err = eval_err("{:a 1 :a 2}");
    assert!(err.contains("DuplicateKey"));
    // A splat does not suppress parse-time rejection of literal dupes,
    // and a splatted map alone is fine.
    assert!(matches!(eval_ok("(def m {:x 1}) {:a 1 @m}"), Value::Dict(_)));
    let err = eval_err("{:a 1 @m :a 2}");
    assert!(err.contains("DuplicateKey"));
}

#[test]
fn test_property_quiet_member_on_nil() {
    assert_eq!(eval_ok("(.?foo nil)"), Value::Nil);
    let err = eval_err("(.foo nil)");
    assert!(err.contains("MissingMember"));
}

#[test]
fn test_property_strict_type_literal_rejects_nil() {
    let err = eval_err("((^int) nil)");
    assert!(err.contains("StrictCastFailure"));
    // The empty-list type accepts nil.
    assert_eq!(eval_ok("((^nil) nil)"), Value::Nil);
}

#[test]
fn test_property_soft_cast_of_nil_is_zero() {
    assert_eq!(eval_ok("((^int?) nil)"), Value::Int(0));
}

#[test]
fn test_property_arg_index_scope_walk() {
    // The inner lambda binds no arguments; %0 resolves in the outer call.
    assert_eq!(eval_ok("((fn [x] ((fn [] %0))) 7)"), Value::Int(7));
}

// ── more literal behaviors ────────────────────────────────────────────────

#[test]
fn test_type_literal_zero_args_returns_type() {
    let value = eval_ok("((^string))");
    match value {
        Value::Type(handle) => assert_eq!(handle.ty.name(), "string"),
        other => panic!("expected type, got {:?}", other),
    }
}

#[test]
fn test_unresolved_type_error() {
    let err = eval_err("(^mystery 1)");
    assert!(err.contains("UnresolvedType"));
}

#[test]
fn test_keyword_as_function_reads_and_writes() {
    assert_eq!(eval_ok("(:a {:a 10})"), Value::Int(10));
    // Two-argument form writes and returns the mapping.
    assert_eq!(eval_ok("(def d {:a 0}) (:a d 5) (d :a)"), Value::Int(5));
}

#[test]
fn test_keyword_arity_errors() {
    let err = eval_err("(def d {:a 1}) (:a d 1 2)");
    assert!(err.contains("ArityMismatch"));
}

#[test]
fn test_vector_write_through_call() {
    assert_eq!(eval_ok("(def v [1 2 3]) (v 1 99) (v 1)"), Value::Int(99));
}

#[test]
fn test_vector_bad_index() {
    let err = eval_err("([1 2] 9)");
    assert!(err.contains("BadIndex"));
}

#[test]
fn test_splat_expansion_in_vector_literal() {
    let value = eval_ok("(def xs [2 3]) [1 @xs 4]");
    assert_eq!(value.to_string(), "[1 2 3 4]");
}

#[test]
fn test_odd_dictionary_after_splat_is_runtime_error() {
    let err = eval_err("(def m {:x 1}) {@m :dangling}");
    assert!(err.contains("OddDictionaryLiteral"));
}

#[test]
fn test_arg_index_out_of_range() {
    let err = eval_err("((fn [x] %3) 1)");
    assert!(err.contains("ArgIndexOutOfRange"));
}

#[test]
fn test_function_literal_closes_over_environment() {
    assert_eq!(
        eval_ok("(def make (fn [n] (fn [] n))) (def f (make 11)) (f)"),
        Value::Int(11)
    );
}

#[test]
fn test_defn_help_is_queryable() {
    assert_eq!(
        eval_ok("(defn twice [x] \"doubles x\" (* x 2)) (help twice)"),
        Value::Str("doubles x".to_string())
    );
}

#[test]
fn test_string_template_expansion() {
    assert_eq!(
        eval_ok("(def who \"braid\") \"hi $who: $(+ 1 2)\""),
        Value::Str("hi braid: 3".to_string())
    );
}

#[test]
fn test_quote_returns_data() {
    assert_eq!(eval_ok("'x").to_string(), "x");
    assert_eq!(eval_ok("'(a b)").to_string(), "[a b]");
}

#[test]
fn test_user_thrown_value_passes_through() {
    let (braid, frame) = session();
    let err = run(&braid, &frame, "(throw [1 2])").unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(err.to_string(), "[1 2]");
}

#[test]
fn test_bigint_literal_and_overflow() {
    assert_eq!(eval_ok("12N").to_string(), "12N");
    // Adding past i64::MAX widens instead of wrapping.
    let value = eval_ok(&format!("(+ {} 1)", i64::MAX));
    assert!(matches!(value, Value::BigInt(_)));
}

#[test]
fn test_cancellation_surfaces_during_rendering() {
    let (braid, frame) = session();
    let value = run(&braid, &frame, "[1 2 3]").unwrap();
    braid.cancel.request();
    let err = braid_lang::value::render(&value, Some(&braid.cancel)).unwrap_err();
    assert!(err.to_string().contains("Cancelled"));
}
