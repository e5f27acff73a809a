use wisp::errors::InterpretResult;
use wisp::run_source;
use wisp::vm::Vm;

fn run(source: &str) -> InterpretResult {
    let mut vm = Vm::new();
    run_source(&mut vm, source)
}

#[test]
fn arithmetic_expression_statement_runs_clean() {
    assert_eq!(run("print 1 + 2 * 3;"), InterpretResult::Ok);
}

#[test]
fn string_concatenation_runs_clean() {
    assert_eq!(run(r#"print "foo" + "bar";"#), InterpretResult::Ok);
}

#[test]
fn uninitialized_variable_defaults_to_nil_without_error() {
    assert_eq!(run("var a; print a;"), InterpretResult::Ok);
}

#[test]
fn negating_a_non_number_is_a_runtime_error() {
    assert_eq!(run("-true;"), InterpretResult::RuntimeError);
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    assert_eq!(run(r#"1 + "x";"#), InterpretResult::RuntimeError);
}

#[test]
fn unterminated_string_is_a_compile_error() {
    assert_eq!(run("\"never closed"), InterpretResult::CompileError);
}

#[test]
fn referencing_an_undeclared_global_is_a_runtime_error() {
    assert_eq!(run("print nope;"), InterpretResult::RuntimeError);
}

#[test]
fn assigning_to_an_undeclared_global_is_a_runtime_error() {
    assert_eq!(run("nope = 1;"), InterpretResult::RuntimeError);
}

#[test]
fn loop_control_keywords_outside_a_loop_are_compile_errors() {
    assert_eq!(run("break;"), InterpretResult::CompileError);
    assert_eq!(run("cycle;"), InterpretResult::CompileError);
}

#[test]
fn variables_persist_across_calls_to_run_source_on_the_same_vm() {
    let mut vm = Vm::new();
    assert_eq!(run_source(&mut vm, "var a = 1;"), InterpretResult::Ok);
    assert_eq!(run_source(&mut vm, "a = a + 1;"), InterpretResult::Ok);
    assert_eq!(run_source(&mut vm, "print a;"), InterpretResult::Ok);
}

#[test]
fn ternary_only_evaluates_the_selected_branch() {
    // The untaken arm would raise a runtime type error if it actually ran,
    // so a clean `Ok` here proves it was skipped rather than merely
    // discarded after evaluation.
    assert_eq!(run("true ? 1 : (true - 1);"), InterpretResult::Ok);
    assert_eq!(run("false ? (true - 1) : 2;"), InterpretResult::Ok);
}

#[test]
fn ternary_taken_branch_errors_do_still_surface() {
    assert_eq!(run("true ? (true - 1) : 2;"), InterpretResult::RuntimeError);
    assert_eq!(run("false ? 1 : (true - 1);"), InterpretResult::RuntimeError);
}

#[test]
fn ternary_is_right_associative_and_chains() {
    assert_eq!(run("print true ? 1 : false ? 2 : 3;"), InterpretResult::Ok);
}

#[test]
fn comparison_operators_desugar_without_error() {
    assert_eq!(run("print 1 <= 2; print 2 >= 1; print 1 != 2;"), InterpretResult::Ok);
}

#[test]
fn block_comment_spanning_multiple_lines_keeps_line_tracking_correct() {
    let source = "#[ this\nspans\nseveral\nlines ]# -true;";
    assert_eq!(run(source), InterpretResult::RuntimeError);
}
