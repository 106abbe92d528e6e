//! End-to-end tests: source text in, IR essentials out.

use mica_base::ErrorKind;
use mica_compile::{compile_to_ir, CompileOptions};

fn compile(source: &str) -> String {
    compile_to_ir(source, &CompileOptions::default()).expect("compilation should succeed")
}

fn compile_folded(source: &str) -> String {
    let options = CompileOptions { fold_constants: true, ..Default::default() };
    compile_to_ir(source, &options).expect("compilation should succeed")
}

fn compile_err(source: &str) -> mica_base::CompileError {
    compile_to_ir(source, &CompileOptions::default()).expect_err("compilation should fail")
}

#[test]
fn minimal_main_produces_exported_function() {
    let ir = compile("fn main() -> i32 { return 0; }");
    assert!(ir.contains("export function w $main() {"));
    assert!(ir.contains("@start"));
    assert!(ir.contains("%r1 =w copy 0"));
    assert!(ir.contains("\tret %r1"));
    assert!(ir.trim_end().ends_with('}'));
}

#[test]
fn add_binds_parameters_and_emits_add() {
    let ir = compile(
        "fn add(a: i32, b: i32) -> i32 { return a + b; }\n\
         fn main() -> i32 { return add(1, 2); }",
    );
    assert!(ir.contains("function w $add(w %r1, w %r2) {"));
    assert!(ir.contains("%r3 =w add %r1, %r2"));
    assert!(ir.contains("\tret %r3"));
}

#[test]
fn string_literal_stores_every_byte_plus_nul() {
    let ir = compile("fn f() -> i32 { let s: char[6] = \"hello\"; return 0; }\nfn main() -> i32 { return 0; }");
    assert!(ir.contains("alloc4 6"));
    let stores = ir.matches("storeb").count();
    assert_eq!(stores, 6, "five bytes of 'hello' plus the NUL");
    // The final byte stored is the terminator.
    assert!(ir.contains("storeb 0, "));
}

#[test]
fn folded_if_condition_becomes_a_literal() {
    let source =
        "fn f() -> bool { if 1 == 1 { return true; } else { return false; } }\n\
         fn main() -> i32 { return 0; }";

    let folded = compile_folded(source);
    assert!(!folded.contains("ceqw"), "condition should fold away");
    assert!(folded.contains("jnz"));

    let unfolded = compile(source);
    assert!(unfolded.contains("ceqw"));
    assert!(unfolded.contains("jnz"));
}

#[test]
fn struct_initializer_lays_out_fields_in_order() {
    let ir = compile(
        "struct P { x: i32, y: i32 }\n\
         fn f() -> i32 { let p: P = P { x: 3, y: 4 }; return p.y; }\n\
         fn main() -> i32 { return 0; }",
    );
    assert!(ir.contains("type :P = { w, w, }"));
    assert!(ir.contains("alloc8 8"));
    assert_eq!(ir.matches("storew").count(), 2);
    // Offsets 0 and 4 for the two stores, offset 4 again for the read.
    assert!(ir.contains(", 0\n"));
    assert!(ir.contains(", 4\n"));
    assert!(ir.contains("loadsw"));
}

#[test]
fn variadic_call_promotes_f32_and_marks_the_boundary() {
    let ir = compile(
        "extern fn printf(fmt: char*, ...) -> i32;\n\
         fn f() -> i32 { return printf(\"%f\\n\", cast<f32>(1.0)); }\n\
         fn main() -> i32 { return 0; }",
    );
    assert!(ir.contains("=d exts"), "f32 argument promoted to f64");
    assert!(ir.contains("call $printf(l "));
    assert!(ir.contains(", ..., d "), "the ... sits at the fixed/variadic boundary");
}

#[test]
fn variadic_call_with_no_extra_arguments_still_marks_the_boundary() {
    let ir = compile(
        "extern fn printf(fmt: char*, ...) -> i32;\n\
         fn main() -> i32 { printf(\"hi\\n\"); return 0; }",
    );
    assert!(ir.contains(", ...)"));
}

#[test]
fn array_initializer_emits_one_store_per_element() {
    let ir = compile(
        "fn f() -> i32 { let a: i32[3] = [1, 2, 3]; return a[0]; }\n\
         fn main() -> i32 { return 0; }",
    );
    assert!(ir.contains("alloc4 12"));
    assert_eq!(ir.matches("storew").count(), 3);
    // Indexing scales by the element size and loads the element.
    assert!(ir.contains("extsw"));
    assert!(ir.contains("=l mul 4,"));
    assert!(ir.contains("loadsw"));
}

#[test]
fn byte_sized_elements_skip_the_multiply() {
    let ir = compile(
        "fn f() -> char { let s: char[3] = \"ab\"; return s[0]; }\n\
         fn main() -> i32 { return 0; }",
    );
    assert!(!ir.contains("=l mul"), "element size 1 needs no scaling");
    assert!(ir.contains("loadub"));
}

#[test]
fn while_loop_branches_between_labels() {
    let ir = compile(
        "fn main() -> i32 {\n\
             let i: i32 = 0;\n\
             while i < 3 { i = i + 1; }\n\
             return i;\n\
         }",
    );
    assert!(ir.contains("jmp @l1"));
    assert!(ir.contains("@l1\n"));
    assert!(ir.contains("jnz %r"));
    assert!(ir.contains("csltw"));
    // Body jumps back to the condition label.
    assert!(ir.matches("jmp @l1").count() >= 2);
}

#[test]
fn unsigned_comparisons_pick_unsigned_opcodes() {
    let ir = compile(
        "fn main() -> i32 {\n\
             let a: u8 = cast<u8>(1);\n\
             let b: u8 = cast<u8>(2);\n\
             if a < b { return 1; }\n\
             return 0;\n\
         }",
    );
    assert!(ir.contains("cultw"), "u8 comparison must be unsigned");
    assert!(ir.contains("extub"), "sub-word operands are widened first");
}

#[test]
fn break_and_continue_jump_through_the_loop_labels() {
    let ir = compile(
        "fn main() -> i32 {\n\
             while true { break; }\n\
             for i in 0..10 { continue; }\n\
             return 0;\n\
         }",
    );
    // break jumps to the while end label, continue to the for step label.
    assert!(ir.matches("jmp").count() >= 4);
    assert!(ir.contains("csltw"), "for loop bound check");
}

#[test]
fn assignment_to_member_stores_through_the_offset() {
    let ir = compile(
        "struct P { x: i32, y: i32 }\n\
         fn main() -> i32 { let p: P = P { x: 1, y: 2 }; p.y = 9; return p.y; }",
    );
    // Three storew: two from the initializer, one from the assignment.
    assert_eq!(ir.matches("storew").count(), 3);
}

#[test]
fn i64_cast_widens_with_extsw() {
    let ir = compile("fn main() -> i32 { let a: i64 = cast<i64>(1); return 0; }");
    assert!(ir.contains("=l extsw"));
}

#[test]
fn comparisons_fold_only_when_requested() {
    let source = "fn main() -> i32 { if 2 != 3 { return 1; } return 0; }";
    assert!(compile(source).contains("cnew"));
    assert!(!compile_folded(source).contains("cnew"));
}

#[test]
fn every_use_of_a_binding_lowers_to_the_same_temporary() {
    let ir = compile(
        "fn f(x: i32) -> i32 { return x + x * x; }\n\
         fn main() -> i32 { return 0; }",
    );
    // x binds to %r1; every read reuses it.
    assert!(ir.contains("function w $f(w %r1) {"));
    assert!(ir.contains("mul %r1, %r1"));
    assert!(ir.contains("add %r1, %r"));
}

#[test]
fn one_function_header_per_declared_function() {
    let ir = compile(
        "fn a() -> i32 { return 1; }\n\
         fn b() -> i32 { return a(); }\n\
         fn main() -> i32 { return b(); }",
    );
    assert_eq!(ir.matches("function w $a(").count(), 1);
    assert_eq!(ir.matches("function w $b(").count(), 1);
    assert_eq!(ir.matches("function w $main(").count(), 1);
}

#[test]
fn if_lowers_to_three_labels_and_a_branch() {
    let ir = compile(
        "fn main() -> i32 { let x: i32 = 1; if x == 1 { return 1; } else { return 2; } }",
    );
    assert!(ir.contains("ceqw"));
    assert!(ir.contains("jnz %r"));
    // then, else and out labels all appear as block starts.
    assert!(ir.contains("@l1\n"));
    assert!(ir.contains("@l2\n"));
    assert!(ir.contains("@l3\n"));
    assert!(ir.contains("jmp @l3"));
}

#[test]
fn equal_typed_operands_share_an_abi_base() {
    let ir = compile(
        "fn main() -> i32 { let a: i64 = cast<i64>(1); let b: i64 = cast<i64>(2); let c: i64 = a + b; return 0; }",
    );
    // The i64 addition is typed l, not w.
    assert!(ir.contains("=l add"));
}

#[test]
fn struct_typed_arguments_pass_by_aggregate_name() {
    let ir = compile(
        "struct P { x: i32, y: i32 }\n\
         fn use_point(p: P) -> i32 { return p.x; }\n\
         fn main() -> i32 { let p: P = P { x: 1, y: 2 }; return use_point(p); }",
    );
    assert!(ir.contains("function w $use_point(:P %r1) {"));
    assert!(ir.contains("call $use_point(:P %r"));
}

#[test]
fn bundled_demo_programs_compile() {
    for (name, source) in [
        ("hello", include_str!("../../../demos/hello.mica")),
        ("point", include_str!("../../../demos/point.mica")),
        ("loops", include_str!("../../../demos/loops.mica")),
    ] {
        let ir = compile_to_ir(source, &CompileOptions::default())
            .unwrap_or_else(|e| panic!("demo '{}' failed: {}", name, e));
        assert!(ir.contains("export function w $main()"), "demo '{}'", name);
    }
}

// ---------------------------------------------------------------------
// Negative scenarios
// ---------------------------------------------------------------------

#[test]
fn redeclaring_a_variable_is_an_error() {
    let err = compile_err("fn main() -> i32 { let x: i32 = 1; let x: i32 = 2; return 0; }");
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("already defined"));
}

#[test]
fn wrong_argument_count_is_an_error() {
    let err = compile_err(
        "fn add(a: i32, b: i32) -> i32 { return a + b; }\n\
         fn main() -> i32 { return add(1, 2, 3); }",
    );
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("takes 2 arguments but 3 were given"));
}

#[test]
fn assigning_i32_to_f32_is_an_error() {
    let err = compile_err("fn main() -> i32 { let f: f32 = 1; return 0; }");
    assert_eq!(err.kind, ErrorKind::Semantic);
}

#[test]
fn indexing_a_non_array_is_an_error() {
    let err = compile_err("fn main() -> i32 { let x: i32 = 5; return x[1]; }");
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("cannot index"));
}

#[test]
fn missing_member_is_an_error() {
    let err = compile_err(
        "struct P { x: i32 }\n\
         fn main() -> i32 { let p: P = P { x: 1 }; return p.nope; }",
    );
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("no member called 'nope'"));
}

#[test]
fn main_returning_f32_is_an_error() {
    let err = compile_err("fn main() -> f32 { return 1.0; }");
    assert_eq!(err.kind, ErrorKind::Semantic);
    assert!(err.message.contains("can only return 'i32'"));
}

#[test]
fn every_error_carries_a_position() {
    let err = compile_err("fn main() -> i32 {\n    return y;\n}");
    assert_eq!(err.pos.line, 2);
    assert!(err.pos.column > 1);
}
