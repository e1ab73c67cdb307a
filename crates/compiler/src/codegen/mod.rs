//! C code generation.
//!
//! Translates a MIR module into a single C11 translation unit that links
//! against the prebuilt `omni_rt` runtime library.
//!
//! # Key Concepts
//!
//! ## Hoisted declarations
//!
//! Every non-parameter SSA value gets one C variable declared at the top
//! of its function, so forward references across `goto`s work without
//! scoping games. String constants initialize at their declaration;
//! primitive stack arrays are declared with their initializer at the
//! instruction site.
//!
//! ## Ownership tracking
//!
//! Heap strings (from `omni_strcat`, `omni_read_line`, string-returning
//! calls, string awaits) and promises are tracked per function and freed
//! at every return site — except the returned value itself, which the
//! caller owns. Conversion temporaries created while stringifying print
//! arguments are freed after the tracked strings, in reverse creation
//! order. All set iteration is over sorted sequences so output is
//! byte-stable.
//!
//! ## Loop induction
//!
//! `phi` instructions and all-zero int constants mark loop-mutable
//! values. Arithmetic whose left operand is such a value updates the
//! slot in place (`v = v + 1`) and aliases its result to the slot, which
//! is how SSA loop counters become plain C variables.
//!
//! ## Failure semantics
//!
//! Recoverable problems (unknown array length, uninferable field type,
//! unsupported map combination, unknown source type) accumulate so one
//! run reports as many as possible. Unsupported ops/terminators and
//! every closure op are hard errors that stop generation.
//!
//! # Module Structure
//!
//! - `state.rs`: generator state and per-function reset
//! - `error.rs`: error types
//! - `types.rs`: source-type to C-type mapping
//! - `runtime.rs`: the intrinsic name table
//! - `program.rs`: module/function emission protocol and the trampoline
//! - `instructions.rs`: the per-op dispatch table
//! - `calls.rs`: call emission and its special cases
//! - `terminators.rs`: ret/jmp/br/cbr

mod calls;
mod error;
mod instructions;
mod program;
mod runtime;
mod state;
mod terminators;
mod types;

pub use error::CodegenError;
pub use runtime::{intrinsic, is_intrinsic, Intrinsic, RetKind, INTRINSICS};
pub use state::Codegen;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::{
        BasicBlock, Inst, MirFunction, MirModule, MirParam, Operand, Terminator, ValueId,
    };

    fn module(functions: Vec<MirFunction>) -> MirModule {
        MirModule { functions }
    }

    fn func(
        name: &str,
        return_type: &str,
        params: Vec<MirParam>,
        blocks: Vec<BasicBlock>,
    ) -> MirFunction {
        MirFunction {
            name: name.to_string(),
            return_type: return_type.to_string(),
            params,
            blocks,
        }
    }

    fn block(name: &str, insts: Vec<Inst>, terminator: Terminator) -> BasicBlock {
        BasicBlock {
            name: name.to_string(),
            insts,
            terminator,
        }
    }

    #[test]
    fn test_hex_constant_and_arithmetic() {
        let mir = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block(
                "entry",
                vec![
                    Inst::new(
                        ValueId(0),
                        "const",
                        "int",
                        vec![Operand::literal("0xFF").with_ty("hex")],
                    ),
                    Inst::new(
                        ValueId(1),
                        "add",
                        "int",
                        vec![Operand::value(ValueId(0)), Operand::literal("1").with_ty("int")],
                    ),
                ],
                Terminator::ret(Some(ValueId(1))),
            )],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(c.contains("int32_t omni_main(void)"), "{}", c);
        assert!(c.contains("v0 = 255;"), "{}", c);
        assert!(c.contains("v1 = v0 + 1;"), "{}", c);
        assert!(c.contains("return v1;"), "{}", c);
        assert!(c.contains("OmniLang program result: %d"), "{}", c);
    }

    #[test]
    fn test_strcat_tracks_cleanup() {
        let mir = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block(
                "entry",
                vec![Inst::new(
                    ValueId(0),
                    "strcat",
                    "string",
                    vec![
                        Operand::literal("\"a\"").with_ty("string"),
                        Operand::literal("\"b\"").with_ty("string"),
                    ],
                )],
                Terminator::new("ret", vec![Operand::literal("0").with_ty("int")]),
            )],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(c.contains("v0 = omni_strcat(\"a\", \"b\");"), "{}", c);
        let free_pos = c
            .find("if (v0 != NULL) { free((void*)v0); v0 = NULL; }")
            .expect("epilogue frees the string");
        let ret_pos = c.find("return 0;").unwrap();
        assert!(free_pos < ret_pos, "{}", c);
    }

    #[test]
    fn test_len_with_known_length() {
        let mir = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block(
                "entry",
                vec![
                    Inst::new(
                        ValueId(0),
                        "array.init",
                        "array<int>",
                        vec![
                            Operand::literal("10").with_ty("int"),
                            Operand::literal("20").with_ty("int"),
                            Operand::literal("30").with_ty("int"),
                        ],
                    ),
                    Inst::new(
                        ValueId(1),
                        "call.int",
                        "int",
                        vec![Operand::literal("len"), Operand::value(ValueId(0))],
                    ),
                ],
                Terminator::ret(Some(ValueId(1))),
            )],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(c.contains("int32_t v0[] = {10, 20, 30};"), "{}", c);
        assert!(
            c.contains("v1 = omni_len((void*)v0, sizeof(int32_t), 3);"),
            "{}",
            c
        );
        assert!(c.contains("return v1;"), "{}", c);
    }

    #[test]
    fn test_async_wraps_and_await_unwraps() {
        let mir = module(vec![
            func(
                "g",
                "Promise<int>",
                vec![],
                vec![block(
                    "entry",
                    vec![],
                    Terminator::new("ret", vec![Operand::literal("7").with_ty("int")]),
                )],
            ),
            func(
                "main",
                "int",
                vec![],
                vec![block(
                    "entry",
                    vec![
                        Inst::new(
                            ValueId(0),
                            "call",
                            "Promise<int>",
                            vec![Operand::literal("g")],
                        ),
                        Inst::new(ValueId(1), "await", "int", vec![Operand::value(ValueId(0))]),
                    ],
                    Terminator::ret(Some(ValueId(1))),
                )],
            ),
        ]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(c.contains("omni_promise_t* g(void)"), "{}", c);
        assert!(c.contains("return omni_promise_create_int(7);"), "{}", c);
        assert!(c.contains("v0 = g();"), "{}", c);
        assert!(c.contains("v1 = omni_await_int(v0);"), "{}", c);
        assert!(c.contains("omni_promise_free(v0);"), "{}", c);
    }

    #[test]
    fn test_struct_element_loop_and_member_access() {
        let mir = module(vec![func(
            "show",
            "void",
            vec![MirParam {
                id: ValueId(0),
                name: "points".to_string(),
                ty: "array<Point>".to_string(),
            }],
            vec![
                block(
                    "entry",
                    vec![Inst::new(
                        ValueId(1),
                        "const",
                        "int",
                        vec![Operand::literal("0").with_ty("int")],
                    )],
                    Terminator::jmp("loop.cond0"),
                ),
                block(
                    "loop.cond0",
                    vec![Inst::new(
                        ValueId(2),
                        "cmp.lt",
                        "bool",
                        vec![Operand::value(ValueId(1)), Operand::literal("3").with_ty("int")],
                    )],
                    Terminator::cbr(ValueId(2), "loop.body0", "loop.end0"),
                ),
                block(
                    "loop.body0",
                    vec![
                        Inst::new(
                            ValueId(3),
                            "phi",
                            "Point",
                            vec![Operand::value(ValueId(0)), Operand::value(ValueId(1))],
                        ),
                        Inst::new(
                            ValueId(4),
                            "member",
                            "int",
                            vec![Operand::value(ValueId(3)), Operand::literal("x")],
                        ),
                        Inst::new(
                            ValueId(5),
                            "add",
                            "int",
                            vec![Operand::value(ValueId(1)), Operand::literal("1").with_ty("int")],
                        ),
                    ],
                    Terminator::jmp("loop.cond0"),
                ),
                block("loop.end0", vec![], Terminator::ret(None)),
            ],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        // The struct element is hoisted as a struct pointer.
        assert!(c.contains("omni_struct_t* v3;"), "{}", c);
        assert!(
            c.contains("v4 = omni_struct_get_int_field(v3, \"x\");"),
            "{}",
            c
        );
        // Loop induction updates the slot in place.
        assert!(c.contains("v1 = v1 + 1;"), "{}", c);
        assert!(c.contains("loop_cond0:;"), "{}", c);
        assert!(c.contains("if (v2) goto loop_body0; else goto loop_end0;"), "{}", c);
    }

    #[test]
    fn test_closure_op_is_a_hard_error() {
        let mir = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block(
                "entry",
                vec![Inst::new(ValueId(0), "closure.create", "<infer>", vec![])],
                Terminator::new("ret", vec![Operand::literal("0")]),
            )],
        )]);
        let err = Codegen::new().generate(&mir).unwrap_err();
        assert!(err.to_string().contains("closures are not supported"));
    }

    #[test]
    fn test_unknown_array_length_warns_but_emits() {
        let mir = module(vec![func(
            "first",
            "int",
            vec![MirParam {
                id: ValueId(0),
                name: "xs".to_string(),
                ty: "array<int>".to_string(),
            }],
            vec![block(
                "entry",
                vec![Inst::new(
                    ValueId(1),
                    "index",
                    "int",
                    vec![Operand::value(ValueId(0)), Operand::literal("0").with_ty("int")],
                )],
                Terminator::ret(Some(ValueId(1))),
            )],
        )]);
        let (c, diagnostics) = Codegen::new().generate_with_diagnostics(&mir).unwrap();
        assert!(diagnostics.iter().any(|d| d.contains("array length not known")));
        assert!(c.contains("v1 = xs[0];"), "{}", c);
        assert!(c.contains("/* warning: array length not known */"), "{}", c);
    }

    #[test]
    fn test_unsupported_op_and_terminator_are_hard_errors() {
        let bad_op = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block(
                "entry",
                vec![Inst::new(ValueId(0), "frobnicate", "int", vec![])],
                Terminator::new("ret", vec![Operand::literal("0")]),
            )],
        )]);
        let err = Codegen::new().generate(&bad_op).unwrap_err();
        assert!(err.to_string().contains("unsupported MIR op 'frobnicate'"));

        let bad_term = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block("entry", vec![], Terminator::new("switch", vec![]))],
        )]);
        let err = Codegen::new().generate(&bad_term).unwrap_err();
        assert!(err.to_string().contains("unsupported MIR terminator 'switch'"));
    }

    #[test]
    fn test_intrinsic_bodies_are_skipped() {
        let mir = module(vec![
            func(
                "read_line",
                "string",
                vec![],
                vec![block(
                    "entry",
                    vec![],
                    Terminator::new("ret", vec![Operand::literal("\"\"").with_ty("string")]),
                )],
            ),
            func(
                "main",
                "int",
                vec![],
                vec![block(
                    "entry",
                    vec![],
                    Terminator::new("ret", vec![Operand::literal("0").with_ty("int")]),
                )],
            ),
        ]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(!c.contains("read_line(void)"), "{}", c);
    }

    #[test]
    fn test_string_comparison_uses_runtime() {
        let mir = module(vec![func(
            "eq",
            "bool",
            vec![
                MirParam {
                    id: ValueId(0),
                    name: "a".to_string(),
                    ty: "string".to_string(),
                },
                MirParam {
                    id: ValueId(1),
                    name: "b".to_string(),
                    ty: "string".to_string(),
                },
            ],
            vec![block(
                "entry",
                vec![Inst::new(
                    ValueId(2),
                    "cmp.lt",
                    "bool",
                    vec![Operand::value(ValueId(0)), Operand::value(ValueId(1))],
                )],
                Terminator::ret(Some(ValueId(2))),
            )],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(c.contains("v2 = omni_string_compare(a, b) < 0;"), "{}", c);
    }

    #[test]
    fn test_print_int_converts_through_tracked_temp() {
        let mir = module(vec![func(
            "main",
            "void",
            vec![],
            vec![block(
                "entry",
                vec![Inst::new(
                    ValueId::INVALID,
                    "call.void",
                    "void",
                    vec![Operand::literal("println"), Operand::literal("42").with_ty("int")],
                )],
                Terminator::ret(None),
            )],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(
            c.contains("const char* tmp0 = omni_int_to_string(42);"),
            "{}",
            c
        );
        assert!(c.contains("omni_println_string(tmp0);"), "{}", c);
        assert!(
            c.contains("if (tmp0 != NULL) { free((void*)tmp0); tmp0 = NULL; }"),
            "{}",
            c
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let mir = module(vec![func(
            "main",
            "int",
            vec![],
            vec![block(
                "entry",
                vec![
                    Inst::new(
                        ValueId(0),
                        "strcat",
                        "string",
                        vec![
                            Operand::literal("\"x\"").with_ty("string"),
                            Operand::literal("\"y\"").with_ty("string"),
                        ],
                    ),
                    Inst::new(
                        ValueId(1),
                        "strcat",
                        "string",
                        vec![Operand::value(ValueId(0)), Operand::literal("\"z\"").with_ty("string")],
                    ),
                ],
                Terminator::new("ret", vec![Operand::literal("0").with_ty("int")]),
            )],
        )]);
        let first = Codegen::new().generate(&mir).unwrap();
        let second = Codegen::new().generate(&mir).unwrap();
        assert_eq!(first, second);
        // Cleanup order: tracked strings in reverse ValueID order.
        let v1_free = first.find("free((void*)v1)").unwrap();
        let v0_free = first.find("free((void*)v0)").unwrap();
        assert!(v1_free < v0_free, "{}", first);
    }

    #[test]
    fn test_returned_string_is_not_freed() {
        let mir = module(vec![func(
            "greet",
            "string",
            vec![],
            vec![block(
                "entry",
                vec![Inst::new(
                    ValueId(0),
                    "strcat",
                    "string",
                    vec![
                        Operand::literal("\"hi \"").with_ty("string"),
                        Operand::literal("\"there\"").with_ty("string"),
                    ],
                )],
                Terminator::ret(Some(ValueId(0))),
            )],
        )]);
        let c = Codegen::new().generate(&mir).unwrap();
        assert!(!c.contains("free((void*)v0)"), "{}", c);
        assert!(c.contains("return v0;"), "{}", c);
    }
}
