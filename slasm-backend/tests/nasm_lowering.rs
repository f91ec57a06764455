//! End-to-end NASM emission scenarios

use slasm_backend::abi::FuncDef;
use slasm_backend::nasm;
use slasm_common::{AbiError, DataType, LoweringError, SlasmError, Word};
use slasm_ir::{BasicBlock, Function, Instruction, Program};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn function_of(
    name: &str,
    params: Vec<&str>,
    locals: Vec<&str>,
    returns_value: bool,
    instructions: Vec<Instruction>,
) -> Function {
    let mut bb = BasicBlock::new();
    for instr in instructions {
        bb.append(instr).unwrap();
    }

    let mut func = Function::new(
        name,
        params.into_iter().map(String::from).collect(),
        locals.into_iter().map(String::from).collect(),
        returns_value,
    )
    .unwrap();
    func.add_basic_block("entry", bb).unwrap();
    func.set_entry("entry").unwrap();
    func
}

fn program_of(functions: Vec<Function>, entry: &str) -> Program {
    let mut program = Program::new("x86-64-linux-nasm");
    for func in functions {
        program.add_function(func).unwrap();
    }
    program.set_entry(entry).unwrap();
    program
}

#[test]
fn subtraction_pops_rhs_into_rbx_first() {
    init_logging();

    let program = program_of(
        vec![function_of(
            "main",
            vec![],
            vec![],
            true,
            vec![
                Instruction::LoadConst {
                    value: Word::from_i64(10),
                },
                Instruction::LoadConst {
                    value: Word::from_i64(3),
                },
                Instruction::Sub {
                    data_type: DataType::I64,
                },
                Instruction::Ret,
            ],
        )],
        "main",
    );

    let text = nasm::emit_program(&program, vec![]).unwrap();
    assert!(text.contains("pop rbx\n    pop rax\n    sub rax, rbx\n    push rax"));
}

#[test]
fn module_contains_trampoline_and_sections() {
    let mut program = program_of(
        vec![function_of("start", vec![], vec![], false, vec![Instruction::Ret])],
        "start",
    );
    program.add_global("counter").unwrap();
    program.add_data("greeting", b"hello".to_vec()).unwrap();

    let text = nasm::emit_program(&program, vec![]).unwrap();

    assert!(text.contains("global _main"));
    assert!(text.contains("_main:\n    call start\n    ret"));
    assert!(text.contains("section .data"));
    // padded to the word size
    assert!(text.contains("greeting: db 104, 101, 108, 108, 111, 0, 0, 0"));
    assert!(text.contains("section .bss\ncounter: resb 8"));
}

#[test]
fn control_flow_lowers_to_two_way_jumps() {
    // countdown loop: decrement the local until it reaches zero
    let mut check = BasicBlock::new();
    check.append(Instruction::LoadLocal { idx: 0 }).unwrap();
    check
        .append(Instruction::CondJump {
            true_target: "body".to_string(),
            false_target: "done".to_string(),
        })
        .unwrap();

    let mut body = BasicBlock::new();
    body.append(Instruction::LoadLocal { idx: 0 }).unwrap();
    body.append(Instruction::Dec {
        data_type: DataType::I64,
    })
    .unwrap();
    body.append(Instruction::StoreLocal { idx: 0 }).unwrap();
    body.append(Instruction::Jump {
        target: "check".to_string(),
    })
    .unwrap();

    let mut done = BasicBlock::new();
    done.append(Instruction::LoadLocal { idx: 0 }).unwrap();
    done.append(Instruction::Ret).unwrap();

    let mut func = Function::new("countdown", vec![], vec!["n".to_string()], true).unwrap();
    func.add_basic_block("check", check).unwrap();
    func.add_basic_block("body", body).unwrap();
    func.add_basic_block("done", done).unwrap();
    func.set_entry("check").unwrap();

    let program = program_of(vec![func], "countdown");
    let text = nasm::emit_program(&program, vec![]).unwrap();

    assert!(text.contains(".check:"));
    assert!(text.contains("jnz .body\n    jmp .done"));
    assert!(text.contains("jmp .check"));
    // locals addressed below the frame base
    assert!(text.contains("push qword [rbp-8]"));
    assert!(text.contains("pop qword [rbp-8]"));
}

#[test]
fn params_addressed_above_return_address() {
    let program = program_of(
        vec![function_of(
            "second_param",
            vec!["a", "b"],
            vec![],
            true,
            vec![Instruction::LoadParam { idx: 1 }, Instruction::Ret],
        )],
        "second_param",
    );

    let text = nasm::emit_program(&program, vec![]).unwrap();
    assert!(text.contains("push qword [rbp+24]"));
}

#[test]
fn native_call_cleans_up_caller_arguments() {
    let program = program_of(
        vec![function_of(
            "main",
            vec![],
            vec![],
            true,
            vec![
                Instruction::LoadConst {
                    value: Word::from_i64(1),
                },
                Instruction::LoadConst {
                    value: Word::from_i64(2),
                },
                Instruction::NativeCall {
                    target: "add_ints".to_string(),
                    num_params: 2,
                    returns_value: true,
                },
                Instruction::Ret,
            ],
        )],
        "main",
    );

    let text = nasm::emit_program(
        &program,
        vec![(
            "add_ints".to_string(),
            FuncDef::native(vec!["a".to_string(), "b".to_string()], true),
        )],
    )
    .unwrap();

    assert!(text.contains("extern add_ints"));
    assert!(text.contains("call add_ints"));
    assert!(text.contains("add rsp, 16 ; remove arguments from stack"));
    assert!(text.contains("push rax ; push return value"));
}

#[test]
fn native_call_arity_mismatch_rejected_before_emission() {
    let program = program_of(
        vec![function_of(
            "main",
            vec![],
            vec![],
            false,
            vec![
                Instruction::NativeCall {
                    target: "print".to_string(),
                    num_params: 0,
                    returns_value: false,
                },
                Instruction::Ret,
            ],
        )],
        "main",
    );

    let err = nasm::emit_program(
        &program,
        vec![(
            "print".to_string(),
            FuncDef::native(vec!["value".to_string()], false),
        )],
    )
    .unwrap_err();

    assert!(matches!(
        err,
        SlasmError::Abi(AbiError::ArityMismatch {
            declared: 1,
            actual: 0,
            ..
        })
    ));
}

#[test]
fn float_mod_lowers_to_fused_identity() {
    let program = program_of(
        vec![function_of(
            "main",
            vec![],
            vec![],
            true,
            vec![
                Instruction::LoadConst {
                    value: Word::from_f64(9.5),
                },
                Instruction::LoadConst {
                    value: Word::from_f64(2.5),
                },
                Instruction::Mod {
                    data_type: DataType::F64,
                },
                Instruction::Ret,
            ],
        )],
        "main",
    );

    let text = nasm::emit_program(&program, vec![]).unwrap();
    for mnemonic in ["divsd", "cvttsd2si", "cvtsi2sd", "mulsd", "subsd"] {
        assert!(text.contains(mnemonic), "missing {}", mnemonic);
    }
}

#[test]
fn lowering_gaps_fail_without_output() {
    let program = program_of(
        vec![function_of(
            "main",
            vec![],
            vec![],
            true,
            vec![
                Instruction::LoadConst {
                    value: Word::from_f32(1.0),
                },
                Instruction::Inc {
                    data_type: DataType::F32,
                },
                Instruction::Ret,
            ],
        )],
        "main",
    );

    let err = nasm::emit_program(&program, vec![]).unwrap_err();
    assert!(matches!(
        err,
        SlasmError::Lowering(LoweringError::UnsupportedDataType { .. })
    ));

    let program = program_of(
        vec![function_of(
            "main",
            vec![],
            vec![],
            true,
            vec![
                Instruction::LoadConst {
                    value: Word::from_ui64(u64::MAX),
                },
                Instruction::Convert {
                    from: DataType::UI64,
                    to: DataType::F64,
                },
                Instruction::Ret,
            ],
        )],
        "main",
    );

    let err = nasm::emit_program(&program, vec![]).unwrap_err();
    assert!(matches!(
        err,
        SlasmError::Lowering(LoweringError::UnsupportedConversion { .. })
    ));
}

#[test]
fn emission_is_deterministic() {
    let program = program_of(
        vec![
            function_of(
                "main",
                vec![],
                vec![],
                true,
                vec![
                    Instruction::LoadConst {
                        value: Word::from_i64(5),
                    },
                    Instruction::Call {
                        target: "helper".to_string(),
                    },
                    Instruction::Ret,
                ],
            ),
            function_of(
                "helper",
                vec![],
                vec![],
                true,
                vec![
                    Instruction::LoadConst {
                        value: Word::from_i64(1),
                    },
                    Instruction::Ret,
                ],
            ),
        ],
        "main",
    );

    let first = nasm::emit_program(&program, vec![]).unwrap();
    let second = nasm::emit_program(&program, vec![]).unwrap();
    assert_eq!(first, second);
}
