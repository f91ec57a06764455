//! JSON program documents
//!
//! The document mirrors the in-memory containers one to one: functions,
//! basic blocks, globals, and data blobs are arrays so declaration order
//! survives a round trip. Instructions serialize as tagged objects keyed by
//! `opcode`. Data blob bytes are hex strings.
//!
//! Loading rebuilds the program through the builder API, so duplicate names,
//! appends past a terminator, and unresolved entries fail with the same
//! errors the builder raises.

use crate::basic_block::BasicBlock;
use crate::function::Function;
use crate::instruction::Instruction;
use crate::program::Program;
use crate::serialize::SerializeError;
use log::debug;
use serde::{Deserialize, Serialize};
use slasm_common::VERSION;

#[derive(Serialize, Deserialize)]
struct ProgramDoc {
    slasm_version: String,
    target: String,
    entry: String,
    globals: Vec<String>,
    data: Vec<DataDoc>,
    functions: Vec<FunctionDoc>,
}

#[derive(Serialize, Deserialize)]
struct DataDoc {
    label: String,
    bytes: String,
}

#[derive(Serialize, Deserialize)]
struct FunctionDoc {
    name: String,
    params: Vec<String>,
    locals: Vec<String>,
    returns_value: bool,
    entry: String,
    basic_blocks: Vec<BlockDoc>,
}

#[derive(Serialize, Deserialize)]
struct BlockDoc {
    label: String,
    instructions: Vec<Instruction>,
}

/// Render a finished program as a pretty-printed JSON document. The program
/// and every function must have a set entry.
pub fn dump_program(program: &Program) -> Result<String, SerializeError> {
    let doc = ProgramDoc {
        slasm_version: VERSION.to_string(),
        target: program.target().to_string(),
        entry: program.entry()?.to_string(),
        globals: program.globals().to_vec(),
        data: program
            .data()
            .map(|(label, bytes)| DataDoc {
                label: label.to_string(),
                bytes: hex::encode(bytes),
            })
            .collect(),
        functions: program
            .functions()
            .map(dump_function)
            .collect::<Result<_, _>>()?,
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}

fn dump_function(function: &Function) -> Result<FunctionDoc, SerializeError> {
    Ok(FunctionDoc {
        name: function.name().to_string(),
        params: function.params().to_vec(),
        locals: function.locals().to_vec(),
        returns_value: function.returns_value(),
        entry: function.entry()?.to_string(),
        basic_blocks: function
            .basic_blocks()
            .map(|(label, bb)| BlockDoc {
                label: label.to_string(),
                instructions: bb.iter().cloned().collect(),
            })
            .collect(),
    })
}

/// Parse a JSON document and rebuild the program it describes.
pub fn load_program(text: &str) -> Result<Program, SerializeError> {
    let doc: ProgramDoc = serde_json::from_str(text)?;

    if doc.slasm_version != VERSION {
        return Err(SerializeError::VersionMismatch {
            expected: VERSION.to_string(),
            found: doc.slasm_version,
        });
    }

    debug!(
        "loading program for target '{}' ({} function(s))",
        doc.target,
        doc.functions.len()
    );

    let mut program = Program::new(doc.target);

    for name in doc.globals {
        program.add_global(name)?;
    }

    for data in doc.data {
        let bytes = hex::decode(&data.bytes).map_err(|source| SerializeError::DataBlob {
            label: data.label.clone(),
            source,
        })?;
        program.add_data(data.label, bytes)?;
    }

    for func_doc in doc.functions {
        program.add_function(load_function(func_doc)?)?;
    }

    program.set_entry(doc.entry)?;

    Ok(program)
}

fn load_function(doc: FunctionDoc) -> Result<Function, SerializeError> {
    let mut function = Function::new(doc.name, doc.params, doc.locals, doc.returns_value)?;

    for block in doc.basic_blocks {
        let mut bb = BasicBlock::new();
        for instr in block.instructions {
            bb.append(instr)?;
        }
        function.add_basic_block(block.label, bb)?;
    }

    function.set_entry(doc.entry)?;

    Ok(function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slasm_common::{DataType, Word};

    fn sample_program() -> Program {
        let mut entry = BasicBlock::new();
        entry
            .append(Instruction::LoadConst {
                value: Word::from_i64(41),
            })
            .unwrap();
        entry
            .append(Instruction::LoadConst {
                value: Word::from_i64(1),
            })
            .unwrap();
        entry
            .append(Instruction::Add {
                data_type: DataType::I64,
            })
            .unwrap();
        entry.append(Instruction::Ret).unwrap();

        let mut func = Function::new("main", vec![], vec!["tmp".to_string()], true).unwrap();
        func.add_basic_block("entry", entry).unwrap();
        func.set_entry("entry").unwrap();

        let mut program = Program::new("x86-64-linux-nasm");
        program.add_global("counter").unwrap();
        program.add_data("msg", b"hi".to_vec()).unwrap();
        program.add_function(func).unwrap();
        program.set_entry("main").unwrap();
        program
    }

    #[test]
    fn test_round_trip_preserves_program() {
        let program = sample_program();
        let text = dump_program(&program).unwrap();
        let reloaded = load_program(&text).unwrap();

        assert_eq!(reloaded.target(), program.target());
        assert_eq!(reloaded.entry().unwrap(), "main");
        assert_eq!(reloaded.globals(), program.globals());
        assert_eq!(
            reloaded.data().collect::<Vec<_>>(),
            program.data().collect::<Vec<_>>()
        );

        let original = program.get_function("main").unwrap();
        let loaded = reloaded.get_function("main").unwrap();
        assert_eq!(loaded.locals(), original.locals());
        assert_eq!(loaded.returns_value(), original.returns_value());
        assert_eq!(
            loaded.basic_blocks().collect::<Vec<_>>(),
            original.basic_blocks().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_document_shape() {
        let text = dump_program(&sample_program()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["slasm_version"], VERSION);
        assert_eq!(value["entry"], "main");
        assert_eq!(value["data"][0]["bytes"], "6869000000000000");
        assert_eq!(
            value["functions"][0]["basic_blocks"][0]["instructions"][0],
            serde_json::json!({ "opcode": "LOAD_CONST", "value": "0x0000000000000029" })
        );
        assert_eq!(
            value["functions"][0]["basic_blocks"][0]["instructions"][2]["opcode"],
            "ADD"
        );
    }

    #[test]
    fn test_round_trip_covers_every_instruction() {
        use crate::serialize::test_support::{every_instruction, every_instruction_program};

        let program = every_instruction_program();
        let reloaded = load_program(&dump_program(&program).unwrap()).unwrap();

        let original = program.get_function("main").unwrap();
        let loaded = reloaded.get_function("main").unwrap();
        assert_eq!(
            loaded.basic_blocks().collect::<Vec<_>>(),
            original.basic_blocks().collect::<Vec<_>>()
        );

        // the rebuilt blocks hold the whole vocabulary, in order
        let flattened: Vec<_> = loaded
            .basic_blocks()
            .flat_map(|(_, bb)| bb.iter().cloned())
            .collect();
        assert_eq!(flattened, every_instruction());
    }

    #[test]
    fn test_load_rejects_version_mismatch() {
        let mut value: serde_json::Value =
            serde_json::from_str(&dump_program(&sample_program()).unwrap()).unwrap();
        value["slasm_version"] = "9.9.9".into();

        let err = load_program(&value.to_string()).unwrap_err();
        assert!(matches!(err, SerializeError::VersionMismatch { .. }));
    }

    #[test]
    fn test_load_rejects_instructions_past_terminator() {
        let mut value: serde_json::Value =
            serde_json::from_str(&dump_program(&sample_program()).unwrap()).unwrap();
        value["functions"][0]["basic_blocks"][0]["instructions"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({ "opcode": "NOOP" }));

        let err = load_program(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            SerializeError::Structural(slasm_common::StructuralError::AppendToTerminated)
        ));
    }
}
