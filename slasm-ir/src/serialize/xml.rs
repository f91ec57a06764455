//! XML program rendering
//!
//! Emit-only: an inspection format for diffing and tooling, never read back.
//! One element per entity, instruction operands as attributes, data blob
//! bytes as hex text content.

use crate::function::Function;
use crate::instruction::Instruction;
use crate::program::Program;
use crate::serialize::SerializeError;
use slasm_common::{Endianness, VERSION};
use std::io::Write;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

/// Render a finished program as an indented XML document. The program and
/// every function must have a set entry.
pub fn dump_program(program: &Program) -> Result<String, SerializeError> {
    let mut buffer = Vec::new();
    let mut writer = EmitterConfig::new()
        .perform_indent(true)
        .create_writer(&mut buffer);

    writer.write(
        XmlEvent::start_element("program")
            .attr("slasm_version", VERSION)
            .attr("target", program.target())
            .attr("entry", program.entry()?),
    )?;

    for name in program.globals() {
        writer.write(XmlEvent::start_element("global").attr("name", name))?;
        writer.write(XmlEvent::end_element())?;
    }

    for (label, bytes) in program.data() {
        writer.write(XmlEvent::start_element("data").attr("label", label))?;
        writer.write(XmlEvent::characters(&hex::encode(bytes)))?;
        writer.write(XmlEvent::end_element())?;
    }

    for function in program.functions() {
        write_function(&mut writer, function)?;
    }

    writer.write(XmlEvent::end_element())?;

    // EventWriter only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_function<W: Write>(
    writer: &mut EventWriter<W>,
    function: &Function,
) -> Result<(), SerializeError> {
    let returns_value = function.returns_value().to_string();
    writer.write(
        XmlEvent::start_element("function")
            .attr("name", function.name())
            .attr("returns_value", &returns_value)
            .attr("entry", function.entry()?),
    )?;

    for param in function.params() {
        writer.write(XmlEvent::start_element("param").attr("name", param))?;
        writer.write(XmlEvent::end_element())?;
    }

    for local in function.locals() {
        writer.write(XmlEvent::start_element("local").attr("name", local))?;
        writer.write(XmlEvent::end_element())?;
    }

    for (label, bb) in function.basic_blocks() {
        writer.write(XmlEvent::start_element("basic_block").attr("label", label))?;
        for instr in bb {
            write_instruction(writer, instr)?;
        }
        writer.write(XmlEvent::end_element())?;
    }

    writer.write(XmlEvent::end_element())?;
    Ok(())
}

fn write_instruction<W: Write>(
    writer: &mut EventWriter<W>,
    instr: &Instruction,
) -> Result<(), SerializeError> {
    let attrs: Vec<(&str, String)> = match instr {
        Instruction::Noop
        | Instruction::Pop
        | Instruction::Or
        | Instruction::And
        | Instruction::Xor
        | Instruction::Not
        | Instruction::IndirectCall
        | Instruction::Ret => vec![],
        Instruction::LoadConst { value } => {
            vec![("value", value.as_hex(Endianness::Little))]
        }
        Instruction::LoadLocal { idx }
        | Instruction::LoadParam { idx }
        | Instruction::StoreLocal { idx }
        | Instruction::StoreParam { idx } => vec![("idx", idx.to_string())],
        Instruction::LoadGlobal { name }
        | Instruction::StoreGlobal { name }
        | Instruction::LoadFuncAddr { name } => vec![("name", name.clone())],
        Instruction::LoadMem { offset } | Instruction::StoreMem { offset } => {
            vec![("offset", offset.to_string())]
        }
        Instruction::Add { data_type }
        | Instruction::Sub { data_type }
        | Instruction::Mul { data_type }
        | Instruction::Div { data_type }
        | Instruction::Mod { data_type }
        | Instruction::Inc { data_type }
        | Instruction::Dec { data_type }
        | Instruction::Eq { data_type }
        | Instruction::Neq { data_type }
        | Instruction::Gt { data_type }
        | Instruction::Lt { data_type }
        | Instruction::GtEq { data_type }
        | Instruction::LtEq { data_type }
        | Instruction::Neg { data_type } => vec![("type", data_type.to_string())],
        Instruction::Shl { amount } | Instruction::Shr { amount } => {
            vec![("amount", amount.to_string())]
        }
        Instruction::Convert { from, to } => {
            vec![("from", from.to_string()), ("to", to.to_string())]
        }
        Instruction::Jump { target } => vec![("target", target.clone())],
        Instruction::CondJump {
            true_target,
            false_target,
        } => vec![
            ("true_target", true_target.clone()),
            ("false_target", false_target.clone()),
        ],
        Instruction::Call { target } => vec![("target", target.clone())],
        Instruction::NativeCall {
            target,
            num_params,
            returns_value,
        } => vec![
            ("target", target.clone()),
            ("num_params", num_params.to_string()),
            ("returns_value", returns_value.to_string()),
        ],
    };

    let mut element = XmlEvent::start_element(instr.opcode());
    for (key, value) in &attrs {
        element = element.attr(*key, value);
    }
    writer.write(element)?;
    writer.write(XmlEvent::end_element())?;

    Ok(())
}
