//! The text IR printer.

use quartz_ir::{MemoryId, Module, Value, ValueId};
use std::collections::HashMap;
use std::io::{self, Write};

/// Sequential id allocation for values and memories as they are printed.
struct Context {
    id_count: u64,
    values: HashMap<ValueId, u64>,
    memories: HashMap<MemoryId, u64>,
}

impl Context {
    fn new() -> Self {
        Self {
            id_count: 0,
            values: HashMap::new(),
            memories: HashMap::new(),
        }
    }

    fn alloc_value(&mut self, value: ValueId) -> u64 {
        let id = self.id_count;
        self.id_count += 1;
        self.values.insert(value, id);
        id
    }

    fn alloc_memory(&mut self, memory: MemoryId) -> u64 {
        let id = self.id_count;
        self.id_count += 1;
        self.memories.insert(memory, id);
        id
    }

    fn value(&self, value: ValueId) -> u64 {
        self.values[&value]
    }

    fn memory(&self, memory: MemoryId) -> u64 {
        self.memories[&memory]
    }

    fn has(&self, value: ValueId) -> bool {
        self.values.contains_key(&value)
    }
}

fn is_printable(chr: char) -> bool {
    chr == ' ' || (chr.is_ascii_graphic() && chr != '\\' && chr != '\"')
}

fn write_string(out: &mut impl Write, string: &str) -> io::Result<()> {
    write!(out, "\"")?;
    for chr in string.chars() {
        if is_printable(chr) {
            write!(out, "{chr}")?;
        } else {
            for byte in chr.to_string().as_bytes() {
                write!(out, "\\x{byte:02x}")?;
            }
        }
    }
    write!(out, "\"")
}

fn write_bits(out: &mut impl Write, bits: &quartz_bits::BitString) -> io::Result<()> {
    let mut text = String::new();
    bits.write_short(&mut text).expect("writing to a String");
    write!(out, "{text}")
}

/// Prints the expression cone of a value, allocating ids bottom-up.
fn print_value(
    module: &Module,
    value: ValueId,
    context: &mut Context,
    out: &mut impl Write,
) -> io::Result<()> {
    if context.has(value) {
        return Ok(());
    }
    match module.value(value) {
        Value::Constant(constant) => {
            write!(out, "{} = constant ", context.alloc_value(value))?;
            write_bits(out, &constant.value)?;
            writeln!(out)
        }
        Value::Op(op) => {
            for &arg in &op.args {
                print_value(module, arg, context, out)?;
            }
            write!(out, "{} = {}", context.alloc_value(value), op.kind)?;
            for &arg in &op.args {
                write!(out, " {}", context.value(arg))?;
            }
            writeln!(out)
        }
        Value::MemoryRead(read) => {
            print_value(module, read.address, context, out)?;
            writeln!(
                out,
                "{} = read {} {}",
                context.alloc_value(value),
                context.memory(read.memory),
                context.value(read.address)
            )
        }
        // The text format has no statement for don't-care values.
        Value::Unknown(_) => panic!("unknown values cannot be represented in text IR"),
        Value::Input(_) | Value::Reg(_) => {
            unreachable!("interface leaves are allocated before expression printing")
        }
    }
}

/// Writes a module as text IR.
///
/// Statement order is deterministic: inputs, registers, memories, then
/// register `next` statements, memory writes, and outputs, with each
/// expression cone printed before its first reference.
pub fn write_module(module: &Module, out: &mut impl Write) -> io::Result<()> {
    let mut context = Context::new();

    for &input in module.inputs() {
        let Value::Input(node) = module.value(input) else {
            continue;
        };
        write!(out, "{} = input ", context.alloc_value(input))?;
        write_string(out, &node.name)?;
        writeln!(out, " {}", node.width)?;
    }

    for &reg in module.regs() {
        let Value::Reg(node) = module.value(reg) else {
            continue;
        };
        write!(out, "{} = reg ", context.alloc_value(reg))?;
        write_bits(out, &node.initial)?;
        write!(out, " ")?;
        write_string(out, &node.name)?;
        writeln!(out)?;
    }

    for (memory, node) in module.memories() {
        write!(
            out,
            "{} = memory {} {} ",
            context.alloc_memory(memory),
            node.width,
            node.size
        )?;
        write_string(out, &node.name)?;
        writeln!(out)?;
    }

    for &reg in module.regs() {
        let Value::Reg(node) = module.value(reg) else {
            continue;
        };
        print_value(module, node.clock, &mut context, out)?;
        print_value(module, node.next, &mut context, out)?;
        writeln!(
            out,
            "next {} {} {}",
            context.value(reg),
            context.value(node.clock),
            context.value(node.next)
        )?;
    }

    for (memory, node) in module.memories() {
        for write in &node.writes {
            print_value(module, write.clock, &mut context, out)?;
            print_value(module, write.address, &mut context, out)?;
            print_value(module, write.enable, &mut context, out)?;
            print_value(module, write.value, &mut context, out)?;
            writeln!(
                out,
                "write {} {} {} {} {}",
                context.memory(memory),
                context.value(write.clock),
                context.value(write.address),
                context.value(write.enable),
                context.value(write.value)
            )?;
        }
    }

    for output in module.outputs() {
        print_value(module, output.value, &mut context, out)?;
        write!(out, "output ")?;
        write_string(out, &output.name)?;
        writeln!(out, " {}", context.value(output.value))?;
    }

    Ok(())
}

/// Writes a module as text IR into a `String`.
pub fn write_module_string(module: &Module) -> String {
    let mut buffer = Vec::new();
    write_module(module, &mut buffer).expect("writing to a Vec");
    String::from_utf8(buffer).expect("text IR is ASCII")
}
