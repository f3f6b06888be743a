//! GraphViz (`dot`) rendering of the value graph.

use quartz_ir::{Module, Value};
use std::io::{self, Write};

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('\"', "\\\"")
}

/// Writes the module's value graph as a `dot` digraph.
///
/// Every node carries its kind and width; argument edges point from
/// operand to user. Register clock and next-state edges are dashed, and
/// memories appear as record nodes fed by their write ports.
pub fn write_graphviz(module: &Module, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "digraph \"{}\" {{", escape(module.name()))?;
    writeln!(out, "  node [shape=box, fontname=\"monospace\"];")?;

    for (id, value) in module.iter() {
        let index = id.as_raw();
        let label = match value {
            Value::Constant(constant) => format!("{}", constant.value),
            Value::Input(input) => format!("input {}:{}", escape(&input.name), input.width),
            Value::Unknown(unknown) => format!("unknown:{}", unknown.width),
            Value::Op(op) => format!("{}:{}", op.kind, op.width),
            Value::Reg(reg) => format!("reg {}:{}", escape(&reg.name), reg.width),
            Value::MemoryRead(read) => format!("read:{}", read.width),
        };
        writeln!(out, "  v{index} [label=\"{label}\"];")?;
        match value {
            Value::Op(op) => {
                for &arg in &op.args {
                    writeln!(out, "  v{} -> v{index};", arg.as_raw())?;
                }
            }
            Value::Reg(reg) => {
                writeln!(out, "  v{} -> v{index} [style=dashed, label=\"clk\"];", reg.clock.as_raw())?;
                writeln!(out, "  v{} -> v{index} [style=dashed, label=\"next\"];", reg.next.as_raw())?;
            }
            Value::MemoryRead(read) => {
                writeln!(out, "  v{} -> v{index} [label=\"addr\"];", read.address.as_raw())?;
                writeln!(out, "  m{} -> v{index};", read.memory.as_raw())?;
            }
            _ => {}
        }
    }

    for (id, memory) in module.memories() {
        let index = id.as_raw();
        writeln!(
            out,
            "  m{index} [shape=box3d, label=\"memory {}:{}x{}\"];",
            escape(&memory.name),
            memory.width,
            memory.size
        )?;
        for write in &memory.writes {
            writeln!(out, "  v{} -> m{index} [style=dashed, label=\"clk\"];", write.clock.as_raw())?;
            writeln!(out, "  v{} -> m{index} [label=\"addr\"];", write.address.as_raw())?;
            writeln!(out, "  v{} -> m{index} [label=\"en\"];", write.enable.as_raw())?;
            writeln!(out, "  v{} -> m{index} [label=\"data\"];", write.value.as_raw())?;
        }
    }

    for (index, output) in module.outputs().iter().enumerate() {
        writeln!(
            out,
            "  o{index} [shape=ellipse, label=\"output {}\"];",
            escape(&output.name)
        )?;
        writeln!(out, "  v{} -> o{index};", output.value.as_raw())?;
    }

    writeln!(out, "}}")
}
