//! Structural Verilog emission.

use quartz_ir::{MemoryId, Module, OpKind, Value, ValueId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::{self, Write};

/// Formats a `[w-1:0] ` range prefix, empty for single-bit signals.
struct Width(usize);

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 != 1 {
            write!(f, "[{}:0] ", self.0 - 1)?;
        }
        Ok(())
    }
}

/// Operator kinds whose Verilog rendering is width-context-sensitive and
/// therefore always assigned through a wire of the node's exact width.
fn needs_wire(kind: OpKind) -> bool {
    matches!(
        kind,
        OpKind::Mul | OpKind::Concat | OpKind::Slice | OpKind::ShrS
    )
}

struct Printer<'m> {
    module: &'m Module,
    names: HashMap<ValueId, String>,
    memory_names: HashMap<MemoryId, String>,
}

impl<'m> Printer<'m> {
    fn new(module: &'m Module) -> Self {
        let mut names = HashMap::new();
        for (index, &reg) in module.regs().iter().enumerate() {
            names.insert(reg, format!("reg{index}"));
        }
        for &input in module.inputs() {
            if let Value::Input(node) = module.value(input) {
                names.insert(input, node.name.clone());
            }
        }
        let mut memory_names = HashMap::new();
        for (index, (memory, _)) in module.memories().enumerate() {
            memory_names.insert(memory, format!("mem{index}"));
        }
        let counts = module.usages();
        let mut wire_values: Vec<ValueId> = counts
            .iter()
            .filter(|(&value, &count)| {
                if names.contains_key(&value) {
                    return false;
                }
                match module.value(value) {
                    Value::Op(op) => count > 1 || needs_wire(op.kind),
                    Value::MemoryRead(_) => count > 1,
                    _ => false,
                }
            })
            .map(|(&value, _)| value)
            .collect();
        wire_values.sort_unstable();
        for value in wire_values {
            let index = names.len();
            names.insert(value, format!("value{index}"));
        }
        Self {
            module,
            names,
            memory_names,
        }
    }

    /// Prints a value as an expression, emitting wire declarations for
    /// named values on first visit and returning the text to paste into
    /// the enclosing expression.
    fn print(
        &self,
        out: &mut impl Write,
        value: ValueId,
        closed: &mut HashSet<ValueId>,
    ) -> io::Result<String> {
        // Literals print in place on every use; everything else is
        // visited once and referenced by name afterwards.
        match self.module.value(value) {
            Value::Constant(constant) => return Ok(format!("{}", constant.value)),
            Value::Unknown(unknown) => return Ok(format!("{}'bx", unknown.width)),
            _ => {}
        }
        if closed.contains(&value) {
            return Ok(self.names[&value].clone());
        }
        closed.insert(value);

        let expr = match self.module.value(value) {
            Value::Constant(_) | Value::Unknown(_) => unreachable!("handled above"),
            Value::MemoryRead(read) => {
                let address = self.print(out, read.address, closed)?;
                format!("{}[{address}]", self.memory_names[&read.memory])
            }
            Value::Op(op) => {
                let mut args = Vec::with_capacity(op.args.len());
                for &arg in &op.args {
                    args.push(self.print(out, arg, closed)?);
                }
                match op.kind {
                    OpKind::And => format!("({} & {})", args[0], args[1]),
                    OpKind::Or => format!("({} | {})", args[0], args[1]),
                    OpKind::Xor => format!("({} ^ {})", args[0], args[1]),
                    OpKind::Not => format!("(~{})", args[0]),
                    OpKind::Add => format!("({} + {})", args[0], args[1]),
                    OpKind::Sub => format!("({} - {})", args[0], args[1]),
                    OpKind::Mul => format!("({} * {})", args[0], args[1]),
                    OpKind::Eq => format!("({} == {})", args[0], args[1]),
                    OpKind::LtU => {
                        format!("($unsigned({}) < $unsigned({}))", args[0], args[1])
                    }
                    OpKind::LtS => format!("($signed({}) < $signed({}))", args[0], args[1]),
                    OpKind::LeU => {
                        format!("($unsigned({}) <= $unsigned({}))", args[0], args[1])
                    }
                    OpKind::LeS => {
                        format!("($signed({}) <= $signed({}))", args[0], args[1])
                    }
                    OpKind::Concat => format!("{{{}, {}}}", args[0], args[1]),
                    // The wire assignment truncates to the slice width;
                    // the shift zero-fills from above.
                    OpKind::Slice => format!("({} >> {})", args[0], args[1]),
                    OpKind::Shl => format!("({} << {})", args[0], args[1]),
                    OpKind::ShrU => format!("({} >> {})", args[0], args[1]),
                    OpKind::ShrS => format!("($signed({}) >>> {})", args[0], args[1]),
                    OpKind::Select => format!("({} ? {} : {})", args[0], args[1], args[2]),
                }
            }
            Value::Input(_) | Value::Reg(_) => {
                unreachable!("inputs and registers are pre-closed")
            }
        };

        match self.names.get(&value) {
            None => Ok(expr),
            Some(name) => {
                writeln!(
                    out,
                    "  wire {}{name};",
                    Width(self.module.width(value))
                )?;
                writeln!(out, "  assign {name} = {expr};")?;
                Ok(name.clone())
            }
        }
    }

    fn print_module(&self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "module {}(", self.module.name())?;
        let mut first = true;
        for &input in self.module.inputs() {
            if let Value::Input(node) = self.module.value(input) {
                if !first {
                    write!(out, ", ")?;
                }
                write!(out, "input {}{}", Width(node.width), node.name)?;
                first = false;
            }
        }
        for output in self.module.outputs() {
            if !first {
                write!(out, ", ")?;
            }
            let width = self.module.width(output.value);
            write!(out, "output {}{}", Width(width), output.name)?;
            first = false;
        }
        writeln!(out, ");")?;

        let mut closed: HashSet<ValueId> = HashSet::new();
        for &input in self.module.inputs() {
            closed.insert(input);
        }
        for &reg in self.module.regs() {
            if let Value::Reg(node) = self.module.value(reg) {
                writeln!(out, "  reg {}{};", Width(node.width), self.names[&reg])?;
            }
            closed.insert(reg);
        }
        for (memory, node) in self.module.memories() {
            writeln!(
                out,
                "  reg {}{} [0:{}];",
                Width(node.width),
                self.memory_names[&memory],
                node.size.saturating_sub(1)
            )?;
            if !node.initial.is_empty() {
                writeln!(out, "  initial begin")?;
                for (address, contents) in &node.initial {
                    writeln!(
                        out,
                        "    {}[{address}] = {contents};",
                        self.memory_names[&memory]
                    )?;
                }
                writeln!(out, "  end")?;
            }
        }

        for output in self.module.outputs() {
            let expr = self.print(out, output.value, &mut closed)?;
            writeln!(out, "  assign {} = {expr};", output.name)?;
        }

        for &reg in self.module.regs() {
            let Value::Reg(node) = self.module.value(reg) else {
                continue;
            };
            let clock = self.print(out, node.clock, &mut closed)?;
            let next = self.print(out, node.next, &mut closed)?;
            let name = &self.names[&reg];
            writeln!(out, "  initial {name} = {};", node.initial)?;
            writeln!(out, "  always @(posedge {clock})")?;
            writeln!(out, "    {name} <= {next};")?;
        }

        for (memory, node) in self.module.memories() {
            for write in &node.writes {
                let clock = self.print(out, write.clock, &mut closed)?;
                let address = self.print(out, write.address, &mut closed)?;
                let enable = self.print(out, write.enable, &mut closed)?;
                let value = self.print(out, write.value, &mut closed)?;
                writeln!(out, "  always @(posedge {clock})")?;
                writeln!(out, "    if ({enable})")?;
                writeln!(
                    out,
                    "      {}[{address}] <= {value};",
                    self.memory_names[&memory]
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "endmodule")
    }
}

/// Writes a module as structural Verilog. The module is not mutated.
pub fn write_verilog(module: &Module, out: &mut impl Write) -> io::Result<()> {
    Printer::new(module).print_module(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_bits::BitString;

    fn emit(module: &Module) -> String {
        let mut buffer = Vec::new();
        write_verilog(module, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn bits(s: &str) -> BitString {
        BitString::parse(s).unwrap()
    }

    #[test]
    fn counter_module_shape() {
        let mut module = Module::new("counter");
        let clock = module.input("clock", 1);
        let counter = module.reg(bits("0000"), clock).unwrap();
        let one = module.constant(bits("0001"));
        let next = module.op(OpKind::Add, &[counter, one]).unwrap();
        module.set_next(counter, next).unwrap();
        module.output("counter", counter);

        let text = emit(&module);
        assert!(text.contains("module counter(input clock, output [3:0] counter);"));
        assert!(text.contains("  reg [3:0] reg0;"));
        assert!(text.contains("  assign counter = reg0;"));
        assert!(text.contains("  initial reg0 = 4'b0000;"));
        assert!(text.contains("  always @(posedge clock)"));
        assert!(text.contains("    reg0 <= (4'b0001 + reg0);"));
        assert!(text.trim_end().ends_with("endmodule"));
    }

    #[test]
    fn shared_expressions_get_wires() {
        let mut module = Module::new("top");
        let a = module.input("a", 4);
        let b = module.input("b", 4);
        let sum = module.op(OpKind::Add, &[a, b]).unwrap();
        let not = module.op(OpKind::Not, &[sum]).unwrap();
        let xor = module.op(OpKind::Xor, &[sum, not]).unwrap();
        module.output("out", xor);

        let text = emit(&module);
        assert!(text.contains("  wire [3:0] value"));
        assert!(text.contains("  assign value"));
        // The shared sum is referenced by name, not re-expanded.
        assert_eq!(text.matches("(a + b)").count(), 1);
    }

    #[test]
    fn width_changing_ops_are_wired() {
        let mut module = Module::new("top");
        let a = module.input("a", 4);
        let b = module.input("b", 4);
        let product = module.op(OpKind::Mul, &[a, b]).unwrap();
        module.output("product", product);
        let text = emit(&module);
        assert!(text.contains("  wire [7:0] value"));
        assert!(text.contains(" = (a * b);"));
        assert!(text.contains("output [7:0] product"));
    }

    #[test]
    fn slice_prints_as_shift_into_exact_wire() {
        let mut module = Module::new("top");
        let a = module.input("a", 8);
        let offset = module.input("offset", 3);
        let width = module.constant(BitString::from_u64(4));
        let sliced = module.op(OpKind::Slice, &[a, offset, width]).unwrap();
        module.output("window", sliced);
        let text = emit(&module);
        assert!(text.contains("  wire [3:0] value"));
        assert!(text.contains(" = (a >> offset);"));
    }

    #[test]
    fn memory_emits_array_and_write_process() {
        let mut module = Module::new("ram");
        let clock = module.input("clock", 1);
        let address = module.input("addr", 5);
        let data = module.input("data", 8);
        let enable = module.input("wen", 1);
        let memory = module.memory(8, 32);
        module
            .set_memory_initial(memory, 2, BitString::from_uint(0x5a, 8))
            .unwrap();
        let read = module.read(memory, address);
        module.output("read", read);
        module.write(memory, clock, address, enable, data).unwrap();

        let text = emit(&module);
        assert!(text.contains("  reg [7:0] mem0 [0:31];"));
        assert!(text.contains("    mem0[2] = 8'b01011010;"));
        assert!(text.contains("  assign read = mem0[addr];"));
        assert!(text.contains("  always @(posedge clock)"));
        assert!(text.contains("    if (wen)"));
        assert!(text.contains("      mem0[addr] <= data;"));
    }

    #[test]
    fn select_and_compares_print_inline() {
        let mut module = Module::new("top");
        let cond = module.input("cond", 1);
        let a = module.input("a", 4);
        let b = module.input("b", 4);
        let less = module.op(OpKind::LtS, &[a, b]).unwrap();
        let picked = module.op(OpKind::Select, &[cond, a, b]).unwrap();
        module.output("less", less);
        module.output("picked", picked);
        let text = emit(&module);
        assert!(text.contains("($signed(a) < $signed(b))"));
        assert!(text.contains("(cond ? a : b)"));
    }
}
