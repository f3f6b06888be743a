//! Cycle-accurate two-state simulation of Quartz modules.
//!
//! A [`Simulation`] borrows a [`Module`] and maintains mutable register and
//! memory state across [`update`](Simulation::update) calls. Each update
//! loads an input vector and runs the evaluation step to a fixed point:
//! registers and memory writes commit on rising clock edges with snapshot
//! semantics, and the step reruns until no state element changes, so
//! feedback through registers settles deterministically within one call.

#![warn(missing_docs)]

pub mod error;
pub mod vcd;

pub use error::SimError;
pub use vcd::VcdWriter;

use quartz_bits::BitString;
use quartz_ir::{fold, MemoryId, Module, OpKind, Value, ValueId};
use std::collections::{BTreeMap, HashMap};

/// Mutable simulation state for one module.
pub struct Simulation<'m> {
    module: &'m Module,
    inputs: Vec<BitString>,
    regs: HashMap<ValueId, BitString>,
    memories: HashMap<MemoryId, BTreeMap<u64, BitString>>,
    prev_clocks: HashMap<ValueId, bool>,
    outputs: Vec<BitString>,
    wrap_addresses: bool,
}

impl<'m> Simulation<'m> {
    /// Creates a simulation with all inputs zero, registers at their
    /// initial values, and memories at their initial contents.
    pub fn new(module: &'m Module) -> Self {
        let inputs = module
            .inputs()
            .iter()
            .map(|&input| BitString::new(module.width(input)))
            .collect();
        let mut regs = HashMap::new();
        let mut prev_clocks = HashMap::new();
        for &id in module.regs() {
            if let Value::Reg(reg) = module.value(id) {
                regs.insert(id, reg.initial.clone());
                prev_clocks.insert(reg.clock, false);
            }
        }
        let mut memories = HashMap::new();
        for (id, memory) in module.memories() {
            memories.insert(id, memory.initial.clone());
            for write in &memory.writes {
                prev_clocks.insert(write.clock, false);
            }
        }
        Self {
            module,
            inputs,
            regs,
            memories,
            prev_clocks,
            outputs: Vec::new(),
            wrap_addresses: false,
        }
    }

    /// Switches out-of-range memory accesses from an error to wrapping
    /// modulo the memory size.
    pub fn wrap_addresses(mut self) -> Self {
        self.wrap_addresses = true;
        self
    }

    /// The output values computed by the most recent update, in
    /// declaration order. Empty before the first update.
    pub fn outputs(&self) -> &[BitString] {
        &self.outputs
    }

    /// Looks up an output of the most recent update by name.
    pub fn output(&self, name: &str) -> Option<&BitString> {
        self.module
            .outputs()
            .iter()
            .position(|output| output.name == name)
            .and_then(|index| self.outputs.get(index))
    }

    /// The current value of a register.
    pub fn reg_value(&self, reg: ValueId) -> Option<&BitString> {
        self.regs.get(&reg)
    }

    /// The current contents of a memory cell; unwritten cells read zero.
    pub fn memory_cell(&self, memory: MemoryId, address: u64) -> BitString {
        let width = self.module.get_memory(memory).width;
        self.memories
            .get(&memory)
            .and_then(|cells| cells.get(&address).cloned())
            .unwrap_or_else(|| BitString::new(width))
    }

    /// Restores every register and memory to its initial contents.
    ///
    /// `prev_clocks` is left alone: the next update still samples edges
    /// against the clocks of the prior call.
    pub fn reset(&mut self) {
        for &id in self.module.regs() {
            if let Value::Reg(reg) = self.module.value(id) {
                self.regs.insert(id, reg.initial.clone());
            }
        }
        for (id, memory) in self.module.memories() {
            self.memories.insert(id, memory.initial.clone());
        }
    }

    fn decode_address(&self, address: &BitString, size: u64) -> Result<u64, SimError> {
        let out_of_range =
            (64..address.width()).any(|bit| address.at(bit)) || address.as_u64() >= size;
        if out_of_range && !self.wrap_addresses {
            return Err(SimError::MemoryOutOfBounds {
                address: address.as_u64(),
                size,
            });
        }
        Ok(address.as_u64() % size)
    }

    /// Evaluates a node under the current values map, memoizing results.
    ///
    /// `Select` evaluates only the taken branch, so a guarded invalid read
    /// cannot abort a run whose condition excludes it; every other
    /// operator evaluates its arguments strictly.
    fn eval(
        &self,
        id: ValueId,
        values: &mut HashMap<ValueId, BitString>,
    ) -> Result<BitString, SimError> {
        if let Some(value) = values.get(&id) {
            return Ok(value.clone());
        }
        let result = match self.module.value(id) {
            Value::Constant(constant) => constant.value.clone(),
            Value::Unknown(_) => return Err(SimError::Unknown),
            Value::Op(op) if op.kind == OpKind::Select => {
                let condition = self.eval(op.args[0], values)?;
                if condition.at(0) {
                    self.eval(op.args[1], values)?
                } else {
                    self.eval(op.args[2], values)?
                }
            }
            Value::Op(op) => {
                let args = op
                    .args
                    .iter()
                    .map(|&arg| self.eval(arg, values))
                    .collect::<Result<Vec<_>, _>>()?;
                fold::eval_op(op.kind, &args)
            }
            Value::MemoryRead(read) => {
                let memory = self.module.get_memory(read.memory);
                let address = self.eval(read.address, values)?;
                let address = self.decode_address(&address, memory.size)?;
                self.memories
                    .get(&read.memory)
                    .and_then(|cells| cells.get(&address).cloned())
                    .unwrap_or_else(|| BitString::new(memory.width))
            }
            // Inputs and registers are seeded into the values map before
            // evaluation starts; reaching one here means the module was
            // mutated behind the simulation's back.
            Value::Input(input) => panic!("input {:?} missing from values map", input.name),
            Value::Reg(_) => panic!("register missing from values map"),
        };
        values.insert(id, result.clone());
        Ok(result)
    }

    /// Loads an input vector matched positionally to the module inputs and
    /// steps the simulation to a fixed point. Returns the output values.
    pub fn update(&mut self, inputs: &[BitString]) -> Result<&[BitString], SimError> {
        if inputs.len() != self.module.inputs().len() {
            return Err(SimError::InputCount {
                expected: self.module.inputs().len(),
                found: inputs.len(),
            });
        }
        for (&id, value) in self.module.inputs().iter().zip(inputs) {
            let expected = self.module.width(id);
            if value.width() != expected {
                let name = match self.module.value(id) {
                    Value::Input(input) => input.name.clone(),
                    _ => String::new(),
                };
                return Err(SimError::InputWidth {
                    name,
                    expected,
                    found: value.width(),
                });
            }
        }
        self.inputs = inputs.to_vec();
        self.step()
    }

    /// Loads inputs by name and steps the simulation.
    pub fn update_named(
        &mut self,
        inputs: &HashMap<String, BitString>,
    ) -> Result<&[BitString], SimError> {
        let mut vector = Vec::with_capacity(self.module.inputs().len());
        for &id in self.module.inputs() {
            let name = match self.module.value(id) {
                Value::Input(input) => &input.name,
                _ => continue,
            };
            match inputs.get(name) {
                Some(value) => vector.push(value.clone()),
                None => {
                    return Err(SimError::MissingInput { name: name.clone() })
                }
            }
        }
        self.update(&vector)
    }

    /// One fixed-point step over the current inputs.
    fn step(&mut self) -> Result<&[BitString], SimError> {
        loop {
            let mut values: HashMap<ValueId, BitString> = HashMap::new();
            for (&id, value) in self.module.inputs().iter().zip(&self.inputs) {
                values.insert(id, value.clone());
            }
            for (&id, value) in &self.regs {
                values.insert(id, value.clone());
            }

            let mut outputs = Vec::with_capacity(self.module.outputs().len());
            for output in self.module.outputs() {
                outputs.push(self.eval(output.value, &mut values)?);
            }

            // Next-state computation reads the pre-edge values map: every
            // register sees the old value of every other register.
            let mut reg_updates: Vec<(ValueId, BitString)> = Vec::new();
            let mut clock_levels: HashMap<ValueId, bool> = HashMap::new();
            for &id in self.module.regs() {
                let Value::Reg(reg) = self.module.value(id) else {
                    continue;
                };
                let level = self.eval(reg.clock, &mut values)?.at(0);
                clock_levels.insert(reg.clock, level);
                if level && !self.prev_clocks[&reg.clock] {
                    reg_updates.push((id, self.eval(reg.next, &mut values)?));
                }
            }
            let mut memory_updates: Vec<(MemoryId, u64, BitString)> = Vec::new();
            for (id, memory) in self.module.memories() {
                for write in &memory.writes {
                    let level = self.eval(write.clock, &mut values)?.at(0);
                    clock_levels.insert(write.clock, level);
                    if level && !self.prev_clocks[&write.clock]
                        && self.eval(write.enable, &mut values)?.at(0)
                    {
                        let address = self.eval(write.address, &mut values)?;
                        let address = self.decode_address(&address, memory.size)?;
                        let value = self.eval(write.value, &mut values)?;
                        memory_updates.push((id, address, value));
                    }
                }
            }

            for (clock, level) in clock_levels {
                self.prev_clocks.insert(clock, level);
            }

            let mut changed = false;
            for (id, value) in reg_updates {
                if self.regs.get(&id) != Some(&value) {
                    self.regs.insert(id, value);
                    changed = true;
                }
            }
            for (id, address, value) in memory_updates {
                let cells = self.memories.entry(id).or_default();
                if cells.get(&address) != Some(&value) {
                    let is_zero = value.is_zero();
                    if is_zero {
                        changed |= cells.remove(&address).map_or(false, |old| !old.is_zero());
                    } else {
                        cells.insert(address, value);
                        changed = true;
                    }
                }
            }

            self.outputs = outputs;
            if !changed {
                return Ok(&self.outputs);
            }
        }
    }
}
