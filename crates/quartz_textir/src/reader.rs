//! The text IR reader.

use crate::ParseError;
use quartz_bits::BitString;
use quartz_ir::{MemoryId, Module, OpKind, ValueId};
use std::collections::HashMap;

/// One line of input with a cursor, plus its line number for errors.
struct Cursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, line: usize) -> Self {
        Self { rest: text, line }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, message)
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t', '\r']);
    }

    fn is_empty(&mut self) -> bool {
        self.skip_whitespace();
        self.rest.is_empty()
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest.chars().next()
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.rest.strip_prefix(expected) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(self.error(format!("expected {expected:?}"))),
        }
    }

    fn read_number(&mut self) -> Result<u64, ParseError> {
        self.skip_whitespace();
        let digits: String = self.rest.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(self.error("expected number"));
        }
        self.rest = &self.rest[digits.len()..];
        digits
            .parse()
            .map_err(|_| self.error("number out of range"))
    }

    fn read_word(&mut self) -> String {
        self.skip_whitespace();
        let word: String = self
            .rest
            .chars()
            .take_while(|&chr| chr != ' ' && chr != '\t' && chr != '\r')
            .collect();
        self.rest = &self.rest[word.len()..];
        word
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        self.expect('\"')?;
        let mut string = String::new();
        let mut chars = self.rest.char_indices();
        loop {
            let Some((index, chr)) = chars.next() else {
                return Err(self.error("unterminated string literal"));
            };
            match chr {
                '\"' => {
                    self.rest = &self.rest[index + 1..];
                    return Ok(string);
                }
                '\\' => {
                    let escape = chars.next().map(|(_, chr)| chr);
                    if escape != Some('x') {
                        return Err(self.error("expected x after \\"));
                    }
                    let mut byte = 0u8;
                    for _ in 0..2 {
                        let digit = chars
                            .next()
                            .and_then(|(_, chr)| chr.to_digit(16))
                            .ok_or_else(|| self.error("invalid hex escape"))?;
                        byte = byte << 4 | digit as u8;
                    }
                    string.push(byte as char);
                }
                _ => string.push(chr),
            }
        }
    }

    fn read_bit_string(&mut self) -> Result<BitString, ParseError> {
        let width = self.read_number()? as usize;
        self.expect('\'')?;
        let base = self
            .rest
            .chars()
            .next()
            .ok_or_else(|| self.error("expected base character"))?;
        self.rest = &self.rest[base.len_utf8()..];
        let log2 = match base {
            'b' => 1,
            'o' => 3,
            'h' => 4,
            _ => return Err(self.error(format!("unknown bit-string base {base:?}"))),
        };
        let digits = self.read_word();
        let parsed = BitString::from_base_log2(log2, &digits)
            .map_err(|error| self.error(error.to_string()))?;
        if parsed.rfind_bit(true) != parsed.width() && parsed.rfind_bit(true) >= width {
            return Err(self.error(format!(
                "literal does not fit into {width} bits"
            )));
        }
        Ok(parsed.resize_u(width))
    }
}

/// Reads a module named `top` from text IR.
pub fn read_module(text: &str) -> Result<Module, ParseError> {
    read_module_named(text, "top")
}

/// Reads a module with the given name from text IR.
pub fn read_module_named(text: &str, name: &str) -> Result<Module, ParseError> {
    let mut module = Module::new(name);
    let mut values: HashMap<u64, ValueId> = HashMap::new();
    let mut memories: HashMap<u64, MemoryId> = HashMap::new();
    // Registers parsed before their `next` statement hold a placeholder
    // clock.
    let placeholder_clock = module.constant(BitString::from_bool(false));

    for (index, line) in text.lines().enumerate() {
        let mut cursor = Cursor::new(line, index + 1);
        if cursor.is_empty() || cursor.peek() == Some('#') {
            continue;
        }

        let mut id = None;
        if cursor.peek().is_some_and(|chr| chr.is_ascii_digit()) {
            id = Some(cursor.read_number()?);
            cursor.expect('=')?;
        }
        let line_number = cursor.line;
        let require_id =
            || id.ok_or_else(|| ParseError::new(line_number, "statement requires an id"));
        let lookup = |values: &HashMap<u64, ValueId>, id: u64| {
            values.get(&id).copied().ok_or_else(|| {
                ParseError::new(line_number, format!("unknown value id {id}"))
            })
        };
        let lookup_memory = |memories: &HashMap<u64, MemoryId>, id: u64| {
            memories.get(&id).copied().ok_or_else(|| {
                ParseError::new(line_number, format!("unknown memory id {id}"))
            })
        };

        let command = cursor.read_word();
        match command.as_str() {
            "input" => {
                let name = cursor.read_string()?;
                let width = cursor.read_number()? as usize;
                values.insert(require_id()?, module.input(name, width));
            }
            "reg" => {
                let initial = cursor.read_bit_string()?;
                let name = cursor.read_string()?;
                let reg = module
                    .reg(initial, placeholder_clock)
                    .map_err(|error| cursor.error(error.to_string()))?;
                module.set_reg_name(reg, name);
                values.insert(require_id()?, reg);
            }
            "memory" => {
                let width = cursor.read_number()? as usize;
                let size = cursor.read_number()?;
                let name = cursor.read_string()?;
                let memory = module.memory(width, size);
                module.set_memory_name(memory, name);
                memories.insert(require_id()?, memory);
            }
            "next" => {
                let reg_id = cursor.read_number()?;
                let clock_id = cursor.read_number()?;
                let next_id = cursor.read_number()?;
                let reg = lookup(&values, reg_id)?;
                let clock = lookup(&values, clock_id)?;
                let next = lookup(&values, next_id)?;
                module
                    .set_clock(reg, clock)
                    .and_then(|_| module.set_next(reg, next))
                    .map_err(|error| cursor.error(error.to_string()))?;
            }
            "read" => {
                let memory_id = cursor.read_number()?;
                let address_id = cursor.read_number()?;
                let memory = lookup_memory(&memories, memory_id)?;
                let address = lookup(&values, address_id)?;
                values.insert(require_id()?, module.read(memory, address));
            }
            "write" => {
                let memory_id = cursor.read_number()?;
                let clock_id = cursor.read_number()?;
                let address_id = cursor.read_number()?;
                let enable_id = cursor.read_number()?;
                let value_id = cursor.read_number()?;
                let memory = lookup_memory(&memories, memory_id)?;
                let clock = lookup(&values, clock_id)?;
                let address = lookup(&values, address_id)?;
                let enable = lookup(&values, enable_id)?;
                let value = lookup(&values, value_id)?;
                module
                    .write(memory, clock, address, enable, value)
                    .map_err(|error| cursor.error(error.to_string()))?;
            }
            "output" => {
                let name = cursor.read_string()?;
                let value_id = cursor.read_number()?;
                module.output(name, lookup(&values, value_id)?);
            }
            "constant" => {
                let literal = cursor.read_bit_string()?;
                values.insert(require_id()?, module.constant(literal));
            }
            other => {
                let kind = OpKind::from_name(other)
                    .ok_or_else(|| cursor.error(format!("unknown statement {other:?}")))?;
                let mut args = Vec::new();
                while !cursor.is_empty() {
                    let arg_id = cursor.read_number()?;
                    args.push(lookup(&values, arg_id)?);
                }
                let op = module
                    .op(kind, &args)
                    .map_err(|error| cursor.error(error.to_string()))?;
                values.insert(require_id()?, op);
            }
        }

        if !cursor.is_empty() {
            return Err(cursor.error("trailing characters after statement"));
        }
    }
    Ok(module)
}
