//! Assembler front-end.
//!
//! A single pass over the source builds the symbol table and emits
//! instruction records; forward label references are recorded in a fixup
//! list and patched once the whole file has been read. Pseudo-instructions
//! are expanded before format classification, so the engine only ever sees
//! real operations.
//!
//! Program index 0 holds a synthetic `end` so the line numbers users see
//! (and labels resolve to) are 1-based.

pub mod lexer;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::common::error::AsmError;
use crate::isa::{self, abi, Format, Instruction, Opcode};

use lexer::Token;

/// Per-parse state: symbol table, deferred fixups, and the emission counter.
/// A fresh context is created for every parse so parses are isolated.
struct Parser {
    symbols: HashMap<String, i32>,
    /// (program index, label) pairs awaiting resolution.
    fixups: Vec<(usize, String)>,
    /// Index the next emitted instruction will occupy.
    line: i32,
}

impl Parser {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            fixups: Vec::new(),
            line: 1,
        }
    }

    /// Resolves an operand token: ABI alias, then decimal literal, then a
    /// known label (as a signed line offset). An unknown identifier is
    /// assumed to be a forward label reference and deferred.
    fn operand_value(&mut self, tok: &Token) -> i32 {
        if let Some(reg) = abi::lookup(&tok.text) {
            return reg;
        }
        if let Ok(val) = tok.text.parse::<i32>() {
            return val;
        }
        if let Some(&target) = self.symbols.get(&tok.text) {
            return target - self.line;
        }
        self.fixups.push((self.line as usize, tok.text.clone()));
        -1
    }
}

/// Parses assembly source into a program image and its entry PC.
///
/// The entry PC is the `main` label's line when the source declares one,
/// otherwise 1 (skipping the synthetic `end` at index 0).
pub fn parse_program(source: &str) -> Result<(Vec<Instruction>, i32), AsmError> {
    let mut parser = Parser::new();
    let mut program = vec![Instruction::end()];

    for (source_line, line) in source.lines().enumerate() {
        let lineno = source_line + 1;
        let tokens = lexer::tokenize_line(line);

        let mut rest: &[Token] = &tokens;
        if tokens.len() >= 2 && tokens[1].text == ":" {
            parser.symbols.insert(tokens[0].text.clone(), parser.line);
            rest = &tokens[2..];
        }

        if rest.is_empty() {
            continue;
        }

        let mut op = Opcode::Nop;
        let (mut rd, mut rs1, mut rs2) = (0i32, 0i32, 0i32);
        for tok in rest {
            match tok.pos {
                0 => {
                    op = Opcode::from_mnemonic(&tok.text).ok_or_else(|| {
                        AsmError::UnknownOpcode {
                            line: lineno,
                            mnemonic: tok.text.clone(),
                        }
                    })?
                }
                1 => rd = parser.operand_value(tok),
                2 => rs1 = parser.operand_value(tok),
                3 => rs2 = parser.operand_value(tok),
                _ => {
                    return Err(AsmError::TooManyOperands {
                        line: lineno,
                        token: tok.text.clone(),
                    })
                }
            }
        }

        // Expand first, then classify: the expansion may move a label
        // operand into the slot its final format expects.
        let mut inst = Instruction::new(op, rd, rs1, rs2);
        if inst.op.is_pseudo() {
            inst = isa::expand_pseudo(inst);
        }

        program.push(inst);
        parser.line += 1;
    }

    // Drain the fixup list now that every label is known.
    for (index, label) in &parser.fixups {
        let target = *parser
            .symbols
            .get(label)
            .ok_or_else(|| AsmError::UndeclaredLabel(label.clone()))?;
        let offset = target - *index as i32;

        let inst = &mut program[*index];
        match inst.format() {
            Format::B => inst.rs2 = offset,
            Format::J => inst.rs1 = offset,
            _ => return Err(AsmError::IllegalLabelUse(label.clone())),
        }
    }

    let entry = parser.symbols.get("main").copied().unwrap_or(1);
    Ok((program, entry))
}

/// Reads and parses an assembly source file.
pub fn parse_program_file<P: AsRef<Path>>(path: P) -> Result<(Vec<Instruction>, i32), AsmError> {
    let source = fs::read_to_string(path)?;
    parse_program(&source)
}
