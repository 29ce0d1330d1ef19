//! Textual stack-machine instruction set.
//!
//! Instructions are built as typed values and only turned into text at the
//! edge; the text form is what the virtual machine reads. Labels are symbolic
//! and a label definition is a bare `L<n>` line.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Unknown instruction '{text}' on line {line}")]
    UnknownInstruction { text: String, line: usize },
    #[error("Invalid operand '{operand}' for '{mnemonic}' on line {line}")]
    InvalidOperand {
        mnemonic: String,
        operand: String,
        line: usize,
    },
    #[error("'{mnemonic}' expects {expected} operands, got {found} on line {line}")]
    OperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
        line: usize,
    },
}

pub type AsmResult<T> = Result<T, AsmError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl FromStr for Label {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('L')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .map(Label)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
}

impl Register {
    pub const COUNT: usize = 8;
    pub const ALL: [Register; Register::COUNT] = [
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.index() + 1)
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .strip_prefix('r')
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or(())?;
        index
            .checked_sub(1)
            .and_then(|index| Register::ALL.get(index).copied())
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
}

impl ArithOp {
    const ALL: [ArithOp; 8] = [
        ArithOp::Add,
        ArithOp::Sub,
        ArithOp::Mul,
        ArithOp::Div,
        ArithOp::Mod,
        ArithOp::And,
        ArithOp::Or,
        ArithOp::Xor,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
            ArithOp::Mod => "mod",
            ArithOp::And => "and",
            ArithOp::Or => "or",
            ArithOp::Xor => "xor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Set(Register, i64),
    Load(Register, usize),
    /// Writes `value` to the slot whose index is held in `address`.
    Store {
        address: Register,
        value: Register,
    },
    Push(Register),
    Pop(Register),
    Arith(ArithOp, Register, Register),
    Less(Register, Register),
    Eq(Register, Register),
    Cmp(Register, Register),
    Jmp(Label),
    JmpCmp(Label),
    JmpNCmp(Label),
    OutInt(Register),
    Label(Label),
}

impl Instruction {
    /// Label this instruction jumps to, if any.
    pub fn target(&self) -> Option<Label> {
        match self {
            Instruction::Jmp(label) | Instruction::JmpCmp(label) | Instruction::JmpNCmp(label) => {
                Some(*label)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Set(reg, value) => write!(f, "set {reg} {value}"),
            Instruction::Load(reg, slot) => write!(f, "load {reg} {slot}"),
            Instruction::Store { address, value } => write!(f, "store {address} {value}"),
            Instruction::Push(reg) => write!(f, "push {reg}"),
            Instruction::Pop(reg) => write!(f, "pop {reg}"),
            Instruction::Arith(op, lhs, rhs) => write!(f, "{} {lhs} {rhs}", op.mnemonic()),
            Instruction::Less(lhs, rhs) => write!(f, "less {lhs} {rhs}"),
            Instruction::Eq(lhs, rhs) => write!(f, "eq {lhs} {rhs}"),
            Instruction::Cmp(lhs, rhs) => write!(f, "cmp {lhs} {rhs}"),
            Instruction::Jmp(label) => write!(f, "jmp {label}"),
            Instruction::JmpCmp(label) => write!(f, "jmpcmp {label}"),
            Instruction::JmpNCmp(label) => write!(f, "jmpncmp {label}"),
            Instruction::OutInt(reg) => write!(f, "out_int {reg}"),
            Instruction::Label(label) => write!(f, "{label}"),
        }
    }
}

/// Ordered instruction list; `Display` renders the newline-separated text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assembly {
    pub instructions: Vec<Instruction>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn extend(&mut self, other: Assembly) {
        self.instructions.extend(other.instructions);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn labels_defined(&self) -> Vec<Label> {
        self.iter()
            .filter_map(|instruction| match instruction {
                Instruction::Label(label) => Some(*label),
                _ => None,
            })
            .collect()
    }

    pub fn labels_referenced(&self) -> Vec<Label> {
        self.iter().filter_map(Instruction::target).collect()
    }
}

impl From<Vec<Instruction>> for Assembly {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl<'a> IntoIterator for &'a Assembly {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instruction) in self.instructions.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{instruction}")?;
        }
        Ok(())
    }
}

impl FromStr for Assembly {
    type Err = AsmError;

    fn from_str(text: &str) -> AsmResult<Self> {
        let mut assembly = Self::new();
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let parts = line.split_whitespace().collect::<Vec<_>>();
            if parts.is_empty() {
                continue;
            }
            assembly.push(parse_line(&parts, line_no)?);
        }
        Ok(assembly)
    }
}

fn parse_line(parts: &[&str], line: usize) -> AsmResult<Instruction> {
    let mnemonic = parts[0];
    let operands = &parts[1..];

    if operands.is_empty()
        && let Ok(label) = mnemonic.parse::<Label>()
    {
        return Ok(Instruction::Label(label));
    }

    let operand_count = |expected: usize| -> AsmResult<()> {
        if operands.len() == expected {
            Ok(())
        } else {
            Err(AsmError::OperandCount {
                mnemonic: mnemonic.to_string(),
                expected,
                found: operands.len(),
                line,
            })
        }
    };
    let invalid = |operand: &str| AsmError::InvalidOperand {
        mnemonic: mnemonic.to_string(),
        operand: operand.to_string(),
        line,
    };
    let reg = |index: usize| -> AsmResult<Register> {
        operands[index]
            .parse()
            .map_err(|_| invalid(operands[index]))
    };
    let label = |index: usize| -> AsmResult<Label> {
        operands[index]
            .parse()
            .map_err(|_| invalid(operands[index]))
    };

    if let Some(op) = ArithOp::ALL.iter().find(|op| op.mnemonic() == mnemonic) {
        operand_count(2)?;
        return Ok(Instruction::Arith(*op, reg(0)?, reg(1)?));
    }

    let instruction = match mnemonic {
        "set" => {
            operand_count(2)?;
            let value = operands[1].parse().map_err(|_| invalid(operands[1]))?;
            Instruction::Set(reg(0)?, value)
        }
        "load" => {
            operand_count(2)?;
            let slot = operands[1].parse().map_err(|_| invalid(operands[1]))?;
            Instruction::Load(reg(0)?, slot)
        }
        "store" => {
            operand_count(2)?;
            Instruction::Store {
                address: reg(0)?,
                value: reg(1)?,
            }
        }
        "push" => {
            operand_count(1)?;
            Instruction::Push(reg(0)?)
        }
        "pop" => {
            operand_count(1)?;
            Instruction::Pop(reg(0)?)
        }
        "less" => {
            operand_count(2)?;
            Instruction::Less(reg(0)?, reg(1)?)
        }
        "eq" => {
            operand_count(2)?;
            Instruction::Eq(reg(0)?, reg(1)?)
        }
        "cmp" => {
            operand_count(2)?;
            Instruction::Cmp(reg(0)?, reg(1)?)
        }
        "jmp" => {
            operand_count(1)?;
            Instruction::Jmp(label(0)?)
        }
        "jmpcmp" => {
            operand_count(1)?;
            Instruction::JmpCmp(label(0)?)
        }
        "jmpncmp" => {
            operand_count(1)?;
            Instruction::JmpNCmp(label(0)?)
        }
        "out_int" => {
            operand_count(1)?;
            Instruction::OutInt(reg(0)?)
        }
        _ => {
            return Err(AsmError::UnknownInstruction {
                text: parts.join(" "),
                line,
            });
        }
    };
    Ok(instruction)
}
