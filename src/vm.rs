//! Reference stack machine for the emitted assembly.
//!
//! [`link`] resolves symbolic labels to instruction addresses; [`VM::run`]
//! executes the result. Registers and memory slots start at zero.

use rustc_hash::FxHashMap;

use crate::asm::{ArithOp, Assembly, Instruction, Label, Register};

mod error;

pub use error::{VmError, VmResult};

const DEFAULT_MAX_STEPS: usize = 10_000_000;
const DEFAULT_MAX_MEMORY: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// `None` runs until the program falls off its last instruction.
    pub max_steps: Option<usize>,
    /// Number of memory slots; storing at or past it is `InvalidAddress`.
    pub max_memory: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_STEPS),
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Set(Register, i64),
    Load(Register, usize),
    Store { address: Register, value: Register },
    Push(Register),
    Pop(Register),
    Arith(ArithOp, Register, Register),
    Less(Register, Register),
    Eq(Register, Register),
    Jump(usize),
    JumpIfFlag(usize),
    JumpUnlessFlag(usize),
    OutInt(Register),
}

/// Assembly with labels stripped and jump targets resolved to addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    code: Vec<Op>,
}

impl Executable {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

pub fn link(assembly: &Assembly) -> VmResult<Executable> {
    let mut addresses = FxHashMap::default();
    let mut next = 0;
    for instruction in assembly {
        match instruction {
            Instruction::Label(label) => {
                if addresses.insert(*label, next).is_some() {
                    return Err(VmError::DuplicateLabel { label: *label });
                }
            }
            _ => next += 1,
        }
    }

    let resolve = |label: Label| -> VmResult<usize> {
        addresses
            .get(&label)
            .copied()
            .ok_or(VmError::UndefinedLabel { label })
    };

    let mut code = Vec::with_capacity(next);
    for instruction in assembly {
        let op = match *instruction {
            Instruction::Label(_) => continue,
            Instruction::Set(reg, value) => Op::Set(reg, value),
            Instruction::Load(reg, slot) => Op::Load(reg, slot),
            Instruction::Store { address, value } => Op::Store { address, value },
            Instruction::Push(reg) => Op::Push(reg),
            Instruction::Pop(reg) => Op::Pop(reg),
            Instruction::Arith(op, lhs, rhs) => Op::Arith(op, lhs, rhs),
            Instruction::Less(lhs, rhs) => Op::Less(lhs, rhs),
            // `cmp` and `eq` both test equality
            Instruction::Eq(lhs, rhs) | Instruction::Cmp(lhs, rhs) => Op::Eq(lhs, rhs),
            Instruction::Jmp(label) => Op::Jump(resolve(label)?),
            Instruction::JmpCmp(label) => Op::JumpIfFlag(resolve(label)?),
            Instruction::JmpNCmp(label) => Op::JumpUnlessFlag(resolve(label)?),
            Instruction::OutInt(reg) => Op::OutInt(reg),
        };
        code.push(op);
    }
    Ok(Executable { code })
}

/// Machine state left behind by a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Execution {
    pub output: Vec<String>,
    pub stack: Vec<i64>,
    pub memory: Vec<i64>,
    pub steps: usize,
}

impl Execution {
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }
}

pub struct VM {
    config: VmConfig,
}

impl VM {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self { config }
    }

    /// Parses, links and runs assembly text.
    pub fn run_text(&self, text: &str) -> VmResult<Execution> {
        let assembly: Assembly = text.parse()?;
        self.run_assembly(&assembly)
    }

    pub fn run_assembly(&self, assembly: &Assembly) -> VmResult<Execution> {
        self.run(&link(assembly)?)
    }

    pub fn run(&self, executable: &Executable) -> VmResult<Execution> {
        let mut registers = [0i64; Register::COUNT];
        let mut flag = false;
        let mut state = Execution::default();
        let mut ip = 0;

        while let Some(&op) = executable.code.get(ip) {
            if let Some(limit) = self.config.max_steps
                && state.steps >= limit
            {
                return Err(VmError::StepLimitExceeded { limit });
            }
            state.steps += 1;
            let current = ip;
            ip += 1;

            match op {
                Op::Set(reg, value) => registers[reg.index()] = value,
                Op::Load(reg, slot) => {
                    registers[reg.index()] = state.memory.get(slot).copied().unwrap_or(0);
                }
                Op::Store { address, value } => {
                    let address = registers[address.index()];
                    let slot = usize::try_from(address)
                        .ok()
                        .filter(|&slot| slot < self.config.max_memory)
                        .ok_or(VmError::InvalidAddress {
                            address,
                            ip: current,
                        })?;
                    if slot >= state.memory.len() {
                        state.memory.resize(slot + 1, 0);
                    }
                    state.memory[slot] = registers[value.index()];
                }
                Op::Push(reg) => state.stack.push(registers[reg.index()]),
                Op::Pop(reg) => {
                    registers[reg.index()] = state
                        .stack
                        .pop()
                        .ok_or(VmError::StackUnderflow { ip: current })?;
                }
                Op::Arith(op, lhs, rhs) => {
                    let (a, b) = (registers[lhs.index()], registers[rhs.index()]);
                    registers[lhs.index()] = arithmetic(op, a, b, current)?;
                }
                Op::Less(lhs, rhs) => flag = registers[lhs.index()] < registers[rhs.index()],
                Op::Eq(lhs, rhs) => flag = registers[lhs.index()] == registers[rhs.index()],
                Op::Jump(target) => ip = target,
                Op::JumpIfFlag(target) => {
                    if flag {
                        ip = target;
                    }
                }
                Op::JumpUnlessFlag(target) => {
                    if !flag {
                        ip = target;
                    }
                }
                Op::OutInt(reg) => state.output.push(registers[reg.index()].to_string()),
            }
        }
        Ok(state)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

fn arithmetic(op: ArithOp, a: i64, b: i64, ip: usize) -> VmResult<i64> {
    let value = match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div | ArithOp::Mod if b == 0 => return Err(VmError::DivisionByZero { ip }),
        ArithOp::Div => a.wrapping_div(b),
        ArithOp::Mod => a.wrapping_rem(b),
        ArithOp::And => a & b,
        ArithOp::Or => a | b,
        ArithOp::Xor => a ^ b,
    };
    Ok(value)
}
