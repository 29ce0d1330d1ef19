//! Lowers a [`Node`] tree into stack-machine assembly.
//!
//! Every kind maps to a [`Rule`]: instructions emitted before the left child,
//! between the children and after the right child, plus the context policy
//! each child is compiled under. Kinds that branch allocate their labels from
//! the context before emitting anything.

use crate::asm::{ArithOp, Assembly, Instruction, Label, Register};
use crate::ast::{Child, Node};
use crate::token::TokenType;

mod context;
mod error;

pub use context::CompileContext;
pub use error::{CompileError, CompileResult};

/// How a child sees the parent's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatePolicy {
    /// The live context: declarations stay visible to siblings and the parent.
    #[default]
    Share,
    /// An isolated copy: declarations are dropped once the child is compiled.
    Snapshot,
}

#[derive(Debug, Default)]
struct Rule {
    pre: Vec<Instruction>,
    mid: Vec<Instruction>,
    post: Vec<Instruction>,
    left: StatePolicy,
    right: StatePolicy,
    /// Recorded as the context's last label once the node is emitted.
    exit: Option<Label>,
}

impl Rule {
    fn leaf(pre: Vec<Instruction>) -> Self {
        Self {
            pre,
            ..Self::default()
        }
    }

    fn post(post: Vec<Instruction>) -> Self {
        Self {
            post,
            ..Self::default()
        }
    }
}

/// Compiles `node` with a fresh context.
pub fn compile(node: &Node) -> CompileResult<Assembly> {
    let mut context = CompileContext::new();
    compile_with(node, &mut context)
}

/// Compiles sibling statements left to right, threading one context.
pub fn compile_sequence<'n>(
    nodes: impl IntoIterator<Item = &'n Node>,
    context: &mut CompileContext,
) -> CompileResult<Assembly> {
    let mut code = Assembly::new();
    for node in nodes {
        code.extend(compile_with(node, context)?);
    }
    Ok(code)
}

pub fn compile_with(node: &Node, context: &mut CompileContext) -> CompileResult<Assembly> {
    check_shape(node)?;
    if node.kind == TokenType::Nop {
        // a statement list folds left to right instead of recursing per link
        return compile_sequence(node.statements(), context);
    }
    let rule = rule_for(node, context)?;

    let mut code = Assembly::from(rule.pre);
    if let Some(left) = node.left.as_deref() {
        code.extend(compile_child(left, context, rule.left)?);
    }
    code.instructions.extend(rule.mid);
    if let Some(right) = node.right.as_deref() {
        code.extend(compile_child(right, context, rule.right)?);
    }
    code.instructions.extend(rule.post);

    if let Some(exit) = rule.exit {
        context.set_last_label(exit);
    }
    Ok(code)
}

fn compile_child(
    node: &Node,
    context: &mut CompileContext,
    policy: StatePolicy,
) -> CompileResult<Assembly> {
    match policy {
        StatePolicy::Share => compile_with(node, context),
        StatePolicy::Snapshot => {
            let mut scoped = context.snapshot();
            let code = compile_with(node, &mut scoped);
            context.resume_after(scoped);
            code
        }
    }
}

fn check_shape(node: &Node) -> CompileResult<()> {
    let kind = node.kind;
    let arity = Node::arity(kind).ok_or(CompileError::UnknownToken { kind })?;

    let check = |child: Child, present: bool, side: Side| match (child, present) {
        (Child::Required, false) => Err(CompileError::MalformedTree {
            kind,
            reason: side.missing(),
        }),
        (Child::Forbidden, true) => Err(CompileError::MalformedTree {
            kind,
            reason: side.unexpected(),
        }),
        _ => Ok(()),
    };
    check(arity.left, node.left.is_some(), Side::Left)?;
    check(arity.right, node.right.is_some(), Side::Right)?;

    let expect_child = |child: Option<&Node>, expected: TokenType, reason| {
        if child.is_some_and(|child| child.kind == expected) {
            Ok(())
        } else {
            Err(CompileError::MalformedTree { kind, reason })
        }
    };
    match kind {
        TokenType::If => {
            expect_child(node.left.as_deref(), TokenType::IfLeft, "left child must be IfLeft")?;
            expect_child(node.right.as_deref(), TokenType::IfRight, "right child must be IfRight")
        }
        TokenType::While => {
            expect_child(node.left.as_deref(), TokenType::WhileLeft, "left child must be WhileLeft")?;
            expect_child(
                node.right.as_deref(),
                TokenType::WhileRight,
                "right child must be WhileRight",
            )
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn missing(self) -> &'static str {
        match self {
            Side::Left => "missing left child",
            Side::Right => "missing right child",
        }
    }

    fn unexpected(self) -> &'static str {
        match self {
            Side::Left => "unexpected left child",
            Side::Right => "unexpected right child",
        }
    }
}

fn rule_for(node: &Node, context: &mut CompileContext) -> CompileResult<Rule> {
    use Instruction::{Cmp, Jmp, JmpNCmp, Load, Pop, Push, Set, Store};
    use Register::{R1, R2, R3};

    let rule = match node.kind {
        TokenType::Const => Rule::leaf(vec![Set(R1, node.payload), Push(R1)]),
        TokenType::Name => {
            let slot = context.slot(node.payload)?;
            Rule::leaf(vec![Load(R1, slot), Push(R1)])
        }
        TokenType::DeclVar => {
            context.declare(node.payload);
            Rule::default()
        }

        TokenType::Plus => arithmetic(ArithOp::Add),
        TokenType::Minus => arithmetic(ArithOp::Sub),
        TokenType::Mult => arithmetic(ArithOp::Mul),
        TokenType::Div => arithmetic(ArithOp::Div),
        TokenType::Mod => arithmetic(ArithOp::Mod),
        TokenType::LAnd => arithmetic(ArithOp::And),
        TokenType::LOr => arithmetic(ArithOp::Or),
        TokenType::Xor => arithmetic(ArithOp::Xor),
        TokenType::Less => comparison(Instruction::Less(R1, R2), context),
        TokenType::Eq => comparison(Instruction::Eq(R1, R2), context),
        TokenType::Assign => {
            let slot = context.slot(node.payload)?;
            Rule::post(vec![
                Pop(R2),
                Pop(R1),
                Set(R3, slot as i64),
                Store {
                    address: R3,
                    value: R2,
                },
                Push(R2),
            ])
        }

        TokenType::If | TokenType::While | TokenType::WhileRight | TokenType::Nop => {
            Rule::default()
        }
        TokenType::IfLeft => {
            let (mark1, mark2) = (context.new_label(), context.new_label());
            Rule {
                mid: vec![Pop(R1), Set(R2, 1), Cmp(R1, R2), JmpNCmp(mark1)],
                post: vec![Jmp(mark2), Instruction::Label(mark1)],
                left: StatePolicy::Snapshot,
                exit: Some(mark2),
                ..Rule::default()
            }
        }
        TokenType::IfRight => {
            let join = context.last_label().ok_or(CompileError::MalformedTree {
                kind: node.kind,
                reason: "no preceding IfLeft to join",
            })?;
            let mark1 = context.new_label();
            Rule {
                mid: vec![Jmp(mark1), Instruction::Label(join)],
                post: vec![Instruction::Label(mark1)],
                exit: Some(mark1),
                ..Rule::default()
            }
        }
        TokenType::WhileLeft => {
            let (mark1, mark2) = (context.new_label(), context.new_label());
            Rule {
                pre: vec![Instruction::Label(mark1)],
                mid: vec![Pop(R1), Set(R2, 1), Cmp(R1, R2), JmpNCmp(mark2)],
                post: vec![Jmp(mark1), Instruction::Label(mark2)],
                left: StatePolicy::Snapshot,
                exit: Some(mark2),
                ..Rule::default()
            }
        }
        TokenType::Def => {
            let (mark1, mark2) = (context.new_label(), context.new_label());
            Rule {
                pre: vec![Jmp(mark1), Instruction::Label(mark2)],
                post: vec![Instruction::Label(mark1)],
                exit: Some(mark2),
                ..Rule::default()
            }
        }

        TokenType::EndInstr => Rule::post(vec![Pop(R1)]),
        TokenType::Print => Rule::post(vec![Pop(R1), Instruction::OutInt(R1)]),

        TokenType::Else
        | TokenType::OpenPar
        | TokenType::ClosePar
        | TokenType::OpenBrace
        | TokenType::CloseBrace => return Err(CompileError::UnknownToken { kind: node.kind }),
    };
    Ok(rule)
}

fn arithmetic(op: ArithOp) -> Rule {
    use Register::{R1, R2};
    Rule::post(vec![
        Instruction::Pop(R2),
        Instruction::Pop(R1),
        Instruction::Arith(op, R1, R2),
        Instruction::Push(R1),
    ])
}

/// Turns the comparison flag into a 0/1 value on the stack.
fn comparison(compare: Instruction, context: &mut CompileContext) -> Rule {
    use Register::{R1, R2};
    let (mark1, mark2) = (context.new_label(), context.new_label());
    Rule {
        post: vec![
            Instruction::Pop(R2),
            Instruction::Pop(R1),
            compare,
            Instruction::JmpNCmp(mark1),
            Instruction::Set(R1, 1),
            Instruction::Jmp(mark2),
            Instruction::Label(mark1),
            Instruction::Set(R1, 0),
            Instruction::Label(mark2),
            Instruction::Push(R1),
        ],
        exit: Some(mark2),
        ..Rule::default()
    }
}
