//! Syntax tree consumed by the compiler.
//!
//! Every node has the same shape: a kind, an integer payload and up to two
//! owned children. What the payload means and which children must be present
//! depends only on the kind, see [`Node::arity`].

use crate::token::TokenType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    Required,
    Optional,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub left: Child,
    pub right: Child,
}

impl Arity {
    const fn new(left: Child, right: Child) -> Self {
        Self { left, right }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: TokenType,
    /// Literal value for `Const`, variable id for `Name`/`DeclVar`/`Assign`,
    /// function id for `Def`. Unused by the other kinds.
    pub payload: i64,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
}

impl Node {
    pub fn new(kind: TokenType) -> Self {
        Self {
            kind,
            payload: 0,
            left: None,
            right: None,
        }
    }

    pub fn with_payload(kind: TokenType, payload: i64) -> Self {
        Self {
            kind,
            payload,
            left: None,
            right: None,
        }
    }

    pub fn with_children(kind: TokenType, left: Option<Node>, right: Option<Node>) -> Self {
        Self {
            kind,
            payload: 0,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    pub fn constant(value: i64) -> Self {
        Self::with_payload(TokenType::Const, value)
    }

    pub fn name(id: i64) -> Self {
        Self::with_payload(TokenType::Name, id)
    }

    pub fn declare(id: i64) -> Self {
        Self::with_payload(TokenType::DeclVar, id)
    }

    pub fn binary(kind: TokenType, left: Node, right: Node) -> Self {
        Self::with_children(kind, Some(left), Some(right))
    }

    /// `target := value`; the target slot is carried in the payload.
    pub fn assign(id: i64, value: Node) -> Self {
        let mut node = Self::binary(TokenType::Assign, Self::name(id), value);
        node.payload = id;
        node
    }

    /// Expression statement: evaluates `expr` and drops its value.
    pub fn statement(expr: Node) -> Self {
        Self::with_children(TokenType::EndInstr, Some(expr), None)
    }

    pub fn print(expr: Node) -> Self {
        Self::with_children(TokenType::Print, Some(expr), None)
    }

    pub fn if_else(condition: Node, then_body: Option<Node>, else_body: Option<Node>) -> Self {
        let left = Self::with_children(TokenType::IfLeft, Some(condition), then_body);
        let right = Self::with_children(TokenType::IfRight, else_body, None);
        Self::binary(TokenType::If, left, right)
    }

    pub fn while_loop(condition: Node, body: Option<Node>) -> Self {
        let left = Self::with_children(TokenType::WhileLeft, Some(condition), body);
        Self::binary(TokenType::While, left, Self::new(TokenType::WhileRight))
    }

    pub fn def(id: i64, body: Option<Node>) -> Self {
        let mut node = Self::with_children(TokenType::Def, body, None);
        node.payload = id;
        node
    }

    /// Chains statements into a right-leaning list of `Nop` nodes.
    pub fn sequence(statements: impl IntoIterator<Item = Node>) -> Option<Node> {
        let statements = statements.into_iter().collect::<Vec<_>>();
        statements.into_iter().rev().fold(None, |rest, statement| {
            Some(Self::with_children(TokenType::Nop, Some(statement), rest))
        })
    }

    /// Walks a `Nop` chain without recursing: every link's left child in
    /// order, then the right child of the last link unless it is itself a
    /// `Nop`. A node that is not a `Nop` yields only itself.
    pub fn statements(&self) -> impl Iterator<Item = &Node> {
        let (head, tail) = if self.kind == TokenType::Nop {
            (Some(self), None)
        } else {
            (None, Some(self))
        };
        let links = std::iter::successors(head, |&link| {
            link.right
                .as_deref()
                .filter(|next| next.kind == TokenType::Nop)
        });
        links
            .flat_map(|link| {
                let last = link
                    .right
                    .as_deref()
                    .filter(|next| next.kind != TokenType::Nop);
                link.left.as_deref().into_iter().chain(last)
            })
            .chain(tail)
    }

    /// Children each kind expects. `None` for punctuation kinds, which never
    /// belong in a tree.
    pub fn arity(kind: TokenType) -> Option<Arity> {
        use Child::*;
        let arity = match kind {
            TokenType::Const | TokenType::Name | TokenType::DeclVar => {
                Arity::new(Forbidden, Forbidden)
            }
            TokenType::Plus
            | TokenType::Minus
            | TokenType::Mult
            | TokenType::Div
            | TokenType::Mod
            | TokenType::LAnd
            | TokenType::LOr
            | TokenType::Xor
            | TokenType::Less
            | TokenType::Eq
            | TokenType::Assign
            | TokenType::If
            | TokenType::While => Arity::new(Required, Required),
            TokenType::IfLeft | TokenType::WhileLeft => Arity::new(Required, Optional),
            TokenType::IfRight => Arity::new(Optional, Forbidden),
            TokenType::WhileRight | TokenType::Nop => Arity::new(Optional, Optional),
            TokenType::Def => Arity::new(Optional, Forbidden),
            TokenType::EndInstr | TokenType::Print => Arity::new(Required, Forbidden),
            TokenType::Else
            | TokenType::OpenPar
            | TokenType::ClosePar
            | TokenType::OpenBrace
            | TokenType::CloseBrace => return None,
        };
        Some(arity)
    }
}

impl Drop for Node {
    // statement chains can be far deeper than the call stack allows
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = Vec::new();
        pending.extend(self.left.take());
        pending.extend(self.right.take());
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_builds_right_leaning_chain() {
        let chain = Node::sequence([Node::declare(0), Node::declare(1)]).expect("non-empty");
        assert_eq!(chain.kind, TokenType::Nop);
        assert_eq!(chain.left.as_deref(), Some(&Node::declare(0)));
        let rest = chain.right.as_deref().expect("second link");
        assert_eq!(rest.left.as_deref(), Some(&Node::declare(1)));
        assert!(rest.right.is_none());
        assert!(Node::sequence([]).is_none());
    }

    #[test]
    fn statements_walks_the_chain_in_order() {
        let chain = Node::sequence((0..4).map(Node::declare)).expect("non-empty");
        let ids = chain.statements().map(|node| node.payload).collect::<Vec<_>>();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        let tail = Node::with_children(
            TokenType::Nop,
            Some(Node::declare(1)),
            Some(Node::constant(2)),
        );
        let kinds = tail.statements().map(|node| node.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![TokenType::DeclVar, TokenType::Const]);

        let single = Node::print(Node::constant(1));
        assert_eq!(single.statements().count(), 1);
    }

    #[test]
    fn drops_deep_chains() {
        let chain = Node::sequence((0..200_000).map(Node::declare));
        drop(chain);
    }

    #[test]
    fn assign_carries_target_in_payload() {
        let node = Node::assign(3, Node::constant(7));
        assert_eq!(node.kind, TokenType::Assign);
        assert_eq!(node.payload, 3);
        assert_eq!(node.left.as_deref(), Some(&Node::name(3)));
    }

    #[test]
    fn punctuation_has_no_arity() {
        assert!(Node::arity(TokenType::OpenBrace).is_none());
        assert_eq!(
            Node::arity(TokenType::Plus),
            Some(Arity::new(Child::Required, Child::Required))
        );
    }
}
