//! Token kinds shared by the lexer, parser and compiler, plus the immutable
//! operator table the parser consults for precedence and associativity.

use rustc_hash::{FxHashMap, FxHashSet};

pub const MIN_PRIORITY: i32 = -5;
pub const MAX_PRIORITY: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Closed set of node kinds. The punctuation kinds at the end only exist
/// between the lexer and the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Values
    Const,
    Name,
    DeclVar,

    // Binary operators
    Plus,
    Minus,
    Mult,
    Div,
    Mod,
    LAnd,
    LOr,
    Xor,
    Less,
    Eq,
    Assign,

    // Control structures
    If,
    IfLeft,
    IfRight,
    While,
    WhileLeft,
    WhileRight,
    Def,

    // Statements
    EndInstr,
    Print,
    Nop,

    // Punctuation
    Else,
    OpenPar,
    ClosePar,
    OpenBrace,
    CloseBrace,
}

impl TokenType {
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
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
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenType,
    /// Literal value for `Const` tokens.
    pub value: Option<i64>,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenType, text: &'a str, span: Span) -> Self {
        Self {
            kind,
            value: None,
            text,
            span,
        }
    }

    pub fn constant(value: i64, text: &'a str, span: Span) -> Self {
        Self {
            kind: TokenType::Const,
            value: Some(value),
            text,
            span,
        }
    }
}

struct Entry {
    kind: TokenType,
    lexeme: Option<&'static str>,
    priority: Option<i32>,
    right_assoc: bool,
}

const fn entry(
    kind: TokenType,
    lexeme: Option<&'static str>,
    priority: Option<i32>,
    right_assoc: bool,
) -> Entry {
    Entry {
        kind,
        lexeme,
        priority,
        right_assoc,
    }
}

const ENTRIES: &[Entry] = &[
    entry(TokenType::Const, None, Some(MAX_PRIORITY), false),
    entry(TokenType::Name, None, Some(MAX_PRIORITY), false),
    entry(TokenType::Plus, Some("+"), Some(6), false),
    entry(TokenType::Minus, Some("-"), Some(6), false),
    entry(TokenType::Mult, Some("*"), Some(8), false),
    entry(TokenType::Div, Some("/"), Some(8), false),
    entry(TokenType::Mod, Some("%"), Some(7), false),
    entry(TokenType::LAnd, Some("&"), Some(3), false),
    entry(TokenType::LOr, Some("|"), Some(1), false),
    entry(TokenType::Xor, Some("^"), Some(2), false),
    entry(TokenType::Less, Some("<"), Some(5), false),
    entry(TokenType::Eq, Some("="), Some(4), false),
    entry(TokenType::Assign, Some(":="), Some(0), true),
    entry(TokenType::If, Some("if"), None, false),
    entry(TokenType::IfLeft, None, None, false),
    entry(TokenType::IfRight, None, None, false),
    entry(TokenType::While, Some("while"), None, false),
    entry(TokenType::WhileLeft, None, None, false),
    entry(TokenType::WhileRight, None, None, false),
    entry(TokenType::Def, Some("def"), None, false),
    entry(TokenType::DeclVar, Some("var"), None, false),
    entry(TokenType::EndInstr, Some(";"), None, false),
    entry(TokenType::Print, Some("print"), Some(-1), false),
    entry(TokenType::Nop, Some("nop"), None, false),
    entry(TokenType::Else, Some("else"), None, false),
    entry(TokenType::OpenPar, Some("("), None, false),
    entry(TokenType::ClosePar, Some(")"), None, false),
    entry(TokenType::OpenBrace, Some("{"), None, false),
    entry(TokenType::CloseBrace, Some("}"), None, false),
];

/// Lexeme, precedence and associativity lookups.
///
/// Built once and handed to the lexer and parser by reference; it is never
/// mutated afterwards, so one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    lexemes: FxHashMap<&'static str, TokenType>,
    priorities: FxHashMap<TokenType, i32>,
    right_assoc: FxHashSet<TokenType>,
}

impl OperatorTable {
    pub fn new() -> Self {
        let mut lexemes = FxHashMap::default();
        let mut priorities = FxHashMap::default();
        let mut right_assoc = FxHashSet::default();
        for entry in ENTRIES {
            if let Some(lexeme) = entry.lexeme {
                lexemes.insert(lexeme, entry.kind);
            }
            if let Some(priority) = entry.priority {
                priorities.insert(entry.kind, priority);
            }
            if entry.right_assoc {
                right_assoc.insert(entry.kind);
            }
        }
        Self {
            lexemes,
            priorities,
            right_assoc,
        }
    }

    pub fn lookup(&self, lexeme: &str) -> Option<TokenType> {
        self.lexemes.get(lexeme).copied()
    }

    /// Precedence of `kind`, or `None` for kinds that are not operators.
    pub fn precedence(&self, kind: TokenType) -> Option<i32> {
        self.priorities.get(&kind).copied()
    }

    pub fn is_right_associative(&self, kind: TokenType) -> bool {
        self.right_assoc.contains(&kind)
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATORS: [TokenType; 11] = [
        TokenType::Plus,
        TokenType::Minus,
        TokenType::Mult,
        TokenType::Div,
        TokenType::Mod,
        TokenType::LAnd,
        TokenType::LOr,
        TokenType::Xor,
        TokenType::Less,
        TokenType::Eq,
        TokenType::Assign,
    ];

    #[test]
    fn every_operator_has_priority_in_range() {
        let table = OperatorTable::new();
        for kind in OPERATORS {
            assert!(kind.is_binary_operator());
            let priority = table
                .precedence(kind)
                .unwrap_or_else(|| panic!("missing priority for {kind:?}"));
            assert!(
                (MIN_PRIORITY..=MAX_PRIORITY).contains(&priority),
                "{kind:?} priority {priority} out of range"
            );
        }
    }

    #[test]
    fn priorities_follow_c_ordering() {
        let table = OperatorTable::new();
        let p = |kind| table.precedence(kind).expect("operator priority");
        assert!(p(TokenType::Mult) > p(TokenType::Plus));
        assert_eq!(p(TokenType::Mult), p(TokenType::Div));
        assert_eq!(p(TokenType::Plus), p(TokenType::Minus));
        assert!(p(TokenType::Plus) > p(TokenType::Less));
        assert!(p(TokenType::Less) > p(TokenType::Eq));
        assert!(p(TokenType::Eq) > p(TokenType::LAnd));
        assert!(p(TokenType::LAnd) > p(TokenType::Xor));
        assert!(p(TokenType::Xor) > p(TokenType::LOr));
        assert!(p(TokenType::LOr) > p(TokenType::Assign));
    }

    #[test]
    fn only_assign_is_right_associative() {
        let table = OperatorTable::new();
        for kind in OPERATORS {
            assert_eq!(
                table.is_right_associative(kind),
                kind == TokenType::Assign,
                "{kind:?}"
            );
        }
        assert!(!table.is_right_associative(TokenType::Nop));
    }

    #[test]
    fn looks_up_keywords_and_symbols() {
        let table = OperatorTable::new();
        assert_eq!(table.lookup(":="), Some(TokenType::Assign));
        assert_eq!(table.lookup("while"), Some(TokenType::While));
        assert_eq!(table.lookup("var"), Some(TokenType::DeclVar));
        assert_eq!(table.lookup("{"), Some(TokenType::OpenBrace));
        assert_eq!(table.lookup("x"), None);
        assert_eq!(table.precedence(TokenType::Else), None);
    }
}
