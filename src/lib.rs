//! Transition-rule language of tabular logical models and its codec to SBML-qual.
//!
//! A rule such as `!CI:2 & (N | Cro >= 2)` is parsed into an [Expression], which can be
//! rendered back in either [RuleNotation], converted to and from the MathML form used by
//! SBML-qual ([math]), and grouped per target species into multi-valued
//! [UpdateFunction]s.

use fxhash::FxHashSet;
use std::collections::HashMap;

pub mod convert;
pub mod math;
pub mod sbml;
pub mod symbolic;

/// **(internal)** Tokenizer and recursive descent parser of rule strings.
mod _rule_parser;
/// **(internal)** Utility methods for `BinaryOp`.
mod _impl_binary_op;
/// **(internal)** Utility methods for `ComparisonOp`.
mod _impl_comparison_op;
/// **(internal)** Utility methods for `Expression`.
mod _impl_expression;
/// **(internal)** `Expression` to rule string.
mod _impl_expression_display;
/// **(internal)** Identifier validation and the canonicalizing `IdScope`.
mod _impl_id_scope;
/// **(internal)** Declared species and their names.
mod _impl_species_table;
/// **(internal)** Grouping of transition rows into update functions and back.
mod _impl_update_function;

pub use _impl_id_scope::{is_valid_sid, sanitize_id};
pub use _rule_parser::{parse, tokenize};

/// Possible binary logical operators that can appear in an `Expression`.
///
/// The declaration order is also the binding strength: `Or` binds loosest, `And` tightest.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum BinaryOp {
    Or,
    Xor,
    And,
}

/// Comparison of a species level against an integer level.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComparisonOp {
    Ge, // '>='
    Gt, // '>'
    Lt, // '<'
    Le, // '<='
    Eq, // '=='
    Neq, // '!='
}

/// A fixed result of a rule, independent of any species.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Constant {
    Bool(bool),
    Level(u32),
}

/// A parsed transition rule.
///
/// Leaves refer to species by their (canonical) identifier. A bare `Reference(A)` means
/// `level(A) >= 1`. The tree is immutable, every transformation produces a new tree.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Expression {
    Reference(String),
    Comparison(String, ComparisonOp, u32),
    Constant(Constant),
    Not(Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

/// Surface notation used when rendering rules.
///
/// Both notations are always accepted by the parser. In `Colon` notation, `A >= 2` is
/// written as `A:2` and `A < 2` as `!A:2`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RuleNotation {
    Colon,
    Operator,
}

/// One token of a rule string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    Identifier(String),
    Integer(u32),
    Boolean(bool),
    Not,                       // '!'
    And,                       // '&'
    Or,                        // '|'
    Xor,                       // '^'
    Comparator(ComparisonOp),  // '>=', '>', '<', '<=', '==', '!='
    Colon,                     // ':'
    ParenOpen,                 // '('
    ParenClose,                // ')'
    End,
}

/// A `Token` together with the (character) position where it starts in the rule string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub position: usize,
}

/// One row of a transition table: the rule under which `target` assumes `level`.
///
/// Missing `level` denotes a Boolean rule (implicit level 1).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransitionRow {
    pub target: String,
    pub level: Option<u32>,
    pub rule: Expression,
}

/// A single `(rule, result_level)` pair of an `UpdateFunction`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionTerm {
    pub rule: Expression,
    pub result_level: u32,
}

/// All rules of one target species, in the order in which they were authored.
///
/// Result levels are pairwise distinct and strictly positive. The default term (level `0`,
/// asserted when no rule holds) is implicit and never stored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateFunction {
    target: String,
    terms: Vec<FunctionTerm>,
}

/// Incrementally groups `TransitionRow`s into `UpdateFunction`s while validating
/// that no level of a target is defined twice.
#[derive(Clone, Debug, Default)]
pub struct TransitionGrouper {
    functions: Vec<UpdateFunction>,
    target_to_index: HashMap<String, usize>,
    boolean_targets: FxHashSet<String>,
    multi_valued_targets: FxHashSet<String>,
}

/// A set of already assigned identifiers. Used to canonicalize and deduplicate ids
/// within one logical sheet (species, transitions, ...).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IdScope {
    assigned: FxHashSet<String>,
}

/// Species declared in a model, with their display names and maximal levels.
///
/// The table resolves identifiers that appear in rules (raw ids, clean ids or names) to
/// clean ids, and clean ids back to labels for rendering.
///
/// Every species has a unique label: its display name, or its id when it has no name.
/// Labels share one scope, so a name never shadows the id-based label of another species.
#[derive(Clone, Debug, Default)]
pub struct SpeciesTable {
    ids: Vec<String>,
    id_scope: IdScope,
    label_scope: IdScope,
    raw_to_id: HashMap<String, String>,
    id_to_name: HashMap<String, String>,
    id_to_label: HashMap<String, String>,
    label_to_id: HashMap<String, String>,
    max_levels: HashMap<String, u32>,
}

/// Errors produced by the rule language and its codecs.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Unexpected character `{character}` at position {position}.")]
    Lex { position: usize, character: char },
    #[error("Syntax error at position {position}: expected {expected}.")]
    Syntax { position: usize, expected: String },
    #[error("Unknown species `{0}`.")]
    UnknownSpecies(String),
    #[error("Input `{0}` has no threshold level.")]
    UnresolvedThreshold(String),
    #[error("Malformed math: {0}")]
    MalformedMath(String),
    #[error("Target `{target}` defines level {level} more than once.")]
    DuplicateLevel { target: String, level: u32 },
    #[error("Target `{target}` mixes rules without a level and rules with levels other than 1.")]
    AmbiguousBoolean { target: String },
    #[error("Invalid level `{value}` for target `{target}`.")]
    InvalidLevel { target: String, value: String },
    #[error("{0}")]
    Document(String),
    #[error("Symbolic encoding failed: {0}")]
    Encoding(String),
}
