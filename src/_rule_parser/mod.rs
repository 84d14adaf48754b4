use crate::{Expression, RuleError};
use std::collections::HashSet;
use std::convert::TryFrom;

/// **(internal)** Recursive descent parsing of `Lexeme` streams.
mod _parse;
/// **(internal)** Splitting of rule strings into `Lexeme`s.
mod _tokenize;

pub use _parse::parse;
pub use _tokenize::tokenize;

impl Expression {
    /// Parse a rule string. `known_identifiers` are species identifiers (or names) that may
    /// contain characters which would otherwise be read as operators, such as `/` or `-`.
    pub fn try_from_rule(
        rule: &str,
        known_identifiers: &HashSet<String>,
    ) -> Result<Expression, RuleError> {
        parse(&tokenize(rule, known_identifiers)?)
    }
}

impl TryFrom<&str> for Expression {
    type Error = RuleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Expression::try_from_rule(value, &HashSet::new())
    }
}
