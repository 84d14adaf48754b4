use crate::ComparisonOp::{Ge, Lt};
use crate::Expression::*;
use crate::{BinaryOp, Constant, Expression, Lexeme, RuleError, Token};

/// Parse a `Lexeme` stream (as produced by `tokenize`) into an `Expression`.
///
/// Operators bind from loosest to tightest as `|`, `^`, `&`, `!`. Binary operators are
/// left-associative. `A:n` is read as `A >= n` and `!A:n` as `A < n`, but a free-standing
/// `!A` stays a negated reference.
pub fn parse(tokens: &[Lexeme]) -> Result<Expression, RuleError> {
    let mut parser = Parser { tokens, index: 0 };
    let result = parser.or()?;
    if parser.peek() != &Token::End {
        return Err(parser.error("a logical operator or the end of the rule"));
    }
    Ok(result)
}

static END: Token = Token::End;

/// **(internal)** A cursor over the token stream.
struct Parser<'a> {
    tokens: &'a [Lexeme],
    index: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &'a Token {
        self.tokens
            .get(self.index)
            .map(|it| &it.token)
            .unwrap_or(&END)
    }

    fn position(&self) -> usize {
        match self.tokens.get(self.index) {
            Some(lexeme) => lexeme.position,
            None => self.tokens.last().map(|it| it.position + 1).unwrap_or(0),
        }
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> RuleError {
        RuleError::Syntax {
            position: self.position(),
            expected: expected.to_string(),
        }
    }

    /// **(internal)** Parsing step 1: `|` operators.
    fn or(&mut self) -> Result<Expression, RuleError> {
        let mut result = self.xor()?;
        while self.peek() == &Token::Or {
            self.advance();
            let right = self.xor()?;
            result = Expression::mk_binary(BinaryOp::Or, result, right);
        }
        Ok(result)
    }

    /// **(internal)** Parsing step 2: `^` operators.
    fn xor(&mut self) -> Result<Expression, RuleError> {
        let mut result = self.and()?;
        while self.peek() == &Token::Xor {
            self.advance();
            let right = self.and()?;
            result = Expression::mk_binary(BinaryOp::Xor, result, right);
        }
        Ok(result)
    }

    /// **(internal)** Parsing step 3: `&` operators.
    fn and(&mut self) -> Result<Expression, RuleError> {
        let mut result = self.unary()?.0;
        while self.peek() == &Token::And {
            self.advance();
            let right = self.unary()?.0;
            result = Expression::mk_binary(BinaryOp::And, result, right);
        }
        Ok(result)
    }

    /// **(internal)** Parsing step 4: negations. The flag in the result is set when the
    /// expression is a comparison written in colon notation (`A:n`), since the negation
    /// of such comparison is folded into `A < n`.
    fn unary(&mut self) -> Result<(Expression, bool), RuleError> {
        if self.peek() != &Token::Not {
            return self.atom();
        }
        self.advance();
        let (inner, colon) = self.unary()?;
        if colon {
            if let Comparison(id, Ge, level) = inner {
                return Ok((Comparison(id, Lt, level), false));
            }
        }
        Ok((Expression::mk_not(inner), false))
    }

    /// **(internal)** Parsing step 5: parenthesized expressions, comparisons, references
    /// and constants.
    fn atom(&mut self) -> Result<(Expression, bool), RuleError> {
        match self.peek() {
            Token::ParenOpen => {
                self.advance();
                let inner = self.or()?;
                if self.peek() != &Token::ParenClose {
                    return Err(self.error("`)`"));
                }
                self.advance();
                Ok((inner, false))
            }
            Token::Identifier(id) => {
                self.advance();
                let result = match self.peek() {
                    Token::Comparator(op) => {
                        self.advance();
                        let level = self.level()?;
                        (Comparison(id.clone(), *op, level), false)
                    }
                    Token::Colon => {
                        self.advance();
                        let level = self.level()?;
                        (Comparison(id.clone(), Ge, level), true)
                    }
                    _ => (Reference(id.clone()), false),
                };
                if matches!(self.peek(), Token::Comparator(_) | Token::Colon) {
                    // Something like `A >= 1 >= 2` or `A:1:2`.
                    return Err(self.error("a logical operator"));
                }
                Ok(result)
            }
            Token::Integer(level) => {
                self.advance();
                if matches!(self.peek(), Token::Comparator(_) | Token::Colon) {
                    return Err(self.error("a species identifier on the left of a comparison"));
                }
                Ok((Expression::Constant(Constant::Level(*level)), false))
            }
            Token::Boolean(value) => {
                self.advance();
                Ok((Expression::Constant(Constant::Bool(*value)), false))
            }
            Token::Colon => Err(self.error("a species identifier before `:`")),
            _ => Err(self.error("an operand")),
        }
    }

    /// **(internal)** Read the integer level of a comparison.
    fn level(&mut self) -> Result<u32, RuleError> {
        match self.peek() {
            Token::Integer(level) => {
                let level = *level;
                self.advance();
                Ok(level)
            }
            _ => Err(self.error("an integer level")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ComparisonOp::*;
    use crate::Expression::*;
    use crate::{BinaryOp, Constant, Expression, RuleError};
    use pretty_assertions::assert_eq;
    use std::convert::TryFrom;

    fn parse(rule: &str) -> Expression {
        Expression::try_from(rule).unwrap()
    }

    fn var(id: &str) -> Expression {
        Reference(id.to_string())
    }

    fn cmp(id: &str, op: crate::ComparisonOp, level: u32) -> Expression {
        Comparison(id.to_string(), op, level)
    }

    #[test]
    fn parse_basic_conjunction() {
        assert_eq!(var("A").and(var("B")), parse("A & B"));
    }

    #[test]
    fn parse_colon_notation() {
        assert_eq!(cmp("CI", Lt, 2).and(cmp("Cro", Lt, 3)), parse("!CI:2 & !Cro:3"));
        assert_eq!(cmp("A", Ge, 2), parse("A:2"));
        assert_eq!(cmp("A", Ge, 1), parse("A:1"));
        // Only the negation directly applied to a colon comparison is folded.
        assert_eq!(Expression::mk_not(cmp("A", Lt, 2)), parse("!!A:2"));
        assert_eq!(Expression::mk_not(cmp("A", Ge, 2)), parse("!(A:2)"));
    }

    #[test]
    fn parse_free_standing_negation_is_kept() {
        assert_eq!(Expression::mk_not(var("A")), parse("!A"));
        assert_eq!(Expression::mk_not(cmp("A", Ge, 2)), parse("!A >= 2"));
    }

    #[test]
    fn parse_comparisons() {
        assert_eq!(cmp("a", Ge, 1), parse("a >= 1"));
        assert_eq!(cmp("a", Gt, 0), parse("a>0"));
        assert_eq!(cmp("a", Lt, 3), parse("a < 3"));
        assert_eq!(cmp("a", Le, 2), parse("a <= 2"));
        assert_eq!(cmp("a", Eq, 2), parse("a == 2"));
        assert_eq!(cmp("a", Eq, 2), parse("a = 2"));
        assert_eq!(cmp("a", Neq, 0), parse("a != 0"));
    }

    #[test]
    fn parse_constants() {
        assert_eq!(Constant(Constant::Bool(true)), parse("TRUE"));
        assert_eq!(Constant(Constant::Bool(false)), parse("false"));
        assert_eq!(Constant(Constant::Level(1)), parse("1"));
        assert_eq!(Constant(Constant::Level(0)), parse("(0)"));
    }

    #[test]
    fn operator_priority_test() {
        // a | (b ^ (c & !d))
        let expected = var("a").or(var("b").xor(var("c").and(Expression::mk_not(var("d")))));
        assert_eq!(expected, parse("a | b ^ c & !d"));
        // ((a & b) ^ c) | d
        let expected = var("a").and(var("b")).xor(var("c")).or(var("d"));
        assert_eq!(expected, parse("a & b ^ c | d"));
        // Parentheses override priority.
        let expected = var("a").and(var("b").or(var("c")));
        assert_eq!(expected, parse("a & (b | c)"));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let expected = Expression::mk_binary(
            BinaryOp::And,
            Expression::mk_binary(BinaryOp::And, var("a"), var("b")),
            var("c"),
        );
        assert_eq!(expected, parse("a & b & c"));
    }

    #[test]
    fn test_invalid_parentheses() {
        assert!(Expression::try_from("a & (b | c").is_err());
        assert!(Expression::try_from("(a | b))").is_err());
        assert!(Expression::try_from("()").is_err());
        assert!(Expression::try_from(")a(").is_err());
    }

    #[test]
    fn test_missing_operand() {
        assert!(Expression::try_from("").is_err());
        assert!(Expression::try_from("a &").is_err());
        assert!(Expression::try_from("a & !").is_err());
        assert!(Expression::try_from("a & | b").is_err());
        assert!(Expression::try_from("^a").is_err());
        assert!(Expression::try_from("a b").is_err());
    }

    #[test]
    fn test_malformed_comparisons() {
        assert!(Expression::try_from("a >= 1 >= 2").is_err());
        assert!(Expression::try_from("a:1:2").is_err());
        assert!(Expression::try_from("a:1 >= 2").is_err());
        assert!(Expression::try_from("a >= b").is_err());
        assert!(Expression::try_from("a:").is_err());
        assert!(Expression::try_from(":2").is_err());
        assert!(Expression::try_from("!:2").is_err());
        assert!(Expression::try_from("2 >= a").is_err());
    }

    #[test]
    fn syntax_errors_carry_position() {
        assert_eq!(
            Err(RuleError::Syntax {
                position: 4,
                expected: "an operand".to_string()
            }),
            Expression::try_from("a & ")
        );
        assert_eq!(
            Err(RuleError::Syntax {
                position: 6,
                expected: "`)`".to_string()
            }),
            Expression::try_from("(a & b")
        );
    }
}
