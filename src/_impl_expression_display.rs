use crate::ComparisonOp::{Ge, Lt};
use crate::Expression::*;
use crate::{Constant, Expression, RuleNotation, SpeciesTable};
use std::fmt::{Display, Error, Formatter};

impl Expression {
    /// Render this rule as a string in the given `notation`, referring to species by id.
    ///
    /// The output contains no whitespace and the minimal amount of parentheses needed
    /// for `parse` to rebuild the same tree.
    pub fn render(&self, notation: RuleNotation) -> String {
        let mut output = String::new();
        self.write_rule(notation, &|id: &str| id.to_string(), &mut output);
        output
    }

    /// Same as `render`, but species are labelled using `species`: by their declared name
    /// if `use_names` is set (quoted when the name is not a valid identifier), otherwise
    /// by id.
    pub fn render_with(
        &self,
        notation: RuleNotation,
        species: &SpeciesTable,
        use_names: bool,
    ) -> String {
        let mut output = String::new();
        self.write_rule(notation, &|id: &str| species.label(id, use_names), &mut output);
        output
    }

    /// **(internal)** Append this rule to `output`.
    fn write_rule(
        &self,
        notation: RuleNotation,
        label: &dyn Fn(&str) -> String,
        output: &mut String,
    ) {
        match self {
            Reference(id) => output.push_str(&label(id)),
            Comparison(id, op, level) => match (notation, op) {
                (RuleNotation::Colon, Ge) => {
                    output.push_str(&label(id));
                    if *level != 1 {
                        output.push_str(&format!(":{}", level));
                    }
                }
                (RuleNotation::Colon, Lt) => {
                    output.push('!');
                    output.push_str(&label(id));
                    if *level != 1 {
                        output.push_str(&format!(":{}", level));
                    }
                }
                _ => output.push_str(&format!("{}{}{}", label(id), op, level)),
            },
            Constant(Constant::Bool(true)) => output.push_str("TRUE"),
            Constant(Constant::Bool(false)) => output.push_str("FALSE"),
            Constant(Constant::Level(level)) => output.push_str(&level.to_string()),
            Not(inner) => {
                output.push('!');
                // `!A:2` would be read back as `A < 2`.
                let colon_suffix = notation == RuleNotation::Colon
                    && matches!(**inner, Comparison(_, Ge, level) if level != 1);
                if colon_suffix || inner.precedence() < self.precedence() {
                    output.push('(');
                    inner.write_rule(notation, label, output);
                    output.push(')');
                } else {
                    inner.write_rule(notation, label, output);
                }
            }
            Binary(op, left, right) => {
                let precedence = op.precedence();
                let left_parens = left.precedence() < precedence;
                let right_parens = right.precedence() <= precedence;
                write_operand(left, left_parens, notation, label, output);
                output.push_str(&op.to_string());
                write_operand(right, right_parens, notation, label, output);
            }
        }
    }
}

fn write_operand(
    operand: &Expression,
    parenthesize: bool,
    notation: RuleNotation,
    label: &dyn Fn(&str) -> String,
    output: &mut String,
) {
    if parenthesize {
        output.push('(');
    }
    operand.write_rule(notation, label, output);
    if parenthesize {
        output.push(')');
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.render(RuleNotation::Operator))
    }
}

#[cfg(test)]
mod tests {
    use crate::ComparisonOp::*;
    use crate::RuleNotation::{Colon, Operator};
    use crate::{BinaryOp, Expression, SpeciesTable};
    use pretty_assertions::assert_eq;
    use std::convert::TryFrom;

    fn parse(rule: &str) -> Expression {
        Expression::try_from(rule).unwrap()
    }

    #[test]
    fn render_basic_rules() {
        assert_eq!("A&B", parse("A & B").render(Operator));
        assert_eq!("A&B", parse("A & B").to_string());
        assert_eq!("!CI<2&Cro<3", parse("!CI:2 & !Cro:3").render(Operator));
        assert_eq!("!CI:2&!Cro:3", parse("!CI:2 & !Cro:3").render(Colon));
        assert_eq!("TRUE|FALSE^2", parse("true | false ^ 2").render(Operator));
    }

    #[test]
    fn render_colon_shorthand() {
        let a = |op, level| Expression::mk_comparison("A", op, level);
        assert_eq!("A", a(Ge, 1).render(Colon));
        assert_eq!("A:2", a(Ge, 2).render(Colon));
        assert_eq!("!A", a(Lt, 1).render(Colon));
        assert_eq!("!A:3", a(Lt, 3).render(Colon));
        assert_eq!("A>2", a(Gt, 2).render(Colon));
        assert_eq!("A==0", a(Eq, 0).render(Colon));
        assert_eq!("A>=2", a(Ge, 2).render(Operator));
        assert_eq!("!(A:2)", a(Ge, 2).negation().render(Colon));
    }

    #[test]
    fn render_minimal_parentheses() {
        assert_eq!("a|b^c&!d", parse("a | (b ^ (c & !d))").render(Operator));
        assert_eq!("(a|b)&c", parse("(a | b) & c").render(Operator));
        assert_eq!("a&b&c", parse("((a & b) & c)").render(Operator));
        assert_eq!("a&(b&c)", parse("a & (b & c)").render(Operator));
        assert_eq!("!(a|b)", parse("!(a | b)").render(Operator));
        assert_eq!("!!a", parse("!!a").render(Operator));
    }

    #[test]
    fn render_parse_round_trip() {
        let rules = vec![
            "a",
            "!a",
            "a>=2&b<3",
            "!(a:2)|!b:2",
            "(a|b)^(c&d)",
            "a^(b^c)",
            "!(a&b)|c!=1&d==2",
            "TRUE&a<=1",
            "0|a>0",
        ];
        for rule in rules {
            let expression = parse(rule);
            for notation in [Operator, Colon] {
                let rendered = expression.render(notation);
                assert_eq!(expression, parse(&rendered), "{}", rendered);
            }
        }
    }

    #[test]
    fn render_right_nested_trees() {
        let right_nested = Expression::mk_binary(
            BinaryOp::Or,
            Expression::mk_reference("a"),
            Expression::mk_reference("b").or(Expression::mk_reference("c")),
        );
        let rendered = right_nested.render(Operator);
        assert_eq!("a|(b|c)", rendered);
        assert_eq!(right_nested, parse(&rendered));
    }

    #[test]
    fn render_with_names() {
        let mut species = SpeciesTable::new();
        species.declare("cycd", Some("Cyclin D"), None);
        species.declare("rb", Some("Rb"), None);
        let rule = Expression::mk_comparison("cycd", Ge, 2)
            .and(Expression::mk_reference("rb").negation());
        assert_eq!("\"Cyclin D\":2&!Rb", rule.render_with(Colon, &species, true));
        assert_eq!("cycd>=2&!rb", rule.render_with(Operator, &species, false));
    }
}
