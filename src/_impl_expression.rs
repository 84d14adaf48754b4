use crate::Expression::*;
use crate::{BinaryOp, ComparisonOp, Constant, Expression, RuleError};
use std::collections::{HashMap, HashSet};

/// Constructor and destructor utility methods. These mainly avoid unnecessary boxing
/// and exhaustive pattern matching when not necessary.
impl Expression {
    /// Create a `true` rule.
    pub fn mk_true() -> Expression {
        Constant(Constant::Bool(true))
    }

    /// Create a `false` rule.
    pub fn mk_false() -> Expression {
        Constant(Constant::Bool(false))
    }

    /// Create a reference to a species, i.e. `level(id) >= 1`.
    pub fn mk_reference(id: &str) -> Expression {
        Reference(id.to_string())
    }

    /// Create a `level(id) 'op' level` rule.
    pub fn mk_comparison(id: &str, op: ComparisonOp, level: u32) -> Expression {
        Comparison(id.to_string(), op, level)
    }

    /// Create a `!phi` rule, where `phi` is an inner `Expression`.
    pub fn mk_not(inner: Expression) -> Expression {
        Not(Box::new(inner))
    }

    /// Create a `phi 'op' psi` where `phi` and `psi` are arguments of `op` operator.
    pub fn mk_binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
        Binary(op, Box::new(left), Box::new(right))
    }

    /// Negate this rule.
    pub fn negation(self) -> Expression {
        Expression::mk_not(self)
    }

    /// Create a conjunction.
    pub fn and(self, other: Expression) -> Expression {
        Expression::mk_binary(BinaryOp::And, self, other)
    }

    /// Create a disjunction.
    pub fn or(self, other: Expression) -> Expression {
        Expression::mk_binary(BinaryOp::Or, self, other)
    }

    /// Create an exclusive or.
    pub fn xor(self, other: Expression) -> Expression {
        Expression::mk_binary(BinaryOp::Xor, self, other)
    }

    /// If `Constant`, return the value, otherwise return `None`.
    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// If `Reference`, return the species id, otherwise return `None`.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Reference(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// If `Not`, return the inner rule, otherwise return `None`.
    pub fn as_not(&self) -> Option<&Expression> {
        match self {
            Not(inner) => Some(inner),
            _ => None,
        }
    }

    /// If `Binary`, return the operator and left/right rules, otherwise return `None`.
    pub fn as_binary(&self) -> Option<(&Expression, BinaryOp, &Expression)> {
        match self {
            Binary(op, l, r) => Some((l, *op, r)),
            _ => None,
        }
    }

    /// Binding strength of the top-level node (see `BinaryOp::precedence`).
    pub fn precedence(&self) -> u8 {
        match self {
            Binary(op, _, _) => op.precedence(),
            Not(_) => 4,
            Reference(_) | Comparison(_, _, _) | Constant(_) => 5,
        }
    }
}

impl Expression {
    /// Return a sorted vector of all species that are referenced in this rule.
    pub fn collect_species(&self) -> Vec<String> {
        let mut species = HashSet::new();
        self.walk_postorder(&mut |it| match it {
            Reference(id) | Comparison(id, _, _) => {
                species.insert(id.clone());
            }
            _ => (),
        });
        let mut result: Vec<String> = species.into_iter().collect();
        result.sort();
        result
    }

    /// The largest integer level that appears in this rule (in a comparison or as
    /// a constant). A bare reference counts as level `1`.
    pub fn max_mentioned_level(&self) -> u32 {
        let mut result = 0;
        self.walk_postorder(&mut |it| {
            let level = match it {
                Reference(_) => 1,
                Comparison(_, _, level) => *level,
                Constant(Constant::Level(level)) => *level,
                _ => 0,
            };
            result = result.max(level);
        });
        result
    }

    /// Iterate through all nodes of the syntax tree of this rule in post-order.
    pub fn walk_postorder<F>(&self, action: &mut F)
    where
        F: FnMut(&Expression),
    {
        match self {
            Reference(_) | Comparison(_, _, _) | Constant(_) => action(self),
            Not(inner) => {
                inner.walk_postorder(action);
                action(self);
            }
            Binary(_, left, right) => {
                left.walk_postorder(action);
                right.walk_postorder(action);
                action(self);
            }
        }
    }

    /// Create a copy of this rule where every species id is replaced by the value in
    /// `mapping`. Ids without a mapping are kept.
    pub fn rename_species(&self, mapping: &HashMap<String, String>) -> Expression {
        self.try_rename_species(&mut |id| {
            Ok(mapping.get(id).cloned().unwrap_or_else(|| id.to_string()))
        })
            .unwrap_or_else(|_: RuleError| self.clone())
    }

    /// Same as `rename_species`, but the new id is computed by a fallible `rename` function
    /// and the first error is returned.
    pub fn try_rename_species<F>(&self, rename: &mut F) -> Result<Expression, RuleError>
    where
        F: FnMut(&str) -> Result<String, RuleError>,
    {
        Ok(match self {
            Reference(id) => Reference(rename(id)?),
            Comparison(id, op, level) => Comparison(rename(id)?, *op, *level),
            Constant(_) => self.clone(),
            Not(inner) => inner.try_rename_species(rename)?.negation(),
            Binary(op, left, right) => {
                let left = left.try_rename_species(rename)?;
                let right = right.try_rename_species(rename)?;
                Expression::mk_binary(*op, left, right)
            }
        })
    }

    /// If possible, evaluate this rule using the given species levels.
    ///
    /// Returns `None` when the value depends on a species missing in `levels`. Some rules
    /// can still be decided (`false & A` is `false` regardless of `A`).
    pub fn evaluate(&self, levels: &HashMap<String, u32>) -> Option<bool> {
        match self {
            Reference(id) => levels.get(id).map(|level| *level >= 1),
            Comparison(id, op, threshold) => {
                levels.get(id).map(|level| op.holds(*level, *threshold))
            }
            Constant(Constant::Bool(value)) => Some(*value),
            Constant(Constant::Level(level)) => Some(*level > 0),
            Not(inner) => inner.evaluate(levels).map(|it| !it),
            Binary(op, left, right) => {
                let left = left.evaluate(levels);
                let right = right.evaluate(levels);
                match op {
                    BinaryOp::And => match (left, right) {
                        (Some(false), _) => Some(false),
                        (_, Some(false)) => Some(false),
                        (Some(true), Some(true)) => Some(true),
                        _ => None,
                    },
                    BinaryOp::Or => match (left, right) {
                        (Some(true), _) => Some(true),
                        (_, Some(true)) => Some(true),
                        (Some(false), Some(false)) => Some(false),
                        _ => None,
                    },
                    BinaryOp::Xor => match (left, right) {
                        (Some(left), Some(right)) => Some(left != right),
                        _ => None,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ComparisonOp::*;
    use crate::{Expression, RuleError};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::convert::TryFrom;

    fn levels(values: &[(&str, u32)]) -> HashMap<String, u32> {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn collect_species_is_sorted_and_unique() {
        let rule = Expression::try_from("(b | a:2) & !b ^ c != 1").unwrap();
        assert_eq!(vec!["a", "b", "c"], rule.collect_species());
        assert!(Expression::mk_true().collect_species().is_empty());
    }

    #[test]
    fn max_mentioned_level() {
        assert_eq!(3, Expression::try_from("a & b:3 | 2").unwrap().max_mentioned_level());
        assert_eq!(1, Expression::try_from("!a").unwrap().max_mentioned_level());
        assert_eq!(0, Expression::try_from("TRUE").unwrap().max_mentioned_level());
    }

    #[test]
    fn rename_species() {
        let rule = Expression::try_from("a & !b:2 | c").unwrap();
        let mut mapping = HashMap::new();
        mapping.insert("a".to_string(), "x".to_string());
        mapping.insert("b".to_string(), "y".to_string());
        let expected = Expression::try_from("x & !y:2 | c").unwrap();
        assert_eq!(expected, rule.rename_species(&mapping));
    }

    #[test]
    fn try_rename_species_fails_on_first_error() {
        let rule = Expression::try_from("a & b").unwrap();
        let result = rule.try_rename_species(&mut |id| {
            if id == "b" {
                Err(RuleError::UnknownSpecies(id.to_string()))
            } else {
                Ok(id.to_uppercase())
            }
        });
        assert_eq!(Err(RuleError::UnknownSpecies("b".to_string())), result);
    }

    #[test]
    fn evaluate_multi_valued_rules() {
        let rule = Expression::try_from("!CI:2 & Cro >= 1").unwrap();
        assert_eq!(Some(true), rule.evaluate(&levels(&[("CI", 1), ("Cro", 2)])));
        assert_eq!(Some(false), rule.evaluate(&levels(&[("CI", 2), ("Cro", 2)])));
        assert_eq!(Some(false), rule.evaluate(&levels(&[("CI", 2)])));
        assert_eq!(None, rule.evaluate(&levels(&[("CI", 0)])));

        let rule = Expression::try_from("a ^ b == 2").unwrap();
        assert_eq!(Some(true), rule.evaluate(&levels(&[("a", 0), ("b", 2)])));
        assert_eq!(Some(false), rule.evaluate(&levels(&[("a", 3), ("b", 2)])));
    }

    #[test]
    fn negated_reference_and_lower_comparison_agree() {
        let negation = Expression::try_from("!A").unwrap();
        let comparison = Expression::mk_comparison("A", Lt, 1);
        for level in 0..4 {
            let state = levels(&[("A", level)]);
            assert_eq!(negation.evaluate(&state), comparison.evaluate(&state));
        }
    }
}
