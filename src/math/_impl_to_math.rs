use crate::math::MathNode;
use crate::ComparisonOp::Ge;
use crate::Expression::*;
use crate::{BinaryOp, Constant, Expression, RuleError, SpeciesTable};

impl Expression {
    /// Convert this rule into the structured math form.
    ///
    /// Every species must be declared in `species`. It is referenced by its id, or by its
    /// (unquoted) label if `use_names` is set. A `Reference` becomes `level >= 1`.
    pub fn to_math(
        &self,
        species: &SpeciesTable,
        use_names: bool,
    ) -> Result<MathNode, RuleError> {
        let resolve = |id: &str| -> Result<MathNode, RuleError> {
            if !species.contains(id) {
                return Err(RuleError::UnknownSpecies(id.to_string()));
            }
            let label = if use_names {
                species.display_label(id)
            } else {
                id
            };
            Ok(MathNode::Species(label.to_string()))
        };
        self.to_math_with(&resolve)
    }

    /// **(internal)** Recursive part of `to_math` with a fixed species resolver.
    fn to_math_with(
        &self,
        resolve: &dyn Fn(&str) -> Result<MathNode, RuleError>,
    ) -> Result<MathNode, RuleError> {
        Ok(match self {
            Reference(id) => MathNode::mk_relational(Ge, resolve(id)?, MathNode::Integer(1)),
            Comparison(id, op, level) => {
                MathNode::mk_relational(*op, resolve(id)?, MathNode::Integer(i64::from(*level)))
            }
            Constant(Constant::Bool(value)) => MathNode::Boolean(*value),
            Constant(Constant::Level(level)) => MathNode::Integer(i64::from(*level)),
            Not(inner) => MathNode::mk_not(inner.to_math_with(resolve)?),
            Binary(op, left, right) => {
                let args = vec![left.to_math_with(resolve)?, right.to_math_with(resolve)?];
                match op {
                    BinaryOp::And => MathNode::And(args),
                    BinaryOp::Or => MathNode::Or(args),
                    BinaryOp::Xor => MathNode::Xor(args),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::math::MathNode;
    use crate::ComparisonOp::*;
    use crate::{Expression, RuleError, SpeciesTable};
    use pretty_assertions::assert_eq;
    use std::convert::TryFrom;

    fn species() -> SpeciesTable {
        let mut species = SpeciesTable::new();
        species.declare("CI", Some("cI"), Some(2));
        species.declare("Cro", None, Some(3));
        species
    }

    #[test]
    fn to_math_structure() {
        let rule = Expression::try_from("!CI:2 & (Cro | TRUE)").unwrap();
        let expected = MathNode::And(vec![
            MathNode::mk_relational(Lt, MathNode::Species("CI".to_string()), MathNode::Integer(2)),
            MathNode::Or(vec![
                MathNode::mk_relational(
                    Ge,
                    MathNode::Species("Cro".to_string()),
                    MathNode::Integer(1),
                ),
                MathNode::Boolean(true),
            ]),
        ]);
        assert_eq!(Ok(expected), rule.to_math(&species(), false));
    }

    #[test]
    fn to_math_with_names() {
        let rule = Expression::try_from("!CI").unwrap();
        let expected = MathNode::mk_not(MathNode::mk_relational(
            Ge,
            MathNode::Species("cI".to_string()),
            MathNode::Integer(1),
        ));
        assert_eq!(Ok(expected), rule.to_math(&species(), true));
    }

    #[test]
    fn to_math_unknown_species() {
        let rule = Expression::try_from("CI ^ N >= 2").unwrap();
        assert_eq!(
            Err(RuleError::UnknownSpecies("N".to_string())),
            rule.to_math(&species(), false)
        );
    }
}
