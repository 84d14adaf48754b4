use crate::math::{MathNode, ThresholdMap};
use crate::ComparisonOp::*;
use crate::Expression::*;
use crate::{BinaryOp, Constant, Expression, RuleError};
use std::convert::TryFrom;

/// Replace every `Input` leaf of `node` with the threshold level of that input.
pub fn substitute_thresholds(
    node: &MathNode,
    thresholds: &ThresholdMap,
) -> Result<MathNode, RuleError> {
    let substitute_all = |args: &[MathNode]| -> Result<Vec<MathNode>, RuleError> {
        args.iter()
            .map(|it| substitute_thresholds(it, thresholds))
            .collect()
    };
    Ok(match node {
        MathNode::Input(id) => match thresholds.get(id) {
            Some(level) => MathNode::Integer(i64::from(*level)),
            None => return Err(RuleError::UnresolvedThreshold(id.clone())),
        },
        MathNode::And(args) => MathNode::And(substitute_all(args)?),
        MathNode::Or(args) => MathNode::Or(substitute_all(args)?),
        MathNode::Xor(args) => MathNode::Xor(substitute_all(args)?),
        MathNode::Not(inner) => MathNode::mk_not(substitute_thresholds(inner, thresholds)?),
        MathNode::Relational(op, left, right) => MathNode::mk_relational(
            *op,
            substitute_thresholds(left, thresholds)?,
            substitute_thresholds(right, thresholds)?,
        ),
        MathNode::Species(_) | MathNode::Integer(_) | MathNode::Boolean(_) => node.clone(),
    })
}

impl Expression {
    /// Convert a structured math tree into a rule.
    ///
    /// Input references are first replaced by their levels from `thresholds`. Afterwards,
    /// comparisons against `0` and `1` are simplified (see `simplify_thresholds`).
    pub fn from_math(node: &MathNode, thresholds: &ThresholdMap) -> Result<Expression, RuleError> {
        let node = substitute_thresholds(node, thresholds)?;
        Ok(Expression::from_substituted_math(&node)?.simplify_thresholds())
    }

    /// Rewrite comparisons of a species against `0` or `1` into (negated) references:
    ///
    /// `>= 1`, `> 0`, `== 1` and `!= 0` become `A`; `< 1`, `<= 0`, `== 0` and `!= 1`
    /// become `!A`. All other comparisons are kept.
    pub fn simplify_thresholds(&self) -> Expression {
        match self {
            Comparison(id, op, level) => match (op, level) {
                (Ge, 1) | (Gt, 0) | (Eq, 1) | (Neq, 0) => Reference(id.clone()),
                (Lt, 1) | (Le, 0) | (Eq, 0) | (Neq, 1) => Reference(id.clone()).negation(),
                _ => self.clone(),
            },
            Reference(_) | Constant(_) => self.clone(),
            Not(inner) => inner.simplify_thresholds().negation(),
            Binary(op, left, right) => {
                Expression::mk_binary(*op, left.simplify_thresholds(), right.simplify_thresholds())
            }
        }
    }

    /// **(internal)** Convert a math tree without input references.
    fn from_substituted_math(node: &MathNode) -> Result<Expression, RuleError> {
        match node {
            MathNode::And(args) => fold_nary(BinaryOp::And, args, true),
            MathNode::Or(args) => fold_nary(BinaryOp::Or, args, false),
            MathNode::Xor(args) => fold_nary(BinaryOp::Xor, args, false),
            MathNode::Not(inner) => Ok(Expression::from_substituted_math(inner)?.negation()),
            MathNode::Relational(op, left, right) => match (&**left, &**right) {
                (MathNode::Species(id), MathNode::Integer(level)) => {
                    Ok(Comparison(id.clone(), *op, read_level(*level)?))
                }
                (MathNode::Integer(level), MathNode::Species(id)) => {
                    Ok(Comparison(id.clone(), op.flip(), read_level(*level)?))
                }
                _ => Err(RuleError::MalformedMath(format!(
                    "Relation `{}` must compare a species with an integer level.",
                    op.mathml_tag()
                ))),
            },
            MathNode::Species(id) => Ok(Reference(id.clone())),
            MathNode::Integer(level) => Ok(Constant(Constant::Level(read_level(*level)?))),
            MathNode::Boolean(value) => Ok(Constant(Constant::Bool(*value))),
            MathNode::Input(id) => Err(RuleError::UnresolvedThreshold(id.clone())),
        }
    }
}

/// **(internal)** Fold arguments of an n-ary connective from the left. An empty
/// application is the `neutral` constant.
fn fold_nary(op: BinaryOp, args: &[MathNode], neutral: bool) -> Result<Expression, RuleError> {
    let mut args = args.iter();
    let mut result = match args.next() {
        Some(first) => Expression::from_substituted_math(first)?,
        None => return Ok(Constant(Constant::Bool(neutral))),
    };
    for arg in args {
        result = Expression::mk_binary(op, result, Expression::from_substituted_math(arg)?);
    }
    Ok(result)
}

fn read_level(value: i64) -> Result<u32, RuleError> {
    u32::try_from(value)
        .map_err(|_| RuleError::MalformedMath(format!("Invalid level `{}`.", value)))
}
