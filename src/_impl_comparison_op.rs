use crate::ComparisonOp;
use crate::ComparisonOp::*;
use std::fmt::{Display, Error, Formatter};

impl ComparisonOp {
    /// All comparison operators, in a fixed order.
    pub const ALL: [ComparisonOp; 6] = [Ge, Gt, Lt, Le, Eq, Neq];

    /// The operator that gives the same result when the operands are swapped
    /// (`a < b` is `b > a`).
    pub fn flip(&self) -> ComparisonOp {
        match self {
            Ge => Le,
            Gt => Lt,
            Lt => Gt,
            Le => Ge,
            Eq => Eq,
            Neq => Neq,
        }
    }

    /// Evaluate `left op right`.
    pub fn holds(&self, left: u32, right: u32) -> bool {
        match self {
            Ge => left >= right,
            Gt => left > right,
            Lt => left < right,
            Le => left <= right,
            Eq => left == right,
            Neq => left != right,
        }
    }

    /// Name of the corresponding MathML relational element.
    pub fn mathml_tag(&self) -> &'static str {
        match self {
            Ge => "geq",
            Gt => "gt",
            Lt => "lt",
            Le => "leq",
            Eq => "eq",
            Neq => "neq",
        }
    }

    /// Inverse of `mathml_tag`.
    pub fn try_from_mathml_tag(tag: &str) -> Option<ComparisonOp> {
        Self::ALL.iter().copied().find(|op| op.mathml_tag() == tag)
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let symbol = match self {
            Ge => ">=",
            Gt => ">",
            Lt => "<",
            Le => "<=",
            Eq => "==",
            Neq => "!=",
        };
        write!(f, "{}", symbol)
    }
}
