//! The structured math form of transition rules, as used by SBML-qual function terms.
//!
//! A `MathNode` tree mirrors the subset of content MathML that appears in qualitative
//! models. `Expression::to_math` and `Expression::from_math` convert between rules and
//! this form; `read_mathml` and the `Display` implementation of `MathNode` transport it
//! to and from XML.

use crate::ComparisonOp;
use fxhash::FxHashMap;

pub const MATHML: &str = "http://www.w3.org/1998/Math/MathML";

/// **(internal)** `Expression` to `MathNode`.
mod _impl_to_math;
/// **(internal)** `MathNode` to `Expression`, including threshold substitution
/// and simplification of comparisons against `0` and `1`.
mod _impl_from_math;
/// **(internal)** Reading `MathNode` trees from `roxmltree` documents.
mod _read_mathml;
/// **(internal)** Writing `MathNode` trees as MathML.
mod _write_mathml;

pub use _impl_from_math::substitute_thresholds;
pub use _read_mathml::{read_mathml, read_mathml_str};
pub(crate) use _write_mathml::escape_xml;

/// Node of a structured math tree.
///
/// Logical connectives are n-ary. `Species` refers to the current level of a species,
/// `Input` to the threshold level of a transition input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MathNode {
    And(Vec<MathNode>),
    Or(Vec<MathNode>),
    Xor(Vec<MathNode>),
    Not(Box<MathNode>),
    Relational(ComparisonOp, Box<MathNode>, Box<MathNode>),
    Species(String),
    Input(String),
    Integer(i64),
    Boolean(bool),
}

/// Threshold levels of transition inputs, keyed by the input id.
pub type ThresholdMap = FxHashMap<String, u32>;

impl MathNode {
    /// Create a `left 'op' right` node.
    pub fn mk_relational(op: ComparisonOp, left: MathNode, right: MathNode) -> MathNode {
        MathNode::Relational(op, Box::new(left), Box::new(right))
    }

    /// Create a `!inner` node.
    pub fn mk_not(inner: MathNode) -> MathNode {
        MathNode::Not(Box::new(inner))
    }

    /// Ids of all inputs referenced in this tree.
    pub fn collect_inputs(&self) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_inputs_into(&mut result);
        result.sort();
        result.dedup();
        result
    }

    fn collect_inputs_into(&self, result: &mut Vec<String>) {
        match self {
            MathNode::And(args) | MathNode::Or(args) | MathNode::Xor(args) => {
                for arg in args {
                    arg.collect_inputs_into(result);
                }
            }
            MathNode::Not(inner) => inner.collect_inputs_into(result),
            MathNode::Relational(_, left, right) => {
                left.collect_inputs_into(result);
                right.collect_inputs_into(result);
            }
            MathNode::Input(id) => result.push(id.clone()),
            MathNode::Species(_) | MathNode::Integer(_) | MathNode::Boolean(_) => (),
        }
    }
}
