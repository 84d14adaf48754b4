//! Reading and writing of SBML-qual `<qual:transition>` elements.
//!
//! Only the transition part of a qualitative model is handled here. The rest of the
//! document (species, compartments, model metadata) is left to the caller.

use crate::math::MathNode;
use crate::RuleError;
use roxmltree::{ExpandedName, Node};

pub const SBML_QUAL: &str = "http://www.sbml.org/sbml/level3/version1/qual/version1";

/// **(internal)** Reading `QualTransition`s from XML and converting them to `UpdateFunction`s.
mod _read_transitions;
/// **(internal)** Writing `UpdateFunction`s as `QualTransition`s.
mod _write_transitions;

pub use _read_transitions::{read_transition, read_transitions, read_transitions_from_str};
pub use _write_transitions::write_transitions;

/// Maps almost directly to the SBML-qual transition input tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QualInput {
    pub id: Option<String>,
    pub species: String,
    pub threshold_level: Option<u32>,
    pub transition_effect: Option<String>,
    pub sign: Option<String>,
}

/// Maps almost directly to the SBML-qual transition output tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QualOutput {
    pub id: Option<String>,
    pub species: String,
    pub transition_effect: Option<String>,
}

/// A transition term. The default term has no math.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QualTerm {
    pub result_level: u32,
    pub math: Option<MathNode>,
}

/// One `<qual:transition>` element. Species references are clean species ids.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QualTransition {
    pub id: Option<String>,
    pub name: Option<String>,
    pub inputs: Vec<QualInput>,
    pub outputs: Vec<QualOutput>,
    pub default_term: Option<QualTerm>,
    pub function_terms: Vec<QualTerm>,
}

/// **(internal)** Find the given tag in a parent `Node`. Returns error if the tag does
/// not exist or is present in multiple instances.
fn read_unique_child<'a, 'input: 'a>(
    parent: Node<'a, 'input>,
    name: (&'static str, &'static str),
) -> Result<Node<'a, 'input>, RuleError> {
    let name = ExpandedName::from(name);
    let mut tags = parent.children().filter(|node| node.tag_name() == name);
    match (tags.next(), tags.next()) {
        (Some(fst), None) => Ok(fst),
        (Some(_), Some(_)) => Err(RuleError::Document(format!(
            "Multiple {} found in {}.",
            name.name(),
            parent.tag_name().name()
        ))),
        (None, _) => Err(RuleError::Document(format!(
            "Could not find tag {} in {}.",
            name.name(),
            parent.tag_name().name()
        ))),
    }
}

/// **(internal)** Same as `read_unique_child`, but a missing tag is not an error.
fn read_optional_child<'a, 'input: 'a>(
    parent: Node<'a, 'input>,
    name: (&'static str, &'static str),
) -> Result<Option<Node<'a, 'input>>, RuleError> {
    if child_tags(parent, name).is_empty() {
        Ok(None)
    } else {
        read_unique_child(parent, name).map(Some)
    }
}

/// **(internal)** Find all child `Nodes` that have a given name.
fn child_tags<'a, 'input: 'a>(
    parent: Node<'a, 'input>,
    name: (&'static str, &'static str),
) -> Vec<Node<'a, 'input>> {
    let name = ExpandedName::from(name);
    parent.children().filter(|n| n.tag_name() == name).collect()
}
