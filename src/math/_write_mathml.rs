use crate::math::{MathNode, MATHML};
use crate::BinaryOp;
use std::fmt::{Display, Error, Formatter};
use std::io::Write;

impl MathNode {
    /// Write this tree as a complete `<math>` element.
    pub fn write_mathml(&self, out: &mut dyn Write) -> Result<(), std::io::Error> {
        write!(out, "<math xmlns=\"{}\">{}</math>", MATHML, self)?;
        Ok(())
    }

    /// This tree as a complete `<math>` element.
    pub fn to_mathml(&self) -> String {
        format!("<math xmlns=\"{}\">{}</math>", MATHML, self)
    }
}

/// Writes the MathML content of the node (without the enclosing `<math>` element).
impl Display for MathNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            MathNode::And(args) => write_apply(f, BinaryOp::And.mathml_tag(), args)?,
            MathNode::Or(args) => write_apply(f, BinaryOp::Or.mathml_tag(), args)?,
            MathNode::Xor(args) => write_apply(f, BinaryOp::Xor.mathml_tag(), args)?,
            MathNode::Not(inner) => write!(f, "<apply><not/>{}</apply>", inner)?,
            MathNode::Relational(op, left, right) => {
                write!(f, "<apply><{}/>{}{}</apply>", op.mathml_tag(), left, right)?
            }
            MathNode::Species(id) | MathNode::Input(id) => {
                write!(f, "<ci>{}</ci>", escape_xml(id))?
            }
            MathNode::Integer(value) => write!(f, "<cn type=\"integer\">{}</cn>", value)?,
            MathNode::Boolean(true) => write!(f, "<true/>")?,
            MathNode::Boolean(false) => write!(f, "<false/>")?,
        }
        Ok(())
    }
}

fn write_apply(f: &mut Formatter<'_>, tag: &str, args: &[MathNode]) -> Result<(), Error> {
    write!(f, "<apply><{}/>", tag)?;
    for arg in args {
        write!(f, "{}", arg)?;
    }
    write!(f, "</apply>")
}

/// Escape the characters that cannot appear verbatim in XML text or attribute values.
pub(crate) fn escape_xml(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
