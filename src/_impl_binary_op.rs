use crate::BinaryOp;
use crate::BinaryOp::*;
use std::fmt::{Display, Error, Formatter};

impl BinaryOp {
    /// Binding strength of the operator. Higher binds tighter. Negation has precedence `4`
    /// and atoms `5`.
    pub fn precedence(&self) -> u8 {
        match self {
            Or => 1,
            Xor => 2,
            And => 3,
        }
    }

    /// Name of the corresponding MathML element.
    pub fn mathml_tag(&self) -> &'static str {
        match self {
            Or => "or",
            Xor => "xor",
            And => "and",
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let symbol = match self {
            And => "&",
            Or => "|",
            Xor => "^",
        };
        write!(f, "{}", symbol)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::BinaryOp::*;

    #[test]
    fn binary_op_precedence_follows_declaration_order() {
        assert!(Or < Xor && Xor < And);
        assert!(Or.precedence() < Xor.precedence());
        assert!(Xor.precedence() < And.precedence());
        assert_eq!("&|^", format!("{}{}{}", And, Or, Xor));
    }
}
