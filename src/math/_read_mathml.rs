use crate::math::{MathNode, MATHML};
use crate::{ComparisonOp, RuleError, SpeciesTable};
use roxmltree::{Document, ExpandedName, Node};
use std::collections::HashSet;

const APPLY_TAG: (&str, &str) = (MATHML, "apply");
const NUMBER_TAG: (&str, &str) = (MATHML, "cn");
const IDENTIFIER_TAG: (&str, &str) = (MATHML, "ci");
const TRUE_TAG: (&str, &str) = (MATHML, "true");
const FALSE_TAG: (&str, &str) = (MATHML, "false");

/// Read the content of a `<math>` element.
///
/// A `<ci>` is an `Input` if it names one of `input_ids`, otherwise it must refer to
/// a species declared in `species` (by id, or by name) and becomes a `Species` with the
/// clean id of that species.
pub fn read_mathml(
    math: Node,
    input_ids: &HashSet<String>,
    species: &SpeciesTable,
) -> Result<MathNode, RuleError> {
    let mut children = math.children().filter(|c| c.is_element());
    let first = children
        .next()
        .ok_or_else(|| RuleError::MalformedMath("Tag <math> has no children.".to_string()))?;
    if children.next().is_some() {
        return Err(RuleError::MalformedMath(
            "More than one child in a <math> tag.".to_string(),
        ));
    }
    let reader = Reader { input_ids, species };
    reader.read_expression(first)
}

/// Parse a standalone `<math>` document (see `read_mathml`).
pub fn read_mathml_str(
    xml: &str,
    input_ids: &HashSet<String>,
    species: &SpeciesTable,
) -> Result<MathNode, RuleError> {
    let document = Document::parse(xml).map_err(|e| RuleError::Document(e.to_string()))?;
    let root = document.root_element();
    if root.tag_name() != ExpandedName::from((MATHML, "math")) {
        return Err(RuleError::Document(format!(
            "Expected a <math> element, found <{}>.",
            root.tag_name().name()
        )));
    }
    read_mathml(root, input_ids, species)
}

/// **(internal)** Context needed to classify identifiers.
struct Reader<'a> {
    input_ids: &'a HashSet<String>,
    species: &'a SpeciesTable,
}

impl Reader<'_> {
    fn read_expression(&self, math: Node) -> Result<MathNode, RuleError> {
        let tag = math.tag_name();
        if tag == ExpandedName::from(IDENTIFIER_TAG) {
            let id = math.text().map(|s| s.trim()).unwrap_or("");
            if id.is_empty() {
                return Err(RuleError::MalformedMath("Empty math identifier.".to_string()));
            }
            if self.input_ids.contains(id) {
                return Ok(MathNode::Input(id.to_string()));
            }
            let species = self
                .species
                .resolve(id, false)
                .or_else(|_| self.species.resolve(id, true))?;
            return Ok(MathNode::Species(species));
        }
        if tag == ExpandedName::from(NUMBER_TAG) {
            return read_number(math).map(MathNode::Integer);
        }
        if tag == ExpandedName::from(TRUE_TAG) {
            return Ok(MathNode::Boolean(true));
        }
        if tag == ExpandedName::from(FALSE_TAG) {
            return Ok(MathNode::Boolean(false));
        }
        if tag == ExpandedName::from(APPLY_TAG) {
            return self.read_apply(math);
        }
        Err(RuleError::MalformedMath(format!(
            "Unexpected MathML tag `{}`.",
            tag.name()
        )))
    }

    fn read_apply(&self, apply: Node) -> Result<MathNode, RuleError> {
        let op_tag = apply.first_element_child().ok_or_else(|| {
            RuleError::MalformedMath("MathML <apply> with no child elements.".to_string())
        })?;
        let mut args = Vec::new();
        let mut arg = op_tag.next_sibling_element();
        while let Some(inner) = arg {
            args.push(self.read_expression(inner)?);
            arg = inner.next_sibling_element();
        }

        let op_name = op_tag.tag_name().name();
        if op_tag.tag_name().namespace() != Some(MATHML) {
            return Err(RuleError::MalformedMath(format!(
                "Unsupported MathML operator `{}`.",
                op_name
            )));
        }
        if let Some(op) = ComparisonOp::try_from_mathml_tag(op_name) {
            if args.len() != 2 {
                return Err(RuleError::MalformedMath(format!(
                    "Relation `{}` expects two arguments, {} given.",
                    op_name,
                    args.len()
                )));
            }
            let right = args.pop();
            let left = args.pop();
            return match (left, right) {
                (Some(left), Some(right)) => Ok(MathNode::mk_relational(op, left, right)),
                _ => Err(RuleError::MalformedMath(format!(
                    "Relation `{}` expects two arguments.",
                    op_name
                ))),
            };
        }
        match op_name {
            "and" => Ok(MathNode::And(args)),
            "or" => Ok(MathNode::Or(args)),
            "xor" => Ok(MathNode::Xor(args)),
            "not" => match args.pop() {
                Some(inner) if args.is_empty() => Ok(MathNode::mk_not(inner)),
                _ => Err(RuleError::MalformedMath(
                    "Operator `not` expects exactly one argument.".to_string(),
                )),
            },
            _ => Err(RuleError::MalformedMath(format!(
                "Unsupported MathML operator `{}`.",
                op_name
            ))),
        }
    }
}

/// **(internal)** Read an integral `<cn>` value. Real numbers are accepted when they
/// have no fractional part (`1.0`).
fn read_number(number: Node) -> Result<i64, RuleError> {
    let value = number.text().map(|s| s.trim()).unwrap_or("");
    if let Some(num_type) = number.attribute("type") {
        if !matches!(num_type, "integer" | "real" | "double") {
            return Err(RuleError::MalformedMath(format!(
                "Numeric type `{}` is not supported.",
                num_type
            )));
        }
    }
    if let Ok(parsed) = value.parse::<i64>() {
        return Ok(parsed);
    }
    match value.parse::<f64>() {
        Ok(parsed) if parsed.fract() == 0.0 && parsed.abs() < 1e15 => Ok(parsed as i64),
        _ => Err(RuleError::MalformedMath(format!(
            "Invalid integer constant: `{}`.",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::math::{read_mathml_str, MathNode, ThresholdMap};
    use crate::ComparisonOp::*;
    use crate::{Expression, RuleError, SpeciesTable};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use std::convert::TryFrom;

    fn math(content: &str) -> String {
        format!("<math xmlns=\"http://www.w3.org/1998/Math/MathML\">{}</math>", content)
    }

    fn species() -> SpeciesTable {
        let mut species = SpeciesTable::new();
        species.declare("ex", None, Some(2));
        species.declare("CI", Some("cI"), Some(2));
        species.declare("Cro", None, Some(3));
        species
    }

    fn inputs(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|it| it.to_string()).collect()
    }

    #[test]
    fn read_threshold_comparison() {
        let xml = math("<apply><geq/><ci> ex </ci><ci>theta_t9_ex</ci></apply>");
        let node = read_mathml_str(&xml, &inputs(&["theta_t9_ex"]), &species()).unwrap();
        assert_eq!(
            MathNode::mk_relational(
                Ge,
                MathNode::Species("ex".to_string()),
                MathNode::Input("theta_t9_ex".to_string())
            ),
            node
        );
        let mut thresholds = ThresholdMap::default();
        thresholds.insert("theta_t9_ex".to_string(), 1);
        assert_eq!(
            Ok(Expression::mk_reference("ex")),
            Expression::from_math(&node, &thresholds)
        );
    }

    #[test]
    fn read_nested_connectives() {
        let xml = math(
            "<apply><and/>\
                <apply><lt/><ci>CI</ci><cn type=\"integer\">2</cn></apply>\
                <apply><not/><apply><eq/><ci>Cro</ci><cn>1.0</cn></apply></apply>\
                <apply><or/><true/><apply><geq/><cn>0</cn><ci>cI</ci></apply></apply>\
            </apply>",
        );
        let node = read_mathml_str(&xml, &HashSet::new(), &species()).unwrap();
        let rule = Expression::from_math(&node, &ThresholdMap::default()).unwrap();
        let expected = Expression::try_from("CI < 2 & !Cro & (TRUE | !CI)").unwrap();
        assert_eq!(expected, rule);
    }

    #[test]
    fn read_rejects_unsupported_math() {
        let species = species();
        let no_inputs = HashSet::new();
        let cases = vec![
            math(""),
            math("<ci>ex</ci><ci>ex</ci>"),
            math("<apply><plus/><ci>ex</ci><cn>1</cn></apply>"),
            math("<apply><geq/><ci>ex</ci></apply>"),
            math("<apply><not/><ci>ex</ci><ci>ex</ci></apply>"),
            math("<apply><geq/><ci>ex</ci><cn>1.5</cn></apply>"),
            math("<apply><geq/><ci>ex</ci><cn type=\"rational\">1<sep/>2</cn></apply>"),
            math("<apply/>"),
            math("<ci></ci>"),
            math("<piecewise/>"),
        ];
        for xml in cases {
            let result = read_mathml_str(&xml, &no_inputs, &species);
            assert!(matches!(result, Err(RuleError::MalformedMath(_))), "{}", xml);
        }
    }

    #[test]
    fn read_unknown_identifier() {
        let xml = math("<apply><geq/><ci>theta</ci><cn>1</cn></apply>");
        assert_eq!(
            Err(RuleError::UnknownSpecies("theta".to_string())),
            read_mathml_str(&xml, &HashSet::new(), &species())
        );
        assert!(matches!(
            read_mathml_str("<math>", &HashSet::new(), &species()),
            Err(RuleError::Document(_))
        ));
        assert!(matches!(
            read_mathml_str("<apply/>", &HashSet::new(), &species()),
            Err(RuleError::Document(_))
        ));
    }
}
