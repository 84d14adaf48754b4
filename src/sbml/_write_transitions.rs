use crate::math::{escape_xml, MATHML};
use crate::sbml::{QualInput, QualOutput, QualTerm, QualTransition, SBML_QUAL};
use crate::{RuleError, SpeciesTable, UpdateFunction};
use std::fmt::{Display, Error, Formatter};
use std::io::Write;

impl UpdateFunction {
    /// Create the `<qual:transition>` of this function with the given transition `id`.
    ///
    /// Every referenced species becomes an input (sorted by id, `transitionEffect="none"`),
    /// the target is the only output (`assignmentLevel`), the default term has level `0`.
    pub fn to_qual_transition(
        &self,
        id: &str,
        species: &SpeciesTable,
    ) -> Result<QualTransition, RuleError> {
        if !species.contains(self.target()) {
            return Err(RuleError::UnknownSpecies(self.target().to_string()));
        }
        let inputs = self
            .collect_species()
            .into_iter()
            .map(|input| QualInput {
                id: Some(format!("{}_in_{}", id, input)),
                species: input,
                threshold_level: None,
                transition_effect: Some("none".to_string()),
                sign: None,
            })
            .collect();
        let output = QualOutput {
            id: Some(format!("{}_out", id)),
            species: self.target().to_string(),
            transition_effect: Some("assignmentLevel".to_string()),
        };
        let function_terms = self
            .terms()
            .iter()
            .map(|term| {
                Ok(QualTerm {
                    result_level: term.result_level,
                    math: Some(term.rule.to_math(species, false)?),
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;
        Ok(QualTransition {
            id: Some(id.to_string()),
            name: None,
            inputs,
            outputs: vec![output],
            default_term: Some(QualTerm {
                result_level: UpdateFunction::DEFAULT_LEVEL,
                math: None,
            }),
            function_terms,
        })
    }
}

/// Write the transitions as a `<qual:listOfTransitions>` element.
pub fn write_transitions(
    transitions: &[QualTransition],
    out: &mut dyn Write,
) -> Result<(), std::io::Error> {
    write!(out, "<qual:listOfTransitions xmlns:qual=\"{}\">", SBML_QUAL)?;
    for transition in transitions {
        write!(out, "{}", transition)?;
    }
    write!(out, "</qual:listOfTransitions>")?;
    Ok(())
}

/// Writes the `<qual:transition>` element. The `qual` prefix must be bound by the
/// enclosing document.
impl Display for QualTransition {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "<qual:transition")?;
        write_attribute(f, "id", self.id.as_deref())?;
        write_attribute(f, "name", self.name.as_deref())?;
        write!(f, ">")?;

        if !self.inputs.is_empty() {
            write!(f, "<qual:listOfInputs>")?;
            for input in &self.inputs {
                write!(f, "<qual:input")?;
                write_attribute(f, "id", input.id.as_deref())?;
                write_attribute(f, "qualitativeSpecies", Some(input.species.as_str()))?;
                let threshold = input.threshold_level.map(|it| it.to_string());
                write_attribute(f, "thresholdLevel", threshold.as_deref())?;
                write_attribute(f, "transitionEffect", input.transition_effect.as_deref())?;
                write_attribute(f, "sign", input.sign.as_deref())?;
                write!(f, "/>")?;
            }
            write!(f, "</qual:listOfInputs>")?;
        }

        write!(f, "<qual:listOfOutputs>")?;
        for output in &self.outputs {
            write!(f, "<qual:output")?;
            write_attribute(f, "id", output.id.as_deref())?;
            write_attribute(f, "qualitativeSpecies", Some(output.species.as_str()))?;
            write_attribute(f, "transitionEffect", output.transition_effect.as_deref())?;
            write!(f, "/>")?;
        }
        write!(f, "</qual:listOfOutputs>")?;

        if let Some(default_term) = &self.default_term {
            write!(f, "<qual:listOfFunctionTerms>")?;
            write!(
                f,
                "<qual:defaultTerm qual:resultLevel=\"{}\"/>",
                default_term.result_level
            )?;
            for term in &self.function_terms {
                write!(f, "<qual:functionTerm qual:resultLevel=\"{}\">", term.result_level)?;
                if let Some(math) = &term.math {
                    write!(f, "<math xmlns=\"{}\">{}</math>", MATHML, math)?;
                }
                write!(f, "</qual:functionTerm>")?;
            }
            write!(f, "</qual:listOfFunctionTerms>")?;
        }
        write!(f, "</qual:transition>")
    }
}

fn write_attribute(f: &mut Formatter<'_>, name: &str, value: Option<&str>) -> Result<(), Error> {
    if let Some(value) = value {
        write!(f, " qual:{}=\"{}\"", name, escape_xml(value))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::sbml::{read_transitions_from_str, write_transitions};
    use crate::{Expression, RuleError, SpeciesTable, TransitionRow, UpdateFunction};
    use pretty_assertions::assert_eq;
    use std::convert::TryFrom;

    fn species() -> SpeciesTable {
        let mut species = SpeciesTable::new();
        species.declare("CI", None, Some(2));
        species.declare("Cro", None, Some(3));
        species.declare("N", None, Some(1));
        species
    }

    fn row(target: &str, level: u32, rule: &str) -> TransitionRow {
        TransitionRow {
            target: target.to_string(),
            level: Some(level),
            rule: Expression::try_from(rule).unwrap(),
        }
    }

    #[test]
    fn write_transition_structure() {
        let function = UpdateFunction::group(&[row("N", 1, "!Cro:2 & CI")]).unwrap().remove(0);
        let transition = function.to_qual_transition("tr_N", &species()).unwrap();
        assert_eq!(
            "<qual:transition qual:id=\"tr_N\">\
                <qual:listOfInputs>\
                    <qual:input qual:id=\"tr_N_in_CI\" qual:qualitativeSpecies=\"CI\" qual:transitionEffect=\"none\"/>\
                    <qual:input qual:id=\"tr_N_in_Cro\" qual:qualitativeSpecies=\"Cro\" qual:transitionEffect=\"none\"/>\
                </qual:listOfInputs>\
                <qual:listOfOutputs>\
                    <qual:output qual:id=\"tr_N_out\" qual:qualitativeSpecies=\"N\" qual:transitionEffect=\"assignmentLevel\"/>\
                </qual:listOfOutputs>\
                <qual:listOfFunctionTerms>\
                    <qual:defaultTerm qual:resultLevel=\"0\"/>\
                    <qual:functionTerm qual:resultLevel=\"1\">\
                        <math xmlns=\"http://www.w3.org/1998/Math/MathML\">\
                            <apply><and/>\
                                <apply><lt/><ci>Cro</ci><cn type=\"integer\">2</cn></apply>\
                                <apply><geq/><ci>CI</ci><cn type=\"integer\">1</cn></apply>\
                            </apply>\
                        </math>\
                    </qual:functionTerm>\
                </qual:listOfFunctionTerms>\
            </qual:transition>",
            transition.to_string()
        );
    }

    #[test]
    fn write_then_read_transitions() {
        let species = species();
        let rows = vec![
            row("Cro", 3, "!CI"),
            row("Cro", 2, "!CI:2 | N"),
            row("Cro", 1, "CI != 2 ^ TRUE"),
            row("CI", 2, "!Cro:3"),
            row("N", 1, "Cro >= 1 & !(CI == 0)"),
        ];
        let functions = UpdateFunction::group(&rows).unwrap();
        let transitions = functions
            .iter()
            .map(|it| it.to_qual_transition(&format!("tr_{}", it.target()), &species))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let mut buffer: Vec<u8> = Vec::new();
        write_transitions(&transitions, &mut buffer).unwrap();
        let xml = String::from_utf8(buffer).unwrap();
        let read = read_transitions_from_str(&xml, &species).unwrap();
        assert_eq!(transitions, read);

        for (function, transition) in functions.iter().zip(read.iter()) {
            let mut warnings = Vec::new();
            let back = transition.to_update_function(&mut warnings).unwrap();
            assert!(warnings.is_empty());
            assert_eq!(function.target(), back.target());
            for (expected, actual) in function.terms().iter().zip(back.terms()) {
                assert_eq!(expected.result_level, actual.result_level);
                assert_eq!(expected.rule.simplify_thresholds(), actual.rule);
            }
        }
    }

    #[test]
    fn write_requires_declared_species() {
        let function = UpdateFunction::group(&[row("X", 1, "CI")]).unwrap().remove(0);
        assert_eq!(
            Err(RuleError::UnknownSpecies("X".to_string())),
            function.to_qual_transition("tr_X", &species())
        );
        let function = UpdateFunction::group(&[row("N", 1, "Y | CI")]).unwrap().remove(0);
        assert_eq!(
            Err(RuleError::UnknownSpecies("Y".to_string())),
            function.to_qual_transition("tr_N", &species())
        );
    }
}
