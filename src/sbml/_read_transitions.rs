use crate::math::{read_mathml, ThresholdMap, MATHML};
use crate::sbml::{
    child_tags, read_optional_child, read_unique_child, QualInput, QualOutput, QualTerm,
    QualTransition, SBML_QUAL,
};
use crate::{Constant, Expression, FunctionTerm, RuleError, SpeciesTable, UpdateFunction};
use roxmltree::{Document, ExpandedName, Node};
use std::collections::HashSet;

/// Read all transitions of the `<qual:listOfTransitions>` in the given `model` element.
pub fn read_transitions(
    model: Node,
    species: &SpeciesTable,
) -> Result<Vec<QualTransition>, RuleError> {
    let list = read_unique_child(model, (SBML_QUAL, "listOfTransitions"))?;
    child_tags(list, (SBML_QUAL, "transition"))
        .into_iter()
        .map(|it| read_transition(it, species))
        .collect()
}

/// Read all `<qual:transition>` elements that appear anywhere in the given XML document.
pub fn read_transitions_from_str(
    xml: &str,
    species: &SpeciesTable,
) -> Result<Vec<QualTransition>, RuleError> {
    let document = Document::parse(xml).map_err(|e| RuleError::Document(e.to_string()))?;
    let transition_tag = ExpandedName::from((SBML_QUAL, "transition"));
    document
        .descendants()
        .filter(|it| it.tag_name() == transition_tag)
        .map(|it| read_transition(it, species))
        .collect()
}

/// Read one `<qual:transition>` element. Species of inputs and outputs are resolved
/// to clean ids using `species`.
pub fn read_transition(
    transition: Node,
    species: &SpeciesTable,
) -> Result<QualTransition, RuleError> {
    let id = transition.attribute((SBML_QUAL, "id"));
    let name = transition.attribute((SBML_QUAL, "name"));
    let label = id.unwrap_or("(anonymous)");

    // Inputs are optional when there aren't any.
    let inputs = read_optional_child(transition, (SBML_QUAL, "listOfInputs"))?;
    let outputs = read_unique_child(transition, (SBML_QUAL, "listOfOutputs"))?;
    // Terms are an optional element.
    let terms = read_optional_child(transition, (SBML_QUAL, "listOfFunctionTerms"))?;

    let inputs = match inputs {
        Some(inputs) => child_tags(inputs, (SBML_QUAL, "input"))
            .into_iter()
            .map(|it| read_transition_input(it, label, species))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let outputs = child_tags(outputs, (SBML_QUAL, "output"))
        .into_iter()
        .map(|it| read_transition_output(it, label, species))
        .collect::<Result<Vec<_>, _>>()?;

    let input_ids: HashSet<String> = inputs.iter().filter_map(|it| it.id.clone()).collect();
    let mut transition = QualTransition {
        id: id.map(|it| it.to_string()),
        name: name.map(|it| it.to_string()),
        inputs,
        outputs,
        default_term: None,
        function_terms: Vec::new(),
    };

    if let Some(terms) = terms {
        let default_term = read_unique_child(terms, (SBML_QUAL, "defaultTerm"))?;
        let default_term = read_transition_term(default_term, label, &input_ids, species)?;
        if default_term.math.is_some() {
            return Err(RuleError::Document(format!(
                "Default term in transition {} has math.",
                label
            )));
        }
        transition.default_term = Some(default_term);
        for term in child_tags(terms, (SBML_QUAL, "functionTerm")) {
            let term = read_transition_term(term, label, &input_ids, species)?;
            transition.function_terms.push(term);
        }
    }

    Ok(transition)
}

fn read_transition_input(
    input: Node,
    transition_id: &str,
    species: &SpeciesTable,
) -> Result<QualInput, RuleError> {
    let qual_species = input
        .attribute((SBML_QUAL, "qualitativeSpecies"))
        .ok_or_else(|| {
            RuleError::Document(format!(
                "Transition {} is missing an input species.",
                transition_id
            ))
        })?;
    let threshold_level = match input.attribute((SBML_QUAL, "thresholdLevel")) {
        Some(value) => Some(read_level(value, "Input threshold level", transition_id)?),
        None => None,
    };
    Ok(QualInput {
        id: input.attribute((SBML_QUAL, "id")).map(|s| s.to_string()),
        species: species.resolve(qual_species, false)?,
        threshold_level,
        transition_effect: input
            .attribute((SBML_QUAL, "transitionEffect"))
            .map(|s| s.to_string()),
        sign: input.attribute((SBML_QUAL, "sign")).map(|s| s.to_string()),
    })
}

fn read_transition_output(
    output: Node,
    transition_id: &str,
    species: &SpeciesTable,
) -> Result<QualOutput, RuleError> {
    let qual_species = output
        .attribute((SBML_QUAL, "qualitativeSpecies"))
        .ok_or_else(|| {
            RuleError::Document(format!(
                "Transition output in {} is missing an output species.",
                transition_id
            ))
        })?;
    Ok(QualOutput {
        id: output.attribute((SBML_QUAL, "id")).map(|s| s.to_string()),
        species: species.resolve(qual_species, false)?,
        transition_effect: output
            .attribute((SBML_QUAL, "transitionEffect"))
            .map(|s| s.to_string()),
    })
}

fn read_transition_term(
    term: Node,
    transition_id: &str,
    input_ids: &HashSet<String>,
    species: &SpeciesTable,
) -> Result<QualTerm, RuleError> {
    let result_level = term
        .attribute((SBML_QUAL, "resultLevel"))
        .ok_or_else(|| {
            RuleError::Document(format!(
                "Term result level not specified in {}.",
                transition_id
            ))
        })?;
    let result_level = read_level(result_level, "Term result level", transition_id)?;
    let math = match read_optional_child(term, (MATHML, "math"))? {
        Some(math) => Some(read_mathml(math, input_ids, species)?),
        None => None,
    };
    Ok(QualTerm { result_level, math })
}

fn read_level(value: &str, what: &str, transition_id: &str) -> Result<u32, RuleError> {
    value.trim().parse::<u32>().map_err(|_| {
        RuleError::Document(format!(
            "{} is not a number in {}. {} given.",
            what, transition_id, value
        ))
    })
}

impl QualTransition {
    /// Threshold levels of all inputs that have both an id and a threshold.
    pub fn threshold_map(&self) -> ThresholdMap {
        self.inputs
            .iter()
            .filter_map(|input| match (&input.id, input.threshold_level) {
                (Some(id), Some(level)) => Some((id.clone(), level)),
                _ => None,
            })
            .collect()
    }

    /// Id of the target species, i.e. the species of the first output.
    pub fn target(&self) -> Result<&str, RuleError> {
        self.outputs
            .first()
            .map(|it| it.species.as_str())
            .ok_or_else(|| {
                RuleError::Document(format!(
                    "Transition {} has no output.",
                    self.id.as_deref().unwrap_or("(anonymous)")
                ))
            })
    }

    /// Convert this transition into an `UpdateFunction` of its target.
    ///
    /// Function terms with result level `0` are skipped. A term without math is read as
    /// the conjunction of all inputs, or as constant `1` when there are no inputs.
    /// Both situations produce a warning.
    pub fn to_update_function(
        &self,
        warnings: &mut Vec<String>,
    ) -> Result<UpdateFunction, RuleError> {
        let target = self.target()?;
        if self.outputs.len() > 1 {
            warnings.push(format!(
                "Transition for `{}` has {} outputs. Only the first one is used.",
                target,
                self.outputs.len()
            ));
        }
        if let Some(default_term) = &self.default_term {
            if default_term.result_level != UpdateFunction::DEFAULT_LEVEL {
                return Err(RuleError::InvalidLevel {
                    target: target.to_string(),
                    value: format!("default {}", default_term.result_level),
                });
            }
        }

        let thresholds = self.threshold_map();
        let mut terms = Vec::new();
        for term in &self.function_terms {
            if term.result_level == UpdateFunction::DEFAULT_LEVEL {
                warnings.push(format!(
                    "Skipped a function term of `{}` with the default result level.",
                    target
                ));
                continue;
            }
            let rule = match &term.math {
                Some(math) => Expression::from_math(math, &thresholds)?,
                None => {
                    warnings.push(format!(
                        "Transition for `{}` has a function term without math.",
                        target
                    ));
                    self.inputs_conjunction()
                }
            };
            terms.push(FunctionTerm {
                rule,
                result_level: term.result_level,
            });
        }
        UpdateFunction::new(target, terms)
    }

    /// **(internal)** Conjunction of all input species, `1` if there are none.
    fn inputs_conjunction(&self) -> Expression {
        let mut seen = HashSet::new();
        let mut iter = self
            .inputs
            .iter()
            .map(|it| it.species.as_str())
            .filter(|it| seen.insert(*it));
        match iter.next() {
            None => Expression::Constant(Constant::Level(1)),
            Some(first) => iter.fold(Expression::mk_reference(first), |acc, it| {
                acc.and(Expression::mk_reference(it))
            }),
        }
    }
}
