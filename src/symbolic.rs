//! Symbolic (BDD) representation of multi-valued rules.
//!
//! Every level threshold `level(s) >= t` that a set of rules can observe becomes one Boolean
//! variable. Only valuations where a higher threshold of a species implies all its lower
//! thresholds are considered. This is used to decide whether two rules are semantically
//! equal, for example `!A` and `A < 1`, and whether function terms of an update function
//! overlap.

use crate::ComparisonOp::*;
use crate::Expression::*;
use crate::{
    BinaryOp, ComparisonOp, Constant, Expression, RuleError, SpeciesTable, UpdateFunction,
};
use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet, BddVariableSetBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Largest number of variables supported by `BddVariableSet`.
const MAX_VARIABLES: usize = 65_534;

/// BDD encoding of the level thresholds observed by a fixed set of rules.
#[derive(Clone)]
pub struct LevelEncoding {
    bdd: BddVariableSet,
    thresholds: HashMap<String, Vec<(u32, BddVariable)>>,
    max_levels: HashMap<String, u32>,
    consistency: Bdd,
}

impl LevelEncoding {
    /// Encoding of the thresholds observed by `expressions`. Levels of species
    /// are unbounded.
    pub fn for_expressions(expressions: &[&Expression]) -> Result<LevelEncoding, RuleError> {
        LevelEncoding::build(expressions, HashMap::new())
    }

    /// Same as `for_expressions`, but species with a maximal level declared in `species`
    /// can never exceed it.
    pub fn with_max_levels(
        expressions: &[&Expression],
        species: &SpeciesTable,
    ) -> Result<LevelEncoding, RuleError> {
        let max_levels = species
            .ids()
            .iter()
            .filter_map(|id| species.max_level(id).map(|level| (id.clone(), level)))
            .collect();
        LevelEncoding::build(expressions, max_levels)
    }

    fn build(
        expressions: &[&Expression],
        max_levels: HashMap<String, u32>,
    ) -> Result<LevelEncoding, RuleError> {
        let mut mentioned: Vec<(String, u32)> = Vec::new();
        for expression in expressions {
            expression.walk_postorder(&mut |it| match it {
                Reference(id) => mentioned.push((id.clone(), 1)),
                Comparison(id, Ge, level) | Comparison(id, Lt, level) => {
                    mentioned.push((id.clone(), *level))
                }
                Comparison(id, _, level) => {
                    mentioned.push((id.clone(), *level));
                    if let Some(above) = level.checked_add(1) {
                        mentioned.push((id.clone(), above));
                    }
                }
                _ => (),
            });
        }

        // Level 0 always holds, levels above the maximum never do.
        let mut levels: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for (id, level) in mentioned {
            let reachable = max_levels.get(&id).map_or(true, |max| level <= *max);
            let entry = levels.entry(id).or_default();
            if level > 0 && reachable {
                entry.insert(level);
            }
        }
        let count: usize = levels.values().map(|it| it.len()).sum();
        if count > MAX_VARIABLES {
            return Err(RuleError::Encoding(format!(
                "{} level thresholds exceed the limit of {} variables.",
                count, MAX_VARIABLES
            )));
        }

        let mut builder = BddVariableSetBuilder::new();
        let mut thresholds = HashMap::new();
        for (index, (id, levels)) in levels.into_iter().enumerate() {
            let variables: Vec<(u32, BddVariable)> = levels
                .into_iter()
                .map(|level| {
                    let name = format!("s{}_ge_{}", index, level);
                    (level, builder.make_variable(&name))
                })
                .collect();
            thresholds.insert(id, variables);
        }
        let bdd = builder.build();
        let mut consistency = bdd.mk_true();
        for variables in thresholds.values() {
            for pair in variables.windows(2) {
                let implication = bdd.mk_var(pair[1].1).imp(&bdd.mk_var(pair[0].1));
                consistency = consistency.and(&implication);
            }
        }
        Ok(LevelEncoding {
            bdd,
            thresholds,
            max_levels,
            consistency,
        })
    }

    /// Build a `Bdd` that is satisfied exactly by the (consistent) valuations where
    /// `expression` holds.
    pub fn encode(&self, expression: &Expression) -> Result<Bdd, RuleError> {
        Ok(self.encode_raw(expression)?.and(&self.consistency))
    }

    /// True if the two rules hold in exactly the same states.
    pub fn equivalent(&self, left: &Expression, right: &Expression) -> Result<bool, RuleError> {
        let left = self.encode_raw(left)?;
        let right = self.encode_raw(right)?;
        Ok(self.consistency.imp(&left.iff(&right)).is_true())
    }

    /// Pairs of result levels of `function` whose rules can hold at the same time.
    /// In such states, the term listed first wins.
    pub fn overlapping_terms(
        &self,
        function: &UpdateFunction,
    ) -> Result<Vec<(u32, u32)>, RuleError> {
        let encoded = function
            .terms()
            .iter()
            .map(|it| Ok((it.result_level, self.encode(&it.rule)?)))
            .collect::<Result<Vec<_>, RuleError>>()?;
        let mut result = Vec::new();
        for (i, (first_level, first)) in encoded.iter().enumerate() {
            for (second_level, second) in encoded.iter().skip(i + 1) {
                if !first.and(second).is_false() {
                    result.push((*first_level, *second_level));
                }
            }
        }
        Ok(result)
    }

    /// **(internal)** Encode without the consistency constraint.
    fn encode_raw(&self, expression: &Expression) -> Result<Bdd, RuleError> {
        Ok(match expression {
            Reference(id) => self.at_least(id, 1)?,
            Comparison(id, op, level) => self.compare(id, *op, *level)?,
            Constant(Constant::Bool(value)) => {
                if *value {
                    self.bdd.mk_true()
                } else {
                    self.bdd.mk_false()
                }
            }
            Constant(Constant::Level(level)) => {
                if *level > 0 {
                    self.bdd.mk_true()
                } else {
                    self.bdd.mk_false()
                }
            }
            Not(inner) => self.encode_raw(inner)?.not(),
            Binary(op, left, right) => {
                let left = self.encode_raw(left)?;
                let right = self.encode_raw(right)?;
                match op {
                    BinaryOp::And => left.and(&right),
                    BinaryOp::Or => left.or(&right),
                    BinaryOp::Xor => left.xor(&right),
                }
            }
        })
    }

    fn compare(&self, id: &str, op: ComparisonOp, level: u32) -> Result<Bdd, RuleError> {
        Ok(match op {
            Ge => self.at_least(id, level)?,
            Gt => self.above(id, level)?,
            Lt => self.at_least(id, level)?.not(),
            Le => self.above(id, level)?.not(),
            Eq => self.at_least(id, level)?.and(&self.above(id, level)?.not()),
            Neq => self.at_least(id, level)?.and(&self.above(id, level)?.not()).not(),
        })
    }

    /// **(internal)** `level(id) >= level`.
    fn at_least(&self, id: &str, level: u32) -> Result<Bdd, RuleError> {
        let thresholds = self
            .thresholds
            .get(id)
            .ok_or_else(|| RuleError::UnknownSpecies(id.to_string()))?;
        if level == 0 {
            return Ok(self.bdd.mk_true());
        }
        if self.max_levels.get(id).map_or(false, |max| level > *max) {
            return Ok(self.bdd.mk_false());
        }
        match thresholds.binary_search_by_key(&level, |(it, _)| *it) {
            Ok(index) => Ok(self.bdd.mk_var(thresholds[index].1)),
            Err(_) => Err(RuleError::Encoding(format!(
                "Level {} of `{}` is not encoded.",
                level, id
            ))),
        }
    }

    /// **(internal)** `level(id) > level`.
    fn above(&self, id: &str, level: u32) -> Result<Bdd, RuleError> {
        match level.checked_add(1) {
            Some(above) => self.at_least(id, above),
            None if self.thresholds.contains_key(id) => Ok(self.bdd.mk_false()),
            None => Err(RuleError::UnknownSpecies(id.to_string())),
        }
    }
}

/// True if the two rules hold in exactly the same states, assuming each species can
/// reach every level mentioned in the rules.
pub fn equivalent(left: &Expression, right: &Expression) -> bool {
    LevelEncoding::for_expressions(&[left, right])
        .and_then(|encoding| encoding.equivalent(left, right))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use crate::symbolic::{equivalent, LevelEncoding};
    use crate::ComparisonOp::*;
    use crate::{Expression, RuleError, SpeciesTable, TransitionRow, UpdateFunction};
    use std::convert::TryFrom;

    fn parse(rule: &str) -> Expression {
        Expression::try_from(rule).unwrap()
    }

    #[test]
    fn negated_reference_is_lower_comparison() {
        assert!(equivalent(&parse("!A"), &Expression::mk_comparison("A", Lt, 1)));
        assert!(equivalent(&parse("!A"), &parse("A == 0")));
        assert!(equivalent(&parse("A"), &parse("A > 0")));
        assert!(!equivalent(&parse("A"), &parse("A:2")));
        assert!(!equivalent(&parse("A == 1"), &parse("A")));
    }

    #[test]
    fn boolean_laws_hold() {
        assert!(equivalent(&parse("!(a & b)"), &parse("!a | !b")));
        assert!(equivalent(&parse("a ^ b"), &parse("(a & !b) | (!a & b)")));
        assert!(equivalent(&parse("a:2 | !a:2"), &parse("TRUE")));
        assert!(equivalent(&parse("a >= 3 & a <= 1"), &parse("FALSE")));
        assert!(equivalent(&parse("a != 2"), &parse("a < 2 | a > 2")));
        assert!(equivalent(&parse("a >= 5 & a:2"), &parse("a >= 5")));
        assert!(equivalent(&parse("0"), &parse("FALSE")));
        assert!(equivalent(&parse("2"), &parse("TRUE")));
    }

    #[test]
    fn large_levels() {
        assert!(equivalent(&parse("A >= 70000 & A"), &parse("A >= 70000")));
        assert!(!equivalent(&parse("A >= 70000"), &parse("A")));
        assert!(equivalent(&parse("A > 4294967295"), &parse("FALSE")));
        assert!(equivalent(&parse("A <= 4294967295"), &parse("TRUE")));
        assert!(equivalent(&parse("A == 4294967295"), &parse("A >= 4294967295")));
    }

    #[test]
    fn too_many_thresholds() {
        let rules: Vec<Expression> = (1..=65_535)
            .map(|level| Expression::mk_comparison("A", Ge, level))
            .collect();
        let rules: Vec<&Expression> = rules.iter().collect();
        assert!(matches!(
            LevelEncoding::for_expressions(&rules),
            Err(RuleError::Encoding(_))
        ));
    }

    #[test]
    fn declared_max_levels_matter() {
        let mut species = SpeciesTable::new();
        species.declare("A", None, Some(1));
        species.declare("B", None, Some(5));
        let rules = [parse("A == 1"), parse("A"), parse("B == 1"), parse("B"), parse("A:2")];
        let refs: Vec<&Expression> = rules.iter().collect();
        let encoding = LevelEncoding::with_max_levels(&refs, &species).unwrap();
        assert_eq!(Ok(true), encoding.equivalent(&rules[0], &rules[1]));
        assert_eq!(Ok(false), encoding.equivalent(&rules[2], &rules[3]));
        assert!(encoding.encode(&rules[4]).unwrap().is_false());
        assert_eq!(
            Err(RuleError::UnknownSpecies("C".to_string())),
            encoding.equivalent(&parse("C"), &rules[1])
        );
        assert!(matches!(
            encoding.equivalent(&parse("B >= 3"), &rules[3]),
            Err(RuleError::Encoding(_))
        ));
    }

    #[test]
    fn grouped_colon_rules_match_threshold_comparisons() {
        let rows: Vec<TransitionRow> = vec![("!CI", 3), ("!CI:2", 2), ("!CI:3", 1)]
            .into_iter()
            .map(|(rule, level)| TransitionRow {
                target: "Cro".to_string(),
                level: Some(level),
                rule: parse(rule),
            })
            .collect();
        let functions = UpdateFunction::group(&rows).unwrap();
        assert_eq!(1, functions.len());
        let expected = vec![
            (Expression::mk_comparison("CI", Lt, 1), 3),
            (Expression::mk_comparison("CI", Lt, 2), 2),
            (Expression::mk_comparison("CI", Lt, 3), 1),
        ];
        assert_eq!(expected.len(), functions[0].terms().len());
        for (term, (rule, level)) in functions[0].terms().iter().zip(expected) {
            assert_eq!(level, term.result_level);
            assert!(equivalent(&term.rule, &rule));
        }
    }

    #[test]
    fn overlapping_terms() {
        let rows: Vec<TransitionRow> = vec![("CI", 2), ("CI:2", 1), ("!CI", 3)]
            .into_iter()
            .map(|(rule, level)| TransitionRow {
                target: "Cro".to_string(),
                level: Some(level),
                rule: parse(rule),
            })
            .collect();
        let function = UpdateFunction::group(&rows).unwrap().remove(0);
        let rules: Vec<&Expression> = function.terms().iter().map(|it| &it.rule).collect();
        let encoding = LevelEncoding::for_expressions(&rules).unwrap();
        assert_eq!(Ok(vec![(2, 1)]), encoding.overlapping_terms(&function));
    }
}
