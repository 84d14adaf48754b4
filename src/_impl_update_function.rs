use crate::{FunctionTerm, RuleError, TransitionGrouper, TransitionRow, UpdateFunction};
use std::collections::{HashMap, HashSet};

impl UpdateFunction {
    /// The level of the target when no term holds.
    pub const DEFAULT_LEVEL: u32 = 0;

    /// Create a new `UpdateFunction`, checking that all result levels are distinct
    /// and positive.
    pub fn new(target: &str, terms: Vec<FunctionTerm>) -> Result<UpdateFunction, RuleError> {
        let mut seen = HashSet::new();
        for term in &terms {
            if term.result_level == UpdateFunction::DEFAULT_LEVEL {
                return Err(RuleError::InvalidLevel {
                    target: target.to_string(),
                    value: term.result_level.to_string(),
                });
            }
            if !seen.insert(term.result_level) {
                return Err(RuleError::DuplicateLevel {
                    target: target.to_string(),
                    level: term.result_level,
                });
            }
        }
        Ok(UpdateFunction {
            target: target.to_string(),
            terms,
        })
    }

    /// Group transition rows by target. Targets appear in the order of their first row,
    /// terms of one target in row order.
    pub fn group(rows: &[TransitionRow]) -> Result<Vec<UpdateFunction>, RuleError> {
        let mut grouper = TransitionGrouper::new();
        for row in rows {
            grouper.push(row.clone())?;
        }
        Ok(grouper.finish())
    }

    /// Split this function back into transition rows, one per term, in stored order.
    ///
    /// If `boolean_mode` is set and the function consists of a single level-1 term,
    /// the row is emitted without a level.
    pub fn ungroup(&self, boolean_mode: bool) -> Vec<TransitionRow> {
        let implicit_level =
            boolean_mode && self.terms.len() == 1 && self.terms[0].result_level == 1;
        self.terms
            .iter()
            .map(|term| TransitionRow {
                target: self.target.clone(),
                level: if implicit_level {
                    None
                } else {
                    Some(term.result_level)
                },
                rule: term.rule.clone(),
            })
            .collect()
    }

    /// Id of the target species.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Explicit terms of this function, in authored order.
    pub fn terms(&self) -> &[FunctionTerm] {
        &self.terms
    }

    pub fn default_level(&self) -> u32 {
        UpdateFunction::DEFAULT_LEVEL
    }

    /// The largest level this function can assign to the target.
    pub fn max_result_level(&self) -> u32 {
        self.terms
            .iter()
            .map(|it| it.result_level)
            .max()
            .unwrap_or(UpdateFunction::DEFAULT_LEVEL)
    }

    /// True if this function only assigns levels `0` and `1`.
    pub fn is_boolean(&self) -> bool {
        self.max_result_level() <= 1
    }

    /// Sorted ids of all species referenced by any term.
    pub fn collect_species(&self) -> Vec<String> {
        let mut result: Vec<String> = self
            .terms
            .iter()
            .flat_map(|it| it.rule.collect_species())
            .collect();
        result.sort();
        result.dedup();
        result
    }

    /// Compute the next level of the target: the result level of the first term that holds,
    /// or the default level when none does.
    ///
    /// Returns `None` if a term cannot be decided because it references a species
    /// missing from `levels`.
    pub fn next_level(&self, levels: &HashMap<String, u32>) -> Option<u32> {
        for term in &self.terms {
            match term.rule.evaluate(levels) {
                Some(true) => return Some(term.result_level),
                Some(false) => continue,
                None => return None,
            }
        }
        Some(UpdateFunction::DEFAULT_LEVEL)
    }
}

impl TransitionGrouper {
    pub fn new() -> TransitionGrouper {
        TransitionGrouper::default()
    }

    /// Add one row to the grouping.
    ///
    /// Fails if the row level is zero, if the target already has a row for the same level,
    /// or if the target mixes rows without a level and rows with a level other than `1`.
    pub fn push(&mut self, row: TransitionRow) -> Result<(), RuleError> {
        let TransitionRow {
            target,
            level,
            rule,
        } = row;
        match level {
            Some(UpdateFunction::DEFAULT_LEVEL) => {
                return Err(RuleError::InvalidLevel {
                    target,
                    value: UpdateFunction::DEFAULT_LEVEL.to_string(),
                });
            }
            None if self.multi_valued_targets.contains(&target) => {
                return Err(RuleError::AmbiguousBoolean { target });
            }
            Some(level) if level != 1 && self.boolean_targets.contains(&target) => {
                return Err(RuleError::AmbiguousBoolean { target });
            }
            _ => (),
        }

        let result_level = level.unwrap_or(1);
        let index = match self.target_to_index.get(&target) {
            Some(index) => *index,
            None => {
                self.functions.push(UpdateFunction {
                    target: target.clone(),
                    terms: Vec::new(),
                });
                self.target_to_index.insert(target.clone(), self.functions.len() - 1);
                self.functions.len() - 1
            }
        };
        let function = &mut self.functions[index];
        if function.terms.iter().any(|it| it.result_level == result_level) {
            return Err(RuleError::DuplicateLevel {
                target,
                level: result_level,
            });
        }
        function.terms.push(FunctionTerm { rule, result_level });

        if level.is_none() {
            self.boolean_targets.insert(target);
        } else if result_level != 1 {
            self.multi_valued_targets.insert(target);
        }
        Ok(())
    }

    /// Number of distinct targets seen so far.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The grouped update functions, in the order in which their targets first appeared.
    pub fn finish(self) -> Vec<UpdateFunction> {
        self.functions
    }
}
