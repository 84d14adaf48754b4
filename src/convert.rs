//! Conversion between the rows of a tabular model and grouped, named transitions.
//!
//! Rows are plain strings as they appear in a table. Species rows are declared first
//! (see `declare_species`), then rule rows are parsed against the resulting
//! `SpeciesTable` and grouped per target (see `read_rule_rows`). The opposite direction
//! is `write_rule_rows`.

use crate::symbolic::LevelEncoding;
use crate::{
    IdScope, RuleError, RuleNotation, SpeciesTable, TransitionGrouper, TransitionRow,
    UpdateFunction,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    /// A transition id with a numeric level suffix, e.g. `tr_Cro_2`.
    static ref LEVEL_SUFFIX: Regex = Regex::new(r"^(.+)_(\d+)$").unwrap();
}

/// What to do when a row cannot be converted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    /// Stop at the first row error.
    FailFast,
    /// Report errors of all rows.
    CollectAll,
}

/// Options of a single conversion run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConversionOptions {
    /// Notation used for rendered rules. Parsing always accepts both.
    pub notation: RuleNotation,
    /// Refer to species by their display names instead of ids.
    pub use_names: bool,
    /// Always write explicit levels. Otherwise, a single level-1 rule of a target is
    /// written without a level.
    pub multi_valued: bool,
    pub error_policy: ErrorPolicy,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            notation: RuleNotation::Operator,
            use_names: false,
            multi_valued: false,
            error_policy: ErrorPolicy::FailFast,
        }
    }
}

/// A row of the species table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpeciesRow {
    pub id: String,
    pub name: Option<String>,
    pub max_level: Option<u32>,
}

/// A row of the transition table. The `level` is kept as the raw cell text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuleRow {
    pub transition_id: Option<String>,
    pub target: String,
    pub level: String,
    pub rule: String,
}

/// A `RuleError` together with the index of the row that caused it.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("Row {row}: {error}")]
pub struct RowError {
    pub row: usize,
    #[source]
    pub error: RuleError,
}

/// An `UpdateFunction` together with the id of its transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConvertedTransition {
    pub id: String,
    pub function: UpdateFunction,
}

/// Declare all species of the given rows. Ids that had to be changed are reported
/// in `warnings`.
pub fn declare_species(rows: &[SpeciesRow], warnings: &mut Vec<String>) -> SpeciesTable {
    let mut species = SpeciesTable::new();
    for row in rows {
        let id = species.declare(&row.id, row.name.as_deref(), row.max_level);
        if id != row.id {
            warnings.push(format!("Renamed species `{}` to `{}`.", row.id, id));
        }
        if let (Some(name), Some(declared)) = (row.name.as_deref(), species.name(&id)) {
            if name.trim() != declared {
                warnings.push(format!(
                    "Renamed `{}` to `{}` to avoid duplicates.",
                    name, declared
                ));
            }
        }
    }
    if cfg!(feature = "print-progress") {
        eprintln!("Declared {} species.", species.len());
    }
    species
}

/// Read the level cell of a rule row. An empty cell means a Boolean rule.
///
/// Integral decimal values (`2.0`) are accepted, since spreadsheets often store numbers
/// that way. Zero is accepted here and rejected by the grouping.
pub fn parse_level(target: &str, value: &str) -> Result<Option<u32>, RuleError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(level) = value.parse::<u32>() {
        return Ok(Some(level));
    }
    match value.parse::<f64>() {
        Ok(level) if level.fract() == 0.0 && level >= 0.0 && level <= f64::from(u32::MAX) => {
            Ok(Some(level as u32))
        }
        _ => Err(RuleError::InvalidLevel {
            target: target.to_string(),
            value: value.to_string(),
        }),
    }
}

/// The transition id without its numeric level suffix: `tr_Cro_2` becomes `tr_Cro`.
pub fn base_transition_id(id: &str) -> &str {
    match LEVEL_SUFFIX.captures(id).and_then(|it| it.get(1)) {
        Some(base) => base.as_str(),
        None => id,
    }
}

/// Parse and group the rule rows.
///
/// Every target becomes one transition. Its id is taken from the first row of the target
/// that has one (without the level suffix), or `tr_<target>`, and is made unique.
/// With `ErrorPolicy::FailFast` the result holds at most one error.
pub fn read_rule_rows(
    rows: &[RuleRow],
    species: &SpeciesTable,
    options: &ConversionOptions,
    warnings: &mut Vec<String>,
) -> Result<Vec<ConvertedTransition>, Vec<RowError>> {
    let mut errors = Vec::new();
    let mut grouper = TransitionGrouper::new();
    let mut target_ids: HashMap<String, String> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        let pushed = read_rule_row(row, species, options).and_then(|transition_row| {
            let target = transition_row.target.clone();
            grouper.push(transition_row)?;
            Ok(target)
        });
        match pushed {
            Ok(target) => {
                if let Some(id) = row.transition_id.as_deref().map(str::trim) {
                    if !id.is_empty() {
                        target_ids
                            .entry(target)
                            .or_insert_with(|| base_transition_id(id).to_string());
                    }
                }
            }
            Err(error) => {
                errors.push(RowError { row: index, error });
                if options.error_policy == ErrorPolicy::FailFast {
                    return Err(errors);
                }
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut scope = IdScope::new();
    let mut result = Vec::new();
    for function in grouper.finish() {
        let base = target_ids
            .remove(function.target())
            .unwrap_or_else(|| format!("tr_{}", function.target()));
        let id = scope.canonicalize(&base);
        if id != base {
            warnings.push(format!("Renamed transition `{}` to `{}`.", base, id));
        }
        warn_overlapping_terms(&function, warnings);
        result.push(ConvertedTransition { id, function });
    }
    if cfg!(feature = "print-progress") {
        eprintln!(
            "Read {} rule rows into {} transitions.",
            rows.len(),
            result.len()
        );
    }
    Ok(result)
}

/// Split the transitions back into rule rows.
///
/// Rows of a transition with several terms get the id `<id>_<level>`.
pub fn write_rule_rows(
    transitions: &[ConvertedTransition],
    species: &SpeciesTable,
    options: &ConversionOptions,
) -> Vec<RuleRow> {
    let mut result = Vec::new();
    for transition in transitions {
        let rows = transition.function.ungroup(!options.multi_valued);
        let suffixed = rows.len() > 1;
        for row in rows {
            let transition_id = match row.level {
                Some(level) if suffixed => format!("{}_{}", transition.id, level),
                _ => transition.id.clone(),
            };
            result.push(RuleRow {
                transition_id: Some(transition_id),
                target: target_cell(species, &row.target, options.use_names),
                level: row.level.map(|it| it.to_string()).unwrap_or_default(),
                rule: row.rule.render_with(options.notation, species, options.use_names),
            });
        }
    }
    if cfg!(feature = "print-progress") {
        eprintln!(
            "Wrote {} transitions as {} rule rows.",
            transitions.len(),
            result.len()
        );
    }
    result
}

/// **(internal)** Parse a single rule row into a `TransitionRow` with clean species ids.
fn read_rule_row(
    row: &RuleRow,
    species: &SpeciesTable,
    options: &ConversionOptions,
) -> Result<TransitionRow, RuleError> {
    let target = row.target.trim();
    // Tolerate quoted names copied from a rule.
    let target = match target.strip_prefix('"').and_then(|it| it.strip_suffix('"')) {
        Some(unquoted) if !unquoted.is_empty() => unquoted,
        _ => target,
    };
    let target = species.resolve(target, options.use_names)?;
    let level = parse_level(&target, &row.level)?;
    let rule = species.parse_rule(&row.rule, options.use_names)?;
    Ok(TransitionRow {
        target,
        level,
        rule,
    })
}

/// **(internal)** Report pairs of terms that can hold at the same time. The earlier
/// term always wins, so such tables are valid, but usually unintended.
fn warn_overlapping_terms(function: &UpdateFunction, warnings: &mut Vec<String>) {
    if function.terms().len() < 2 {
        return;
    }
    let rules: Vec<_> = function.terms().iter().map(|it| &it.rule).collect();
    let pairs = LevelEncoding::for_expressions(&rules)
        .and_then(|encoding| encoding.overlapping_terms(function));
    match pairs {
        Ok(pairs) => {
            for (first, second) in pairs {
                warnings.push(format!(
                    "Rules of `{}` for levels {} and {} overlap. Level {} takes precedence.",
                    function.target(),
                    first,
                    second,
                    first
                ));
            }
        }
        Err(error) => warnings.push(format!(
            "Overlaps of `{}` rules were not checked: {}",
            function.target(),
            error
        )),
    }
}

/// **(internal)** The target cell of a written row. Names are never quoted here.
fn target_cell(species: &SpeciesTable, id: &str, use_names: bool) -> String {
    if use_names {
        species.display_label(id).to_string()
    } else {
        id.to_string()
    }
}
