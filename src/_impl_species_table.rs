use crate::{is_valid_sid, Expression, IdScope, RuleError, SpeciesTable};
use std::collections::HashSet;

impl SpeciesTable {
    pub fn new() -> SpeciesTable {
        SpeciesTable::default()
    }

    /// Declare a new species and return its clean id.
    ///
    /// The `raw_id` is canonicalized in the species scope, so two species with the same raw
    /// id receive distinct ids. A raw id keeps pointing to the first species declared with
    /// it. The optional display `name` is trimmed and deduplicated with a numeric suffix
    /// against the labels of all species declared so far. A species without a name is
    /// labelled by its id, deduplicated the same way.
    pub fn declare(&mut self, raw_id: &str, name: Option<&str>, max_level: Option<u32>) -> String {
        let id = self.id_scope.canonicalize(raw_id);
        self.ids.push(id.clone());
        self.raw_to_id
            .entry(raw_id.trim().to_string())
            .or_insert_with(|| id.clone());
        let label = match name.map(|it| it.trim()).filter(|it| !it.is_empty()) {
            Some(name) => {
                let name = self.label_scope.deduplicate(name);
                self.id_to_name.insert(id.clone(), name.clone());
                name
            }
            None => self.label_scope.deduplicate(&id),
        };
        self.label_to_id.insert(label.clone(), id.clone());
        self.id_to_label.insert(id.clone(), label);
        if let Some(max_level) = max_level {
            self.max_levels.insert(id.clone(), max_level);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True if `id` is the clean id of a declared species.
    pub fn contains(&self, id: &str) -> bool {
        self.id_scope.contains(id)
    }

    /// Clean ids of all species, in declaration order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Display name of the species with the given clean id, if it has one.
    pub fn name(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(|it| it.as_str())
    }

    /// Declared maximal level of the species with the given clean id.
    pub fn max_level(&self, id: &str) -> Option<u32> {
        self.max_levels.get(id).copied()
    }

    /// Unquoted label of species `id`: its display name, or its id when it has none.
    /// Unlike the id, the label of an unnamed species may carry a suffix when its id is
    /// also the name of another species.
    pub fn display_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.id_to_label.get(id).map(|it| it.as_str()).unwrap_or(id)
    }

    /// The string used to refer to species `id` in a rule.
    ///
    /// With `use_names`, this is the `display_label` (in double quotes if it is not a valid
    /// identifier). Otherwise, it is the id.
    pub fn label(&self, id: &str, use_names: bool) -> String {
        if !use_names {
            return id.to_string();
        }
        let label = self.display_label(id);
        if is_valid_sid(label) {
            label.to_string()
        } else {
            format!("\"{}\"", label)
        }
    }

    /// Find the clean id of a species referenced by `token` in a rule.
    ///
    /// The token is looked up as a label first (if `use_names` is set), then as
    /// a clean id, then as a raw id.
    pub fn resolve(&self, token: &str, use_names: bool) -> Result<String, RuleError> {
        if use_names {
            if let Some(id) = self.label_to_id.get(token) {
                return Ok(id.clone());
            }
        }
        if self.contains(token) {
            return Ok(token.to_string());
        }
        self.raw_to_id
            .get(token)
            .cloned()
            .ok_or_else(|| RuleError::UnknownSpecies(token.to_string()))
    }

    /// Replace every species in `rule` with its clean id (see `resolve`).
    pub fn resolve_expression(
        &self,
        rule: &Expression,
        use_names: bool,
    ) -> Result<Expression, RuleError> {
        rule.try_rename_species(&mut |token| self.resolve(token, use_names))
    }

    /// All strings that can refer to a species in a rule. This is the recognition set
    /// for `tokenize`.
    pub fn known_identifiers(&self, use_names: bool) -> HashSet<String> {
        let mut result: HashSet<String> = self.ids.iter().cloned().collect();
        result.extend(self.raw_to_id.keys().cloned());
        if use_names {
            result.extend(self.label_to_id.keys().cloned());
        }
        result
    }

    /// Parse a rule that refers to species of this table and resolve them to clean ids.
    pub fn parse_rule(&self, rule: &str, use_names: bool) -> Result<Expression, RuleError> {
        let known = self.known_identifiers(use_names);
        let expression = Expression::try_from_rule(rule, &known)?;
        self.resolve_expression(&expression, use_names)
    }
}
