use crate::IdScope;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches a string that is a valid SBML `SId`.
    static ref SID: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();

    /// Matches every character that cannot appear in an `SId`.
    static ref INVALID_SID_CHAR: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
}

/// Check if the given string is a valid SBML identifier (`SId`).
pub fn is_valid_sid(id: &str) -> bool {
    SID.is_match(id)
}

/// Turn an arbitrary string into a valid `SId`. Surrounding whitespace is removed, every
/// invalid character becomes `_`, and `_` is prepended when the result is empty or starts
/// with a digit.
///
/// Valid identifiers are returned unchanged.
pub fn sanitize_id(raw_id: &str) -> String {
    let mut result = INVALID_SID_CHAR.replace_all(raw_id.trim(), "_").to_string();
    if result.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
        result.insert(0, '_');
    }
    result
}

impl IdScope {
    pub fn new() -> IdScope {
        IdScope::default()
    }

    /// True if `id` was already assigned in this scope.
    pub fn contains(&self, id: &str) -> bool {
        self.assigned.contains(id)
    }

    /// Number of assigned identifiers.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Register `id` without any modification, unless it is already assigned, in which case
    /// the first free `id_1`, `id_2`, ... is registered instead. Returns the registered value.
    pub fn deduplicate(&mut self, id: &str) -> String {
        let mut result = id.to_string();
        let mut suffix = 1;
        while self.assigned.contains(&result) {
            result = format!("{}_{}", id, suffix);
            suffix += 1;
        }
        self.assigned.insert(result.clone());
        result
    }

    /// Sanitize `raw_id` (see `sanitize_id`) and register it as a unique identifier
    /// in this scope.
    pub fn canonicalize(&mut self, raw_id: &str) -> String {
        self.deduplicate(&sanitize_id(raw_id))
    }
}
