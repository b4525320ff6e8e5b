//! Variable name normalization and flattening of variable scopes

use apiport_common::{Environment, ImportWarning, Variable, WarningKind};
use std::collections::HashMap;

/// Reduce a variable name to `[A-Za-z0-9_]`
///
/// Other characters are removed, runs of underscores collapse to one, and
/// leading/trailing underscores are trimmed. A name with nothing left
/// becomes `variable`.
pub fn normalize_variable_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch);
        } else if ch == '_' && !result.ends_with('_') {
            result.push(ch);
        }
    }

    let trimmed = result.trim_matches('_');
    if trimmed.is_empty() {
        "variable".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize every name in a batch of variables
///
/// Emits `variable_renamed` for each changed name (and records the source
/// name in `original_key`), and `duplicate_variable` when a normalized name
/// collides with one seen earlier in the batch. Collisions resolve as
/// "later value wins": the first entry keeps its position and takes the
/// later value, the later entry is dropped.
pub fn normalize_variable_names(variables: Vec<Variable>) -> (Vec<Variable>, Vec<ImportWarning>) {
    let mut result: Vec<Variable> = Vec::with_capacity(variables.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for mut variable in variables {
        let normalized = normalize_variable_name(&variable.key);
        if normalized != variable.key {
            warnings.push(
                ImportWarning::new(
                    WarningKind::VariableRenamed,
                    format!(
                        "Variable '{}' was renamed to '{}'",
                        variable.key, normalized
                    ),
                )
                .with_variable(normalized.as_str())
                .with_rename(variable.key.as_str(), normalized.as_str()),
            );
            variable.original_key = Some(std::mem::replace(&mut variable.key, normalized));
        }

        match positions.get(&variable.key) {
            Some(&index) => {
                warnings.push(
                    ImportWarning::new(
                        WarningKind::DuplicateVariable,
                        format!(
                            "Variable '{}' is defined more than once; the later value is used",
                            variable.key
                        ),
                    )
                    .with_variable(variable.key.as_str()),
                );
                let existing = &mut result[index];
                existing.value = variable.value;
                existing.var_type = variable.var_type;
                existing.enabled = variable.enabled;
            }
            None => {
                positions.insert(variable.key.clone(), result.len());
                result.push(variable);
            }
        }
    }

    (result, warnings)
}

/// Flatten collection-scoped variables into a synthetic environment
///
/// Collection variables sit below environment variables in the source
/// tools' precedence order; a flat environment cannot express that, so a
/// single `conversion_note` records it when there is anything to flatten.
pub fn map_collection_variables(variables: &[Variable]) -> (Environment, Vec<ImportWarning>) {
    let environment = Environment::new("Collection Variables", variables.to_vec());
    let mut warnings = Vec::new();
    if !variables.is_empty() {
        warnings.push(ImportWarning::new(
            WarningKind::ConversionNote,
            format!(
                "{} collection variable(s) were converted to the 'Collection Variables' environment; \
                 collection-vs-environment precedence is not preserved",
                variables.len()
            ),
        ));
    }
    (environment, warnings)
}

/// Wrap global variables into a synthetic environment
pub fn map_global_variables(variables: &[Variable]) -> Environment {
    Environment::new("Global Variables", variables.to_vec())
}
