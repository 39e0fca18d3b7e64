//! Registry of loaded function metadata.
//!
//! Populated by load requests and read by invocation requests. Entries live
//! for the lifetime of the worker process; there is no unload.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

use skiff_proto::{Direction, RpcFunctionMetadata};

/// Metadata describing one loaded function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMetadata {
    /// Function name as declared by the host.
    pub name: String,

    /// Script the engine runs for this function.
    pub script_file: PathBuf,

    /// Optional entry point inside the script.
    pub entry_point: String,

    /// Declared bindings, in declaration order.
    pub bindings: Vec<Binding>,
}

/// A declared binding of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Binding name, unique within its function.
    pub name: String,

    /// Binding direction.
    pub direction: Direction,

    /// Free-form type tag.
    pub binding_type: String,
}

impl From<RpcFunctionMetadata> for FunctionMetadata {
    fn from(metadata: RpcFunctionMetadata) -> Self {
        Self {
            name: metadata.name,
            script_file: PathBuf::from(metadata.script_file),
            entry_point: metadata.entry_point,
            bindings: metadata
                .bindings
                .into_iter()
                .map(|(name, info)| Binding {
                    name,
                    direction: info.direction,
                    binding_type: info.binding_type,
                })
                .collect(),
        }
    }
}

/// Function registry keyed by host-assigned function id.
///
/// Ids are matched case-insensitively. The first registration for an id
/// wins; later loads for the same id are ignored.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionMetadata>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata under `function_id` unless the id is already known.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn register(&mut self, function_id: &str, metadata: FunctionMetadata) -> bool {
        match self.functions.entry(normalise(function_id)) {
            Entry::Vacant(slot) => {
                slot.insert(metadata);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Looks up a function by id.
    #[must_use]
    pub fn get(&self, function_id: &str) -> Option<&FunctionMetadata> {
        self.functions.get(&normalise(function_id))
    }

    /// Returns the number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Checks if no function has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Upper-cases each character on its own. Characters whose upper case is
/// more than one character are kept as they are, so a key never changes
/// length.
fn normalise(function_id: &str) -> String {
    function_id
        .chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(script: &str) -> FunctionMetadata {
        RpcFunctionMetadata::new("greet", script)
            .with_binding("req", Direction::In, "httpTrigger")
            .with_binding("res", Direction::Out, "http")
            .into()
    }

    #[test]
    fn converts_wire_metadata() {
        let meta = metadata("/functions/greet/run.ps1");
        assert_eq!(meta.script_file, PathBuf::from("/functions/greet/run.ps1"));
        assert_eq!(meta.bindings.len(), 2);
        assert_eq!(meta.bindings[0].name, "req");
        assert_eq!(meta.bindings[1].direction, Direction::Out);
        assert_eq!(meta.bindings[1].binding_type, "http");
    }

    #[test]
    fn register_then_get() {
        let mut registry = FunctionRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register("fn-a", metadata("/a.ps1")));
        assert_eq!(
            registry.get("fn-a").map(|m| m.script_file.clone()),
            Some(PathBuf::from("/a.ps1"))
        );
        assert!(registry.get("fn-b").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = FunctionRegistry::new();
        assert!(registry.register("fn-a", metadata("/first.ps1")));
        assert!(!registry.register("fn-a", metadata("/second.ps1")));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("fn-a").map(|m| m.script_file.clone()),
            Some(PathBuf::from("/first.ps1"))
        );
    }

    #[test]
    fn ids_match_case_insensitively() {
        let mut registry = FunctionRegistry::new();
        assert!(registry.register("HttpTrigger", metadata("/first.ps1")));
        assert!(!registry.register("httptrigger", metadata("/second.ps1")));

        assert!(registry.get("HTTPTRIGGER").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn case_folding_is_per_character() {
        assert_eq!(normalise("Straße-Ä"), "STRAßE-Ä");
        assert_eq!(normalise("İd"), "İD");
        assert_eq!(normalise("ärger"), normalise("ÄRGER"));

        let mut registry = FunctionRegistry::new();
        assert!(registry.register("straße", metadata("/a.ps1")));
        assert!(registry.get("STRASSE").is_none());
        assert!(registry.get("STRAßE").is_some());
    }
}
