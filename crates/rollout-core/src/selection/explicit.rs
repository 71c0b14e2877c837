//! Explicit selection: named services, or everything.

use super::{SelectionInput, SelectionMode, SelectionPolicy};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitPolicy;

impl ExplicitPolicy {
    /// Named services in registry order, or the whole registry when none are named.
    pub fn named_or_all(input: &SelectionInput<'_>) -> Vec<String> {
        let names = &input.flags.explicit_services;
        input
            .registry
            .ordered(|service| names.is_empty() || names.iter().any(|n| n == service.name()))
            .into_iter()
            .map(|service| service.name().to_string())
            .collect()
    }
}

impl SelectionPolicy for ExplicitPolicy {
    fn mode(&self) -> SelectionMode {
        SelectionMode::Explicit
    }

    fn restart_set(&self, input: &SelectionInput<'_>, _reinstall_deps: bool) -> Vec<String> {
        Self::named_or_all(input)
    }
}
