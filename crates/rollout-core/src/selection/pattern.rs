//! Pattern selection: services inferred from changed paths.

use super::{ExplicitPolicy, SelectionInput, SelectionMode, SelectionPolicy};

#[derive(Debug, Clone, Copy)]
pub struct PatternPolicy {
    manifest_restarts_all: bool,
}

impl PatternPolicy {
    pub fn new(manifest_restarts_all: bool) -> Self {
        Self {
            manifest_restarts_all,
        }
    }
}

impl SelectionPolicy for PatternPolicy {
    fn mode(&self) -> SelectionMode {
        SelectionMode::Pattern
    }

    fn restart_set(&self, input: &SelectionInput<'_>, reinstall_deps: bool) -> Vec<String> {
        // Names on the command line and forced restarts bypass inference.
        if !input.flags.explicit_services.is_empty() || input.flags.force_restart {
            return ExplicitPolicy::named_or_all(input);
        }

        let all_pattern_services = reinstall_deps && self.manifest_restarts_all;
        input
            .registry
            .ordered(|service| {
                service.has_patterns()
                    && (all_pattern_services || service.matches_any(input.changes.iter()))
            })
            .into_iter()
            .map(|service| service.name().to_string())
            .collect()
    }
}
