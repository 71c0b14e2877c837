//! Static catalog of deployable services.
//!
//! The registry is built once per run from configuration and never mutated.
//! Its insertion order is the canonical order for restarts and reports.

mod pattern;

pub use pattern::PathPattern;

use std::collections::HashSet;

use crate::config::ServiceConfigEntry;
use crate::error::{DeployError, DeployResult};

/// How a service gets picked when no names are given on the command line.
#[derive(Debug, Clone)]
pub enum SelectionRule {
    /// Only restarted when named explicitly (or when deploying everything).
    ExplicitOnly,
    /// Restarted when any changed path matches one of the patterns.
    Patterns(Vec<PathPattern>),
}

/// A supervised unit of the deployed application.
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    unit: String,
    rule: SelectionRule,
}

impl Service {
    /// Create a service whose supervisor unit is `<name>.service`.
    pub fn new(name: impl Into<String>, rule: SelectionRule) -> Self {
        let name = name.into();
        let unit = format!("{name}.service");
        Self { name, unit, rule }
    }

    /// Explicit-only service.
    pub fn explicit(name: impl Into<String>) -> Self {
        Self::new(name, SelectionRule::ExplicitOnly)
    }

    /// Pattern service with plain path prefixes.
    pub fn with_prefixes<I, S>(name: impl Into<String>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = prefixes.into_iter().map(PathPattern::prefix).collect();
        Self::new(name, SelectionRule::Patterns(patterns))
    }

    /// Override the supervisor unit name.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn rule(&self) -> &SelectionRule {
        &self.rule
    }

    pub fn has_patterns(&self) -> bool {
        matches!(self.rule, SelectionRule::Patterns(_))
    }

    /// Whether any of the given paths triggers this service.
    pub fn matches_any<'a>(&self, mut paths: impl Iterator<Item = &'a str>) -> bool {
        match &self.rule {
            SelectionRule::ExplicitOnly => false,
            SelectionRule::Patterns(patterns) => {
                paths.any(|path| patterns.iter().any(|p| p.matches(path)))
            }
        }
    }
}

/// Ordered, name-unique collection of services.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<Service>,
}

impl ServiceRegistry {
    /// Build a registry, rejecting duplicate names.
    ///
    /// Names end up comma-joined in tab-separated history lines, so commas and
    /// whitespace are not allowed in them.
    pub fn new(services: Vec<Service>) -> DeployResult<Self> {
        let mut seen = HashSet::new();
        for service in &services {
            if service.name.trim().is_empty() {
                return Err(DeployError::config("service name must not be empty"));
            }
            if service.name.chars().any(|c| c == ',' || c.is_whitespace()) {
                return Err(DeployError::config(format!(
                    "service name '{}' must not contain commas or whitespace",
                    service.name
                )));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(DeployError::config(format!(
                    "duplicate service '{}' in registry",
                    service.name
                )));
            }
        }
        Ok(Self { services })
    }

    /// Build a registry from `[[services]]` configuration entries.
    pub fn from_config(entries: &[ServiceConfigEntry]) -> DeployResult<Self> {
        let services = entries
            .iter()
            .map(service_from_entry)
            .collect::<DeployResult<Vec<_>>>()?;
        Self::new(services)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name.as_str()).collect()
    }

    /// Check that every requested name is registered.
    pub fn ensure_known(&self, names: &[String]) -> DeployResult<()> {
        let unknown: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| !self.contains(name))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        Err(DeployError::config(format!(
            "unknown service(s): {} (known: {})",
            unknown.join(", "),
            self.names().join(", ")
        )))
    }

    /// Keep the services accepted by `keep`, in registry order.
    pub fn ordered<F>(&self, mut keep: F) -> Vec<&Service>
    where
        F: FnMut(&Service) -> bool,
    {
        self.services.iter().filter(|s| keep(*s)).collect()
    }
}

fn service_from_entry(entry: &ServiceConfigEntry) -> DeployResult<Service> {
    let has_patterns = !entry.patterns.is_empty() || !entry.regex.is_empty();
    if entry.explicit_only && has_patterns {
        return Err(DeployError::config(format!(
            "service '{}' is explicit_only but also declares patterns",
            entry.name
        )));
    }

    let rule = if has_patterns {
        let mut patterns: Vec<PathPattern> =
            entry.patterns.iter().map(PathPattern::prefix).collect();
        for expr in &entry.regex {
            let pattern = PathPattern::regex(expr).map_err(|e| {
                DeployError::config(format!(
                    "service '{}' has invalid regex '{}': {}",
                    entry.name, expr, e
                ))
            })?;
            patterns.push(pattern);
        }
        SelectionRule::Patterns(patterns)
    } else {
        SelectionRule::ExplicitOnly
    };

    let mut service = Service::new(entry.name.clone(), rule);
    if let Some(unit) = &entry.unit {
        service = service.with_unit(unit.clone());
    }
    Ok(service)
}
