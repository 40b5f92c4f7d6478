//! Name tables for core commands, custom bindings and aliases.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::command::CommandFactory;
use crate::error::RegistryError;

/// Target of an alias: a command name plus the parameters put in front of
/// whatever the caller supplies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs {
    pub command: String,
    pub parameters: Vec<String>,
}

impl CommandArgs {
    pub fn new(command: impl Into<String>, parameters: Vec<String>) -> Self {
        Self {
            command: command.into(),
            parameters,
        }
    }
}

/// A name resolved to something that can be instantiated.
pub struct Resolved {
    pub factory: Arc<dyn CommandFactory>,
    /// Arguments with every alias prefix applied.
    pub args: Vec<String>,
}

#[derive(Default)]
pub struct CommandRegistry {
    core: BTreeMap<String, Arc<dyn CommandFactory>>,
    custom: BTreeMap<String, Arc<dyn CommandFactory>>,
    aliases: BTreeMap<String, CommandArgs>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a static table of core commands.
    pub fn with_core<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = (S, Arc<dyn CommandFactory>)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, factory) in commands {
            registry.core.insert(name.into(), factory);
        }
        registry
    }

    pub fn core_command(&self, name: &str) -> Option<&Arc<dyn CommandFactory>> {
        self.core.get(name)
    }

    pub fn custom_command(&self, name: &str) -> Option<&Arc<dyn CommandFactory>> {
        self.custom.get(name)
    }

    /// Core commands sorted by name.
    pub fn core_commands(&self) -> impl Iterator<Item = (&str, &Arc<dyn CommandFactory>)> {
        self.core.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn custom_commands(&self) -> impl Iterator<Item = (&str, &Arc<dyn CommandFactory>)> {
        self.custom.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &CommandArgs)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when `name` is a core or custom command.
    pub fn is_bound(&self, name: &str) -> bool {
        self.core.contains_key(name) || self.custom.contains_key(name)
    }

    /// Binds `name` to `factory`, replacing any previous custom binding.
    pub fn add_custom_command(&mut self, name: impl Into<String>, factory: Arc<dyn CommandFactory>) {
        let name = name.into();
        debug!(%name, implementation = factory.type_name(), "bound custom command");
        self.custom.insert(name, factory);
    }

    pub fn remove_custom_command(&mut self, name: &str) -> bool {
        self.custom.remove(name).is_some()
    }

    /// Finds a catalog implementation by core name or by (short) type name.
    pub fn find_implementation(&self, target: &str) -> Option<Arc<dyn CommandFactory>> {
        if let Some(factory) = self.core.get(target) {
            return Some(Arc::clone(factory));
        }
        self.core
            .values()
            .chain(self.custom.values())
            .find(|factory| {
                let full = factory.type_name();
                let short = full.rsplit("::").next().unwrap_or(full);
                full.eq_ignore_ascii_case(target) || short.eq_ignore_ascii_case(target)
            })
            .map(Arc::clone)
    }

    pub fn add_alias(
        &mut self,
        name: &str,
        command: &str,
        parameters: Vec<String>,
    ) -> Result<(), RegistryError> {
        if self.aliases.contains_key(name) {
            return Err(RegistryError::AliasExists(name.to_string()));
        }
        if self.is_bound(name) {
            return Err(RegistryError::AliasShadowsCommand(name.to_string()));
        }
        self.aliases
            .insert(name.to_string(), CommandArgs::new(command, parameters));
        Ok(())
    }

    pub fn remove_alias(&mut self, name: &str) -> Result<(), RegistryError> {
        self.aliases
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::AliasNotFound(name.to_string()))
    }

    pub fn find_alias(&self, name: &str) -> Option<&CommandArgs> {
        self.aliases.get(name)
    }

    /// Names of the aliases pointing directly at `command`.
    pub fn aliases_for(&self, command: &str) -> Vec<String> {
        self.aliases
            .iter()
            .filter(|(_, target)| target.command == command)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Resolves `name` in lookup order: core, custom, then alias.
    ///
    /// Aliases may point at other aliases; each hop puts its parameters in
    /// front of the ones collected so far. `Ok(None)` means the name is not a
    /// command at all and should be tried as a script.
    pub fn resolve(&self, name: &str, args: &[String]) -> Result<Option<Resolved>, RegistryError> {
        let mut current = name.to_string();
        let mut args = args.to_vec();
        let mut seen = HashSet::new();

        loop {
            if let Some(factory) = self.core.get(&current).or_else(|| self.custom.get(&current)) {
                return Ok(Some(Resolved {
                    factory: Arc::clone(factory),
                    args,
                }));
            }
            let Some(alias) = self.aliases.get(&current) else {
                return Ok(None);
            };
            if !seen.insert(current.clone()) {
                return Err(RegistryError::AliasCycle(name.to_string()));
            }
            debug!(alias = %current, target = %alias.command, "expanding alias");
            let mut expanded = alias.parameters.clone();
            expanded.append(&mut args);
            args = expanded;
            current = alias.command.clone();
        }
    }
}
