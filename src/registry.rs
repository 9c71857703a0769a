//! Module registry: symbolic module names to factories

use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::modules::{CapabilityModule, DisplaySize, ModuleBase, Resize, Toolbar};

pub type ModuleFactory = Rc<dyn Fn(ModuleBase) -> Box<dyn CapabilityModule>>;

/// A constructible module that is not looked up by name
#[derive(Clone)]
pub struct CustomModule {
    name: String,
    factory: ModuleFactory,
}

impl CustomModule {
    pub fn new(
        name: impl Into<String>,
        factory: impl Fn(ModuleBase) -> Box<dyn CapabilityModule> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            factory: Rc::new(factory),
        }
    }
}

/// One entry of the configured module list
#[derive(Clone)]
pub enum ModuleSpec {
    DisplaySize,
    Toolbar,
    Resize,
    /// Resolved through names registered on the `ModuleRegistry`
    Named(String),
    Custom(CustomModule),
}

impl ModuleSpec {
    pub fn from_name(name: &str) -> Self {
        match name {
            DisplaySize::NAME => ModuleSpec::DisplaySize,
            Toolbar::NAME => ModuleSpec::Toolbar,
            Resize::NAME => ModuleSpec::Resize,
            other => ModuleSpec::Named(other.to_string()),
        }
    }

    pub fn custom(
        name: impl Into<String>,
        factory: impl Fn(ModuleBase) -> Box<dyn CapabilityModule> + 'static,
    ) -> Self {
        ModuleSpec::Custom(CustomModule::new(name, factory))
    }

    pub fn name(&self) -> &str {
        match self {
            ModuleSpec::DisplaySize => DisplaySize::NAME,
            ModuleSpec::Toolbar => Toolbar::NAME,
            ModuleSpec::Resize => Resize::NAME,
            ModuleSpec::Named(name) => name,
            ModuleSpec::Custom(custom) => &custom.name,
        }
    }
}

impl fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSpec::Custom(custom) => write!(f, "Custom({})", custom.name),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl Serialize for ModuleSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ModuleSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ModuleSpec::from_name(&name))
    }
}

pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl Default for ModuleRegistry {
    /// Registry holding the built-in modules
    fn default() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register(DisplaySize::NAME, |base| Box::new(DisplaySize::new(base)));
        registry.register(Toolbar::NAME, |base| Box::new(Toolbar::new(base)));
        registry.register(Resize::NAME, |base| Box::new(Resize::new(base)));
        registry
    }
}

impl ModuleRegistry {
    /// Register a named module; an existing name, built-ins included, is replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(ModuleBase) -> Box<dyn CapabilityModule> + 'static,
    ) {
        let name = name.into();
        debug!(module = %name, "registered image module");
        self.factories.insert(name, Rc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn resolve(&self, spec: &ModuleSpec) -> Result<ModuleFactory> {
        if let ModuleSpec::Custom(custom) = spec {
            return Ok(custom.factory.clone());
        }
        match self.factories.get(spec.name()) {
            Some(factory) => Ok(factory.clone()),
            None => bail!("Unknown image module '{}'", spec.name()),
        }
    }

    /// Construct one module per spec, in order
    ///
    /// Every spec is resolved before anything is constructed, so an unknown
    /// name yields no modules at all.
    pub fn instantiate(
        &self,
        specs: &[ModuleSpec],
        base: ModuleBase,
    ) -> Result<Vec<Box<dyn CapabilityModule>>> {
        let factories = specs
            .iter()
            .map(|spec| self.resolve(spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(factories.iter().map(|factory| factory(base)).collect())
    }
}
