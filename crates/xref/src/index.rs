use crate::layout::EntityKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Registry {
    modules: BTreeMap<String, String>,
    classes: BTreeMap<String, String>,
    functions: BTreeMap<String, String>,
    module_classes: BTreeMap<String, Vec<String>>,
    class_module: BTreeMap<String, String>,
    /// Source file each class was first registered from
    class_sources: BTreeMap<String, PathBuf>,
}

impl Registry {
    fn table(&mut self, kind: EntityKind) -> &mut BTreeMap<String, String> {
        match kind {
            EntityKind::Module => &mut self.modules,
            EntityKind::Class => &mut self.classes,
            EntityKind::Function => &mut self.functions,
        }
    }
}

/// Entities documented during one run, shared by every tier.
///
/// Built fresh per run and injected where needed; all access goes through a
/// single lock.
#[derive(Debug, Default)]
pub struct CrossReferenceIndex {
    inner: Mutex<Registry>,
}

impl CrossReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, kind: EntityKind, name: &str, text: &str) {
        self.lock().table(kind).insert(name.to_string(), text.to_string());
        log::debug!("Registered {}: {name}", kind.as_str());
    }

    /// Register a class with its owning module and the file it came from.
    ///
    /// Identity is the short class name, so a second registration from a
    /// different file replaces the first; that collision is logged.
    pub fn register_class(&self, name: &str, text: &str, module: Option<&str>, source: Option<&Path>) {
        let mut registry = self.lock();

        if let Some(source) = source {
            match registry.class_sources.get(name) {
                Some(previous) if previous != source => log::warn!(
                    "Class name collision: {name} defined in {} and {}; links point to the latest",
                    previous.display(),
                    source.display()
                ),
                Some(_) => {}
                None => {
                    registry
                        .class_sources
                        .insert(name.to_string(), source.to_path_buf());
                }
            }
        }

        registry.classes.insert(name.to_string(), text.to_string());
        if let Some(module) = module {
            let members = registry.module_classes.entry(module.to_string()).or_default();
            if !members.iter().any(|member| member == name) {
                members.push(name.to_string());
            }
            registry
                .class_module
                .insert(name.to_string(), module.to_string());
        }
        log::debug!("Registered class: {name}");
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.lock().table(kind).contains_key(name)
    }

    pub fn text(&self, kind: EntityKind, name: &str) -> Option<String> {
        self.lock().table(kind).get(name).cloned()
    }

    /// Registered names of one kind, sorted
    pub fn names(&self, kind: EntityKind) -> Vec<String> {
        self.lock().table(kind).keys().cloned().collect()
    }

    /// Other classes registered under the same module
    pub fn related_classes(&self, class: &str) -> Vec<String> {
        let registry = self.lock();
        registry
            .class_module
            .get(class)
            .and_then(|module| registry.module_classes.get(module))
            .map(|members| {
                members
                    .iter()
                    .filter(|member| member.as_str() != class)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn module_classes(&self, module: &str) -> Vec<String> {
        self.lock()
            .module_classes
            .get(module)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        let registry = self.lock();
        registry.modules.len() + registry.classes.len() + registry.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
