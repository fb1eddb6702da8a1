//! Per-run bundling state
//!
//! A [`BundleSession`] is created fresh for every bundle invocation and is
//! threaded explicitly through each phase. It owns the module, external,
//! export and binding arenas, the two insert-once registries (canonical path
//! → module, specifier → external), and the swc infrastructure every module
//! shares (one source map, one comment store, one hygiene context).

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::warn;
use rustc_hash::FxHashSet;
use swc_core::common::{Globals, SourceMap, comments::SingleThreadedComments, sync::Lrc};

use crate::{
    config::BundleOptions,
    error::Warning,
    module_graph::{
        Binding, BindingId, ExportId, ExportRecord, ExternalId, ExternalModule, FxIndexMap,
        Module, ModuleId,
    },
};

pub struct BundleSession {
    pub(crate) options: BundleOptions,
    pub(crate) source_map: Lrc<SourceMap>,
    pub(crate) comments: SingleThreadedComments,
    pub(crate) globals: Globals,
    /// Modules in completion order; a module is stored once all of its
    /// dependencies are stored
    modules: Vec<Module>,
    externals: Vec<ExternalModule>,
    exports: Vec<ExportRecord>,
    bindings: Vec<Binding>,
    /// Canonical path → module
    module_ids: FxIndexMap<PathBuf, ModuleId>,
    /// Literal specifier → external module
    external_ids: FxIndexMap<String, ExternalId>,
    entry: Option<ModuleId>,
    warnings: Vec<Warning>,
    /// `(module, name)` pairs already reported as ambiguous
    reported_ambiguities: FxHashSet<(PathBuf, String)>,
}

impl fmt::Debug for BundleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleSession")
            .field("options", &self.options)
            .field("modules", &self.module_ids.keys().collect::<Vec<_>>())
            .field("externals", &self.external_ids.keys().collect::<Vec<_>>())
            .field("exports", &self.exports.len())
            .field("bindings", &self.bindings.len())
            .field("entry", &self.entry)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl BundleSession {
    pub fn new(options: BundleOptions) -> Self {
        Self {
            options,
            source_map: Lrc::default(),
            comments: SingleThreadedComments::default(),
            globals: Globals::new(),
            modules: Vec::new(),
            externals: Vec::new(),
            exports: Vec::new(),
            bindings: Vec::new(),
            module_ids: FxIndexMap::default(),
            external_ids: FxIndexMap::default(),
            entry: None,
            warnings: Vec::new(),
            reported_ambiguities: FxHashSet::default(),
        }
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    pub fn entry(&self) -> Option<ModuleId> {
        self.entry
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    /// All modules, dependencies before the modules that import them
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module_by_path(&self, path: &Path) -> Option<ModuleId> {
        self.module_ids.get(path).copied()
    }

    /// Id the next stored module will receive
    pub(crate) fn next_module_id(&self) -> ModuleId {
        ModuleId::new(self.modules.len() as u32)
    }

    /// Store a fully analyzed module
    pub(crate) fn insert_module(&mut self, module: Module) -> ModuleId {
        let id = module.id;
        debug_assert_eq!(id, self.next_module_id());
        self.module_ids.insert(module.path.clone(), id);
        if module.is_entry {
            self.entry = Some(id);
        }
        self.modules.push(module);
        id
    }

    pub fn external(&self, id: ExternalId) -> &ExternalModule {
        &self.externals[id.index()]
    }

    pub fn external_mut(&mut self, id: ExternalId) -> &mut ExternalModule {
        &mut self.externals[id.index()]
    }

    /// External modules in first-encounter order
    pub fn externals(&self) -> impl Iterator<Item = &ExternalModule> {
        self.externals.iter()
    }

    pub fn external_by_specifier(&self, specifier: &str) -> Option<ExternalId> {
        self.external_ids.get(specifier).copied()
    }

    /// Get or create the external module for a bare specifier
    pub(crate) fn intern_external(&mut self, specifier: &str) -> ExternalId {
        if let Some(id) = self.external_ids.get(specifier) {
            return *id;
        }
        let id = ExternalId::new(self.externals.len() as u32);
        self.externals.push(ExternalModule {
            id,
            specifier: specifier.to_owned(),
            exports: FxIndexMap::default(),
            dependents: Default::default(),
        });
        self.external_ids.insert(specifier.to_owned(), id);
        id
    }

    pub fn export(&self, id: ExportId) -> &ExportRecord {
        &self.exports[id.index()]
    }

    pub fn export_mut(&mut self, id: ExportId) -> &mut ExportRecord {
        &mut self.exports[id.index()]
    }

    pub(crate) fn add_export(&mut self, record: ExportRecord) -> ExportId {
        let id = ExportId::new(self.exports.len() as u32);
        self.exports.push(record);
        id
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.index()]
    }

    pub fn binding_mut(&mut self, id: BindingId) -> &mut Binding {
        &mut self.bindings[id.index()]
    }

    pub(crate) fn add_binding(&mut self, binding: Binding) -> BindingId {
        let id = BindingId::new(self.bindings.len() as u32);
        self.bindings.push(binding);
        id
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn report(&mut self, warning: Warning) {
        if let Warning::AmbiguousStarExport { module, name, .. } = &warning {
            if !self
                .reported_ambiguities
                .insert((module.clone(), name.clone()))
            {
                return;
            }
        }
        warn!("{warning}");
        self.warnings.push(warning);
    }
}
