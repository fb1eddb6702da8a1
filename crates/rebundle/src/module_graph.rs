//! Module graph records
//!
//! Every node of the bundle graph lives in an arena owned by
//! [`BundleSession`](crate::session::BundleSession) and is referenced by a
//! small copyable id everywhere else. Cross references (dependents, export
//! owners, re-exported records) are plain ids, so records never own each
//! other and the graph can be mutated phase by phase without reference cycles.

use std::{fmt, hash::BuildHasherDefault, path::PathBuf};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHasher};
use swc_core::{
    common::SyntaxContext,
    ecma::ast::{Id, Module as SwcModule},
};

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Export name used for a module's namespace aggregate
pub const NAMESPACE_EXPORT: &str = "*";
/// Export name used for a module's default export
pub const DEFAULT_EXPORT: &str = "default";

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                Self(id)
            }

            /// Position of the record in its arena
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Unique identifier for an internal (file-backed) module
    ModuleId
);
arena_id!(
    /// Unique identifier for an external module
    ExternalId
);
arena_id!(
    /// Unique identifier for an export record
    ExportId
);
arena_id!(
    /// Unique identifier for a top-level binding
    BindingId
);

/// Target of a specifier: a module we bundle, or an opaque external
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleRef {
    Internal(ModuleId),
    External(ExternalId),
}

/// One exported name as observed at a module's public surface.
///
/// Several modules may point at the same record (re-exports share it), so
/// a rename of the record is visible through every alias.
#[derive(Debug, Clone)]
pub struct ExportRecord {
    /// Name inside the declaring module (`'*'` for namespace aggregates,
    /// `'default'` for anonymous defaults)
    pub local_name: String,
    /// Identifier that holds the value in the merged program
    pub identifier_name: String,
    /// Module that provides the value
    pub source: ModuleRef,
    /// Binding that backs the export, when there is one
    pub owner_binding: Option<BindingId>,
    /// External specifier the name was borrowed from through `export *`
    pub exported_from: Option<String>,
}

/// Declaration form of a top-level binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Const,
    Let,
    Var,
    Function,
    Class,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const => write!(f, "const"),
            Self::Let => write!(f, "let"),
            Self::Var => write!(f, "var"),
            Self::Function => write!(f, "function"),
            Self::Class => write!(f, "class"),
        }
    }
}

/// A module-scope declaration
#[derive(Debug, Clone)]
pub struct Binding {
    /// Scope-resolved identity of the declared name
    pub id: Id,
    /// Current name; updated by the deconflictor
    pub name: String,
    pub module: ModuleId,
    pub kind: BindingKind,
    /// Every non-declaring occurrence, `export` sites included
    pub references: usize,
    /// Occurrences contributed by `export` keywords and export specifiers
    pub export_references: usize,
    /// Assignment and update targets
    pub reassignments: usize,
    /// Set once the tree shaker deleted the declaration
    pub removed: bool,
}

impl Binding {
    pub fn original_name(&self) -> &str {
        &self.id.0
    }

    /// References that are not the binding being exported
    pub fn local_references(&self) -> usize {
        self.references.saturating_sub(self.export_references)
    }
}

/// What a local import binding consumes
#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// `'default'`, `'*'` or the imported name
    pub imported_name: String,
    pub source_specifier: String,
    pub local: Id,
    pub target: ModuleRef,
    /// Record the local name stands for, when the dependency provides it
    pub resolved: Option<ExportId>,
    /// Occurrences of the local name outside export statements
    pub references: usize,
}

/// An `export * from '<external>'` that can only be materialized at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarReexport {
    pub specifier: String,
    pub external: ExternalId,
}

/// Occurrence counts for one scope-resolved identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentUsage {
    pub references: usize,
    pub export_references: usize,
    pub reassignments: usize,
}

impl IdentUsage {
    /// Occurrences outside export statements
    pub fn local_references(&self) -> usize {
        self.references.saturating_sub(self.export_references)
    }
}

/// A source file in the bundle
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    /// Canonical path on disk
    pub path: PathBuf,
    pub is_entry: bool,
    /// Size of the source text in bytes
    pub source_len: usize,
    pub ast: SwcModule,
    /// Syntax context the resolver assigns to module-scope declarations
    pub top_level_ctxt: SyntaxContext,
    /// Syntax context of references that resolve to no declaration
    pub unresolved_ctxt: SyntaxContext,
    /// Specifier as written → resolved target
    pub dependencies: FxIndexMap<String, ModuleRef>,
    /// Modules that import or re-export from this one
    pub dependents: FxIndexSet<ModuleId>,
    /// Exported name → record
    pub exports: FxIndexMap<String, ExportId>,
    pub import_bindings: Vec<ImportBinding>,
    /// Top-level declarations, in source order
    pub bindings: Vec<BindingId>,
    pub pending_star_reexports: Vec<StarReexport>,
    /// Record holding the value of `export default <expression>` when it
    /// cannot alias a binding
    pub anonymous_default: Option<ExportId>,
    /// Occurrence counts of every module-scope identifier
    pub usage: FxHashMap<Id, IdentUsage>,
}

impl Module {
    pub fn new(
        id: ModuleId,
        path: PathBuf,
        is_entry: bool,
        source_len: usize,
        ast: SwcModule,
        top_level_ctxt: SyntaxContext,
        unresolved_ctxt: SyntaxContext,
    ) -> Self {
        Self {
            id,
            path,
            is_entry,
            source_len,
            ast,
            top_level_ctxt,
            unresolved_ctxt,
            dependencies: FxIndexMap::default(),
            dependents: FxIndexSet::default(),
            exports: FxIndexMap::default(),
            import_bindings: Vec::new(),
            bindings: Vec::new(),
            pending_star_reexports: Vec::new(),
            anonymous_default: None,
            usage: FxHashMap::default(),
        }
    }

    /// Find the import that declared `local`
    pub fn import_binding(&self, local: &Id) -> Option<&ImportBinding> {
        self.import_bindings
            .iter()
            .find(|import| &import.local == local)
    }
}

/// A dependency the bundler never reads; it stays an `import` in the output
#[derive(Debug)]
pub struct ExternalModule {
    pub id: ExternalId,
    /// The literal specifier text, its identity
    pub specifier: String,
    /// `'default'`, `'*'` or imported name → record
    pub exports: FxIndexMap<String, ExportId>,
    pub dependents: FxIndexSet<ModuleId>,
}
