//! AST visitor implementations for rebundle
//!
//! Read-only visitors collect module-scope facts after scope resolution;
//! the renamer applies final names once deconfliction is done.

mod declaration_collector;
mod global_collector;
mod nested_binding_collector;
mod renamer;
mod usage_collector;

pub use declaration_collector::{DeclarationCollector, DeclaredBinding};
pub use global_collector::GlobalCollector;
pub use nested_binding_collector::NestedBindingCollector;
pub use renamer::Renamer;
pub use usage_collector::UsageCollector;
