//! Native extension building
//!
//! Assembles the compiled-extension targets of the binding layer and builds
//! them. Each target combines its Cython wrapper sources with the shared
//! dxFeed C API sources, minus whatever the target platform excludes.
//!
//! - [`sources`]: shared native source collection and platform exclusions
//! - [`assembler`]: manifest targets -> resolved [`ExtensionTarget`]s
//! - [`binding`], [`compiler`]: external toolchain wrappers
//! - [`builder`]: per-target build orchestration

pub mod assembler;
pub mod binding;
pub mod builder;
pub mod compiler;
pub mod process;
pub mod sources;
pub mod types;

pub use assembler::assemble;
pub use binding::BindingGenerator;
pub use builder::ExtensionBuilder;
pub use compiler::CCompiler;
pub use sources::{ExclusionFilter, collect_sources, platform_sources};
pub use types::{BuildResult, ExtensionTarget};
