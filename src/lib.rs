//! # entity-finder
//!
//! Discovers self-describing entity classes in Java source trees.
//!
//! An entity class carries its own persistence mapping: a static
//! `loadMetadata` method whose body issues mapping calls against the
//! metadata parameter. The driver walks configured directories, loads every
//! matching source file into a shared type registry, and exposes the classes
//! that describe themselves.
//!
//! ## Architecture
//!
//! - **driver**: Path-based discovery with a memoized entity class list
//! - **registry**: Shared in-memory registry of declared types per source file
//! - **loader**: Per-language source loading into the registry
//! - **scan**: Recursive source file discovery under configured directories
//! - **structure**: Java type and mapping-directive extraction using tree-sitter AST parsing
//! - **metadata**: Mapping model, directives, and the self-description capability
//! - **error**: Mapping error taxonomy with coarse error kinds

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod registry;
pub mod scan;
pub mod structure;
