//! kiln-lib: recipe-driven CMake build pipeline
//!
//! This crate provides the stages a recipe goes through:
//! - `recipe`: evaluate a Lua recipe into a `Recipe`
//! - `config`: validate settings and resolve the toolchain
//! - `source`: fetch the tagged source archive, or fall back to a local tree
//! - `provision`: request OS packages through the host's package manager
//! - `build`, `test_runner`, `install`: drive cmake and ctest
//! - `pipeline`: the state machine tying the stages to lifecycle hooks

pub mod build;
pub mod config;
pub mod consts;
pub mod exec;
pub mod install;
pub mod pipeline;
pub mod platform;
pub mod provision;
pub mod recipe;
pub mod source;
pub mod test_runner;
pub mod util;
