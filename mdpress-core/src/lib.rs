#![doc = "mdpress-core: core pipeline library for mdpress."]

//! This crate contains all batch-rendering logic, data models and pipelines for mdpress.
//! CLI glue, configuration loading and CI output plumbing live in the `mdpress` binary crate.
//! Begin new modules as submodules below.
//!
//! # Usage
//! Add this as a dependency for all shared dispatch, rendering, installation and discovery code.

pub mod contract;
pub mod discover;
pub mod dispatch;
pub mod install;
pub mod render;
