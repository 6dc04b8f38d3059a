//! Core library for the smellfix code-smell tool.
//!
//! This library parses Python source with ruff's parser, reports structural
//! smells (mutable default arguments, overlong functions, syntax errors) and
//! synthesizes unified-diff fixes for mutable defaults.
//!
//! ```
//! use smellfix::pipeline::analyze_source;
//! use smellfix::rules::ScanOptions;
//! use std::path::Path;
//!
//! let report = analyze_source(
//!     Path::new("m.py"),
//!     "def f(items=[]): items.append(1)\n",
//!     &ScanOptions::default(),
//! );
//! assert_eq!(report.diagnostics.len(), 1);
//! assert!(report.patch.is_some());
//! ```

#![allow(clippy::format_push_string, clippy::items_after_statements)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module defining the diagnostic data model.
pub mod diagnostic;

/// Module turning source text into syntax trees.
pub mod parser;

/// Module defining the syntax tree and function-node views.
pub mod tree;

/// Module containing the smell detectors.
pub mod rules;

/// Module containing the scanner that runs detectors over a tree.
pub mod scanner;

/// Module containing the byte-range rewriter and the mutable-default fix.
pub mod fix;

/// Module for unified diff generation and application.
pub mod diff;

/// Module orchestrating parse, scan, fix and diff for one file.
pub mod pipeline;

/// Module for loading configuration.
pub mod config;

/// Module containing utility functions.
/// This includes helper functions used across the application.
pub mod utils;

/// Module defining the entry point logic.
pub mod entry_point;

/// Module containing shared constants.
pub mod constants;

/// Module for rich CLI output formatting with colored text and progress bars.
pub mod output;

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;
