//! Responsive gallery layout engine.
//!
//! - `layout`: justified rows, masonry columns, breakpoints, result cache
//! - `scheduler`: debounced recompute with a first-pass dimension gate
//! - `carousel`: active index, autoplay and scroll-driven selection
//! - `runtime`: tokio event loop driving both state machines
//! - `scanner`: image discovery and header-only size probing

pub mod carousel;
pub mod cli;
pub mod config;
pub mod layout;
pub mod models;
pub mod runtime;
pub mod scanner;
pub mod scheduler;
