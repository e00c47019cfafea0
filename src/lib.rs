//! famtree: genealogy rosters rendered as family trees
//!
//! Members reference a single parent and a spouse; the builder turns that
//! roster into a forest of couples with their merged children.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod render;
pub mod util;
