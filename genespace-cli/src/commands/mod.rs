//! Command implementations for the GeneSpace CLI

pub mod config;
pub mod inspect;
pub mod tile;
pub mod view;
