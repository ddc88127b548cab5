pub mod anki;
pub mod commands;
pub mod config;
pub mod core;
pub mod generator;
pub mod gui;
pub mod persistence;
pub mod prompter;

#[cfg(test)]
mod testing;
