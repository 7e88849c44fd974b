//! Core of the fine-tuning walkthrough: the five-step wizard, the example
//! set and hyperparameters it collects, the simulated training run and the
//! playground chat that compares a base model with a prompt-primed "tuned" one.

pub mod controllers;
pub mod exporters;
pub mod models;
pub mod services;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use controllers::{TrainingRun, TunerApp};
