//! Vocabulary battle engine.
//!
//! Players fight an enemy by translating words. Each turn the word selector
//! offers the least-mastered terms from the vocabulary pool, the battle state
//! machine resolves answers into damage, and a finished battle is reported to
//! a result backend at most once.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;
pub mod vocabulary;
