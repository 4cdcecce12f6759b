pub mod engine;
pub mod evaluator;
pub mod loader;
pub mod markov;
pub mod modifiers;
pub mod parser;
pub mod tokens;
pub mod weighted;
