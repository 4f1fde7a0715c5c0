pub mod assembler;
pub mod engine;
