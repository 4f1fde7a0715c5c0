pub mod backend;
pub mod cpu;
pub mod png;
pub mod text;
