pub mod globe;
pub mod plan;
