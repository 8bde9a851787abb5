pub mod builder;
pub mod simulation;
