//! Core data structures for the YumYum Eco simulation.

pub mod entity;
pub mod environment;
