// src/models/mod.rs

pub mod feedback;
pub mod participant;
pub mod quiz;
pub mod quiz_result;
