// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod feedback;
pub mod participant;
pub mod quiz;
pub mod results;
pub mod session;
