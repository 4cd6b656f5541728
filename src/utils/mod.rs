// src/utils/mod.rs

pub mod code;
pub mod hash;
pub mod html;
pub mod jwt;
pub mod time;
