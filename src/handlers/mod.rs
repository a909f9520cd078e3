// src/handlers/mod.rs

pub mod auth;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod question;
pub mod quiz;
