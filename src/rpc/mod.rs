//! Session protocol: wire messages and their handlers

pub mod handler;
pub mod protocol;
