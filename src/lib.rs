// src/lib.rs — Library root for SousChef

pub mod bot;
pub mod cli;
pub mod cooking;
pub mod infra;
pub mod integrations;
pub mod storage;
