pub mod commands;
pub mod core;
pub mod db;
pub mod models;
pub mod utils;
