// Service module exports

pub mod database;
pub mod drag;
pub mod history;
pub mod planner;
pub mod settings;
pub mod source;
pub mod view;
