// Module exports for models

pub mod block;
pub mod event;
pub mod grid;
pub mod schedule;
pub mod slot;
pub mod task;
