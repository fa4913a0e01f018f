pub mod columns;
pub mod context;
pub mod engine;
pub mod personnel;
pub mod projection;
pub mod tasks;
