// Module structure for the log converter.

// Core
pub mod logs;
pub mod store;

// Process surface
pub mod cli;
pub mod conf;
pub mod runtime;
