pub mod builder;
pub mod platform;
pub mod registry;
pub mod retry;
