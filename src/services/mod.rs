pub mod clock;
pub mod driver;
pub mod engine;
pub mod lifecycle;
pub mod policy;
pub mod progress;
pub mod registry;
