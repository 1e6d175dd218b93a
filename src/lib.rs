pub mod analysis;
pub mod annotation;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod detection;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod ssd;
pub mod traits;
