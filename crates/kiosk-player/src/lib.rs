pub mod config;
pub mod controller;
pub mod debounce;
pub mod envcheck;
pub mod error;
pub mod input;
pub mod media;
pub mod poll;
pub mod supervisor;

pub use error::{Error, Result};
