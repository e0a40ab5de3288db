pub mod coerce;
pub mod config;
pub mod diff;
pub mod error;
pub mod io;
pub mod model;
pub mod normalize;
pub mod repository;
pub mod sync;
pub mod timestamp;

pub use error::{ErrorKind, Result, RiderError};
