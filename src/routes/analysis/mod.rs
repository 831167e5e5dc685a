mod handler;
mod model;

pub use handler::{analyze_location, health, police_offices};
