//! Learned scoring models
//!
//! - [`PriorityModel`] - probability that a card needs review now
//! - [`DifficultyModel`] - continuous difficulty estimate
//!
//! Both standardise their inputs with a [`StandardScaler`] captured at fit
//! time and refuse to score before a successful fit.

pub mod difficulty;
pub mod priority;
pub mod scaler;

pub use difficulty::DifficultyModel;
pub use priority::PriorityModel;
pub use scaler::StandardScaler;
