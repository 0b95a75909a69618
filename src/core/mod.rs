pub mod basis;
pub mod collocation;
pub mod config;
pub mod derivatives;
pub mod error;
pub mod knots;
pub mod splines;
