// src/polynomial/mod.rs

pub mod stream;

pub use stream::{Polynomial, PolynomialStream};
