// src/primes/mod.rs

pub mod oracle;

pub use oracle::PrimeOracle;
