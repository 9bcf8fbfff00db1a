// src/bigint/mod.rs

pub mod bitarray;
pub mod calc;

pub use bitarray::BigBitArray;
pub use calc::BigIntCalc;
