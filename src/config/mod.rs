// src/config/mod.rs

pub mod mpqs_config;

pub use mpqs_config::{size_parameters_for_digits, MpqsConfig, SizeParameters};
