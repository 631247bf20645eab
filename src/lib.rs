pub mod adapters;
pub mod config;
pub mod controllers;
pub mod domain;
pub mod error;
pub mod http;
pub mod ports;
pub mod repository;

#[cfg(test)]
pub mod test_helpers;
