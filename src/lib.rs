pub mod broadcast;
pub mod capture;
pub mod configuration;
pub mod controller;
pub mod dissector;
pub mod error_handling;
pub mod pipeline;
pub mod query;
pub mod storage;
pub mod web_interface;

#[cfg(test)]
mod test_utils;
