pub mod branch;
pub mod common;
pub mod employee;
pub mod vehicle;
