pub mod check;
pub mod clear;
pub mod get;
