//! A set of built-in tools that models can use.

mod current_time;

pub use current_time::CurrentTimeTool;
