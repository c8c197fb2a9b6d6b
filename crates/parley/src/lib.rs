//! Ready-made dialogues assembled from `parley-core` responders.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to pick up the same presets in your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod presets;
pub mod tools;

pub use presets::{
    ASSISTANT_NAME, CRITIC_NAME, PLANNER_NAME, Presets, USER_NAME, greeters,
    greeting,
};

/// Re-exports of [`parley_core`] crate.
pub mod core {
    pub use parley_core::*;
}
