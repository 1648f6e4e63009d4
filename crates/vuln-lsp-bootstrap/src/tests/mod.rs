//! Unit and behavioural tests for the bootstrap layer.

mod behaviour;
mod support;
