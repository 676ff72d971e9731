pub(crate) mod bootstrap;
mod demo_input;
mod gameplay;
pub(crate) mod loop_runner;
mod tuning;
