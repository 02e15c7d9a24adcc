//! Command line front end

pub mod invoke;
pub mod quote;
pub mod setup;
pub mod ui;
