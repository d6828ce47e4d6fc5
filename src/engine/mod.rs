//! Named rule engine module

mod rule_engine;

pub use rule_engine::*;
