pub use cerebrate_core::prelude::*;

// vim: ts=4
