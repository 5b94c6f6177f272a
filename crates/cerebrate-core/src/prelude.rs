pub use crate::app::App;
pub use cerebrate_types::error::{ClResult, Error};
pub use cerebrate_types::types::{Severity, Timestamp, UserId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
