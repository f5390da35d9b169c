//! Request pipeline stages, outermost first:
//!
//! ```text
//! context → logging → metrics → recover → timeout → authenticate → require_role → handler
//! ```

pub mod auth;
pub mod context;
pub mod logging;
pub mod metrics;
pub mod recover;
