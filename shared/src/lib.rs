//! Types, constants, and DTOs shared between the PlexGuard core and any
//! HTTP client of its admin/portal surface.

pub mod constants;
pub mod dto;
pub mod types;

pub use constants::*;
pub use dto::*;
pub use types::*;
