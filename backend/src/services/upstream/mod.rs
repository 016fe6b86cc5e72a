pub mod client;
pub mod types;

pub use client::{UpstreamClient, UpstreamConfig};
pub use types::{RawSession, SessionContent, SessionMedia, SessionPlayer, SessionSnapshot, SessionUser};
