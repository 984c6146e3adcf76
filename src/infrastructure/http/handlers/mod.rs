//! HTTP Handlers

mod container;
mod ping;
mod synthesis;
mod voice;

pub use container::*;
pub use ping::*;
pub use synthesis::*;
pub use voice::*;
