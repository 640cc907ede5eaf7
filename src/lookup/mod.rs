pub mod error;
pub mod image;
pub mod normalizer;
pub mod text;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CredentialKind, LookupError};
pub use image::ImageLookupClient;
pub use text::TextInsightClient;
pub use types::{TermInfo, TrendInfo};
