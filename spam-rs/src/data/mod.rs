//! Dataset loading and splitting

pub mod loader;
pub mod split;

pub use loader::{decode, DataLoader, Dataset, Document, TextEncoding};
pub use split::{stratified_split, Split};
