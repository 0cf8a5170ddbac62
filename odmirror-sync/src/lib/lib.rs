pub mod diff;
pub mod mirror;
pub mod oauth2;
pub mod reconcile;
pub mod snapshot;
pub mod storage;
pub mod sweep;
pub mod transfer;
pub mod walk;

pub use crate::mirror::{Mirror, Summary};
