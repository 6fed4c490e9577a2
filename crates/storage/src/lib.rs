pub mod backend;
pub mod error;
mod key;
mod models;

pub use crate::backend::Store;
pub use crate::key::validate as validate_key;
pub use crate::models::{Acl, PutAck};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn Store + Send + Sync>;
