mod config;
mod error;
mod events;
mod store;

pub use config::FirebaseConfig;
pub use error::{FirebaseDaoError, FirebaseResult};
pub use store::FirebaseStore;

use crate::dao::storage::StorageError;

impl From<FirebaseDaoError> for StorageError {
    fn from(err: FirebaseDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
