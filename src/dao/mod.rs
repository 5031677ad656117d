/// Session codes and member id generation and validation.
pub mod codes;
/// Database model definitions.
pub mod models;
/// Session and score repository on top of the key-path store.
pub mod session;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Hierarchical key-path store and its backends.
pub mod store;
