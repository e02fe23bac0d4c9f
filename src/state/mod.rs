/// State management module
///
/// This module handles all application state, including:
/// - The SQLite-backed key/value storage area (library.rs)
/// - The draft record and display ordering (data.rs)
/// - The persisted draft collection (store.rs)
/// - The publish endpoint setting (settings.rs)
/// - The draft session controller (session.rs)

pub mod data;
pub mod library;
pub mod session;
pub mod settings;
pub mod store;
