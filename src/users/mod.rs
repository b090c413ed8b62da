// Credvault — Users Module
//
// Minimal user registry. Records reference users only through their id
// (`created_by` / `updated_by`); the service never looks users up itself.

mod directory;

pub use directory::{SqliteUserDirectory, User, UserDirectory};
