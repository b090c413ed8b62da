// Credvault — Store Module
//
// Two-table persistence for credential records: a shared core row plus at
// most one variant extension row per record. Values are stored exactly as
// handed over; encryption happens in the service layer.

mod db;
mod error;
mod models;
mod repository;

pub use db::Database;
pub use error::{FormError, StoreError};
pub use models::{
    now_millis, CardFields, CardRecord, CredentialRecord, CredentialRecordForm, IdentityFields,
    IdentityRecord, LoginFields, LoginRecord, Record, RecordKind, RecordListing, VariantFields,
    VariantForm, VariantRecord,
};
pub use repository::{RecordStore, SqliteRecordStore};
pub(crate) use repository::{format_time, parse_time, parse_uuid};
