// Credvault — Field Codec Module
//
// Symmetric encryption of individual string fields. Knows nothing about
// record shape; the service layer decides which fields go through it.

mod error;
mod field;

pub use error::CodecError;
pub use field::{decrypt, encrypt, FieldCodec};
