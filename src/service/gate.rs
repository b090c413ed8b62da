// Credvault — Ownership Gate
//
// The owner of a record is the `created_by` of its core row. Every record
// has a core row whatever its variant, so the check never looks at
// extension tables.

use uuid::Uuid;

use crate::error::VaultError;
use crate::store::{CredentialRecord, RecordStore};

pub struct OwnershipGate<'s, S: ?Sized> {
    store: &'s S,
}

impl<'s, S: RecordStore + ?Sized> OwnershipGate<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Confirm `caller` owns `record_id` and hand back its stored core.
    ///
    /// A missing core is `NotFound`; a core owned by someone else is
    /// `Forbidden`.
    pub fn authorize(
        &self,
        op: &'static str,
        record_id: &Uuid,
        caller: &Uuid,
    ) -> Result<CredentialRecord, VaultError> {
        let core = self
            .store
            .get_core(record_id)
            .map_err(|e| VaultError::store(op, e))?;

        if core.created_by != *caller {
            tracing::warn!(
                record_id = %record_id,
                caller = %caller,
                op,
                "Access denied: caller does not own record"
            );
            return Err(VaultError::Forbidden { op });
        }

        tracing::debug!(record_id = %record_id, op, "Ownership confirmed");
        Ok(core)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
