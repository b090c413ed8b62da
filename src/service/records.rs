// Credvault — Record Service
//
// Orchestrates every record operation:
//   1. ownership check through the gate (get, update, delete)
//   2. form parsing and validation for the record's kind
//   3. field encryption / decryption over the kind's sensitive fields
//   4. persistence through the record store
//
// Create, update and delete hand back stored values (ciphertext). Only
// `get_record` returns plaintext.

use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::OwnershipGate;
use crate::codec::FieldCodec;
use crate::error::{Result, VaultError};
use crate::store::{
    CardFields, CredentialRecord, CredentialRecordForm, FormError, IdentityFields, LoginFields,
    Record, RecordKind, RecordListing, RecordStore, StoreError, VariantFields, VariantForm,
    VariantRecord,
};

pub struct RecordService<S> {
    store: S,
    codec: FieldCodec,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: S, codec: FieldCodec) -> Self {
        Self { store, codec }
    }

    fn gate(&self) -> OwnershipGate<'_, S> {
        OwnershipGate::new(&self.store)
    }

    /// Every record `owner` created, bucketed by kind. Sensitive fields are
    /// returned as stored.
    pub fn list_records(&self, owner: &Uuid) -> Result<RecordListing> {
        self.store
            .list_all(owner)
            .map_err(|e| VaultError::store("list_records", e))
    }

    /// Fetch one record with its sensitive fields decrypted.
    pub fn get_record(&self, id: &Uuid, caller: &Uuid) -> Result<Record> {
        const OP: &str = "get_record";

        let core = self.gate().authorize(OP, id, caller)?;
        let mut record = self.resolve(OP, core)?;
        self.open(OP, record.sensitive_fields_mut())?;

        Ok(record)
    }

    /// Create a record of the kind named by `kind_tag` from a JSON form.
    pub fn create_record(&self, kind_tag: &str, raw_form: &[u8], owner: &Uuid) -> Result<Record> {
        const OP: &str = "create_record";

        let kind: RecordKind = kind_tag.parse().map_err(|e| VaultError::form(OP, e))?;

        let record = match kind {
            RecordKind::SecureNote => {
                let form: CredentialRecordForm = parse_form(OP, raw_form)?;
                let name = form
                    .require_name()
                    .map_err(|e| VaultError::form(OP, e))?
                    .to_string();

                let mut core = CredentialRecord::new(name, form.notes, *owner);
                self.seal(OP, core.sensitive_fields_mut())?;

                let stored = self
                    .store
                    .create_core(&core)
                    .map_err(|e| VaultError::store(OP, e))?;
                Record::SecureNote(stored)
            }
            RecordKind::Login => Record::Login(self.create_variant::<LoginFields>(
                OP,
                raw_form,
                owner,
                |s, r| s.create_login(r),
            )?),
            RecordKind::Card => Record::Card(self.create_variant::<CardFields>(
                OP,
                raw_form,
                owner,
                |s, r| s.create_card(r),
            )?),
            RecordKind::Identity => Record::Identity(self.create_variant::<IdentityFields>(
                OP,
                raw_form,
                owner,
                |s, r| s.create_identity(r),
            )?),
        };

        Ok(record)
    }

    /// Apply a partial JSON form to an existing record. The form schema is
    /// picked from the record's stored kind; a form with nothing in it is
    /// rejected. Only the fields the form carries are encrypted and written.
    pub fn update_record(&self, id: &Uuid, raw_form: &[u8], caller: &Uuid) -> Result<Record> {
        const OP: &str = "update_record";

        let core = self.gate().authorize(OP, id, caller)?;
        let current = self.resolve(OP, core)?;

        let updated = match current {
            Record::SecureNote(core) => {
                let form: CredentialRecordForm = parse_form(OP, raw_form)?;
                check_update(OP, form.is_blank(), form.validate())?;

                let mut patch = core.update_patch(&form, *caller);
                self.seal(OP, patch.sensitive_fields_mut())?;

                let stored = self
                    .store
                    .update_core(&patch)
                    .map_err(|e| VaultError::store(OP, e))?;
                Record::SecureNote(stored)
            }
            Record::Login(record) => Record::Login(self.update_variant::<LoginFields>(
                OP,
                &record,
                raw_form,
                caller,
                |s, r| s.update_login(r),
            )?),
            Record::Card(record) => Record::Card(self.update_variant::<CardFields>(
                OP,
                &record,
                raw_form,
                caller,
                |s, r| s.update_card(r),
            )?),
            Record::Identity(record) => Record::Identity(self.update_variant::<IdentityFields>(
                OP,
                &record,
                raw_form,
                caller,
                |s, r| s.update_identity(r),
            )?),
        };

        tracing::info!(record_id = %id, kind = %updated.kind(), "Record updated");

        Ok(updated)
    }

    /// Delete a record and return its stored core.
    pub fn delete_record(&self, id: &Uuid, caller: &Uuid) -> Result<CredentialRecord> {
        const OP: &str = "delete_record";

        self.gate().authorize(OP, id, caller)?;

        self.store.delete(id).map_err(|e| VaultError::store(OP, e))
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    /// Find the variant behind a core row. Variants are probed in a fixed
    /// order; a core with no extension row is a secure note.
    fn resolve(&self, op: &'static str, core: CredentialRecord) -> Result<Record> {
        let id = core.id;

        if let Some(record) = found(op, self.store.get_login(&id))? {
            return Ok(Record::Login(record));
        }
        if let Some(record) = found(op, self.store.get_card(&id))? {
            return Ok(Record::Card(record));
        }
        if let Some(record) = found(op, self.store.get_identity(&id))? {
            return Ok(Record::Identity(record));
        }

        Ok(Record::SecureNote(core))
    }

    fn create_variant<F: VariantFields>(
        &self,
        op: &'static str,
        raw_form: &[u8],
        owner: &Uuid,
        persist: impl FnOnce(&S, &VariantRecord<F>) -> std::result::Result<VariantRecord<F>, StoreError>,
    ) -> Result<VariantRecord<F>> {
        let form: VariantForm<F> = parse_form(op, raw_form)?;
        let mut record = form
            .into_record(*owner)
            .map_err(|e| VaultError::form(op, e))?;

        self.seal(op, record.sensitive_fields_mut())?;

        persist(&self.store, &record).map_err(|e| VaultError::store(op, e))
    }

    fn update_variant<F: VariantFields>(
        &self,
        op: &'static str,
        current: &VariantRecord<F>,
        raw_form: &[u8],
        caller: &Uuid,
        persist: impl FnOnce(&S, &VariantRecord<F>) -> std::result::Result<VariantRecord<F>, StoreError>,
    ) -> Result<VariantRecord<F>> {
        let form: VariantForm<F> = parse_form(op, raw_form)?;
        check_update(op, form.is_blank(), form.validate())?;

        let mut patch = current.update_patch(&form, *caller);
        self.seal(op, patch.sensitive_fields_mut())?;

        persist(&self.store, &patch).map_err(|e| VaultError::store(op, e))
    }

    fn seal(&self, op: &'static str, fields: Vec<&mut Option<String>>) -> Result<()> {
        for field in fields {
            if let Some(value) = field.as_mut() {
                *value = self
                    .codec
                    .encrypt(value.as_str())
                    .map_err(|e| VaultError::codec(op, e))?;
            }
        }
        Ok(())
    }

    fn open(&self, op: &'static str, fields: Vec<&mut Option<String>>) -> Result<()> {
        for field in fields {
            if let Some(value) = field.as_mut() {
                *value = self
                    .codec
                    .decrypt(value.as_str())
                    .map_err(|e| VaultError::codec(op, e))?;
            }
        }
        Ok(())
    }
}

fn parse_form<T: DeserializeOwned>(op: &'static str, raw_form: &[u8]) -> Result<T> {
    serde_json::from_slice(raw_form)
        .map_err(|e| VaultError::invalid_input(op, format!("malformed form: {}", e)))
}

fn check_update(
    op: &'static str,
    blank: bool,
    validated: std::result::Result<(), FormError>,
) -> Result<()> {
    if blank {
        return Err(VaultError::form(op, FormError::NothingToUpdate));
    }
    validated.map_err(|e| VaultError::form(op, e))
}

/// `NotFound` from a variant probe means "not this kind", not a failure.
fn found<T>(op: &'static str, result: std::result::Result<T, StoreError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(VaultError::store(op, e)),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::error::ErrorKind;
    use crate::store::{CardRecord, Database, IdentityRecord, LoginRecord, SqliteRecordStore};

    const KEY: &str = "1234567890123456";

    fn service(db: &Database) -> RecordService<SqliteRecordStore<'_>> {
        RecordService::new(SqliteRecordStore::new(db), FieldCodec::new(KEY).unwrap())
    }

    fn enc(value: &str) -> Option<String> {
        Some(codec::encrypt(value, KEY).unwrap())
    }

    fn as_note(record: Record) -> CredentialRecord {
        match record {
            Record::SecureNote(core) => core,
            other => panic!("expected secure note, got {}", other.kind()),
        }
    }

    fn as_login(record: Record) -> LoginRecord {
        match record {
            Record::Login(r) => r,
            other => panic!("expected login, got {}", other.kind()),
        }
    }

    fn as_card(record: Record) -> CardRecord {
        match record {
            Record::Card(r) => r,
            other => panic!("expected card, got {}", other.kind()),
        }
    }

    fn as_identity(record: Record) -> IdentityRecord {
        match record {
            Record::Identity(r) => r,
            other => panic!("expected identity, got {}", other.kind()),
        }
    }

    fn create_login(svc: &RecordService<SqliteRecordStore<'_>>, owner: &Uuid) -> Uuid {
        svc.create_record(
            "login",
            br#"{"name":"L1","username":"u","password":"p","url":"http://x"}"#,
            owner,
        )
        .unwrap()
        .id()
    }

    #[test]
    fn test_secure_note_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        let created = as_note(
            svc.create_record("secure_note", br#"{"name":"N1","notes":"secret"}"#, &u1)
                .unwrap(),
        );
        // Create hands back the stored form.
        assert_eq!(created.notes.as_deref(), Some("s6+ac05Q"));
        assert_eq!(created.created_by, u1);

        let fetched = as_note(svc.get_record(&created.id, &u1).unwrap());
        assert_eq!(fetched.name, "N1");
        assert_eq!(fetched.notes.as_deref(), Some("secret"));

        let err = svc.get_record(&created.id, &u2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let deleted = svc.delete_record(&created.id, &u1).unwrap();
        assert_eq!(deleted.id, created.id);
        assert_eq!(deleted.notes, created.notes);

        let err = svc.get_record(&created.id, &u1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_login_is_encrypted_at_rest() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();

        let id = create_login(&svc, &owner);

        let stored = svc.store.get_login(&id).unwrap();
        assert_eq!(stored.core.notes, None);
        assert_eq!(stored.fields.username, enc("u"));
        assert_eq!(stored.fields.password, enc("p"));
        assert_eq!(stored.fields.url.as_deref(), Some("http://x"));

        let fetched = as_login(svc.get_record(&id, &owner).unwrap());
        assert_eq!(fetched.fields.username.as_deref(), Some("u"));
        assert_eq!(fetched.fields.password.as_deref(), Some("p"));
        assert_eq!(fetched.fields.url.as_deref(), Some("http://x"));

        assert!(matches!(svc.store.get_card(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(svc.store.get_identity(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_card_roundtrip_and_exclusivity() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();

        let id = svc
            .create_record(
                "card",
                br#"{"name":"C1","notes":"n","brand":"visa","number":"4111","expiration_month":"01","expiration_year":"2030","cvv":"123"}"#,
                &owner,
            )
            .unwrap()
            .id();

        let stored = svc.store.get_card(&id).unwrap();
        assert_eq!(stored.fields.brand.as_deref(), Some("visa"));
        assert_eq!(stored.fields.number, enc("4111"));
        assert_eq!(stored.fields.cvv, enc("123"));
        assert_eq!(stored.core.notes, enc("n"));

        let fetched = as_card(svc.get_record(&id, &owner).unwrap());
        assert_eq!(fetched.core.notes.as_deref(), Some("n"));
        assert_eq!(fetched.fields.number.as_deref(), Some("4111"));
        assert_eq!(fetched.fields.expiration_month.as_deref(), Some("01"));
        assert_eq!(fetched.fields.expiration_year.as_deref(), Some("2030"));
        assert_eq!(fetched.fields.cvv.as_deref(), Some("123"));

        assert!(matches!(svc.store.get_login(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(svc.store.get_identity(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_identity_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();

        let id = svc
            .create_record(
                "identity",
                br#"{"name":"I1","first_name":"Ada","last_name":"Lovelace","email":"ada@example.com","country":"UK"}"#,
                &owner,
            )
            .unwrap()
            .id();

        let stored = svc.store.get_identity(&id).unwrap();
        assert_eq!(stored.fields.first_name, enc("Ada"));
        assert_eq!(stored.fields.country.as_deref(), Some("UK"));
        assert_eq!(stored.fields.middle_name, None);

        let fetched = as_identity(svc.get_record(&id, &owner).unwrap());
        assert_eq!(fetched.fields.first_name.as_deref(), Some("Ada"));
        assert_eq!(fetched.fields.last_name.as_deref(), Some("Lovelace"));
        assert_eq!(fetched.fields.email.as_deref(), Some("ada@example.com"));
        assert_eq!(fetched.fields.country.as_deref(), Some("UK"));

        assert!(matches!(svc.store.get_login(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(svc.store.get_card(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();

        let cases: [(&str, &[u8]); 5] = [
            ("wallet", br#"{"name":"W"}"#),
            ("login", br#"{"username":"u"}"#),
            ("secure_note", br#"{"name":""}"#),
            ("secure_note", br#"{"name":"N","notes":""}"#),
            ("card", b"not json"),
        ];

        for (tag, form) in cases {
            let err = svc.create_record(tag, form, &owner).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "tag {}", tag);
        }

        assert!(svc.list_records(&owner).unwrap().is_empty());
    }

    #[test]
    fn test_update_applies_partial_form() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();
        let id = create_login(&svc, &owner);

        let updated = as_login(
            svc.update_record(&id, br#"{"password":"p2","notes":"rotated"}"#, &owner)
                .unwrap(),
        );
        assert_eq!(updated.fields.password, enc("p2"));
        assert_eq!(updated.core.notes, enc("rotated"));
        assert_eq!(updated.core.updated_by, owner);
        assert_eq!(updated.core.created_by, owner);

        let fetched = as_login(svc.get_record(&id, &owner).unwrap());
        assert_eq!(fetched.core.name, "L1");
        assert_eq!(fetched.core.notes.as_deref(), Some("rotated"));
        assert_eq!(fetched.fields.username.as_deref(), Some("u"));
        assert_eq!(fetched.fields.password.as_deref(), Some("p2"));
        assert_eq!(fetched.fields.url.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_update_secure_note() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();

        let id = svc
            .create_record("secure_note", br#"{"name":"N1","notes":"old"}"#, &owner)
            .unwrap()
            .id();

        svc.update_record(&id, br#"{"name":"N2"}"#, &owner).unwrap();

        let fetched = as_note(svc.get_record(&id, &owner).unwrap());
        assert_eq!(fetched.name, "N2");
        assert_eq!(fetched.notes.as_deref(), Some("old"));
    }

    #[test]
    fn test_blank_update_is_rejected_without_mutation() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();
        let id = create_login(&svc, &owner);
        let before = svc.store.get_login(&id).unwrap();

        let blank_forms: [&[u8]; 2] = [b"{}", br#"{"name":"","url":""}"#];
        for form in blank_forms {
            let err = svc.update_record(&id, form, &owner).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        // Present-but-empty name alongside real changes is still invalid.
        let err = svc
            .update_record(&id, br#"{"name":"","password":"p2"}"#, &owner)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(svc.store.get_login(&id).unwrap(), before);
    }

    #[test]
    fn test_non_owner_cannot_update_or_delete() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let id = create_login(&svc, &owner);
        let before = svc.store.get_login(&id).unwrap();

        let err = svc
            .update_record(&id, br#"{"password":"stolen"}"#, &intruder)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = svc.delete_record(&id, &intruder).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        assert_eq!(svc.store.get_login(&id).unwrap(), before);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let caller = Uuid::new_v4();
        let ghost = Uuid::new_v4();

        for err in [
            svc.update_record(&ghost, br#"{"name":"x"}"#, &caller).unwrap_err(),
            svc.delete_record(&ghost, &caller).unwrap_err(),
            svc.get_record(&ghost, &caller).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.status_code(), 404);
        }
    }

    #[test]
    fn test_list_is_scoped_to_owner_and_not_decrypted() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let note_id = svc
            .create_record("secure_note", br#"{"name":"N1","notes":"secret"}"#, &owner)
            .unwrap()
            .id();
        let login_id = create_login(&svc, &owner);
        create_login(&svc, &other);

        let listing = svc.list_records(&owner).unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing.secure_notes.len(), 1);
        assert_eq!(listing.secure_notes[0].id, note_id);
        assert_eq!(listing.secure_notes[0].notes, enc("secret"));
        assert_eq!(listing.logins.len(), 1);
        assert_eq!(listing.logins[0].core.id, login_id);
        assert_eq!(listing.logins[0].fields.password, enc("p"));
        assert!(listing.secure_notes.iter().all(|n| n.id != login_id));
    }

    #[test]
    fn test_wrong_key_never_reveals_plaintext() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();

        let id = service(&db)
            .create_record(
                "secure_note",
                r#"{"name":"N1","notes":"pässwörd"}"#.as_bytes(),
                &owner,
            )
            .unwrap()
            .id();

        let other = RecordService::new(
            SqliteRecordStore::new(&db),
            FieldCodec::new("abcdefghijklmnop").unwrap(),
        );
        match other.get_record(&id, &owner) {
            Ok(record) => assert_ne!(as_note(record).notes.as_deref(), Some("pässwörd")),
            Err(err) => assert_eq!(err.kind(), ErrorKind::Internal),
        }
    }

    #[test]
    fn test_update_writes_only_form_fields() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();

        let id = svc
            .create_record(
                "login",
                br#"{"name":"L1","notes":"n","username":"u","password":"p","url":"http://x"}"#,
                &owner,
            )
            .unwrap()
            .id();
        let before = svc.store.get_login(&id).unwrap();

        svc.update_record(&id, br#"{"url":"http://y"}"#, &owner).unwrap();

        let after = svc.store.get_login(&id).unwrap();
        assert_eq!(after.fields.url.as_deref(), Some("http://y"));
        assert_eq!(after.fields.username, before.fields.username);
        assert_eq!(after.fields.password, before.fields.password);
        assert_eq!(after.core.notes, before.core.notes);
        assert_eq!(after.core.name, "L1");
    }

    #[test]
    fn test_update_leaves_undecryptable_fields_alone() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let owner = Uuid::new_v4();
        let id = create_login(&svc, &owner);

        db.conn()
            .execute(
                "UPDATE login SET username = 'not base64!!' WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
            .unwrap();

        svc.update_record(&id, br#"{"password":"p2"}"#, &owner).unwrap();

        let stored = svc.store.get_login(&id).unwrap();
        assert_eq!(stored.fields.username.as_deref(), Some("not base64!!"));
        assert_eq!(stored.fields.password, enc("p2"));
    }

    /// Delegates to SQLite, but can fail the card lookup and can let a
    /// second writer change a login password right before an update lands.
    struct InterleavedStore<'a> {
        inner: SqliteRecordStore<'a>,
        db: &'a Database,
        fail_card_lookup: bool,
        concurrent_password: Option<String>,
    }

    impl<'a> InterleavedStore<'a> {
        fn new(db: &'a Database) -> Self {
            Self {
                inner: SqliteRecordStore::new(db),
                db,
                fail_card_lookup: false,
                concurrent_password: None,
            }
        }
    }

    impl<'a> RecordStore for InterleavedStore<'a> {
        fn list_all(&self, owner: &Uuid) -> std::result::Result<RecordListing, StoreError> {
            self.inner.list_all(owner)
        }

        fn get_core(&self, id: &Uuid) -> std::result::Result<CredentialRecord, StoreError> {
            self.inner.get_core(id)
        }

        fn get_login(&self, id: &Uuid) -> std::result::Result<LoginRecord, StoreError> {
            self.inner.get_login(id)
        }

        fn get_card(&self, id: &Uuid) -> std::result::Result<CardRecord, StoreError> {
            if self.fail_card_lookup {
                return Err(StoreError::Other("disk I/O error".to_string()));
            }
            self.inner.get_card(id)
        }

        fn get_identity(&self, id: &Uuid) -> std::result::Result<IdentityRecord, StoreError> {
            self.inner.get_identity(id)
        }

        fn create_core(
            &self,
            record: &CredentialRecord,
        ) -> std::result::Result<CredentialRecord, StoreError> {
            self.inner.create_core(record)
        }

        fn create_login(&self, record: &LoginRecord) -> std::result::Result<LoginRecord, StoreError> {
            self.inner.create_login(record)
        }

        fn create_card(&self, record: &CardRecord) -> std::result::Result<CardRecord, StoreError> {
            self.inner.create_card(record)
        }

        fn create_identity(
            &self,
            record: &IdentityRecord,
        ) -> std::result::Result<IdentityRecord, StoreError> {
            self.inner.create_identity(record)
        }

        fn update_core(
            &self,
            record: &CredentialRecord,
        ) -> std::result::Result<CredentialRecord, StoreError> {
            self.inner.update_core(record)
        }

        fn update_login(&self, record: &LoginRecord) -> std::result::Result<LoginRecord, StoreError> {
            if let Some(password) = &self.concurrent_password {
                let sealed = codec::encrypt(password, KEY).unwrap();
                self.db
                    .conn()
                    .execute(
                        "UPDATE login SET password = ?1 WHERE id = ?2",
                        rusqlite::params![sealed, record.core.id.to_string()],
                    )
                    .unwrap();
            }
            self.inner.update_login(record)
        }

        fn update_card(&self, record: &CardRecord) -> std::result::Result<CardRecord, StoreError> {
            self.inner.update_card(record)
        }

        fn update_identity(
            &self,
            record: &IdentityRecord,
        ) -> std::result::Result<IdentityRecord, StoreError> {
            self.inner.update_identity(record)
        }

        fn delete(&self, id: &Uuid) -> std::result::Result<CredentialRecord, StoreError> {
            self.inner.delete(id)
        }
    }

    #[test]
    fn test_update_keeps_concurrent_change_to_other_field() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let id = create_login(&service(&db), &owner);

        let mut store = InterleavedStore::new(&db);
        store.concurrent_password = Some("concurrent".to_string());
        let svc = RecordService::new(store, FieldCodec::new(KEY).unwrap());

        svc.update_record(&id, br#"{"url":"http://y"}"#, &owner).unwrap();

        let fetched = as_login(svc.get_record(&id, &owner).unwrap());
        assert_eq!(fetched.fields.password.as_deref(), Some("concurrent"));
        assert_eq!(fetched.fields.username.as_deref(), Some("u"));
        assert_eq!(fetched.fields.url.as_deref(), Some("http://y"));
    }

    #[test]
    fn test_variant_lookup_failure_is_internal() {
        let db = Database::open_in_memory().unwrap();
        let owner = Uuid::new_v4();
        let id = service(&db)
            .create_record("secure_note", br#"{"name":"N1","notes":"secret"}"#, &owner)
            .unwrap()
            .id();

        let mut store = InterleavedStore::new(&db);
        store.fail_card_lookup = true;
        let svc = RecordService::new(store, FieldCodec::new(KEY).unwrap());

        let err = svc.get_record(&id, &owner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let err = svc.update_record(&id, br#"{"name":"N2"}"#, &owner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(svc.store.get_core(&id).unwrap().name, "N1");
    }
}
