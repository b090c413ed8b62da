// Credvault — Record domain model
//
// A record is one shared core (`CredentialRecord`) plus at most one variant
// payload. The core lives in `credential_record`; each variant lives in its
// own extension table keyed by the same id. A core without any extension is
// a secure note.
//
// SECURITY: sensitive fields hold ciphertext at rest and plaintext only after
// the service decrypts them. Debug output redacts them either way.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::FormError;

/// Current time truncated to millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// ─── Record kind ─────────────────────────────────────────────────────────────

/// Closed set of record variants. The string tag selects the form schema on
/// create and the extension table in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    SecureNote,
    Login,
    Card,
    Identity,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::SecureNote,
        RecordKind::Login,
        RecordKind::Card,
        RecordKind::Identity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::SecureNote => "secure_note",
            RecordKind::Login => "login",
            RecordKind::Card => "card",
            RecordKind::Identity => "identity",
        }
    }

    /// Extension table for the variant; secure notes have none.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            RecordKind::SecureNote => None,
            RecordKind::Login => Some("login"),
            RecordKind::Card => Some("card"),
            RecordKind::Identity => Some("identity"),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FormError::UnknownKind(s.to_string()))
    }
}

// ─── Core record ─────────────────────────────────────────────────────────────

/// The shared core of every record.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub name: String,
    /// Encrypted at rest.
    pub notes: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
}

impl CredentialRecord {
    /// Build a fresh core owned by `owner`, with a new id and both audit
    /// timestamps set to now.
    pub fn new(name: String, notes: Option<String>, owner: Uuid) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            name,
            notes,
            created_on: now,
            updated_on: now,
            created_by: owner,
            updated_by: owner,
        }
    }

    pub fn apply_form(&mut self, form: &CredentialRecordForm) {
        if let Some(name) = &form.name {
            self.name = name.clone();
        }
        if form.notes.is_some() {
            self.notes = form.notes.clone();
        }
    }

    /// Build the row a partial update writes: identity and creation audit
    /// fields from `self`, every other field only where `form` carries it.
    /// Absent fields stay `None` (or empty for `name`) so the store keeps
    /// their current values.
    pub fn update_patch(&self, form: &CredentialRecordForm, by: Uuid) -> Self {
        let mut patch = Self {
            id: self.id,
            name: String::new(),
            notes: None,
            created_on: self.created_on,
            updated_on: self.updated_on,
            created_by: self.created_by,
            updated_by: self.updated_by,
        };
        patch.apply_form(form);
        patch.touch(by);
        patch
    }

    /// Stamp the update audit fields.
    pub fn touch(&mut self, by: Uuid) {
        self.updated_on = now_millis();
        self.updated_by = by;
    }

    pub fn sensitive_fields_mut(&mut self) -> Vec<&mut Option<String>> {
        vec![&mut self.notes]
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("notes", &redact(&self.notes))
            .field("created_on", &self.created_on)
            .field("updated_on", &self.updated_on)
            .field("created_by", &self.created_by)
            .field("updated_by", &self.updated_by)
            .finish()
    }
}

// ─── Variant payloads ────────────────────────────────────────────────────────

/// The variant-specific half of a record.
///
/// Every field is an independently nullable string, so one struct shape
/// serves as the stored payload and as the update patch. `COLUMNS` lists the
/// extension-table columns in the same order `fields()` yields them.
pub trait VariantFields:
    Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + 'static
{
    const KIND: RecordKind;
    /// Extension table holding this variant.
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns encrypted at rest.
    const SENSITIVE: &'static [&'static str];

    fn fields(&self) -> Vec<&Option<String>>;

    fn fields_mut(&mut self) -> Vec<&mut Option<String>>;

    fn sensitive_fields_mut(&mut self) -> Vec<&mut Option<String>> {
        Self::COLUMNS
            .iter()
            .zip(self.fields_mut())
            .filter(|(column, _)| Self::SENSITIVE.contains(*column))
            .map(|(_, field)| field)
            .collect()
    }

    /// Replace every field that is present in `patch`.
    fn apply(&mut self, patch: &Self) {
        for (field, update) in self.fields_mut().into_iter().zip(patch.fields()) {
            if update.is_some() {
                *field = update.clone();
            }
        }
    }

    fn is_blank(&self) -> bool {
        self.fields().into_iter().all(is_blank)
    }
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginFields {
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
}

impl VariantFields for LoginFields {
    const KIND: RecordKind = RecordKind::Login;
    const TABLE: &'static str = "login";
    const COLUMNS: &'static [&'static str] = &["username", "password", "url"];
    const SENSITIVE: &'static [&'static str] = &["username", "password"];

    fn fields(&self) -> Vec<&Option<String>> {
        vec![&self.username, &self.password, &self.url]
    }

    fn fields_mut(&mut self) -> Vec<&mut Option<String>> {
        vec![&mut self.username, &mut self.password, &mut self.url]
    }
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardFields {
    pub brand: Option<String>,
    pub number: Option<String>,
    pub expiration_month: Option<String>,
    pub expiration_year: Option<String>,
    pub cvv: Option<String>,
}

impl VariantFields for CardFields {
    const KIND: RecordKind = RecordKind::Card;
    const TABLE: &'static str = "card";
    const COLUMNS: &'static [&'static str] =
        &["brand", "number", "expiration_month", "expiration_year", "cvv"];
    const SENSITIVE: &'static [&'static str] =
        &["number", "expiration_month", "expiration_year", "cvv"];

    fn fields(&self) -> Vec<&Option<String>> {
        vec![
            &self.brand,
            &self.number,
            &self.expiration_month,
            &self.expiration_year,
            &self.cvv,
        ]
    }

    fn fields_mut(&mut self) -> Vec<&mut Option<String>> {
        vec![
            &mut self.brand,
            &mut self.number,
            &mut self.expiration_month,
            &mut self.expiration_year,
            &mut self.cvv,
        ]
    }
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityFields {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub passport_number: Option<String>,
    pub country: Option<String>,
}

impl VariantFields for IdentityFields {
    const KIND: RecordKind = RecordKind::Identity;
    const TABLE: &'static str = "identity";
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "middle_name",
        "last_name",
        "address",
        "email",
        "phone_number",
        "passport_number",
        "country",
    ];
    const SENSITIVE: &'static [&'static str] = &[
        "first_name",
        "middle_name",
        "last_name",
        "address",
        "email",
        "phone_number",
        "passport_number",
    ];

    fn fields(&self) -> Vec<&Option<String>> {
        vec![
            &self.first_name,
            &self.middle_name,
            &self.last_name,
            &self.address,
            &self.email,
            &self.phone_number,
            &self.passport_number,
            &self.country,
        ]
    }

    fn fields_mut(&mut self) -> Vec<&mut Option<String>> {
        vec![
            &mut self.first_name,
            &mut self.middle_name,
            &mut self.last_name,
            &mut self.address,
            &mut self.email,
            &mut self.phone_number,
            &mut self.passport_number,
            &mut self.country,
        ]
    }
}

macro_rules! redacted_debug {
    ($($ty:ident),+) => {
        $(
            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    debug_fields::<$ty>(stringify!($ty), self, f)
                }
            }
        )+
    };
}

redacted_debug!(LoginFields, CardFields, IdentityFields);

fn debug_fields<F: VariantFields>(
    name: &str,
    fields: &F,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let mut out = f.debug_struct(name);
    for (column, value) in F::COLUMNS.iter().zip(fields.fields()) {
        if F::SENSITIVE.contains(column) {
            out.field(column, &redact(value));
        } else {
            out.field(column, value);
        }
    }
    out.finish()
}

// ─── Variant records ─────────────────────────────────────────────────────────

/// A core record joined with one variant payload through the shared id.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord<F> {
    #[serde(flatten)]
    pub core: CredentialRecord,
    #[serde(flatten)]
    pub fields: F,
}

pub type LoginRecord = VariantRecord<LoginFields>;
pub type CardRecord = VariantRecord<CardFields>;
pub type IdentityRecord = VariantRecord<IdentityFields>;

impl<F: VariantFields> VariantRecord<F> {
    pub fn new(core: CredentialRecord, fields: F) -> Self {
        Self { core, fields }
    }

    /// Apply the core half of the form, then the variant half.
    pub fn apply_form(&mut self, form: &VariantForm<F>) {
        self.core.apply_form(&form.core);
        self.fields.apply(&form.fields);
    }

    /// Update row for this record carrying only what `form` supplies.
    pub fn update_patch(&self, form: &VariantForm<F>, by: Uuid) -> Self {
        let blank = CredentialRecordForm::default();
        let mut patch = Self::new(self.core.update_patch(&blank, by), F::default());
        patch.apply_form(form);
        patch
    }

    pub fn sensitive_fields_mut(&mut self) -> Vec<&mut Option<String>> {
        let mut fields = self.core.sensitive_fields_mut();
        fields.extend(self.fields.sensitive_fields_mut());
        fields
    }
}

impl<F: VariantFields + fmt::Debug> fmt::Debug for VariantRecord<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantRecord")
            .field("kind", &F::KIND)
            .field("core", &self.core)
            .field("fields", &self.fields)
            .finish()
    }
}

/// A record of exactly one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    SecureNote(CredentialRecord),
    Login(LoginRecord),
    Card(CardRecord),
    Identity(IdentityRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::SecureNote(_) => RecordKind::SecureNote,
            Record::Login(_) => RecordKind::Login,
            Record::Card(_) => RecordKind::Card,
            Record::Identity(_) => RecordKind::Identity,
        }
    }

    pub fn core(&self) -> &CredentialRecord {
        match self {
            Record::SecureNote(core) => core,
            Record::Login(r) => &r.core,
            Record::Card(r) => &r.core,
            Record::Identity(r) => &r.core,
        }
    }

    pub fn id(&self) -> Uuid {
        self.core().id
    }

    pub fn sensitive_fields_mut(&mut self) -> Vec<&mut Option<String>> {
        match self {
            Record::SecureNote(core) => core.sensitive_fields_mut(),
            Record::Login(r) => r.sensitive_fields_mut(),
            Record::Card(r) => r.sensitive_fields_mut(),
            Record::Identity(r) => r.sensitive_fields_mut(),
        }
    }
}

/// All records of one owner, bucketed by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordListing {
    pub secure_notes: Vec<CredentialRecord>,
    pub logins: Vec<LoginRecord>,
    pub cards: Vec<CardRecord>,
    pub identities: Vec<IdentityRecord>,
}

impl RecordListing {
    pub fn len(&self) -> usize {
        self.secure_notes.len() + self.logins.len() + self.cards.len() + self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Forms ───────────────────────────────────────────────────────────────────

/// Caller-supplied core fields. Used for create (name required) and for
/// partial update (present fields replace, absent fields are untouched).
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialRecordForm {
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl CredentialRecordForm {
    /// Reject fields that are present but empty.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.as_deref() == Some("") {
            return Err(FormError::Empty("name"));
        }
        if self.notes.as_deref() == Some("") {
            return Err(FormError::Empty("notes"));
        }
        Ok(())
    }

    /// Validate for creation and return the mandatory name.
    pub fn require_name(&self) -> Result<&str, FormError> {
        self.validate()?;
        self.name.as_deref().ok_or(FormError::Missing("name"))
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.name) && is_blank(&self.notes)
    }
}

impl fmt::Debug for CredentialRecordForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecordForm")
            .field("name", &self.name)
            .field("notes", &redact(&self.notes))
            .finish()
    }
}

/// Core form plus one variant's fields, read from a single flat JSON object.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantForm<F> {
    #[serde(flatten)]
    pub core: CredentialRecordForm,
    #[serde(flatten)]
    pub fields: F,
}

impl<F: VariantFields> VariantForm<F> {
    pub fn validate(&self) -> Result<(), FormError> {
        self.core.validate()
    }

    /// Build a new record owned by `owner` from a creation form.
    pub fn into_record(self, owner: Uuid) -> Result<VariantRecord<F>, FormError> {
        let name = self.core.require_name()?.to_string();
        let core = CredentialRecord::new(name, self.core.notes, owner);
        Ok(VariantRecord::new(core, self.fields))
    }

    pub fn is_blank(&self) -> bool {
        self.core.is_blank() && self.fields.is_blank()
    }
}

impl<F: VariantFields + fmt::Debug> fmt::Debug for VariantForm<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantForm")
            .field("core", &self.core)
            .field("fields", &self.fields)
            .finish()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
