// Credvault — Service Module
//
// Entry point for record operations: ownership check, form parsing,
// field encryption, and persistence, in that order.

mod gate;
mod records;

pub use gate::OwnershipGate;
pub use records::RecordService;
