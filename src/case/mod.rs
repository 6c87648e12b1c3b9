//! Case state the voice session mutates: the context that frames the
//! conversation and the durable record stores the tool dispatcher appends to.
//!
//! The stores expose the same `add_*` operations to every caller; there is no
//! separate write path for assistant-originated records.

mod context;
mod store;
mod types;

pub use context::CaseContext;
pub use store::{CaseSnapshot, CaseStore};
pub use types::{ActionItem, Contact, EvidenceEntry, ExpenseEntry, Page};
