//! Domain vocabulary for Ventra: permission catalog, audit actions,
//! email canonicalisation, and the invitation state machine.

#![forbid(unsafe_code)]

mod access;
mod email;
mod invite;

pub use access::{AuditAction, Permission};
pub use email::EmailAddress;
pub use invite::InviteStatus;
