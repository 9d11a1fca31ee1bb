//! Domain types
//!
//! The profile record, its draft form, the list filter and the admin form
//! that stages edits before they reach the store.

pub mod form;
pub mod profiles;

pub use form::{FormMode, ProfileForm};
pub use profiles::{Profile, ProfileDraft, ProfileFilter};
