pub mod screening;
pub mod user_profile;

pub use screening::{NewScreeningRecord, StoredScreeningRecord};
pub use user_profile::{ProfileChanges, StoredUserProfile};
