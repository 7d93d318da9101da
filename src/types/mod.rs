mod models;
pub mod rule;
mod subject;
mod used;

pub use models::*;
pub use rule::{DENY, Rule, UNLIMITED};
pub use subject::LimitSubject;
pub use used::{Used, UsedAssets, UsedAttachments, UsedCode, UsedGit};
