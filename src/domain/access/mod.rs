mod identity;
mod permission;
mod rule;

pub use identity::Identity;
pub use permission::Permission;
pub use rule::{AccessDenied, AccessRule};
