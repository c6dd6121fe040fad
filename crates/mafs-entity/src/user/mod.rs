//! User domain entities.

pub mod group;
pub mod level;
pub mod model;

pub use group::ADMIN_GROUP;
pub use level::PermissionLevel;
pub use model::{CreateUser, UpdateProfile, UpdateUser, User, UserSummary};
