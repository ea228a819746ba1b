//! HTTP handlers

mod access;
mod admin;
mod auth;
mod claim;
mod health;

pub use access::{course_access, lesson_access};
pub use admin::{
    activate_subscription, grant_batch_course, grant_org_course, revoke_batch_course,
    revoke_org_course, upload_roster,
};
pub use auth::{change_password, login, logout, logout_all, me, refresh, register, sessions};
pub use claim::claim;
pub use health::{health, ready};
