//! Admin-only endpoints.
//!
//! Every handler resolves the caller with
//! [`require_admin`](super::auth::principal::require_admin): unauthenticated
//! callers get 401, non-admins 403. Listings accept the same `skip`/`limit`,
//! `search` and whitelisted `sort_by`/`sort_order` parameters.

pub(crate) mod content;
pub(crate) mod dashboard;
mod storage;
pub(crate) mod types;
pub(crate) mod users;

const DEFAULT_ADMIN_LIMIT: i64 = 100;
const USER_NOT_FOUND: &str = "User not found";
