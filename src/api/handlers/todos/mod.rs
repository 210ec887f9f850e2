//! Todo endpoints, scoped to the authenticated user.

pub(crate) mod crud;
pub(crate) mod storage;
pub(crate) mod types;

const TODO_NOT_FOUND: &str = "Todo not found";
