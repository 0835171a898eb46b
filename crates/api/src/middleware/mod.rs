//! HTTP middleware components.

pub mod auth;
pub mod logging;
pub mod rbac;
pub mod trace_id;

pub use auth::{require_auth, AuthUser};
pub use rbac::{require_admin, require_staff};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
