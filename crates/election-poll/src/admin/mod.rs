//! Administrator role management and self-service profile updates.

pub mod router;
pub mod service;

pub use router::admin_router;
pub use service::{
    hash_password, AdminService, AdminUpdateResponse, ProfileUpdateRequest, RoleUpdateRequest,
};
