use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{AdminAccount, AdminId, AdminRole};
use crate::error::ApiError;
use crate::repository::{PollRepository, RepositoryError};

const ROLE_UPDATE_FAILED: &str = "Failed to update admin role";
pub(crate) const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
const INVALID_REQUEST: &str = "Invalid request data";
const PASSWORD_HASH_COST: u32 = 10;
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdateRequest {
    pub id: Option<String>,
    pub role: Option<String>,
}

/// Self-service changes to the caller's own account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUpdateResponse {
    pub message: String,
    pub data: AdminAccount,
}

/// Hash a password the way stored admin accounts expect.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, PASSWORD_HASH_COST)
}

pub struct AdminService<R> {
    repository: Arc<R>,
    hash_cost: u32,
}

impl<R> AdminService<R>
where
    R: PollRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            hash_cost: PASSWORD_HASH_COST,
        }
    }

    /// bcrypt cost for newly set passwords.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Change another admin's role. Only super admins may do this.
    pub fn update_role(
        &self,
        caller: Option<&AdminId>,
        request: &RoleUpdateRequest,
    ) -> Result<AdminUpdateResponse, ApiError> {
        let caller = caller.ok_or(ApiError::Unauthorized)?;
        let caller_account = self
            .repository
            .admin(caller)
            .map_err(|err| ApiError::unexpected(ROLE_UPDATE_FAILED, err))?;
        if caller_account.map(|account| account.role) != Some(AdminRole::SuperAdmin) {
            return Err(ApiError::Forbidden(
                "Forbidden: Only Super Admins can update roles".to_string(),
            ));
        }

        let target = request
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AdminId(id.to_string()))
            .ok_or_else(|| ApiError::Validation(INVALID_REQUEST.to_string()))?;
        let role = request
            .role
            .as_deref()
            .and_then(AdminRole::parse)
            .ok_or_else(|| ApiError::Validation(INVALID_REQUEST.to_string()))?;

        let updated = self
            .repository
            .update_admin_role(&target, role)
            .map_err(|err| not_found_or_unexpected(err, ROLE_UPDATE_FAILED))?;

        info!(admin = %updated.id.0, role = role.label(), by = %caller.0, "admin role updated");
        Ok(AdminUpdateResponse {
            message: "Admin role updated successfully".to_string(),
            data: updated,
        })
    }

    /// Change the caller's email and/or password.
    ///
    /// Either change needs the current password. Hashing is CPU bound, so
    /// async callers should run this off the runtime.
    pub fn update_profile(
        &self,
        caller: Option<&AdminId>,
        request: &ProfileUpdateRequest,
    ) -> Result<AdminUpdateResponse, ApiError> {
        let caller = caller.ok_or(ApiError::Unauthorized)?;
        let email = request
            .email
            .as_deref()
            .filter(|email| looks_like_email(email))
            .ok_or_else(|| ApiError::Validation(INVALID_REQUEST.to_string()))?;

        let mut account = self
            .repository
            .admin(caller)
            .map_err(|err| ApiError::unexpected(PROFILE_UPDATE_FAILED, err))?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        let email_changed = email != account.email;
        if email_changed {
            let holder = self
                .repository
                .admin_by_email(email)
                .map_err(|err| ApiError::unexpected(PROFILE_UPDATE_FAILED, err))?;
            if holder.is_some_and(|holder| holder.id != account.id) {
                return Err(ApiError::Validation("Email already in use".to_string()));
            }
        }

        let current_password = non_blank(request.current_password.as_deref());
        let mut new_hash = None;

        if let Some(new_password) = non_blank(request.new_password.as_deref()) {
            if new_password.chars().count() < MIN_PASSWORD_CHARS {
                return Err(ApiError::Validation(
                    "New password must be at least 6 characters".to_string(),
                ));
            }
            let current = current_password.ok_or_else(|| {
                ApiError::Validation("Current password is required to change password".to_string())
            })?;
            verify_current(current, &account.password_hash)?;
            if request.confirm_password.as_deref() != Some(new_password) {
                return Err(ApiError::Validation("New passwords do not match".to_string()));
            }
            let hash = bcrypt::hash(new_password, self.hash_cost)
                .map_err(|err| ApiError::unexpected(PROFILE_UPDATE_FAILED, err))?;
            new_hash = Some(hash);
        } else if email_changed {
            let current = current_password.ok_or_else(|| {
                ApiError::Validation("Current password is required to update email".to_string())
            })?;
            verify_current(current, &account.password_hash)?;
        }

        if !email_changed && new_hash.is_none() {
            return Err(ApiError::Validation("No changes to update".to_string()));
        }

        let password_changed = new_hash.is_some();
        if email_changed {
            account.email = email.to_string();
        }
        if let Some(hash) = new_hash {
            account.password_hash = hash;
        }

        let updated = self
            .repository
            .update_admin(account)
            .map_err(|err| not_found_or_unexpected(err, PROFILE_UPDATE_FAILED))?;

        info!(admin = %updated.id.0, email_changed, password_changed, "admin profile updated");
        Ok(AdminUpdateResponse {
            message: "Profile updated successfully".to_string(),
            data: updated,
        })
    }
}

fn verify_current(password: &str, stored_hash: &str) -> Result<(), ApiError> {
    match bcrypt::verify(password, stored_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ApiError::Validation(
            "Current password is incorrect".to_string(),
        )),
        Err(err) => Err(ApiError::unexpected(PROFILE_UPDATE_FAILED, err)),
    }
}

fn not_found_or_unexpected(err: RepositoryError, public_message: &str) -> ApiError {
    match err {
        RepositoryError::NotFound => ApiError::NotFound("Admin not found".to_string()),
        other => ApiError::unexpected(public_message, other),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
