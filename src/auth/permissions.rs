// Role hierarchy checks. Everything here is pure: callers load the rows,
// these functions decide.

use crate::database::models::{Role, User};
use crate::database::users::Visibility;
use crate::error::ApiError;

/// Read access: active, confirmed, not deleted
pub fn is_active_and_confirmed(user: &User) -> bool {
    user.is_active && user.is_email_confirmed && !user.is_deleted
}

/// Node writes: ADMIN or SUDO with a confirmed email
pub fn is_admin_or_sudo(user: &User) -> bool {
    user.role.is_privileged() && user.is_email_confirmed
}

/// User management writes: ADMIN or SUDO
pub fn can_manage_users(user: &User) -> bool {
    user.role.is_privileged()
}

pub fn require_read(user: &User) -> Result<(), ApiError> {
    if is_active_and_confirmed(user) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Your account must be active and have a confirmed email."))
    }
}

pub fn require_node_write(user: &User) -> Result<(), ApiError> {
    require_read(user)?;
    if is_admin_or_sudo(user) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only ADMIN or SUDO users may modify nodes."))
    }
}

pub fn require_user_write(user: &User) -> Result<(), ApiError> {
    require_read(user)?;
    if can_manage_users(user) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not have permission to manage users."))
    }
}

/// Which users a viewer may see
pub fn visibility(viewer: &User) -> Visibility {
    match viewer.role {
        Role::Sudo => Visibility::All,
        Role::Admin => Visibility::AllButSudo,
        Role::User => Visibility::OnlySelf(viewer.id),
    }
}

/// Same scope as `visibility`, ignoring the soft-delete flag
pub fn can_see(viewer: &User, target: &User) -> bool {
    match viewer.role {
        Role::Sudo => true,
        Role::Admin => target.role != Role::Sudo,
        Role::User => viewer.id == target.id,
    }
}

pub fn check_user_create(actor: &User, role: Role) -> Result<(), ApiError> {
    if !can_manage_users(actor) {
        return Err(ApiError::forbidden("You do not have permission to create users."));
    }
    if role == Role::Sudo && actor.role != Role::Sudo {
        return Err(ApiError::forbidden("Only SUDO users can create other SUDO users."));
    }
    Ok(())
}

/// The parts of an update request that the hierarchy rules look at
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateIntent {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Update rules, evaluated in order. The single-SUDO rule needs the
/// database and is checked by the caller afterwards.
pub fn check_user_update(actor: &User, target: &User, intent: &UpdateIntent) -> Result<(), ApiError> {
    let is_self = actor.id == target.id;

    if target.is_deleted {
        return Err(ApiError::bad_request("A deleted user cannot be modified."));
    }
    if actor.role == Role::User && !is_self {
        return Err(ApiError::forbidden("You can only update your own profile."));
    }
    if target.role == Role::Sudo && actor.role != Role::Sudo {
        return Err(ApiError::forbidden("You do not have permission to modify the SUDO user."));
    }
    if actor.role == Role::Admin && target.role == Role::Admin && !is_self {
        return Err(ApiError::forbidden("An ADMIN cannot modify another ADMIN."));
    }
    if actor.role == Role::User && is_self && intent.role.is_some() {
        return Err(ApiError::forbidden("You cannot change your own role."));
    }
    if is_self && intent.is_active == Some(false) {
        return Err(ApiError::forbidden("You cannot deactivate your own account."));
    }
    if intent.role == Some(Role::Sudo) && actor.role != Role::Sudo {
        return Err(ApiError::forbidden("Only SUDO users can assign the SUDO role."));
    }
    if let Some(role) = intent.role {
        if is_self && role != target.role {
            return Err(ApiError::field("role", "You cannot change your own role."));
        }
    }
    Ok(())
}

/// Own-profile update: role changes are refused (403 for USER, 400 otherwise)
/// and so is self-deactivation.
pub fn check_self_update(actor: &User, intent: &UpdateIntent) -> Result<(), ApiError> {
    if actor.role == Role::User && intent.role.is_some() {
        return Err(ApiError::forbidden("You cannot change your own role."));
    }
    if intent.is_active == Some(false) {
        return Err(ApiError::forbidden("You cannot deactivate your own account."));
    }
    if let Some(role) = intent.role {
        if role != actor.role {
            return Err(ApiError::field("role", "You cannot change your own role."));
        }
    }
    Ok(())
}

/// Delete rules, evaluated in order. The active-nodes rule is checked by
/// the caller afterwards.
pub fn check_user_delete(actor: &User, target: &User) -> Result<(), ApiError> {
    if actor.id == target.id {
        return Err(ApiError::forbidden("You cannot delete your own account."));
    }
    if target.is_deleted {
        return Err(ApiError::bad_request("This user has already been deleted."));
    }
    if target.role == Role::Sudo && actor.role != Role::Sudo {
        return Err(ApiError::forbidden("Only a SUDO user can delete a SUDO user."));
    }
    if target.role == Role::Admin && actor.role == Role::Admin {
        return Err(ApiError::forbidden("An ADMIN cannot delete another ADMIN."));
    }
    if actor.role == Role::User {
        return Err(ApiError::forbidden("You do not have permission to delete users."));
    }
    Ok(())
}

/// Listing someone's created nodes
pub fn check_nodes_created(actor: &User, target: &User) -> Result<(), ApiError> {
    if actor.role == Role::User && actor.id != target.id {
        return Err(ApiError::forbidden("You do not have permission to view nodes created by this user."));
    }
    if target.is_deleted {
        return Err(ApiError::bad_request("Cannot list nodes of a deleted user."));
    }
    Ok(())
}
