use serde::Deserialize;
use sqlx::PgPool;

use crate::api::parse_bool;
use crate::audit;
use crate::auth::password::{hash_password, validate_new_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::auth::permissions::{self, UpdateIntent};
use crate::auth::{self, TokenError, TokenKind, TokenPair};
use crate::database::models::{Role, User};
use crate::database::users::{
    NewUser, UserChanges, UserOrder, UserQuery, EMAIL_INDEX, SINGLE_SUDO_INDEX, USERNAME_INDEX,
};
use crate::database::{DatabaseError, DatabaseManager, NodeRepository, TokenRepository, UserRepository};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::response::Page;

const LOGIN_FAILED: &str = "No active account found with the given credentials";
const MAX_USERNAME_LENGTH: usize = 150;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Fields accepted by PUT/PATCH on a user; absent fields are left alone
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_email_confirmed: Option<bool>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Raw `/api/users/` query string
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub is_email_confirmed: Option<String>,
    pub is_active: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Loose match for `local@domain.tld`, used to decide how a login identifier is looked up
pub fn is_email_shaped(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty() && host.chars().all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    local_ok && host_ok && tld_ok
}

pub fn clean_username(raw: &str) -> Result<String, String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!("Ensure this field has no more than {} characters.", MAX_USERNAME_LENGTH));
    }
    if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        return Err("Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.".to_string());
    }
    Ok(username.to_string())
}

pub fn clean_email(raw: &str) -> Result<String, String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err("Email may not be empty.".to_string());
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(email)
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse::<Role>()
        .map_err(|_| ApiError::field("role", format!("\"{}\" is not a valid choice.", raw)))
}

fn field_errors(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        return Ok(());
    }
    let message = errors.values().cloned().collect::<Vec<_>>().join(" ");
    Err(ApiError::validation_error(message, Some(errors)))
}

/// Map a unique index violation that slipped past the pre-checks to its field
fn map_unique(err: DatabaseError) -> ApiError {
    if err.is_unique_violation_of(USERNAME_INDEX) {
        ApiError::field("username", "A user with that username already exists.")
    } else if err.is_unique_violation_of(EMAIL_INDEX) {
        ApiError::field("email", "This email is already registered.")
    } else if err.is_unique_violation_of(SINGLE_SUDO_INDEX) {
        ApiError::field("role", "A SUDO user already exists.")
    } else {
        err.into()
    }
}

pub struct UserService {
    users: UserRepository,
    nodes: NodeRepository,
    tokens: TokenRepository,
}

impl UserService {
    pub async fn new() -> Result<Self, ApiError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            nodes: NodeRepository::new(pool.clone()),
            tokens: TokenRepository::new(pool),
        }
    }

    // Tokens

    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, ApiError> {
        let mut missing = FieldErrors::new();
        if request.username.is_none() {
            missing.insert("username".to_string(), "This field is required.".to_string());
        }
        if request.password.is_none() {
            missing.insert("password".to_string(), "This field is required.".to_string());
        }
        field_errors(missing)?;

        let identifier = request.username.unwrap_or_default();
        let identifier = identifier.trim();
        let password = request.password.unwrap_or_default();
        if identifier.is_empty() {
            return Err(ApiError::unauthorized(LOGIN_FAILED));
        }

        let user = self
            .users
            .find_for_login(identifier, is_email_shaped(identifier))
            .await?
            .ok_or_else(|| ApiError::unauthorized(LOGIN_FAILED))?;

        if !verify_password(&password, &user.password_hash) || !user.can_authenticate() {
            tracing::debug!(user_id = user.id, "login rejected");
            return Err(ApiError::unauthorized(LOGIN_FAILED));
        }

        let pair = auth::issue_pair(&user)?;
        self.users.touch_last_login(user.id).await?;
        audit!(user_id = user.id, "login");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair; the old one is blacklisted
    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair, ApiError> {
        let token = request
            .refresh
            .ok_or_else(|| ApiError::field("refresh", "This field is required."))?;

        let claims = auth::validate_jwt(&token, TokenKind::Refresh)?;
        if self.tokens.is_revoked(claims.jti).await? {
            return Err(TokenError::Revoked.into());
        }

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(User::can_authenticate)
            .ok_or_else(|| ApiError::unauthorized(LOGIN_FAILED))?;

        // Losing this race means another request already rotated the token
        if !self.tokens.revoke(claims.jti, user.id, claims.expires_at()).await? {
            return Err(TokenError::Revoked.into());
        }

        let pair = auth::issue_pair(&user)?;
        if let Err(e) = self.tokens.purge_expired().await {
            tracing::warn!("Failed to purge expired revoked tokens: {}", e);
        }
        Ok(pair)
    }

    /// Resolve the bearer of an access token to a user allowed to use the API
    pub async fn authenticate(&self, token: &str) -> Result<User, ApiError> {
        let claims = auth::validate_jwt(token, TokenKind::Access)?;
        self.users
            .find_by_id(claims.sub)
            .await?
            .filter(User::can_authenticate)
            .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))
    }

    // Reads

    pub async fn list(&self, viewer: &User, params: &UserListParams, limit: i64, offset: i64) -> Result<Page<User>, ApiError> {
        let role = match params.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => Some(parse_role(raw)?),
            None => None,
        };
        let (order, descending) = params
            .ordering
            .as_deref()
            .and_then(UserOrder::parse)
            .unwrap_or((UserOrder::DateJoined, true));

        let query = UserQuery {
            visibility: permissions::visibility(viewer),
            role,
            is_email_confirmed: parse_bool(params.is_email_confirmed.as_deref()),
            is_active: parse_bool(params.is_active.as_deref()),
            search: params.search.clone(),
            order,
            descending,
            limit,
            offset,
        };
        let (users, count) = self.users.list(&query).await?;
        Ok(Page::new(users, count, limit, offset))
    }

    /// A visible, non-deleted user with its active node count
    pub async fn detail(&self, viewer: &User, id: i64) -> Result<(User, i64), ApiError> {
        let user = self
            .users
            .find_visible(id, permissions::visibility(viewer))
            .await?
            .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;
        let count = self.nodes.count_by_creator(user.id).await?;
        Ok((user, count))
    }

    /// Target for a write. Deleted users are included so the rules can
    /// report them; users outside the viewer's scope are not found.
    async fn find_target(&self, viewer: &User, id: i64) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .filter(|target| permissions::can_see(viewer, target))
            .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }

    /// The target user for a nodes-created listing, after permission checks
    pub async fn nodes_created_target(&self, viewer: &User, id: i64) -> Result<User, ApiError> {
        let target = self.find_target(viewer, id).await?;
        permissions::check_nodes_created(viewer, &target)?;
        Ok(target)
    }

    pub async fn me(&self, viewer: &User) -> Result<(User, i64), ApiError> {
        if viewer.is_deleted {
            return Err(ApiError::gone("Your account has been deleted."));
        }
        let count = self.nodes.count_by_creator(viewer.id).await?;
        Ok((viewer.clone(), count))
    }

    // Writes

    pub async fn create(&self, actor: &User, request: CreateUserRequest) -> Result<User, ApiError> {
        let role = match request.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => parse_role(raw)?,
            None => Role::User,
        };
        permissions::check_user_create(actor, role)?;

        let mut errors = FieldErrors::new();
        let required = "This field is required.".to_string();

        let username = match request.username.as_deref().map(clean_username) {
            Some(Ok(username)) => Some(username),
            Some(Err(msg)) => {
                errors.insert("username".into(), msg);
                None
            }
            None => {
                errors.insert("username".into(), required.clone());
                None
            }
        };
        let email = match request.email.as_deref().map(clean_email) {
            Some(Ok(email)) => Some(email),
            Some(Err(msg)) => {
                errors.insert("email".into(), msg);
                None
            }
            None => {
                errors.insert("email".into(), required.clone());
                None
            }
        };
        if request.password.is_none() {
            errors.insert("password".into(), required.clone());
        }
        if request.password_confirm.is_none() {
            errors.insert("password_confirm".into(), required);
        }

        if let Some(username) = &username {
            if self.users.username_taken(username, None).await? {
                errors.insert("username".into(), "A user with that username already exists.".into());
            }
        }
        if let Some(email) = &email {
            if self.users.email_taken(email, None).await? {
                errors.insert("email".into(), "This email is already registered.".into());
            }
        }
        field_errors(errors)?;

        let (username, email) = match (username, email) {
            (Some(username), Some(email)) => (username, email),
            _ => return Err(ApiError::validation_error("Invalid user data", None)),
        };
        let password = request.password.unwrap_or_default();
        validate_new_password(&password, &username, &email)?;
        if request.password_confirm.as_deref() != Some(password.as_str()) {
            return Err(ApiError::field("password_confirm", "Passwords do not match."));
        }

        if role == Role::Sudo && self.users.sudo_exists(None).await? {
            return Err(ApiError::field("role", "A SUDO user already exists."));
        }

        let new_user = NewUser {
            username,
            email,
            password_hash: hash_password(&password)?,
            first_name: request.first_name.unwrap_or_default().trim().to_string(),
            last_name: request.last_name.unwrap_or_default().trim().to_string(),
            role,
            is_email_confirmed: false,
        };
        let user = self.users.create(&new_user).await.map_err(map_unique)?;

        audit!(user_id = user.id, actor_id = actor.id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn update(&self, actor: &User, id: i64, request: UpdateUserRequest) -> Result<User, ApiError> {
        let target = self.find_target(actor, id).await?;
        let intent = UpdateIntent {
            role: request.role.as_deref().map(parse_role).transpose()?,
            is_active: request.is_active,
        };
        permissions::check_user_update(actor, &target, &intent)?;

        if intent.role == Some(Role::Sudo) && target.role != Role::Sudo && self.users.sudo_exists(Some(target.id)).await? {
            return Err(ApiError::field("role", "A SUDO user already exists."));
        }

        let changes = self.build_changes(&target, request, intent.role).await?;
        let user = self.users.update(target.id, &changes).await.map_err(map_unique)?;

        audit!(user_id = user.id, actor_id = actor.id, "user updated");
        Ok(user)
    }

    pub async fn update_me(&self, actor: &User, request: UpdateUserRequest) -> Result<User, ApiError> {
        if actor.is_deleted {
            return Err(ApiError::gone("You cannot update a deleted account."));
        }
        let intent = UpdateIntent {
            role: request.role.as_deref().map(parse_role).transpose()?,
            is_active: request.is_active,
        };
        permissions::check_self_update(actor, &intent)?;

        // Own confirmation status is not self-service
        let request = UpdateUserRequest {
            is_email_confirmed: None,
            ..request
        };
        let changes = self.build_changes(actor, request, None).await?;
        let user = self.users.update(actor.id, &changes).await.map_err(map_unique)?;

        audit!(user_id = user.id, "profile updated");
        Ok(user)
    }

    async fn build_changes(&self, target: &User, request: UpdateUserRequest, role: Option<Role>) -> Result<UserChanges, ApiError> {
        let mut errors = FieldErrors::new();
        let mut changes = UserChanges {
            role,
            is_email_confirmed: request.is_email_confirmed,
            is_active: request.is_active,
            first_name: request.first_name.map(|v| v.trim().to_string()),
            last_name: request.last_name.map(|v| v.trim().to_string()),
            ..Default::default()
        };

        if let Some(raw) = request.username.as_deref() {
            match clean_username(raw) {
                Ok(username) if self.users.username_taken(&username, Some(target.id)).await? => {
                    errors.insert("username".into(), "A user with that username already exists.".into());
                }
                Ok(username) => changes.username = Some(username),
                Err(msg) => {
                    errors.insert("username".into(), msg);
                }
            }
        }
        if let Some(raw) = request.email.as_deref() {
            match clean_email(raw) {
                Ok(email) if self.users.email_taken(&email, Some(target.id)).await? => {
                    errors.insert("email".into(), "This email is already registered.".into());
                }
                Ok(email) => changes.email = Some(email),
                Err(msg) => {
                    errors.insert("email".into(), msg);
                }
            }
        }
        field_errors(errors)?;

        // Blank means keep the current password
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            let username = changes.username.as_deref().unwrap_or(&target.username);
            let email = changes.email.as_deref().unwrap_or(&target.email);
            validate_new_password(&password, username, email)?;
            changes.password_hash = Some(hash_password(&password)?);
        }
        Ok(changes)
    }

    pub async fn delete(&self, actor: &User, id: i64) -> Result<(), ApiError> {
        let target = self.find_target(actor, id).await?;
        permissions::check_user_delete(actor, &target)?;

        if self.nodes.count_by_creator(target.id).await? > 0 {
            return Err(ApiError::bad_request("Cannot delete a user who has active nodes."));
        }
        self.users.soft_delete(target.id).await?;

        audit!(user_id = target.id, actor_id = actor.id, "user deleted");
        Ok(())
    }

    pub async fn change_password(&self, actor: &User, request: ChangePasswordRequest) -> Result<(), ApiError> {
        if actor.is_deleted {
            return Err(ApiError::gone("You cannot change the password of a deleted account."));
        }
        let (old, new, confirm) = match (request.old_password, request.new_password, request.confirm_password) {
            (Some(old), Some(new), Some(confirm)) if !old.is_empty() && !new.is_empty() && !confirm.is_empty() => {
                (old, new, confirm)
            }
            _ => return Err(ApiError::bad_request("All fields are required.")),
        };

        if new != confirm {
            return Err(ApiError::field("confirm_password", "Passwords do not match."));
        }
        if !verify_password(&old, &actor.password_hash) {
            return Err(ApiError::field("old_password", "Current password is incorrect."));
        }
        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::field(
                "new_password",
                format!("The password must be at least {} characters long.", MIN_PASSWORD_LENGTH),
            ));
        }

        self.users.set_password(actor.id, &hash_password(&new)?).await?;
        audit!(user_id = actor.id, "password changed");
        Ok(())
    }
}
