use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use super::manager::DatabaseError;
use super::models::{Role, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
     is_email_confirmed, is_active, is_deleted, deleted_at, date_joined, last_login";

pub const USERNAME_INDEX: &str = "users_username_ci_key";
pub const EMAIL_INDEX: &str = "users_email_ci_key";
pub const SINGLE_SUDO_INDEX: &str = "users_single_sudo_key";

/// Who is looking; drives row visibility
#[derive(Debug, Clone, Copy)]
pub enum Visibility {
    /// Every non-deleted user
    All,
    /// Every non-deleted user except the SUDO account
    AllButSudo,
    /// Only the viewer
    OnlySelf(i64),
}

/// Allowed sort keys for user listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOrder {
    Username,
    Email,
    DateJoined,
    Role,
    IsActive,
}

impl UserOrder {
    fn column(&self) -> &'static str {
        match self {
            UserOrder::Username => "username",
            UserOrder::Email => "email",
            UserOrder::DateJoined => "date_joined",
            UserOrder::Role => "role",
            UserOrder::IsActive => "is_active",
        }
    }

    /// Parse `field` or `-field`; returns the key and whether it is descending
    pub fn parse(raw: &str) -> Option<(Self, bool)> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        let order = match field {
            "username" => UserOrder::Username,
            "email" => UserOrder::Email,
            "date_joined" => UserOrder::DateJoined,
            "role" => UserOrder::Role,
            "is_active" => UserOrder::IsActive,
            _ => return None,
        };
        Some((order, descending))
    }
}

#[derive(Debug, Clone)]
pub struct UserQuery {
    pub visibility: Visibility,
    pub role: Option<Role>,
    pub is_email_confirmed: Option<bool>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
    pub order: UserOrder,
    pub descending: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_email_confirmed: bool,
}

/// Column changes for an update; None leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_email_confirmed: Option<bool>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.role.is_none()
            && self.is_email_confirmed.is_none()
            && self.is_active.is_none()
            && self.password_hash.is_none()
    }
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up a login identifier. Email-shaped identifiers match either
    /// column, preferring the email match; anything else matches username only.
    pub async fn find_for_login(&self, identifier: &str, email_shaped: bool) -> Result<Option<User>, DatabaseError> {
        let sql = if email_shaped {
            format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE lower(email) = lower($1) OR lower(username) = lower($1)
                 ORDER BY (lower(email) = lower($1)) DESC, id
                 LIMIT 1"
            )
        } else {
            format!("SELECT {USER_COLUMNS} FROM users WHERE lower(username) = lower($1) LIMIT 1")
        };
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// A single user, constrained by what the viewer may see
    pub async fn find_visible(&self, id: i64, visibility: Visibility) -> Result<Option<User>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id = "));
        qb.push_bind(id);
        Self::push_visibility(&mut qb, visibility);
        let user = qb.build_query_as::<User>().fetch_optional(&self.pool).await?;
        Ok(user)
    }

    pub async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), DatabaseError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        Self::push_filters(&mut count_qb, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        Self::push_filters(&mut qb, query);
        qb.push(" ORDER BY ")
            .push(query.order.column())
            .push(if query.descending { " DESC" } else { " ASC" })
            .push(", id ASC LIMIT ");
        qb.push_bind(query.limit);
        qb.push(" OFFSET ");
        qb.push_bind(query.offset);

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok((users, total))
    }

    fn push_visibility(qb: &mut QueryBuilder<'_, Postgres>, visibility: Visibility) {
        qb.push(" AND NOT is_deleted");
        match visibility {
            Visibility::All => {}
            Visibility::AllButSudo => {
                qb.push(" AND role <> 'SUDO'");
            }
            Visibility::OnlySelf(id) => {
                qb.push(" AND id = ");
                qb.push_bind(id);
            }
        }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
        Self::push_visibility(qb, query.visibility);

        if let Some(role) = query.role {
            qb.push(" AND role = ");
            qb.push_bind(role.as_str());
        }
        if let Some(confirmed) = query.is_email_confirmed {
            qb.push(" AND is_email_confirmed = ");
            qb.push_bind(confirmed);
        }
        if let Some(active) = query.is_active {
            qb.push(" AND is_active = ");
            qb.push_bind(active);
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (");
            for (i, column) in ["username", "email", "first_name", "last_name", "role"].iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(*column).push(" ILIKE ");
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }

    pub async fn username_taken(&self, username: &str, exclude: Option<i64>) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(username) = lower($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn email_taken(&self, email: &str, exclude: Option<i64>) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether a SUDO user other than `exclude` exists
    pub async fn sudo_exists(&self, exclude: Option<i64>) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'SUDO' AND ($1::BIGINT IS NULL OR id <> $1))",
        )
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_sudo(&self) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = 'SUDO' LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql).fetch_optional(&self.pool).await?;
        Ok(user)
    }

    pub async fn create(&self, new_user: &NewUser) -> Result<User, DatabaseError> {
        Self::insert(&self.pool, new_user).await
    }

    pub async fn insert<'e, E>(executor: E, new_user: &NewUser) -> Result<User, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, role, is_email_confirmed)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.role.as_str())
            .bind(new_user.is_email_confirmed)
            .fetch_one(executor)
            .await?;
        Ok(user)
    }

    pub async fn update(&self, id: i64, changes: &UserChanges) -> Result<User, DatabaseError> {
        if changes.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(v) = &changes.username {
                set.push("username = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.email {
                set.push("email = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.first_name {
                set.push("first_name = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &changes.last_name {
                set.push("last_name = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = changes.role {
                set.push("role = ").push_bind_unseparated(v.as_str());
            }
            if let Some(v) = changes.is_email_confirmed {
                set.push("is_email_confirmed = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.is_active {
                set.push("is_active = ").push_bind_unseparated(v);
            }
            if let Some(v) = &changes.password_hash {
                set.push("password_hash = ").push_bind_unseparated(v.clone());
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING {USER_COLUMNS}"));

        qb.build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    /// Soft delete also deactivates so the account can no longer log in
    pub async fn soft_delete(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE users SET is_deleted = TRUE, is_active = FALSE, deleted_at = NOW()
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Escape LIKE metacharacters so search terms match literally
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordering() {
        assert_eq!(UserOrder::parse("-date_joined"), Some((UserOrder::DateJoined, true)));
        assert_eq!(UserOrder::parse("username"), Some((UserOrder::Username, false)));
        assert_eq!(UserOrder::parse("password_hash"), None);
        assert_eq!(UserOrder::parse("-"), None);
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn empty_changes() {
        assert!(UserChanges::default().is_empty());
        let changes = UserChanges { is_active: Some(false), ..Default::default() };
        assert!(!changes.is_empty());
    }
}
