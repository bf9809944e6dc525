/// Role based authorization with an in-memory permission cache
///
/// Roles and their granted permissions are database rows, but they change
/// rarely. They are loaded once at startup into a [`PermissionCache`] and
/// answered from memory on every request. An explicit reload refreshes the
/// map from storage.
///
/// Checks are route level: a route declares the [`Permission`] it needs and
/// the caller passes if any of their roles carries it. There are no
/// ownership checks.
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::auth::authorization::{Permission, PermissionCache};
/// use projectdesk_shared::auth::middleware::AuthContext;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, auth: AuthContext) -> Result<(), Box<dyn std::error::Error>> {
/// let cache = PermissionCache::load(&pool).await?;
///
/// cache.require(&auth, Permission::Destroy).await?;
/// # Ok(())
/// # }
/// ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::middleware::AuthContext;
use crate::models::role::{Role, RoleGrant, API_GUARD};
use crate::models::InvalidEnumValue;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// None of the caller's roles grants the permission
    #[error("Missing permission: {0}")]
    Forbidden(Permission),

    /// Database error while loading grants
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Named capability a route can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Index,
    Show,
    Create,
    Update,
    Destroy,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::Index,
        Permission::Show,
        Permission::Create,
        Permission::Update,
        Permission::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Index => "index",
            Permission::Show => "show",
            Permission::Create => "create",
            Permission::Update => "update",
            Permission::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| InvalidEnumValue {
                kind: "permission",
                value: s.to_string(),
            })
    }
}

type RoleMap = HashMap<String, HashSet<Permission>>;

/// Shared role to permission map
///
/// Cloning is cheap; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct PermissionCache {
    inner: Arc<RwLock<RoleMap>>,
}

impl PermissionCache {
    /// Loads the cache from storage
    pub async fn load(pool: &PgPool) -> Result<Self, AuthzError> {
        let cache = Self::default();
        cache.reload(pool).await?;
        Ok(cache)
    }

    /// Builds a cache from an explicit list of grants
    pub fn from_grants(grants: &[RoleGrant]) -> Self {
        Self {
            inner: Arc::new(RwLock::new(build_map(grants))),
        }
    }

    /// Replaces the cached map with the grants currently in storage
    ///
    /// # Returns
    ///
    /// Number of roles loaded
    pub async fn reload(&self, pool: &PgPool) -> Result<usize, AuthzError> {
        let grants = Role::grants(pool, API_GUARD).await?;
        let mut map = build_map(&grants);

        // Roles with no grants still exist and deny everything
        for name in Role::list_names(pool, API_GUARD).await? {
            map.entry(name).or_default();
        }

        let roles = map.len();
        *self.inner.write().await = map;

        tracing::info!(roles, grants = grants.len(), "Permission cache loaded");
        Ok(roles)
    }

    /// Returns true if any of the roles grants the permission
    pub async fn allows<S: AsRef<str>>(&self, roles: &[S], permission: Permission) -> bool {
        let map = self.inner.read().await;
        roles
            .iter()
            .filter_map(|role| map.get(role.as_ref()))
            .any(|granted| granted.contains(&permission))
    }

    /// Checks the caller's roles against a required permission
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Forbidden` if no role grants the permission
    pub async fn require(&self, auth: &AuthContext, permission: Permission) -> Result<(), AuthzError> {
        if !self.allows(&auth.roles, permission).await {
            return Err(AuthzError::Forbidden(permission));
        }

        Ok(())
    }

    /// Number of roles currently cached
    pub async fn role_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn build_map(grants: &[RoleGrant]) -> RoleMap {
    let mut map = RoleMap::new();

    for grant in grants {
        match grant.permission.parse::<Permission>() {
            Ok(permission) => {
                map.entry(grant.role.clone()).or_default().insert(permission);
            }
            Err(e) => {
                tracing::warn!(role = %grant.role, error = %e, "Ignoring unknown permission");
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(role: &str, permission: &str) -> RoleGrant {
        RoleGrant {
            role: role.to_string(),
            permission: permission.to_string(),
        }
    }

    fn seeded_cache() -> PermissionCache {
        let mut grants = Vec::new();
        for p in ["index", "show", "create", "update", "destroy"] {
            grants.push(grant("superadmin", p));
        }
        for p in ["index", "show", "create", "update"] {
            grants.push(grant("admin", p));
        }
        for p in ["index", "show"] {
            grants.push(grant("client", p));
        }
        PermissionCache::from_grants(&grants)
    }

    fn auth(roles: &[&str]) -> AuthContext {
        AuthContext {
            user_id: 1,
            token_id: 1,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!("index".parse::<Permission>().unwrap(), Permission::Index);
        assert_eq!("destroy".parse::<Permission>().unwrap(), Permission::Destroy);
        assert!("delete".parse::<Permission>().is_err());
        assert!("Index".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_display_matches_serde() {
        for p in Permission::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p));
        }
    }

    #[tokio::test]
    async fn test_allows_by_role() {
        let cache = seeded_cache();

        assert!(cache.allows(&["superadmin"], Permission::Destroy).await);
        assert!(cache.allows(&["admin"], Permission::Update).await);
        assert!(!cache.allows(&["admin"], Permission::Destroy).await);
        assert!(cache.allows(&["client"], Permission::Show).await);
        assert!(!cache.allows(&["client"], Permission::Create).await);
    }

    #[tokio::test]
    async fn test_allows_unknown_or_no_role() {
        let cache = seeded_cache();
        let none: [&str; 0] = [];

        assert!(!cache.allows(&["guest"], Permission::Index).await);
        assert!(!cache.allows(&none, Permission::Index).await);
    }

    #[tokio::test]
    async fn test_any_role_suffices() {
        let cache = seeded_cache();
        assert!(cache.allows(&["client", "superadmin"], Permission::Destroy).await);
    }

    #[tokio::test]
    async fn test_require() {
        let cache = seeded_cache();

        assert!(cache.require(&auth(&["superadmin"]), Permission::Destroy).await.is_ok());

        let err = cache
            .require(&auth(&["admin"]), Permission::Destroy)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden(Permission::Destroy)));
        assert!(err.to_string().contains("destroy"));
    }

    #[tokio::test]
    async fn test_unknown_permission_rows_are_ignored() {
        let cache = PermissionCache::from_grants(&[grant("admin", "index"), grant("admin", "export")]);

        assert_eq!(cache.role_count().await, 1);
        assert!(cache.allows(&["admin"], Permission::Index).await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = PermissionCache::default();
        let clone = cache.clone();

        *cache.inner.write().await = build_map(&[grant("client", "index")]);
        assert!(clone.allows(&["client"], Permission::Index).await);
    }
}
