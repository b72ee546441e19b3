//! In-memory user store with Argon2 password hashes
//!
//! Implements the user directory and credential verification collaborators,
//! seeded with the reference accounts at startup.

use super::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::{
    CredentialVerifier, ErrorContext, GatehouseError, GatehouseResult, Role, UserAccount,
    UserDirectory, UserFilter, UserStatus,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Argon2 hashing with configurable cost
#[derive(Clone)]
pub struct PasswordHashing {
    argon2: Argon2<'static>,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHashing {
    /// Minimal-cost parameters for tests
    pub fn low_cost() -> Self {
        let params = Params::new(1024, 1, 1, None).unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashing)
    }

    /// Parameters are read from the stored hash, so any cost verifies
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                self.argon2
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

const DECOY_PASSWORD: &str = "gatehouse-decoy-password";

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: Role,
    pub status: UserStatus,
}

/// Password shared by every seeded account
pub const SEED_PASSWORD: &str = "123456";

// username, full name, phone, department, position, role, status
const SEED_USERS: [(&str, &str, &str, &str, &str, Role, UserStatus); 11] = [
    ("admin", "System Administrator", "13800138000", "IT", "System Administrator", Role::Admin, UserStatus::Active),
    ("zhangsan", "Zhang San", "13800138001", "Engineering", "Frontend Engineer", Role::User, UserStatus::Active),
    ("lisi", "Li Si", "13800138002", "Engineering", "Backend Engineer", Role::User, UserStatus::Active),
    ("wangwu", "Wang Wu", "13800138003", "Product", "Product Manager", Role::Manager, UserStatus::Active),
    ("zhaoliu", "Zhao Liu", "13800138004", "Design", "UI Designer", Role::User, UserStatus::Active),
    ("sunqi", "Sun Qi", "13800138005", "Marketing", "Marketing Specialist", Role::User, UserStatus::Active),
    ("zhouba", "Zhou Ba", "13800138006", "Sales", "Sales Manager", Role::Manager, UserStatus::Active),
    ("wujiu", "Wu Jiu", "13800138007", "HR", "HR Specialist", Role::User, UserStatus::Active),
    ("zhengshi", "Zheng Shi", "13800138008", "Finance", "Financial Analyst", Role::User, UserStatus::Active),
    ("liuyi", "Liu Yi", "13800138009", "Engineering", "QA Engineer", Role::User, UserStatus::Inactive),
    ("chener", "Chen Er", "13800138010", "Operations", "Operations Specialist", Role::User, UserStatus::Pending),
];

struct Accounts {
    by_id: BTreeMap<u64, UserAccount>,
    next_id: u64,
}

pub struct MemoryUserStore {
    accounts: RwLock<Accounts>,
    hashing: PasswordHashing,
    /// Verified against for unknown usernames so they cost a full hash check
    decoy_hash: Option<String>,
}

fn lock_poisoned(operation: &str) -> GatehouseError {
    GatehouseError::Storage {
        message: "user store lock poisoned".to_string(),
        source: None,
        context: ErrorContext::new("user_store").with_operation(operation),
    }
}

impl MemoryUserStore {
    pub fn new(hashing: PasswordHashing) -> Self {
        let decoy_hash = match hashing.hash(DECOY_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "No decoy hash, unknown-user logins will return early");
                None
            }
        };
        Self {
            accounts: RwLock::new(Accounts {
                by_id: BTreeMap::new(),
                next_id: 1,
            }),
            hashing,
            decoy_hash,
        }
    }

    /// Store populated with the reference accounts
    pub fn seeded(hashing: PasswordHashing) -> Result<Self, AuthError> {
        let store = Self::new(hashing);
        for (username, full_name, phone, department, position, role, status) in SEED_USERS {
            let user = NewUser {
                username: username.to_string(),
                email: format!("{}@gatehouse.local", username),
                full_name: full_name.to_string(),
                phone: Some(phone.to_string()),
                department: Some(department.to_string()),
                position: Some(position.to_string()),
                role,
                status,
            };
            store.insert(user, SEED_PASSWORD)?;
        }
        info!(count = SEED_USERS.len(), "Seeded user store");
        Ok(store)
    }

    fn read(&self, operation: &str) -> GatehouseResult<RwLockReadGuard<'_, Accounts>> {
        self.accounts.read().map_err(|_| lock_poisoned(operation))
    }

    fn write(&self, operation: &str) -> GatehouseResult<RwLockWriteGuard<'_, Accounts>> {
        self.accounts.write().map_err(|_| lock_poisoned(operation))
    }

    pub fn insert(&self, user: NewUser, password: &str) -> Result<UserAccount, AuthError> {
        let password_hash = self.hashing.hash(password)?;
        let mut accounts = self.write("insert")?;

        if accounts.by_id.values().any(|a| a.username == user.username) {
            return Err(AuthError::Directory(gatehouse_core::validation_error!(
                format!("username '{}' already exists", user.username),
                "username",
                "user_store"
            )));
        }

        let id = accounts.next_id;
        accounts.next_id += 1;

        let account = UserAccount {
            id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            department: user.department,
            position: user.position,
            role: user.role,
            status: user.status,
            password_hash,
            created_at: Utc::now(),
            last_login: None,
        };
        accounts.by_id.insert(id, account.clone());
        debug!(username = %account.username, id, "User created");
        Ok(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserDirectory for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> GatehouseResult<Option<UserAccount>> {
        let accounts = self.read("find_by_username")?;
        Ok(accounts
            .by_id
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> GatehouseResult<Option<UserAccount>> {
        Ok(self.read("find_by_id")?.by_id.get(&id).cloned())
    }

    async fn record_login(&self, username: &str) -> GatehouseResult<()> {
        let mut accounts = self.write("record_login")?;
        match accounts.by_id.values_mut().find(|a| a.username == username) {
            Some(account) => {
                account.last_login = Some(Utc::now());
                Ok(())
            }
            None => Err(gatehouse_core::not_found_error!(
                format!("user '{}'", username),
                "user_store"
            )),
        }
    }

    async fn list(&self, filter: &UserFilter) -> GatehouseResult<Vec<UserAccount>> {
        let accounts = self.read("list")?;
        Ok(accounts
            .by_id
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CredentialVerifier for MemoryUserStore {
    async fn verify(&self, username: &str, password: &str) -> GatehouseResult<Option<UserAccount>> {
        let Some(account) = self.find_by_username(username).await? else {
            if let Some(decoy) = &self.decoy_hash {
                let _ = self.hashing.verify(password, decoy);
            }
            debug!(username, "Login for unknown user");
            return Ok(None);
        };

        if self.hashing.verify(password, &account.password_hash) {
            Ok(Some(account))
        } else {
            debug!(username, "Password mismatch");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryUserStore {
        MemoryUserStore::seeded(PasswordHashing::low_cost()).unwrap()
    }

    #[tokio::test]
    async fn test_seeded_accounts() {
        let store = store();
        assert_eq!(store.len(), 11);

        let admin = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.id, 1);
        assert_eq!(admin.role, Role::Admin);
        assert_ne!(admin.password_hash, SEED_PASSWORD);

        let pending = store.find_by_username("chener").await.unwrap().unwrap();
        assert_eq!(pending.status, UserStatus::Pending);
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let store = store();
        assert!(store.verify("lisi", SEED_PASSWORD).await.unwrap().is_some());
        assert!(store.verify("lisi", "wrong").await.unwrap().is_none());
        assert!(store.verify("nobody", SEED_PASSWORD).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_still_checks_a_hash() {
        let store = store();
        let decoy = store.decoy_hash.as_deref().expect("decoy hash");
        assert!(PasswordHash::new(decoy).is_ok());
        assert!(store.hashing.verify(DECOY_PASSWORD, decoy));

        // Matching the decoy never signs anyone in
        assert!(store.verify("nobody", DECOY_PASSWORD).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_login_and_list() {
        let store = store();
        store.record_login("wangwu").await.unwrap();
        let wangwu = store.find_by_username("wangwu").await.unwrap().unwrap();
        assert!(wangwu.last_login.is_some());
        assert!(store.record_login("ghost").await.is_err());

        let managers = store
            .list(&UserFilter::parse(None, None, Some("manager")))
            .await
            .unwrap();
        let names: Vec<_> = managers.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["wangwu", "zhouba"]);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = store();
        let duplicate = NewUser {
            username: "admin".to_string(),
            email: "other@example.com".to_string(),
            full_name: "Other".to_string(),
            phone: None,
            department: None,
            position: None,
            role: Role::User,
            status: UserStatus::Active,
        };
        assert!(store.insert(duplicate, "pw").is_err());
    }

    #[test]
    fn test_hash_verifies_across_cost_settings() {
        let hash = PasswordHashing::low_cost().hash("s3cret").unwrap();
        assert!(PasswordHashing::default().verify("s3cret", &hash));
        assert!(!PasswordHashing::default().verify("other", &hash));
        assert!(!PasswordHashing::default().verify("s3cret", "not-a-phc-string"));
    }
}
