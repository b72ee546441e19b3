//! Core data type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles a user account can hold
///
/// Role names are matched case-sensitively against the serialized form
/// (`ADMIN`, `MANAGER`, `USER`).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    /// All declared roles, in catalog order
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }

    /// Granted authority string, e.g. `ROLE_ADMIN`
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "USER" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Pending => "PENDING",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            "PENDING" => Ok(UserStatus::Pending),
            _ => Err(format!("Unknown user status: {}", s)),
        }
    }
}

/// Stored user record as returned by the user directory
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    /// PHC-formatted password hash
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserAccount {
    /// Identity resolved from this record
    pub fn identity(&self) -> Identity {
        Identity {
            subject: self.username.clone(),
            role: self.role,
            status: self.status,
        }
    }

    /// Public projection of this record
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            status: self.status,
        }
    }
}

/// Resolved identity of the caller for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Username
    pub subject: String,
    pub role: Role,
    pub status: UserStatus,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: Role, status: UserStatus) -> Self {
        Self {
            subject: subject.into(),
            role,
            status,
        }
    }

    pub fn authorities(&self) -> Vec<String> {
        vec![self.role.authority()]
    }
}

/// Public user fields returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: UserStatus,
}

/// Listing filter for user queries
///
/// Status and role filters are parsed leniently: values that do not name a
/// declared status or role are dropped and the query runs unfiltered on that
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub status: Option<UserStatus>,
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn parse(search: Option<&str>, status: Option<&str>, role: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let status = status
            .map(|s| s.trim().to_uppercase())
            .and_then(|s| s.parse::<UserStatus>().ok());
        let role = role
            .map(|r| r.trim().to_uppercase())
            .and_then(|r| r.parse::<Role>().ok());

        Self {
            search,
            status,
            role,
        }
    }

    /// Whether an account passes every active filter
    pub fn matches(&self, account: &UserAccount) -> bool {
        if let Some(status) = self.status {
            if account.status != status {
                return false;
            }
        }
        if let Some(role) = self.role {
            if account.role != role {
                return false;
            }
        }
        match &self.search {
            Some(needle) => {
                account.username.contains(needle.as_str())
                    || account.full_name.contains(needle.as_str())
                    || account.email.contains(needle.as_str())
            }
            None => true,
        }
    }
}

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub const DEFAULT_SIZE: usize = 10;
    pub const MAX_SIZE: usize = 100;

    pub fn new(page: Option<usize>, size: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size
                .unwrap_or(Self::DEFAULT_SIZE)
                .clamp(1, Self::MAX_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice a full result set down to the requested page
    pub fn from_items(items: Vec<T>, request: PageRequest) -> Self {
        let total_elements = items.len();
        let total_pages = total_elements.div_ceil(request.size);
        let content = items
            .into_iter()
            .skip(request.page.saturating_mul(request.size))
            .take(request.size)
            .collect();

        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }
}
