//! Resource kinds and status vocabularies
//!
//! The static bidirectional mapping between resource names, their typed
//! facades, and the link/status metadata the materialization pipeline
//! needs. Unknown names resolve to `None` so callers can distinguish
//! "not a resource" from a lookup failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of remote resource a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Account,
    Application,
    Directory,
    Group,
    Organization,
    Tenant,
    ApiKey,
    CustomData,
    EmailTemplate,
}

impl ResourceKind {
    /// All registered kinds.
    #[must_use]
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Account,
            ResourceKind::Application,
            ResourceKind::Directory,
            ResourceKind::Group,
            ResourceKind::Organization,
            ResourceKind::Tenant,
            ResourceKind::ApiKey,
            ResourceKind::CustomData,
            ResourceKind::EmailTemplate,
        ]
    }

    /// Singular name as it appears in hrefs and link fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Account => "account",
            ResourceKind::Application => "application",
            ResourceKind::Directory => "directory",
            ResourceKind::Group => "group",
            ResourceKind::Organization => "organization",
            ResourceKind::Tenant => "tenant",
            ResourceKind::ApiKey => "apiKey",
            ResourceKind::CustomData => "customData",
            ResourceKind::EmailTemplate => "emailTemplate",
        }
    }

    /// Plural collection name (`accounts`, `directories`, ...).
    #[must_use]
    pub fn collection_name(&self) -> &'static str {
        match self {
            ResourceKind::Account => "accounts",
            ResourceKind::Application => "applications",
            ResourceKind::Directory => "directories",
            ResourceKind::Group => "groups",
            ResourceKind::Organization => "organizations",
            ResourceKind::Tenant => "tenants",
            ResourceKind::ApiKey => "apiKeys",
            ResourceKind::CustomData => "customData",
            ResourceKind::EmailTemplate => "emailTemplates",
        }
    }

    /// Resolve a singular resource name. Unknown names return `None`.
    #[must_use]
    pub fn for_name(name: &str) -> Option<ResourceKind> {
        ResourceKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Resolve a collection name to its element kind (`accounts` ->
    /// `Account`). Unknown names return `None`.
    #[must_use]
    pub fn element_for_collection(name: &str) -> Option<ResourceKind> {
        ResourceKind::all()
            .iter()
            .copied()
            .find(|kind| kind.collection_name().eq_ignore_ascii_case(name))
    }

    /// The status values this kind's `status`-suffixed fields accept, or
    /// an empty slice when the kind carries no status.
    #[must_use]
    pub fn status_values(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Account => &["ENABLED", "DISABLED", "UNVERIFIED"],
            ResourceKind::Application
            | ResourceKind::Directory
            | ResourceKind::Group
            | ResourceKind::Organization
            | ResourceKind::ApiKey
            | ResourceKind::EmailTemplate => &["ENABLED", "DISABLED"],
            ResourceKind::Tenant | ResourceKind::CustomData => &[],
        }
    }

    /// Normalize a raw status string against this kind's vocabulary.
    /// Matching is case-insensitive; unknown values return `None`.
    #[must_use]
    pub fn normalize_status(&self, raw: &str) -> Option<&'static str> {
        self.status_values()
            .iter()
            .copied()
            .find(|candidate| candidate.eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown resource kind name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown resource kind: {0}")]
pub struct ParseResourceKindError(String);

impl FromStr for ResourceKind {
    type Err = ParseResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::for_name(s).ok_or_else(|| ParseResourceKindError(s.to_string()))
    }
}

/// Shape of a navigable link property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkShape {
    /// Points at a single resource.
    Single,
    /// Points at a pageable collection.
    Collection,
}

/// Look up the shape of a named link on a kind. Plain attributes and
/// unknown names return `None`.
#[must_use]
pub fn link_shape(kind: ResourceKind, name: &str) -> Option<LinkShape> {
    use LinkShape::{Collection, Single};
    let table: &[(&str, LinkShape)] = match kind {
        ResourceKind::Account => &[
            ("directory", Single),
            ("tenant", Single),
            ("customData", Single),
            ("providerData", Single),
            ("groups", Collection),
            ("groupMemberships", Collection),
            ("applications", Collection),
            ("apiKeys", Collection),
        ],
        ResourceKind::Group => &[
            ("directory", Single),
            ("tenant", Single),
            ("customData", Single),
            ("accounts", Collection),
            ("accountMemberships", Collection),
        ],
        ResourceKind::Directory => &[
            ("tenant", Single),
            ("provider", Single),
            ("customData", Single),
            ("accountCreationPolicy", Single),
            ("passwordPolicy", Single),
            ("accounts", Collection),
            ("groups", Collection),
        ],
        ResourceKind::Application => &[
            ("tenant", Single),
            ("customData", Single),
            ("defaultAccountStoreMapping", Single),
            ("defaultGroupStoreMapping", Single),
            ("oAuthPolicy", Single),
            ("accounts", Collection),
            ("groups", Collection),
            ("accountStoreMappings", Collection),
        ],
        ResourceKind::Organization => &[
            ("tenant", Single),
            ("customData", Single),
            ("defaultAccountStoreMapping", Single),
            ("defaultGroupStoreMapping", Single),
            ("accounts", Collection),
            ("groups", Collection),
            ("accountStoreMappings", Collection),
        ],
        ResourceKind::Tenant => &[
            ("customData", Single),
            ("accounts", Collection),
            ("applications", Collection),
            ("directories", Collection),
            ("groups", Collection),
            ("organizations", Collection),
        ],
        ResourceKind::ApiKey => &[("account", Single), ("tenant", Single)],
        ResourceKind::CustomData | ResourceKind::EmailTemplate => &[],
    };
    table
        .iter()
        .find(|(link, _)| *link == name)
        .map(|(_, shape)| *shape)
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Enabled,
    Disabled,
    Unverified,
}

impl AccountStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Enabled => "ENABLED",
            AccountStatus::Disabled => "DISABLED",
            AccountStatus::Unverified => "UNVERIFIED",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ParseResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENABLED" => Ok(AccountStatus::Enabled),
            "DISABLED" => Ok(AccountStatus::Disabled),
            "UNVERIFIED" => Ok(AccountStatus::Unverified),
            _ => Err(ParseResourceKindError(s.to_string())),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enabled/disabled status shared by applications, directories, groups,
/// organizations, and API keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceStatus {
    Enabled,
    Disabled,
}

impl ResourceStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Enabled => "ENABLED",
            ResourceStatus::Disabled => "DISABLED",
        }
    }
}

impl FromStr for ResourceStatus {
    type Err = ParseResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENABLED" => Ok(ResourceStatus::Enabled),
            "DISABLED" => Ok(ResourceStatus::Disabled),
            _ => Err(ParseResourceKindError(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
