//! Core authorization types

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier
///
/// Ownership checks compare these for exact equality, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Authenticated caller of a request
///
/// Built once per request by an [`IdentityResolver`](crate::identity::IdentityResolver)
/// and passed down by reference. Fields are private so an identity cannot be
/// altered after it has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    id: UserId,
    role: Role,
}

impl CallerIdentity {
    pub fn new(id: impl Into<UserId>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Anything that records which user owns it
///
/// `None` means the resource has no owner (e.g. the uploader account was
/// deleted); such resources can only be managed by privileged roles.
pub trait Owned {
    fn owner_id(&self) -> Option<&UserId>;
}

impl Owned for UserId {
    fn owner_id(&self) -> Option<&UserId> {
        Some(self)
    }
}

impl Owned for Option<UserId> {
    fn owner_id(&self) -> Option<&UserId> {
        self.as_ref()
    }
}

impl<T: Owned + ?Sized> Owned for &T {
    fn owner_id(&self) -> Option<&UserId> {
        (**self).owner_id()
    }
}

/// Kind of protected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Photo,
    Comment,
    Transformation,
    Rating,
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Photo => "photo",
            ResourceKind::Comment => "comment",
            ResourceKind::Transformation => "transformation",
            ResourceKind::Rating => "rating",
            ResourceKind::User => "user",
        };
        f.write_str(name)
    }
}

/// Ownership metadata of a protected resource, as loaded by a handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedResource {
    /// Resource kind
    pub kind: ResourceKind,

    /// Resource identifier within its kind
    pub id: String,

    /// Owning user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

impl OwnedResource {
    /// Create an unowned resource descriptor
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            owner: None,
        }
    }

    /// Photo uploaded by `owner`
    pub fn photo(id: impl Into<String>, owner: impl Into<UserId>) -> Self {
        Self::new(ResourceKind::Photo, id).with_owner(owner)
    }

    /// Comment written by `author`
    pub fn comment(id: impl Into<String>, author: impl Into<UserId>) -> Self {
        Self::new(ResourceKind::Comment, id).with_owner(author)
    }

    /// Set the owning user
    pub fn with_owner(mut self, owner: impl Into<UserId>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

impl Owned for OwnedResource {
    fn owner_id(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_identity_creation() {
        let caller = CallerIdentity::new("u1", Role::Moderator);
        assert_eq!(caller.id(), &UserId::from("u1"));
        assert_eq!(caller.role(), Role::Moderator);
    }

    #[test]
    fn test_user_id_from_integer() {
        assert_eq!(UserId::from(42u64), UserId::from("42"));
        assert_eq!(UserId::from(7u64).to_string(), "7");
    }

    #[test]
    fn test_owned_resource_creation() {
        let photo = OwnedResource::photo("17", "u1");
        assert_eq!(photo.kind, ResourceKind::Photo);
        assert_eq!(photo.owner_id(), Some(&UserId::from("u1")));

        let orphan = OwnedResource::new(ResourceKind::Comment, "3");
        assert_eq!(orphan.owner_id(), None);
        assert_eq!((&orphan).owner_id(), None);
    }

    #[test]
    fn test_identity_serialization() {
        let caller = CallerIdentity::new("u5", Role::Admin);
        let json = serde_json::to_value(&caller).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "u5", "role": "admin" }));

        let back: CallerIdentity = serde_json::from_value(json).unwrap();
        assert_eq!(back, caller);
    }

    #[test]
    fn test_identity_rejects_unknown_role() {
        let result = serde_json::from_str::<CallerIdentity>(r#"{"id":"u1","role":"owner"}"#);
        assert!(result.is_err());
    }
}
