//! Service keys identifying one service slot per generation.

use std::any::TypeId;
use std::fmt;

/// Key for service storage and lookup within a generation.
///
/// A generation holds at most one instance per service type, so the key is
/// the implementing type itself. The `TypeId` drives equality and hashing;
/// the type name only serves diagnostics.
///
/// # Examples
///
/// ```rust
/// use screenflow::{key_of, ServiceKey};
///
/// struct Session;
/// struct Profile;
///
/// assert_eq!(key_of::<Session>(), key_of::<Session>());
/// assert_ne!(key_of::<Session>(), key_of::<Profile>());
/// assert!(key_of::<Session>().display_name().ends_with("Session"));
/// ```
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    /// Full type name, as produced by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// The `TypeId` backing this key.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

// TypeId-only comparison; the name is derived from the same type
impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl std::hash::Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceKey").field(&self.name).finish()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Builds the key for a service type.
#[inline(always)]
pub fn key_of<T: 'static>() -> ServiceKey {
    ServiceKey {
        id: TypeId::of::<T>(),
        name: std::any::type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod app {
        pub struct Inbox;
    }

    #[test]
    fn short_name_strips_module_path() {
        let key = key_of::<app::Inbox>();
        assert_eq!(key.short_name(), "Inbox");
        assert_eq!(key.to_string(), "Inbox");
        assert!(key.display_name().contains("app::Inbox"));
    }

    #[test]
    fn keys_hash_by_type() {
        let mut set = HashSet::new();
        set.insert(key_of::<app::Inbox>());
        set.insert(key_of::<app::Inbox>());
        set.insert(key_of::<String>());
        assert_eq!(set.len(), 2);
    }
}
