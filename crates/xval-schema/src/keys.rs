//! # Key Policy
//!
//! The presence rules shared by every keyed collection (attrs, coords and
//! dataset data variables). A collection first has its key sets compared
//! against the configured keys; per-key validation is the caller's job and
//! runs afterwards, over configured keys that are present.
//!
//! Missing keys are reported before extra keys. In lazy mode both are
//! recorded and the caller still goes on to per-key checks.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use xval_core::{ConstructionError, KeySet, SchemaError, ValidationContext, ValidationError};

use crate::schema::{bool_field, SchemaKind};

/// Plain-data field holding [`KeyPolicy::require_all_keys`].
pub const REQUIRE_ALL_KEYS: &str = "require_all_keys";
/// Plain-data field holding [`KeyPolicy::allow_extra_keys`].
pub const ALLOW_EXTRA_KEYS: &str = "allow_extra_keys";

/// Which keys a keyed collection must and may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPolicy {
    /// Every configured key must be present.
    pub require_all_keys: bool,
    /// Keys that are not configured are tolerated.
    pub allow_extra_keys: bool,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            require_all_keys: true,
            allow_extra_keys: true,
        }
    }
}

impl KeyPolicy {
    /// Build a policy from its two flags.
    pub fn new(require_all_keys: bool, allow_extra_keys: bool) -> Self {
        Self {
            require_all_keys,
            allow_extra_keys,
        }
    }

    /// Compare the key sets of a collection named `collection`.
    ///
    /// Mismatches are routed through `ctx`, so in lazy mode both phases run
    /// and this returns `Ok`.
    pub fn check_keys<'a, C, A>(
        &self,
        collection: &str,
        configured: C,
        actual: A,
        ctx: &ValidationContext,
    ) -> Result<(), ValidationError>
    where
        C: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = &'a str>,
    {
        let configured: BTreeSet<&str> = configured.into_iter().collect();
        let actual: BTreeSet<&str> = actual.into_iter().collect();

        if self.require_all_keys {
            let missing: KeySet = configured.difference(&actual).copied().collect();
            if !missing.0.is_empty() {
                ctx.handle_error(SchemaError::MissingKeys {
                    collection: collection.to_string(),
                    keys: missing,
                })?;
            }
        }

        if !self.allow_extra_keys {
            let extra: KeySet = actual.difference(&configured).copied().collect();
            if !extra.0.is_empty() {
                ctx.handle_error(SchemaError::ExtraKeys {
                    collection: collection.to_string(),
                    keys: extra,
                })?;
            }
        }

        Ok(())
    }

    /// Write both flags into `obj`.
    pub(crate) fn serialize_into(&self, obj: &mut Map<String, Value>) {
        obj.insert(REQUIRE_ALL_KEYS.into(), Value::Bool(self.require_all_keys));
        obj.insert(ALLOW_EXTRA_KEYS.into(), Value::Bool(self.allow_extra_keys));
    }

    /// Read both flags from `obj`, defaulting absent ones.
    pub(crate) fn deserialize_from(
        kind: SchemaKind,
        obj: &Map<String, Value>,
    ) -> Result<Self, ConstructionError> {
        let defaults = Self::default();
        Ok(Self {
            require_all_keys: bool_field(kind, obj, REQUIRE_ALL_KEYS, defaults.require_all_keys)?,
            allow_extra_keys: bool_field(kind, obj, ALLOW_EXTRA_KEYS, defaults.allow_extra_keys)?,
        })
    }
}
