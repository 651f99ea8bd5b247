//! Access policy
//!
//! The member resolver finds members regardless of their declared
//! visibility. Whether a resolved member may actually be read, written or
//! invoked is decided here, against the type that declares the member.
//!
//! ## Resolution order
//!
//! 1. Exact type rule (`"host.vault.Secret"`)
//! 2. Pattern rules, most specific first: longest literal prefix, then
//!    `prefix.*` before `prefix.**`, with `"*"` and `"**"` last. Rules of
//!    equal specificity keep insertion order.
//! 3. Policy default
//!
//! ## TOML Configuration
//!
//! ```toml
//! [access]
//! default = "ALL"
//!
//! [access.types]
//! "host.vault.*" = "PUBLIC_ONLY"
//! "host.audit.Log" = "READ_PUBLIC|INVOKE_PUBLIC"
//! ```

use std::fmt;

use rustc_hash::FxHashMap;
use tether_sdk::Visibility;

use crate::error::BridgeError;

/// Access flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessFlags(u8);

impl AccessFlags {
    /// Nothing allowed
    pub const NONE: Self = Self(0x00);
    /// Read public fields
    pub const READ_PUBLIC: Self = Self(0x01);
    /// Read non-public fields
    pub const READ_PRIVATE: Self = Self(0x02);
    /// Write public fields
    pub const WRITE_PUBLIC: Self = Self(0x04);
    /// Write non-public fields
    pub const WRITE_PRIVATE: Self = Self(0x08);
    /// Invoke public methods
    pub const INVOKE_PUBLIC: Self = Self(0x10);
    /// Invoke non-public methods
    pub const INVOKE_PRIVATE: Self = Self(0x20);

    /// READ_PUBLIC | READ_PRIVATE
    pub const READ_ALL: Self = Self(0x03);
    /// WRITE_PUBLIC | WRITE_PRIVATE
    pub const WRITE_ALL: Self = Self(0x0C);
    /// INVOKE_PUBLIC | INVOKE_PRIVATE
    pub const INVOKE_ALL: Self = Self(0x30);
    /// READ_PUBLIC | WRITE_PUBLIC | INVOKE_PUBLIC
    pub const PUBLIC_ONLY: Self = Self(0x15);
    /// Everything
    pub const ALL: Self = Self(0x3F);

    /// Check if all flags in `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Parse a single flag name, or hex (`0x15`) / decimal bits
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "READ_PUBLIC" => Some(Self::READ_PUBLIC),
            "READ_PRIVATE" => Some(Self::READ_PRIVATE),
            "WRITE_PUBLIC" => Some(Self::WRITE_PUBLIC),
            "WRITE_PRIVATE" => Some(Self::WRITE_PRIVATE),
            "INVOKE_PUBLIC" => Some(Self::INVOKE_PUBLIC),
            "INVOKE_PRIVATE" => Some(Self::INVOKE_PRIVATE),
            "READ_ALL" => Some(Self::READ_ALL),
            "WRITE_ALL" => Some(Self::WRITE_ALL),
            "INVOKE_ALL" => Some(Self::INVOKE_ALL),
            "PUBLIC_ONLY" => Some(Self::PUBLIC_ONLY),
            "ALL" => Some(Self::ALL),
            _ => {
                let bits = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u8::from_str_radix(hex, 16).ok()?,
                    None => s.parse::<u8>().ok()?,
                };
                (bits & !Self::ALL.0 == 0).then_some(Self(bits))
            }
        }
    }

    /// Parse pipe-separated flags (e.g. `"READ_PUBLIC|WRITE_PUBLIC"`)
    pub fn parse(s: &str) -> Option<Self> {
        s.split('|')
            .map(|part| Self::parse_one(part.trim()))
            .try_fold(Self::NONE, |acc, flag| flag.map(|f| acc.union(f)))
    }
}

impl Default for AccessFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "NONE",
            Self::READ_PUBLIC => "READ_PUBLIC",
            Self::READ_PRIVATE => "READ_PRIVATE",
            Self::WRITE_PUBLIC => "WRITE_PUBLIC",
            Self::WRITE_PRIVATE => "WRITE_PRIVATE",
            Self::INVOKE_PUBLIC => "INVOKE_PUBLIC",
            Self::INVOKE_PRIVATE => "INVOKE_PRIVATE",
            Self::READ_ALL => "READ_ALL",
            Self::WRITE_ALL => "WRITE_ALL",
            Self::INVOKE_ALL => "INVOKE_ALL",
            Self::PUBLIC_ONLY => "PUBLIC_ONLY",
            Self::ALL => "ALL",
            _ => return write!(f, "0x{:02X}", self.0),
        };
        f.write_str(name)
    }
}

/// What the caller wants to do with a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Field read
    Read,
    /// Field write
    Write,
    /// Method call
    Invoke,
}

impl Access {
    /// Flag required for this access on a member with `visibility`.
    /// Protected members count as non-public.
    pub fn required(self, visibility: Visibility) -> AccessFlags {
        let public = visibility.is_public();
        match (self, public) {
            (Access::Read, true) => AccessFlags::READ_PUBLIC,
            (Access::Read, false) => AccessFlags::READ_PRIVATE,
            (Access::Write, true) => AccessFlags::WRITE_PUBLIC,
            (Access::Write, false) => AccessFlags::WRITE_PRIVATE,
            (Access::Invoke, true) => AccessFlags::INVOKE_PUBLIC,
            (Access::Invoke, false) => AccessFlags::INVOKE_PRIVATE,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
            Access::Invoke => "invoke",
        }
    }
}

/// Type pattern rule (supports wildcards)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRule {
    /// Pattern (`"host.vault.*"`, `"host.**"`, `"*"`)
    pub pattern: String,
    /// Flags for matching types
    pub flags: AccessFlags,
}

impl TypeRule {
    /// Check if a type name matches this pattern.
    ///
    /// `prefix.*` matches types directly inside `prefix`; `prefix.**`
    /// matches anything below it; `*` and `**` match everything.
    pub fn matches(&self, type_name: &str) -> bool {
        if self.pattern == "*" || self.pattern == "**" {
            return true;
        }

        if let Some(prefix) = self.pattern.strip_suffix(".**") {
            type_name
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1)
        } else if let Some(prefix) = self.pattern.strip_suffix(".*") {
            type_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
        } else {
            self.pattern == type_name
        }
    }

    /// Ordering key; higher sorts first
    fn specificity(&self) -> (usize, u8) {
        if self.pattern == "*" || self.pattern == "**" {
            (0, 0)
        } else if let Some(prefix) = self.pattern.strip_suffix(".**") {
            (prefix.len(), 0)
        } else if let Some(prefix) = self.pattern.strip_suffix(".*") {
            (prefix.len(), 1)
        } else {
            (self.pattern.len(), 2)
        }
    }
}

/// Allow-list deciding which resolved members may be used
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    default: AccessFlags,
    exact: FxHashMap<String, AccessFlags>,
    rules: Vec<TypeRule>,
}

impl AccessPolicy {
    /// Policy allowing everything, regardless of visibility
    pub fn allow_all() -> Self {
        Self::with_default(AccessFlags::ALL)
    }

    /// Policy with the given default and no type rules
    pub fn with_default(default: AccessFlags) -> Self {
        Self {
            default,
            exact: FxHashMap::default(),
            rules: Vec::new(),
        }
    }

    /// Default flags
    pub fn default_flags(&self) -> AccessFlags {
        self.default
    }

    /// Add a rule for a type name or wildcard pattern
    pub fn with_rule(mut self, pattern: impl Into<String>, flags: AccessFlags) -> Self {
        self.add_rule(pattern, flags);
        self
    }

    /// Add a rule for a type name or wildcard pattern
    pub fn add_rule(&mut self, pattern: impl Into<String>, flags: AccessFlags) {
        let pattern = pattern.into();
        if pattern.contains('*') {
            let rule = TypeRule { pattern, flags };
            let key = rule.specificity();
            let at = self
                .rules
                .iter()
                .position(|r| r.specificity() < key)
                .unwrap_or(self.rules.len());
            self.rules.insert(at, rule);
        } else {
            self.exact.insert(pattern, flags);
        }
    }

    /// Check if anything is restricted (fast path for the default policy)
    pub fn has_any_restrictions(&self) -> bool {
        self.default != AccessFlags::ALL
            || self.exact.values().any(|f| *f != AccessFlags::ALL)
            || self.rules.iter().any(|r| r.flags != AccessFlags::ALL)
    }

    /// Flags in effect for a type
    pub fn resolve(&self, type_name: &str) -> AccessFlags {
        if let Some(flags) = self.exact.get(type_name) {
            return *flags;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(type_name))
            .map(|rule| rule.flags)
            .unwrap_or(self.default)
    }

    /// Check whether `access` to `member` (declared on `type_name` with
    /// `visibility`) is allowed
    pub fn check(
        &self,
        type_name: &str,
        member: &str,
        visibility: Visibility,
        access: Access,
    ) -> Result<(), BridgeError> {
        if !self.has_any_restrictions() {
            return Ok(());
        }
        let required = access.required(visibility);
        if self.resolve(type_name).contains(required) {
            Ok(())
        } else {
            Err(BridgeError::AccessDenied(format!(
                "cannot {} {} member '{}' of {}",
                access.verb(),
                if visibility.is_public() { "public" } else { "non-public" },
                member,
                type_name
            )))
        }
    }
}
