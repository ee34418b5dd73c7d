//! Lock identity, path and state definitions.

use crate::error::{Result, ZklockError};
use std::fmt;

/// Name a lock holder writes into the lock node.
///
/// Unauthenticated: any party can claim any identity. Never empty, since an
/// empty node value reads as "lock lost".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ZklockError::UserError(
                "lock identity must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Identity derived from the local host name.
    pub fn from_hostname() -> Result<Self> {
        let host = hostname::get().map_err(|e| {
            ZklockError::UserError(format!(
                "failed to determine host name: {}\nFix: pass --identity explicitly.",
                e
            ))
        })?;
        Self::new(host.to_string_lossy().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full path of a lock node: `root/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPath(String);

impl LockPath {
    pub fn new(root: &str, name: &str) -> Result<Self> {
        validate_root(root)?;
        validate_lock_name(name)?;
        if root == "/" {
            Ok(Self(format!("/{}", name)))
        } else {
            Ok(Self(format!("{}/{}", root, name)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ownership of the lock as observed by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unacquired,
    Held,
    /// Node vanished or was emptied.
    Lost,
    /// Node names another identity.
    Usurped,
    /// Monitoring has ended.
    Terminal,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Unacquired => "unacquired",
            LockState::Held => "held",
            LockState::Lost => "lost",
            LockState::Usurped => "usurped",
            LockState::Terminal => "terminal",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `root` is an absolute node path.
pub fn validate_root(root: &str) -> Result<()> {
    if !root.starts_with('/') {
        return Err(ZklockError::UserError(format!(
            "root path '{}' must start with '/'",
            root
        )));
    }
    if root.len() > 1 && root.ends_with('/') {
        return Err(ZklockError::UserError(format!(
            "root path '{}' must not end with '/'",
            root
        )));
    }
    if root.contains("//") {
        return Err(ZklockError::UserError(format!(
            "root path '{}' contains an empty segment",
            root
        )));
    }
    Ok(())
}

/// Check that `name` is usable as a single path segment.
pub fn validate_lock_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(ZklockError::UserError(format!(
            "invalid lock name '{}': must be a single non-empty path segment",
            name
        )));
    }
    Ok(())
}
