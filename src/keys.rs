//! Storage key derivation.
//!
//! Chunk 0 lives under the unsuffixed key so entries written by
//! non-chunking versions keep resolving; later chunks append `.<index>`.
//! Account scoping folds the server URL and account id into the base key
//! before the chunk suffix is applied.

use crate::types::AccountScope;

/// Selects between the current and the legacy account key form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Fold the account id into scoped keys.
    #[default]
    Current,
    /// Omit the account id, deriving the key form used before ids were part
    /// of the naming scheme, so old entries can be located and rewritten.
    Migration,
}

/// Derive the storage key for one chunk of a logical secret.
///
/// Pure and deterministic; the same inputs always derive the same key, which
/// is what lets a read chain re-derive the keys a write chain used.
pub fn derive_key(
    name: &str,
    scope: Option<&AccountScope>,
    mode: KeyMode,
    chunk_index: usize,
) -> String {
    let base = match scope {
        None => name.to_string(),
        Some(scope) => {
            let mut url = scope.url().to_string();
            if !url.ends_with('/') {
                url.push('/');
            }
            let mut key = format!("{name}:{url}");
            if mode == KeyMode::Current && !scope.id().is_empty() {
                key.push(':');
                key.push_str(scope.id());
            }
            key
        }
    };

    if chunk_index > 0 {
        format!("{base}.{chunk_index}")
    } else {
        base
    }
}
