//! Global String Interner
//!
//! Shader property names are interned once and carried around as [`Symbol`]s,
//! so property sets compare and copy as integers while the shader builder can
//! still resolve the original names for template rendering.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer handle to an interned string.
pub type Symbol = Spur;

/// Interns `s`, returning the existing symbol if it was already present.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("UseAlphaMap");
        let s2 = intern("UseAlphaMap");
        let s3 = intern("UseNormalMap");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "UseAlphaMap");
        assert_eq!(resolve(s3), "UseNormalMap");
    }

    #[test]
    fn test_get() {
        let _ = intern("ExistingProperty");

        assert!(get("ExistingProperty").is_some());
        assert!(get("MissingProperty").is_none());
    }
}
