//! Builtin primitives of the pseudo-package with the empty path

/// Path of the builtin pseudo-package.
pub const BUILTIN_PACKAGE: &str = "";

/// Primitive spellings and the canonical node they map to. Several spellings
/// share one node (`int8`, `uint8` and `byte` are all `byte`).
const BUILTINS: &[(&str, &str)] = &[
    ("bool", "bool"),
    ("string", "string"),
    ("int", "int"),
    ("int64", "int64"),
    ("int32", "int32"),
    ("int16", "int16"),
    ("int8", "byte"),
    ("uint", "uint"),
    ("uint64", "uint64"),
    ("uint32", "uint32"),
    ("uint16", "uint16"),
    ("uint8", "byte"),
    ("uintptr", "uintptr"),
    ("byte", "byte"),
    ("float", "float"),
    ("float64", "float64"),
    ("float32", "float32"),
];

/// Canonical builtin name for a primitive spelling, if it is specially
/// registered.
pub fn canonical_builtin(name: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(spelling, _)| *spelling == name)
        .map(|(_, canonical)| *canonical)
}

pub fn is_builtin(name: &str) -> bool {
    canonical_builtin(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliased_spellings_share_canonical_name() {
        assert_eq!(canonical_builtin("int8"), Some("byte"));
        assert_eq!(canonical_builtin("uint8"), Some("byte"));
        assert_eq!(canonical_builtin("float64"), Some("float64"));
    }

    #[test]
    fn test_unregistered_primitives() {
        assert!(!is_builtin("complex128"));
        assert!(!is_builtin("rune"));
        assert!(!is_builtin("untyped string"));
    }
}
