//! String interning for control sequence names.

use std::collections::HashMap;

use super::CsName;

/// Interner mapping control sequence names to [CsName] keys.
///
/// Interning the same name twice returns the same key. Interned strings are
/// never deallocated; a math expression only ever mentions a bounded number
/// of distinct names.
#[derive(Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsNameInterner {
    names: Vec<String>,
    keys: HashMap<String, CsName>,
}

impl CsNameInterner {
    pub fn new() -> CsNameInterner {
        Default::default()
    }

    /// Intern the provided string and return its key.
    pub fn get_or_intern<T: AsRef<str>>(&mut self, string: T) -> CsName {
        let string = string.as_ref();
        if let Some(&key) = self.keys.get(string) {
            return key;
        }
        self.names.push(string.to_string());
        // Keys start at 1, so the vector length after pushing is the key.
        let key = CsName::try_from_usize(self.names.len()).unwrap();
        self.keys.insert(string.to_string(), key);
        key
    }

    /// Get the key for the provided string if it has already been interned.
    ///
    /// This method is useful when the caller only has a shared reference to
    /// the interner.
    #[inline]
    pub fn get<T: AsRef<str>>(&self, string: T) -> Option<CsName> {
        self.keys.get(string.as_ref()).copied()
    }

    /// Return the interned string corresponding to the provided key.
    #[inline]
    pub fn resolve(&self, cs_name: CsName) -> Option<&str> {
        self.names.get(cs_name.to_usize() - 1).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_resolve() {
        let mut interner = CsNameInterner::new();
        let hello_1 = interner.get_or_intern("hello");
        let world_1 = interner.get_or_intern("world");
        let hello_2 = interner.get_or_intern("hello");
        assert_eq!(hello_1, hello_2);
        assert_ne!(hello_1, world_1);

        assert_eq!(interner.resolve(hello_1), Some("hello"));
        assert_eq!(interner.resolve(world_1), Some("world"));

        assert_eq!(interner.get("hello"), Some(hello_1));
        assert_eq!(interner.get("other"), None);
    }
}
