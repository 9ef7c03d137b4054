use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::LazyLock;
use std::sync::PoisonError;
use std::sync::RwLock;
use string_interner::StringInterner;
use string_interner::backend::StringBackend;
use string_interner::symbol::SymbolU32;

/// Interned name of a type or of one of its operations.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct Identifier(SymbolU32);

impl std::fmt::Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identifier({self})")
    }
}

static IDENTIFIERS: LazyLock<RwLock<StringInterner<StringBackend>>> =
    LazyLock::new(|| RwLock::new(StringInterner::default()));

impl Identifier {
    pub fn parse(raw: &str) -> Self {
        let symbol = IDENTIFIERS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_intern(raw);

        Self(symbol)
    }

    pub fn raw(self) -> String {
        IDENTIFIERS
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(self.0)
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        *self == Self::parse(other)
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        *self == Self::parse(other)
    }
}
