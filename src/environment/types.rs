use std::fmt;

/// Static types known to the language. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Any,
    Nil,
    Comparable,
    Boolean,
    Integer,
    Decimal,
    Character,
    String,
}

impl Type {
    pub const ALL: [Type; 8] = [
        Type::Any,
        Type::Nil,
        Type::Comparable,
        Type::Boolean,
        Type::Integer,
        Type::Decimal,
        Type::Character,
        Type::String,
    ];

    /// Looks up a type by the name used in source text.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Any => "Any",
            Type::Nil => "Nil",
            Type::Comparable => "Comparable",
            Type::Boolean => "Boolean",
            Type::Integer => "Integer",
            Type::Decimal => "Decimal",
            Type::Character => "Character",
            Type::String => "String",
        }
    }

    /// Name of the corresponding type in generated Java.
    pub fn host_name(self) -> &'static str {
        match self {
            Type::Any => "Object",
            Type::Nil => "Void",
            Type::Comparable => "Comparable",
            Type::Boolean => "boolean",
            Type::Integer => "int",
            Type::Decimal => "double",
            Type::Character => "char",
            Type::String => "String",
        }
    }

    pub fn is_comparable(self) -> bool {
        matches!(
            self,
            Type::Integer | Type::Decimal | Type::Character | Type::String
        )
    }

    /// Whether a value of type `actual` may be stored where `self` is expected.
    pub fn accepts(self, actual: Type) -> bool {
        match self {
            Type::Any => true,
            Type::Comparable => actual == Type::Comparable || actual.is_comparable(),
            _ => self == actual,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_source_names() {
        for ty in Type::ALL {
            assert_eq!(Type::from_name(ty.name()), Some(ty));
        }
        assert_eq!(Type::from_name("integer"), None);
        assert_eq!(Type::from_name("Object"), None);
    }

    #[test]
    fn any_accepts_everything() {
        for ty in Type::ALL {
            assert!(Type::Any.accepts(ty), "{ty}");
        }
    }

    #[test]
    fn comparable_accepts_only_ordered_types() {
        assert!(Type::Comparable.accepts(Type::Integer));
        assert!(Type::Comparable.accepts(Type::Decimal));
        assert!(Type::Comparable.accepts(Type::Character));
        assert!(Type::Comparable.accepts(Type::String));
        assert!(Type::Comparable.accepts(Type::Comparable));
        assert!(!Type::Comparable.accepts(Type::Boolean));
        assert!(!Type::Comparable.accepts(Type::Nil));
        assert!(!Type::Comparable.accepts(Type::Any));
    }

    #[test]
    fn concrete_types_are_nominal() {
        assert!(Type::Integer.accepts(Type::Integer));
        assert!(!Type::Integer.accepts(Type::Decimal));
        assert!(!Type::Integer.accepts(Type::Any));
        assert!(!Type::String.accepts(Type::Comparable));
    }
}
