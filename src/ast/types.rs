//! The PCL type system.
//!
//! Types are plain structural values: two types are equal exactly when their
//! trees are equal. Compatibility is the directed relation used for
//! assignment, argument passing and comparison.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Integer,
    Real,
    Boolean,
    Char,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(ScalarType),
    Pointer(Box<Type>),
    ConstArray(u32, Box<Type>),
    VarArray(Box<Type>),
    Label,
    Nil,
    Procedure,
    Function(Box<Type>),
}

impl Type {
    pub const INTEGER: Type = Type::Scalar(ScalarType::Integer);
    pub const REAL: Type = Type::Scalar(ScalarType::Real);
    pub const BOOLEAN: Type = Type::Scalar(ScalarType::Boolean);
    pub const CHAR: Type = Type::Scalar(ScalarType::Char);

    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn const_array(length: u32, element: Type) -> Type {
        Type::ConstArray(length, Box::new(element))
    }

    pub fn var_array(element: Type) -> Type {
        Type::VarArray(Box::new(element))
    }

    /// The type of a string literal with `length` bytes: NUL-terminated chars.
    pub fn string(length: usize) -> Type {
        Type::const_array(length as u32 + 1, Type::CHAR)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Type::Scalar(ScalarType::Integer | ScalarType::Real))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::ConstArray(..) | Type::VarArray(_))
    }

    pub fn is_pointer_like(&self) -> bool {
        matches!(self, Type::Pointer(_) | Type::Nil)
    }

    /// Element type of either array form.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::ConstArray(_, element) | Type::VarArray(element) => Some(element),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    /// A complete type has a known size: everything a variable can hold.
    pub fn is_complete(&self) -> bool {
        match self {
            Type::Scalar(_) | Type::Pointer(_) => true,
            Type::ConstArray(length, element) => *length > 0 && element.is_complete(),
            _ => false,
        }
    }

    /// Whether a value of type `self` may be used where `expected` is required.
    pub fn is_compatible_with(&self, expected: &Type) -> bool {
        if self == expected {
            return true;
        }

        match (self, expected) {
            (Type::Scalar(ScalarType::Integer), Type::Scalar(ScalarType::Real)) => true,
            (Type::Nil, Type::Pointer(_)) => true,
            (Type::ConstArray(_, actual), Type::VarArray(element)) => actual == element,
            (Type::Pointer(actual), Type::Pointer(pointee)) => match (&**actual, &**pointee) {
                (Type::ConstArray(_, actual), Type::VarArray(element)) => actual == element,
                _ => false,
            },
            _ => false,
        }
    }

    /// Compatibility for `var` parameters: the callee writes through the
    /// handle, so no widening applies. Only array length is erased.
    pub fn is_reference_compatible_with(&self, expected: &Type) -> bool {
        if self == expected {
            return true;
        }

        matches!(
            (self, expected),
            (Type::ConstArray(_, actual), Type::VarArray(element)) if actual == element
        )
    }

    /// Whether `=` and `<>` accept this pair of operand types.
    pub fn is_equality_comparable_with(&self, other: &Type) -> bool {
        if self.is_array() || other.is_array() {
            return false;
        }

        if self.is_arithmetic() && other.is_arithmetic() {
            return true;
        }

        match (self, other) {
            (Type::Scalar(left), Type::Scalar(right)) => left == right,
            (Type::Pointer(_) | Type::Nil, Type::Pointer(_) | Type::Nil) => {
                self.is_compatible_with(other) || other.is_compatible_with(self)
            }
            _ => false,
        }
    }

    /// Result type of `+`, `-` and `*`.
    pub fn arithmetic_result(&self, other: &Type) -> Option<Type> {
        if !self.is_arithmetic() || !other.is_arithmetic() {
            return None;
        }

        if *self == Type::REAL || *other == Type::REAL {
            Some(Type::REAL)
        } else {
            Some(Type::INTEGER)
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Scalar(ScalarType::Integer) => write!(f, "integer"),
            Type::Scalar(ScalarType::Real) => write!(f, "real"),
            Type::Scalar(ScalarType::Boolean) => write!(f, "boolean"),
            Type::Scalar(ScalarType::Char) => write!(f, "char"),
            Type::Pointer(pointee) => write!(f, "^{}", pointee),
            Type::ConstArray(length, element) => write!(f, "array [{}] of {}", length, element),
            Type::VarArray(element) => write!(f, "array of {}", element),
            Type::Label => write!(f, "label"),
            Type::Nil => write!(f, "nil"),
            Type::Procedure => write!(f, "procedure"),
            Type::Function(result) => write!(f, "function: {}", result),
        }
    }
}
