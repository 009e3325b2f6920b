// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type definitions and the compatibility relations.

use std::fmt;

/// A type in a routing description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Location,
    /// A qubit handle. Accepted wherever an `Int` index is expected.
    Qubit,
    Gate,
    Arch,
    State,
    Option(Box<Type>),
    Vec(Box<Type>),
    /// Container with a declared index type, such as the qubit map.
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Tuple(Vec<Type>),
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
    /// User-declared struct. An empty field list means "any fields" and is
    /// used for references to a struct by name.
    Struct {
        name: String,
        fields: Vec<(String, Type)>,
    },
    /// Unresolvable or deliberately unspecified. Compatible with everything.
    Unknown,
}

impl Type {
    pub fn vec(elem: Type) -> Type {
        Type::Vec(Box::new(elem))
    }

    pub fn option(inner: Type) -> Type {
        Type::Option(Box::new(inner))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map { key: Box::new(key), value: Box::new(value) }
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function { params, ret: Box::new(ret) }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Name of a nominal domain type (`Gate`, `Arch`, ...), used to look up
    /// its member schema.
    pub fn domain_name(&self) -> Option<&'static str> {
        match self {
            Type::Location => Some("Location"),
            Type::Qubit => Some("Qubit"),
            Type::Gate => Some("Gate"),
            Type::Arch => Some("Arch"),
            Type::State => Some("State"),
            _ => None,
        }
    }

    /// The builtin type spelled `name`, if any.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "Int" => Some(Type::Int),
            "Float" => Some(Type::Float),
            "Bool" => Some(Type::Bool),
            "String" => Some(Type::String),
            "Location" => Some(Type::Location),
            "Qubit" => Some(Type::Qubit),
            "Gate" => Some(Type::Gate),
            "Arch" => Some(Type::Arch),
            "State" => Some(Type::State),
            _ => None,
        }
    }

    /// `(index type, element type)` for indexable containers.
    pub fn index_signature(&self) -> Option<(Type, Type)> {
        match self {
            Type::Vec(elem) => Some((Type::Int, (**elem).clone())),
            Type::Map { key, value } => Some(((**key).clone(), (**value).clone())),
            _ => None,
        }
    }
}

/// General compatibility between an expected and an actual type.
///
/// Reflexive and symmetric. `Unknown` matches anything, containers compare
/// element-wise, domain types and structs compare by name. Two structs of the
/// same name are compatible when either leaves its fields unspecified or the
/// field sets agree.
pub fn compatible(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (Type::Vec(x), Type::Vec(y)) | (Type::Option(x), Type::Option(y)) => compatible(x, y),
        (Type::Tuple(xs), Type::Tuple(ys)) => all_compatible(xs, ys),
        (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
            compatible(k1, k2) && compatible(v1, v2)
        }
        (
            Type::Function { params: p1, ret: r1 },
            Type::Function { params: p2, ret: r2 },
        ) => all_compatible(p1, p2) && compatible(r1, r2),
        (
            Type::Struct { name: n1, fields: f1 },
            Type::Struct { name: n2, fields: f2 },
        ) => n1 == n2 && (f1.is_empty() || f2.is_empty() || fields_compatible(f1, f2)),
        _ => a == b,
    }
}

fn all_compatible(xs: &[Type], ys: &[Type]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| compatible(x, y))
}

fn fields_compatible(f1: &[(String, Type)], f2: &[(String, Type)]) -> bool {
    let covers = |xs: &[(String, Type)], ys: &[(String, Type)]| {
        xs.iter().all(|(name, ty)| ys.iter().any(|(other, other_ty)| other == name && compatible(ty, other_ty)))
    };
    f1.len() == f2.len() && covers(f1, f2) && covers(f2, f1)
}

/// Whether `actual` may index a container whose declared index type is
/// `expected`. `Qubit` and `Int` are interchangeable here and only here.
pub fn index_compatible(expected: &Type, actual: &Type) -> bool {
    match (expected, actual) {
        (Type::Int, Type::Qubit) | (Type::Qubit, Type::Int) => true,
        _ => compatible(expected, actual),
    }
}

/// Merge two compatible types, keeping whichever side is more specific.
/// `Vec<Unknown>` joined with `Vec<Location>` is `Vec<Location>`.
pub fn join(a: &Type, b: &Type) -> Type {
    match (a, b) {
        (Type::Unknown, other) | (other, Type::Unknown) => other.clone(),
        (Type::Vec(x), Type::Vec(y)) => Type::vec(join(x, y)),
        (Type::Option(x), Type::Option(y)) => Type::option(join(x, y)),
        (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
            Type::map(join(k1, k2), join(v1, v2))
        }
        (Type::Tuple(xs), Type::Tuple(ys)) if xs.len() == ys.len() => {
            Type::Tuple(xs.iter().zip(ys).map(|(x, y)| join(x, y)).collect())
        }
        (Type::Struct { fields, .. }, other @ Type::Struct { .. }) if fields.is_empty() => other.clone(),
        _ => a.clone(),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Location => write!(f, "Location"),
            Type::Qubit => write!(f, "Qubit"),
            Type::Gate => write!(f, "Gate"),
            Type::Arch => write!(f, "Arch"),
            Type::State => write!(f, "State"),
            Type::Option(inner) => write!(f, "Option<{}>", inner),
            Type::Vec(elem) => write!(f, "Vec<{}>", elem),
            Type::Map { key, value } => write!(f, "Map<{}, {}>", key, value),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                write!(f, ")")
            }
            Type::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Struct { name, .. } => write!(f, "{}", name),
            Type::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(fields: Vec<(&str, Type)>) -> Type {
        Type::Struct {
            name: "Transition".to_string(),
            fields: fields.into_iter().map(|(n, t)| (n.to_string(), t)).collect(),
        }
    }

    #[test]
    fn unknown_is_universal() {
        for ty in [Type::Int, Type::vec(Type::Location), Type::Gate, transition(vec![])] {
            assert!(compatible(&Type::Unknown, &ty));
            assert!(compatible(&ty, &Type::Unknown));
        }
    }

    #[test]
    fn containers_compare_structurally() {
        assert!(compatible(&Type::vec(Type::Unknown), &Type::vec(Type::Location)));
        assert!(!compatible(&Type::vec(Type::Int), &Type::vec(Type::Location)));
        assert!(compatible(&Type::option(Type::Unknown), &Type::option(Type::Gate)));
        assert!(!compatible(
            &Type::Tuple(vec![Type::Int, Type::Int]),
            &Type::Tuple(vec![Type::Int])
        ));
    }

    #[test]
    fn structs_compare_by_name_and_fields() {
        let declared = transition(vec![("na", Type::Location)]);
        assert!(compatible(&declared, &transition(vec![])));
        assert!(compatible(&declared, &transition(vec![("na", Type::Location)])));
        assert!(!compatible(&declared, &transition(vec![("na", Type::Int)])));
        let other = Type::Struct { name: "GateRealization".to_string(), fields: vec![] };
        assert!(!compatible(&declared, &other));
    }

    #[test]
    fn domain_types_are_nominal() {
        assert!(!compatible(&Type::Arch, &Type::State));
        assert!(!compatible(&Type::Qubit, &Type::Int));
        assert!(!compatible(&Type::Int, &Type::Float));
    }

    #[test]
    fn qubit_int_only_for_indexing() {
        assert!(index_compatible(&Type::Int, &Type::Qubit));
        assert!(index_compatible(&Type::Qubit, &Type::Int));
        assert!(index_compatible(&Type::Int, &Type::Unknown));
        assert!(!index_compatible(&Type::Int, &Type::Location));
        assert!(!index_compatible(&Type::Int, &Type::Float));
    }

    #[test]
    fn join_prefers_specific() {
        assert_eq!(join(&Type::vec(Type::Unknown), &Type::vec(Type::Location)), Type::vec(Type::Location));
        assert_eq!(join(&Type::Unknown, &Type::Int), Type::Int);
        assert_eq!(join(&Type::Bool, &Type::Unknown), Type::Bool);
    }

    #[test]
    fn display() {
        assert_eq!(Type::vec(Type::vec(Type::Location)).to_string(), "Vec<Vec<Location>>");
        assert_eq!(
            Type::function(vec![Type::Int, Type::Qubit], Type::option(Type::Gate)).to_string(),
            "fn(Int, Qubit) -> Option<Gate>"
        );
        assert_eq!(Type::Tuple(vec![Type::Location, Type::Location]).to_string(), "(Location, Location)");
        assert_eq!(Type::map(Type::Qubit, Type::Location).to_string(), "Map<Qubit, Location>");
    }

    #[test]
    fn maps_index_by_their_key() {
        let map = Type::map(Type::Qubit, Type::Location);
        assert_eq!(map.index_signature(), Some((Type::Qubit, Type::Location)));
        assert_eq!(Type::vec(Type::Gate).index_signature(), Some((Type::Int, Type::Gate)));
        assert!(!compatible(&map, &Type::vec(Type::Location)));
        assert!(compatible(&map, &Type::map(Type::Unknown, Type::Location)));
    }
}
