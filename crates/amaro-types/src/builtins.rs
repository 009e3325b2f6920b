// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builtin registry: free functions, receiver methods, and the context
//! values every routing description can refer to.
//!
//! Built once per process and read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::types::{compatible, join, Type};

/// A type in a builtin signature. May mention type variables (`T`, `U`)
/// that are bound per call.
#[derive(Debug, Clone)]
pub enum Scheme {
    Ty(Type),
    Var(char),
    Vec(Box<Scheme>),
    Option(Box<Scheme>),
    Tuple(Vec<Scheme>),
    Fn(Vec<Scheme>, Box<Scheme>),
}

/// Type-variable bindings accumulated while checking one call.
pub type Bindings = HashMap<char, Type>;

impl Scheme {
    /// Replace bound variables. Unbound variables become `Unknown`.
    pub fn instantiate(&self, bindings: &Bindings) -> Type {
        match self {
            Scheme::Ty(ty) => ty.clone(),
            Scheme::Var(v) => bindings.get(v).cloned().unwrap_or(Type::Unknown),
            Scheme::Vec(elem) => Type::vec(elem.instantiate(bindings)),
            Scheme::Option(inner) => Type::option(inner.instantiate(bindings)),
            Scheme::Tuple(elems) => Type::Tuple(elems.iter().map(|e| e.instantiate(bindings)).collect()),
            Scheme::Fn(params, ret) => Type::function(
                params.iter().map(|p| p.instantiate(bindings)).collect(),
                ret.instantiate(bindings),
            ),
        }
    }

    /// Match `actual` against this scheme, recording variable bindings.
    /// A variable already bound is refined with [`join`] when compatible.
    pub fn bind(&self, actual: &Type, bindings: &mut Bindings) {
        match (self, actual) {
            (Scheme::Var(v), _) => {
                if actual.is_unknown() {
                    return;
                }
                let merged = match bindings.get(v) {
                    Some(bound) if compatible(bound, actual) => join(bound, actual),
                    Some(_) => return,
                    None => actual.clone(),
                };
                bindings.insert(*v, merged);
            }
            (Scheme::Vec(s), Type::Vec(t)) | (Scheme::Option(s), Type::Option(t)) => s.bind(t, bindings),
            (Scheme::Tuple(ss), Type::Tuple(ts)) if ss.len() == ts.len() => {
                for (s, t) in ss.iter().zip(ts) {
                    s.bind(t, bindings);
                }
            }
            (Scheme::Fn(ps, r), Type::Function { params, ret }) if ps.len() == params.len() => {
                for (s, t) in ps.iter().zip(params) {
                    s.bind(t, bindings);
                }
                r.bind(ret, bindings);
            }
            _ => {}
        }
    }
}

/// Signature of a builtin function or method.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Scheme>,
    pub ret: Scheme,
}

impl Signature {
    fn new(params: Vec<Scheme>, ret: Scheme) -> Self {
        Self { params, ret }
    }

    /// The signature as a plain function type, with unbound variables
    /// left `Unknown`.
    pub fn instantiate(&self, bindings: &Bindings) -> Type {
        Type::function(
            self.params.iter().map(|p| p.instantiate(bindings)).collect(),
            self.ret.instantiate(bindings),
        )
    }
}

/// The process-wide builtin registry.
pub struct BuiltinRegistry {
    functions: HashMap<&'static str, Signature>,
    /// Methods keyed by receiver kind (`Vec`, `Gate`, `State`, `Arch`).
    methods: HashMap<&'static str, HashMap<&'static str, Signature>>,
    values: HashMap<&'static str, Type>,
}

static REGISTRY: OnceLock<BuiltinRegistry> = OnceLock::new();

/// Gates a routing description may name directly.
pub const GATE_NAMES: &[&str] = &[
    "CX", "T", "Pauli", "PauliMeasurement", "H", "CZ", "X", "Y", "Z", "S", "Sdg", "Tdg", "RX", "RY",
    "RZ",
];

fn ty(t: Type) -> Scheme {
    Scheme::Ty(t)
}

fn vec_of(s: Scheme) -> Scheme {
    Scheme::Vec(Box::new(s))
}

fn locations() -> Scheme {
    vec_of(ty(Type::Location))
}

fn qubits() -> Scheme {
    vec_of(ty(Type::Qubit))
}

impl BuiltinRegistry {
    /// Get the global registry (lazily initialized).
    pub fn load() -> &'static BuiltinRegistry {
        REGISTRY.get_or_init(BuiltinRegistry::build)
    }

    fn build() -> BuiltinRegistry {
        let t = || Scheme::Var('T');
        let u = || Scheme::Var('U');

        let mut functions = HashMap::new();
        functions.insert(
            "map",
            Signature::new(vec![vec_of(t()), Scheme::Fn(vec![t()], Box::new(u()))], vec_of(u())),
        );
        functions.insert(
            "fold",
            Signature::new(vec![vec_of(t()), u(), Scheme::Fn(vec![t(), u()], Box::new(u()))], u()),
        );
        functions.insert(
            "all_paths",
            Signature::new(
                vec![ty(Type::Arch), locations(), locations(), locations()],
                vec_of(locations()),
            ),
        );
        functions.insert(
            "shortest_path",
            Signature::new(
                vec![ty(Type::Arch), locations(), locations(), locations()],
                Scheme::Option(Box::new(locations())),
            ),
        );
        functions.insert(
            "vertical_neighbors",
            Signature::new(vec![ty(Type::Location), ty(Type::Int), ty(Type::Int)], locations()),
        );
        functions.insert(
            "horizontal_neighbors",
            Signature::new(vec![ty(Type::Location), ty(Type::Int)], locations()),
        );
        functions.insert(
            "value_swap",
            Signature::new(vec![ty(Type::Location), ty(Type::Location)], ty(Type::State)),
        );
        functions.insert("identity_application", Signature::new(vec![ty(Type::Int)], ty(Type::State)));
        functions.insert("values", Signature::new(vec![ty(Type::State)], locations()));
        functions.insert("path", Signature::new(vec![], locations()));
        functions.insert("tree", Signature::new(vec![], locations()));
        functions.insert(
            "steiner_trees",
            Signature::new(vec![ty(Type::Arch), vec_of(locations()), locations()], locations()),
        );
        // Constructors
        functions.insert("Qubit", Signature::new(vec![ty(Type::Int)], ty(Type::Qubit)));
        functions.insert("Location", Signature::new(vec![ty(Type::Int)], ty(Type::Location)));
        functions.insert("Vec", Signature::new(vec![], vec_of(t())));

        let mut vec_methods = HashMap::new();
        vec_methods.insert("push", Signature::new(vec![t()], vec_of(t())));
        vec_methods.insert("extend", Signature::new(vec![vec_of(t())], vec_of(t())));
        vec_methods.insert("pop", Signature::new(vec![], vec_of(t())));
        vec_methods.insert("len", Signature::new(vec![], ty(Type::Int)));

        let mut gate_methods = HashMap::new();
        gate_methods.insert("qubits", Signature::new(vec![], qubits()));
        gate_methods.insert("gate_type", Signature::new(vec![], ty(Type::Gate)));
        gate_methods.insert("x_indices", Signature::new(vec![], qubits()));
        gate_methods.insert("y_indices", Signature::new(vec![], qubits()));
        gate_methods.insert("z_indices", Signature::new(vec![], qubits()));

        let mut state_methods = HashMap::new();
        state_methods.insert("map", Signature::new(vec![], ty(Type::map(Type::Qubit, Type::Location))));
        state_methods.insert("values", Signature::new(vec![], locations()));

        let mut arch_methods = HashMap::new();
        arch_methods.insert("width", Signature::new(vec![], ty(Type::Int)));
        arch_methods.insert("height", Signature::new(vec![], ty(Type::Int)));
        arch_methods.insert("locations", Signature::new(vec![], locations()));
        arch_methods.insert(
            "contains_edge",
            Signature::new(
                vec![Scheme::Tuple(vec![ty(Type::Location), ty(Type::Location)])],
                ty(Type::Bool),
            ),
        );

        let mut methods = HashMap::new();
        methods.insert("Vec", vec_methods);
        methods.insert("Gate", gate_methods);
        methods.insert("State", state_methods);
        methods.insert("Arch", arch_methods);

        let mut values = HashMap::new();
        values.insert("Arch", Type::Arch);
        values.insert("arch", Type::Arch);
        values.insert("State", Type::State);
        values.insert("Gate", Type::Gate);
        values.insert("step", Type::Int);
        for name in ["Transition", "GateRealization"] {
            values.insert(name, Type::Struct { name: name.to_string(), fields: Vec::new() });
        }
        for gate in GATE_NAMES {
            values.insert(*gate, Type::Gate);
        }

        BuiltinRegistry { functions, methods, values }
    }

    pub fn function(&self, name: &str) -> Option<&Signature> {
        self.functions.get(name)
    }

    /// Look up a method by receiver kind and name.
    pub fn method(&self, receiver: &str, name: &str) -> Option<&Signature> {
        self.methods.get(receiver).and_then(|m| m.get(name))
    }

    /// Type of a context value (`Gate`, `step`, `CX`, ...).
    pub fn value(&self, name: &str) -> Option<&Type> {
        self.values.get(name)
    }

    /// Every globally visible name: functions and context values.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().chain(self.values.keys()).copied()
    }
}
