// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Bottom-up type inference for expressions.

use amaro_ast::expr::{BinOp, Expr, ExprKind, FieldInit, LambdaParam, LetBinding, UnaryOp};
use amaro_ast::Span;

use super::{Checker, SemanticError};
use crate::builtins::{Bindings, Signature};
use crate::scope::ScopeKind;
use crate::types::{compatible, index_compatible, join, Type};

/// What a name or member resolves to.
enum Target {
    /// A value of known type (local binding, context value, struct field).
    Value(Type),
    /// A builtin function or method, with any receiver-bound type variables.
    Builtin { name: String, sig: &'static Signature, bindings: Bindings },
}

impl<'a> Checker<'a> {
    /// Infer the type of `expr`, recording it for the node.
    pub(crate) fn infer(&mut self, expr: &Expr) -> Type {
        let ty = self.infer_kind(expr);
        self.node_types.insert(expr.id, ty.clone());
        ty
    }

    fn infer_kind(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::Int(_) => Type::Int,
            ExprKind::Float(_) => Type::Float,
            ExprKind::String(_) => Type::String,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Ident(name) => match self.resolve_name(name) {
                Some(target) => target_value(target),
                None => {
                    self.report(SemanticError::UnknownIdentifier { name: name.clone(), span: expr.span });
                    Type::Unknown
                }
            },
            ExprKind::Binary { op, left, right } => self.infer_binary(*op, left, right, expr.span),
            ExprKind::Unary { op, operand } => self.infer_unary(*op, operand, expr.span),
            ExprKind::Call { func, args } => self.infer_call(func, args, expr.span),
            ExprKind::Lambda { params, body } => self.infer_lambda(params, body, &[]),
            ExprKind::Let { bindings, body } => self.infer_let(bindings, body),
            ExprKind::If { cond, then_branch, else_branch } => {
                let cond_ty = self.infer(cond);
                if !compatible(&Type::Bool, &cond_ty) {
                    self.report(SemanticError::Mismatch {
                        expected: Type::Bool,
                        found: cond_ty,
                        span: cond.span,
                    });
                }
                let then_ty = self.infer(then_branch);
                let else_ty = self.infer(else_branch);
                if compatible(&then_ty, &else_ty) {
                    join(&then_ty, &else_ty)
                } else {
                    self.report(SemanticError::BranchMismatch { then_ty, else_ty, span: expr.span });
                    Type::Unknown
                }
            }
            ExprKind::Field { object, field, field_span } => {
                let base = self.infer(object);
                match self.resolve_member(&base, field) {
                    Some(target) => target_value(target),
                    None => {
                        self.report(SemanticError::UnknownMember {
                            ty: base,
                            member: field.clone(),
                            span: *field_span,
                        });
                        Type::Unknown
                    }
                }
            }
            ExprKind::Index { object, index } => {
                let base = self.infer(object);
                let actual = self.infer(index);
                if base.is_unknown() {
                    return Type::Unknown;
                }
                match base.index_signature() {
                    Some((expected, elem)) => {
                        if !index_compatible(&expected, &actual) {
                            self.report(SemanticError::IndexTypeMismatch {
                                expected,
                                found: actual,
                                span: index.span,
                            });
                        }
                        elem
                    }
                    None => {
                        self.report(SemanticError::NotIndexable { ty: base, span: object.span });
                        Type::Unknown
                    }
                }
            }
            ExprKind::TupleIndex { object, index } => match self.infer(object) {
                Type::Tuple(elems) if (*index as usize) < elems.len() => elems[*index as usize].clone(),
                Type::Tuple(elems) => {
                    self.report(SemanticError::TupleIndexOutOfRange {
                        ty: Type::Tuple(elems),
                        index: *index,
                        span: expr.span,
                    });
                    Type::Unknown
                }
                Type::Unknown => Type::Unknown,
                other => {
                    self.report(SemanticError::NotIndexable { ty: other, span: expr.span });
                    Type::Unknown
                }
            },
            ExprKind::Projection { object, path } => self.infer_projection(object, path),
            ExprKind::Range { start, end } => {
                for bound in [start, end] {
                    let ty = self.infer(bound);
                    if !index_compatible(&Type::Int, &ty) {
                        self.report(SemanticError::Mismatch {
                            expected: Type::Int,
                            found: ty,
                            span: bound.span,
                        });
                    }
                }
                Type::vec(Type::Int)
            }
            ExprKind::Vec(items) => {
                let mut elem = Type::Unknown;
                for item in items {
                    let ty = self.infer(item);
                    if compatible(&elem, &ty) {
                        elem = join(&elem, &ty);
                    } else {
                        self.report(SemanticError::Mismatch {
                            expected: elem.clone(),
                            found: ty,
                            span: item.span,
                        });
                    }
                }
                Type::vec(elem)
            }
            ExprKind::Tuple(items) => Type::Tuple(items.iter().map(|item| self.infer(item)).collect()),
            ExprKind::Some(inner) => Type::option(self.infer(inner)),
            ExprKind::None => Type::option(Type::Unknown),
            ExprKind::StructLit { name, fields, .. } => self.infer_struct_lit(name, fields),
            ExprKind::Error => Type::Unknown,
        }
    }

    fn resolve_name(&self, name: &str) -> Option<Target> {
        if let Some(ty) = self.symbols.lookup_local(name) {
            return Some(Target::Value(ty.clone()));
        }
        if let Some(fields) = self.structs.get(name) {
            return Some(Target::Value(Type::Struct { name: name.to_string(), fields: fields.clone() }));
        }
        let globals = self.symbols.globals();
        if let Some(ty) = globals.value(name) {
            return Some(Target::Value(ty.clone()));
        }
        globals.function(name).map(|sig| Target::Builtin {
            name: name.to_string(),
            sig,
            bindings: Bindings::new(),
        })
    }

    fn resolve_member(&self, base: &Type, member: &str) -> Option<Target> {
        let globals = self.symbols.globals();
        match base {
            Type::Unknown => Some(Target::Value(Type::Unknown)),
            Type::Vec(elem) => {
                let sig = globals.method("Vec", member)?;
                let mut bindings = Bindings::new();
                if !elem.is_unknown() {
                    bindings.insert('T', (**elem).clone());
                }
                Some(Target::Builtin { name: member.to_string(), sig, bindings })
            }
            Type::Struct { name, fields } => {
                let declared = self.structs.get(name);
                match member_type(fields, member).or_else(|| declared.and_then(|d| member_type(d, member))) {
                    Some(ty) => Some(Target::Value(ty)),
                    // A struct nobody declared has no schema to check against.
                    None if fields.is_empty() && declared.is_none() => Some(Target::Value(Type::Unknown)),
                    None => None,
                }
            }
            other => {
                let domain = other.domain_name()?;
                if let Some(sig) = globals.method(domain, member) {
                    return Some(Target::Builtin {
                        name: member.to_string(),
                        sig,
                        bindings: Bindings::new(),
                    });
                }
                self.domain_fields.get(domain).and_then(|fields| member_type(fields, member)).map(Target::Value)
            }
        }
    }

    fn infer_binary(&mut self, op: BinOp, left: &Expr, right: &Expr, span: Span) -> Type {
        let l = self.infer(left);
        let r = self.infer(right);
        let numeric = |t: &Type| t.is_numeric() || t.is_unknown();

        let invalid = |l: Type, r: Type| SemanticError::InvalidOperands {
            op: op.symbol().to_string(),
            left: l,
            right: r,
            span,
        };

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if !(numeric(&l) && numeric(&r)) {
                    self.report(invalid(l, r));
                    return Type::Unknown;
                }
                match (&l, &r) {
                    (Type::Float, _) | (_, Type::Float) => Type::Float,
                    _ => join(&l, &r),
                }
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                if !(numeric(&l) && numeric(&r)) {
                    self.report(invalid(l, r));
                }
                Type::Bool
            }
            BinOp::Eq | BinOp::Ne => {
                let comparable = compatible(&l, &r)
                    || (l.is_numeric() && r.is_numeric())
                    || index_compatible(&l, &r);
                if !comparable {
                    self.report(invalid(l, r));
                }
                Type::Bool
            }
            BinOp::And | BinOp::Or => {
                if !(compatible(&Type::Bool, &l) && compatible(&Type::Bool, &r)) {
                    self.report(invalid(l, r));
                }
                Type::Bool
            }
        }
    }

    fn infer_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Type {
        let ty = self.infer(operand);
        let ok = match op {
            UnaryOp::Neg => ty.is_numeric() || ty.is_unknown(),
            UnaryOp::Not => compatible(&Type::Bool, &ty),
        };
        if !ok {
            self.report(SemanticError::InvalidOperand { op: op.to_string(), operand: ty, span });
            return Type::Unknown;
        }
        match op {
            UnaryOp::Neg => ty,
            UnaryOp::Not => Type::Bool,
        }
    }

    fn infer_call(&mut self, func: &Expr, args: &[Expr], span: Span) -> Type {
        let (target, name) = match &func.kind {
            ExprKind::Ident(name) => match self.resolve_name(name) {
                Some(target) => (target, name.clone()),
                None => {
                    self.report(SemanticError::UnknownIdentifier { name: name.clone(), span });
                    self.infer_args(args);
                    return Type::Unknown;
                }
            },
            ExprKind::Field { object, field, field_span } => {
                let base = self.infer(object);
                match self.resolve_member(&base, field) {
                    Some(target) => (target, field.clone()),
                    None => {
                        self.report(SemanticError::UnknownMember {
                            ty: base,
                            member: field.clone(),
                            span: *field_span,
                        });
                        self.infer_args(args);
                        return Type::Unknown;
                    }
                }
            }
            _ => (Target::Value(self.infer(func)), func.summarize(32)),
        };

        let callee_ty = match &target {
            Target::Value(ty) => ty.clone(),
            Target::Builtin { sig, bindings, .. } => sig.instantiate(bindings),
        };
        self.node_types.entry(func.id).or_insert(callee_ty);

        match target {
            Target::Value(Type::Function { params, ret }) => {
                if params.len() != args.len() {
                    self.report(SemanticError::ArityMismatch {
                        name,
                        expected: params.len(),
                        found: args.len(),
                        span,
                    });
                    self.infer_args(args);
                    return *ret;
                }
                for (param, arg) in params.iter().zip(args) {
                    let hints = lambda_hints(param);
                    let ty = self.infer_with_hints(arg, &hints);
                    if !compatible(param, &ty) {
                        self.report(SemanticError::Mismatch {
                            expected: param.clone(),
                            found: ty,
                            span: arg.span,
                        });
                    }
                }
                *ret
            }
            Target::Value(Type::Unknown) => {
                self.infer_args(args);
                Type::Unknown
            }
            // Zero-argument call of a plain value is the value itself.
            Target::Value(ty) if args.is_empty() => ty,
            Target::Value(ty) => {
                self.infer_args(args);
                self.report(SemanticError::NotCallable { ty, span });
                Type::Unknown
            }
            Target::Builtin { name, sig, bindings } => self.check_builtin_call(&name, sig, bindings, args, span),
        }
    }

    /// Check a call against a builtin signature. Non-lambda arguments are
    /// inferred first so that lambdas see their parameter types.
    fn check_builtin_call(
        &mut self,
        name: &str,
        sig: &Signature,
        mut bindings: Bindings,
        args: &[Expr],
        span: Span,
    ) -> Type {
        if sig.params.len() != args.len() {
            self.report(SemanticError::ArityMismatch {
                name: name.to_string(),
                expected: sig.params.len(),
                found: args.len(),
                span,
            });
            self.infer_args(args);
            return sig.ret.instantiate(&bindings);
        }

        let mut arg_types: Vec<Option<Type>> = vec![None; args.len()];
        for (i, (param, arg)) in sig.params.iter().zip(args).enumerate() {
            if matches!(arg.kind, ExprKind::Lambda { .. }) {
                continue;
            }
            let ty = self.infer(arg);
            param.bind(&ty, &mut bindings);
            arg_types[i] = Some(ty);
        }
        for (i, (param, arg)) in sig.params.iter().zip(args).enumerate() {
            if arg_types[i].is_some() {
                continue;
            }
            let hints = lambda_hints(&param.instantiate(&bindings));
            let ty = self.infer_with_hints(arg, &hints);
            param.bind(&ty, &mut bindings);
            arg_types[i] = Some(ty);
        }

        for ((param, arg), ty) in sig.params.iter().zip(args).zip(arg_types) {
            let Some(ty) = ty else { continue };
            let expected = param.instantiate(&bindings);
            if !compatible(&expected, &ty) {
                self.report(SemanticError::Mismatch { expected, found: ty, span: arg.span });
            }
        }

        sig.ret.instantiate(&bindings)
    }

    fn infer_args(&mut self, args: &[Expr]) {
        for arg in args {
            self.infer(arg);
        }
    }

    /// Like [`infer`](Self::infer), but a lambda takes its parameter types
    /// from `hints`.
    fn infer_with_hints(&mut self, expr: &Expr, hints: &[Type]) -> Type {
        match &expr.kind {
            ExprKind::Lambda { params, body } => {
                let ty = self.infer_lambda(params, body, hints);
                self.node_types.insert(expr.id, ty.clone());
                ty
            }
            _ => self.infer(expr),
        }
    }

    fn infer_lambda(&mut self, params: &[LambdaParam], body: &Expr, hints: &[Type]) -> Type {
        self.symbols.push(ScopeKind::Lambda);
        let mut param_types = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let ty = hints.get(i).cloned().unwrap_or(Type::Unknown);
            self.node_types.insert(param.id, ty.clone());
            self.symbols.bind(param.name.as_str(), ty.clone());
            param_types.push(ty);
        }
        let ret = self.infer(body);
        self.symbols.pop();
        Type::function(param_types, ret)
    }

    /// Each binding opens a scope visible to later bindings and the body.
    fn infer_let(&mut self, bindings: &[LetBinding], body: &Expr) -> Type {
        for binding in bindings {
            let ty = self.infer(&binding.value);
            self.node_types.insert(binding.id, ty.clone());
            self.symbols.push(ScopeKind::Let);
            self.symbols.bind(binding.name.as_str(), ty);
        }
        let ty = self.infer(body);
        for _ in bindings {
            self.symbols.pop();
        }
        ty
    }

    fn infer_projection(&mut self, object: &Expr, path: &Expr) -> Type {
        let base = self.infer(object);
        if base.is_unknown() {
            return Type::Unknown;
        }

        let member = match &path.kind {
            ExprKind::Ident(name) => Some(name),
            ExprKind::Call { func, args } if args.is_empty() => match &func.kind {
                ExprKind::Ident(name) => Some(name),
                _ => None,
            },
            _ => None,
        };

        match member.and_then(|name| self.resolve_member(&base, name)) {
            Some(target) => {
                let ty = target_value(target);
                self.node_types.insert(path.id, ty.clone());
                ty
            }
            None => {
                self.report(SemanticError::UnresolvedProjection { ty: base, span: path.span });
                Type::Unknown
            }
        }
    }

    fn infer_struct_lit(&mut self, name: &str, fields: &[FieldInit]) -> Type {
        let mut inits = Vec::with_capacity(fields.len());
        for init in fields {
            inits.push((init.name.clone(), self.infer(&init.value)));
        }

        if let Some(declared) = self.structs.get(name).cloned() {
            for (init, (_, ty)) in fields.iter().zip(&inits) {
                match declared.iter().find(|(field, _)| *field == init.name) {
                    Some((_, expected)) if !compatible(expected, ty) => {
                        self.report(SemanticError::Mismatch {
                            expected: expected.clone(),
                            found: ty.clone(),
                            span: init.value.span,
                        });
                    }
                    Some(_) => {}
                    None => {
                        self.report(SemanticError::UnknownMember {
                            ty: Type::Struct { name: name.to_string(), fields: declared.clone() },
                            member: init.name.clone(),
                            span: init.name_span,
                        });
                    }
                }
            }
            return Type::Struct { name: name.to_string(), fields: declared };
        }

        match Type::from_name(name) {
            Some(domain) if domain.domain_name().is_some() => domain,
            _ => Type::Struct { name: name.to_string(), fields: inits },
        }
    }
}

/// Type of a name used as a value. Zero-parameter builtins read as their
/// return value, so `State.map` and `State.map()` agree.
fn target_value(target: Target) -> Type {
    match target {
        Target::Value(ty) => ty,
        Target::Builtin { sig, bindings, .. } if sig.params.is_empty() => sig.ret.instantiate(&bindings),
        Target::Builtin { sig, bindings, .. } => sig.instantiate(&bindings),
    }
}

fn member_type(fields: &[(String, Type)], member: &str) -> Option<Type> {
    fields.iter().find(|(name, _)| name == member).map(|(_, ty)| ty.clone())
}

fn lambda_hints(expected: &Type) -> Vec<Type> {
    match expected {
        Type::Function { params, .. } => params.clone(),
        _ => Vec::new(),
    }
}
