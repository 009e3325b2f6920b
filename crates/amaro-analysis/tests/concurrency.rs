// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parallel analyses: node ids never collide and stale results never win.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use amaro_analysis::{analyze, DocumentStore};
use amaro_ast::block::{BlockItem, File, Item, TypeExpr, TypeExprKind};
use amaro_ast::expr::{Expr, ExprKind};
use amaro_ast::NodeId;

const SOURCE: &str = r#"
RouteInfo:
    routed_gates = CX, T
    GateRealization{path : Vec<(Location, Location)>}
    realize_gate =
        if Gate.gate_type() == CX
        then (let v = Vec() in v.push(Location(0)))
        else map(Gate.qubits(), |q| -> State.map[q])
TransitionInfo:
    Transition{na : Location}
    get_transitions = [Transition{na = Location(1)}]
    apply = identity_application(step)
    cost = (1.0, 2).0 + 1.0
{{ foreign }}
"#;

fn collect_file(file: &File, ids: &mut Vec<NodeId>) {
    ids.push(file.id);
    for item in &file.items {
        match item {
            Item::Foreign(foreign) => ids.push(foreign.id),
            Item::Block(block) => {
                ids.push(block.id);
                for item in &block.items {
                    match item {
                        BlockItem::Field(field) => {
                            ids.push(field.id);
                            collect_expr(&field.value, ids);
                        }
                        BlockItem::Struct(def) => {
                            ids.push(def.id);
                            for field in &def.fields {
                                ids.push(field.id);
                                collect_type(&field.ty, ids);
                            }
                        }
                        BlockItem::Foreign(foreign) => ids.push(foreign.id),
                    }
                }
            }
        }
    }
}

fn collect_type(ty: &TypeExpr, ids: &mut Vec<NodeId>) {
    ids.push(ty.id);
    match &ty.kind {
        TypeExprKind::Named { args, .. } => args.iter().for_each(|a| collect_type(a, ids)),
        TypeExprKind::Tuple(elems) => elems.iter().for_each(|e| collect_type(e, ids)),
        TypeExprKind::Error => {}
    }
}

fn collect_expr(expr: &Expr, ids: &mut Vec<NodeId>) {
    ids.push(expr.id);
    match &expr.kind {
        ExprKind::Binary { left, right, .. } => {
            collect_expr(left, ids);
            collect_expr(right, ids);
        }
        ExprKind::Unary { operand, .. } => collect_expr(operand, ids),
        ExprKind::Call { func, args } => {
            collect_expr(func, ids);
            args.iter().for_each(|a| collect_expr(a, ids));
        }
        ExprKind::Lambda { params, body } => {
            ids.extend(params.iter().map(|p| p.id));
            collect_expr(body, ids);
        }
        ExprKind::Let { bindings, body } => {
            for binding in bindings {
                ids.push(binding.id);
                collect_expr(&binding.value, ids);
            }
            collect_expr(body, ids);
        }
        ExprKind::If { cond, then_branch, else_branch } => {
            collect_expr(cond, ids);
            collect_expr(then_branch, ids);
            collect_expr(else_branch, ids);
        }
        ExprKind::Field { object, .. } | ExprKind::TupleIndex { object, .. } => collect_expr(object, ids),
        ExprKind::Index { object, index } => {
            collect_expr(object, ids);
            collect_expr(index, ids);
        }
        ExprKind::Projection { object, path } => {
            collect_expr(object, ids);
            collect_expr(path, ids);
        }
        ExprKind::Range { start, end } => {
            collect_expr(start, ids);
            collect_expr(end, ids);
        }
        ExprKind::Vec(items) | ExprKind::Tuple(items) => items.iter().for_each(|i| collect_expr(i, ids)),
        ExprKind::Some(inner) => collect_expr(inner, ids),
        ExprKind::StructLit { fields, .. } => fields.iter().for_each(|f| collect_expr(&f.value, ids)),
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::String(_)
        | ExprKind::Bool(_)
        | ExprKind::Ident(_)
        | ExprKind::None
        | ExprKind::Error => {}
    }
}

#[test]
fn node_ids_unique_across_concurrent_parses() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 25;

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ids = Vec::new();
                for _ in 0..ROUNDS {
                    let analysis = analyze(SOURCE);
                    collect_file(&analysis.file, &mut ids);
                }
                ids
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut total = 0;
    for handle in handles {
        for id in handle.join().unwrap() {
            total += 1;
            assert!(seen.insert(id), "node id {:?} allocated twice", id);
        }
    }
    assert!(total > THREADS * ROUNDS * 30, "walked only {} nodes", total);
}

#[test]
fn concurrent_passes_agree() {
    let expected = analyze(SOURCE).diagnostics;
    assert!(expected.is_empty(), "{:?}", expected);

    let handles: Vec<_> = (0..4).map(|_| thread::spawn(|| analyze(SOURCE).diagnostics)).collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn highest_version_survives_out_of_order_commits() {
    const VERSIONS: i32 = 32;
    let store = Arc::new(DocumentStore::new());
    let barrier = Arc::new(Barrier::new(VERSIONS as usize));

    // Later versions start first so that most commits arrive out of order.
    let handles: Vec<_> = (1..=VERSIONS)
        .rev()
        .map(|version| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let text = format!("StateInfo:\n    cost = {}\n", version);
                let analysis = analyze(&text);
                barrier.wait();
                store.commit("file:///race.amaro", version, text, analysis);
                // Whatever happened, nothing older than us is visible now.
                let visible = store.version("file:///race.amaro").unwrap();
                assert!(visible >= version, "version {} visible after committing {}", visible, version);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let doc = store.get("file:///race.amaro").unwrap();
    assert_eq!(doc.version, VERSIONS);
    assert_eq!(doc.text, format!("StateInfo:\n    cost = {}\n", VERSIONS));
}
