// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for routing descriptions.
//!
//! Transforms a token stream into a [`File`](amaro_ast::block::File) of blocks.
//! Parsing never aborts: syntax errors are collected and the parser resumes
//! at the next field or block header.

mod hints;
mod parser;

pub use parser::{ParseError, ParseErrorKind, ParseResult, Parser, MAX_DEPTH};

/// Lex and parse `source` in one step.
pub fn parse(source: &str) -> ParseResult {
    let lexed = amaro_lexer::Lexer::new(source).tokenize();
    Parser::new(lexed.tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use amaro_ast::block::{Block, BlockItem, BlockStyle, Item, TypeExprKind};
    use amaro_ast::expr::{BinOp, Expr, ExprKind, UnaryOp};

    fn parse_ok(src: &str) -> ParseResult {
        let result = parse(src);
        assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
        result
    }

    fn blocks(result: &ParseResult) -> Vec<&Block> {
        result.file.blocks().collect()
    }

    fn field_value<'a>(result: &'a ParseResult, block: &str, field: &str) -> &'a Expr {
        let block = result
            .file
            .blocks()
            .find(|b| b.name == block)
            .unwrap_or_else(|| panic!("no block {}", block));
        &block.field(field).unwrap_or_else(|| panic!("no field {}", field)).value
    }

    /// Parse a single expression as the value of `x` in a throwaway block.
    fn expr(src: &str) -> Expr {
        let result = parse_ok(&format!("B:\n    x = {}\n", src));
        field_value(&result, "B", "x").clone()
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    #[test]
    fn parse_colon_blocks() {
        let result = parse_ok("RouteInfo:\n    routed_gates = CX\nStateInfo:\n    cost = 1.0\n");
        let blocks = blocks(&result);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "RouteInfo");
        assert_eq!(blocks[0].style, BlockStyle::Colon);
        assert_eq!(blocks[0].fields().count(), 1);
        assert_eq!(blocks[1].name, "StateInfo");
    }

    #[test]
    fn parse_bracket_block_single_line() {
        let result = parse_ok("GateRealization[name='test', value=42]");
        let blocks = blocks(&result);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].style, BlockStyle::Bracket);
        let names: Vec<_> = blocks[0].fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "value"]);
        assert!(matches!(blocks[0].field("name").map(|f| &f.value.kind), Some(ExprKind::String(s)) if s == "test"));
    }

    #[test]
    fn parse_mixed_block_styles() {
        let src = "\
GateRealization[name='a']
RouteInfo:
    routed_gates = CX
TransitionInfo[cost = 1.0; apply = f(x)]
";
        let result = parse_ok(src);
        let names: Vec<_> = blocks(&result).iter().map(|b| b.name.clone()).collect();
        assert_eq!(names, vec!["GateRealization", "RouteInfo", "TransitionInfo"]);
    }

    #[test]
    fn garbage_line_between_blocks_recovers() {
        let src = "\
RouteInfo:
    routed_gates = CX
this is invalid
GateRealization[name='test']
";
        let result = parse(src);
        assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
        assert_eq!(result.errors[0].kind, ParseErrorKind::Syntax);
        let names: Vec<_> = blocks(&result).iter().map(|b| b.name.clone()).collect();
        assert_eq!(names, vec!["RouteInfo", "GateRealization"]);
    }

    #[test]
    fn garbage_before_first_block() {
        let result = parse("42 + \nRouteInfo:\n    routed_gates = CX\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("block header"));
        assert_eq!(blocks(&result).len(), 1);
    }

    #[test]
    fn broken_field_keeps_following_fields() {
        let src = "\
RouteInfo:
    routed_gates = CX
    realize_gate = (a +
    step_cost = 2
";
        let result = parse(src);
        assert!(!result.errors.is_empty());
        let block = blocks(&result)[0];
        let names: Vec<_> = block.fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["routed_gates", "realize_gate", "step_cost"]);
        assert!(block.field("realize_gate").map(|f| f.value.is_error()).unwrap_or(false));
    }

    #[test]
    fn missing_value_does_not_swallow_next_field() {
        let result = parse("B:\n    x =\n    y = 1\n");
        assert_eq!(result.errors.len(), 1);
        let block = blocks(&result)[0];
        assert!(block.field("x").map(|f| f.value.is_error()).unwrap_or(false));
        assert!(matches!(block.field("y").map(|f| &f.value.kind), Some(ExprKind::Int(1))));
    }

    #[test]
    fn trailing_junk_after_value() {
        let result = parse("B:\n    x = a b\n    y = 2\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("after field value"));
        assert_eq!(blocks(&result)[0].fields().count(), 2);
    }

    #[test]
    fn unclosed_bracket_block() {
        let result = parse("GateRealization[name = 'a'\nRouteInfo:\n    routed_gates = CX\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("missing ']'"));
        assert_eq!(blocks(&result).len(), 2);
    }

    #[test]
    fn invalid_characters_are_reported_once() {
        let result = parse("B:\n    x = 1 @@@ 2\n    y = 3\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::InvalidToken);
        assert!(result.errors[0].message.contains("@@@"));
        assert_eq!(blocks(&result)[0].fields().count(), 2);
    }

    #[test]
    fn empty_and_whitespace_input() {
        for src in ["", "   \n\n\t\n", "// only a comment\n"] {
            let result = parse_ok(src);
            assert!(result.file.items.is_empty());
        }
    }

    #[test]
    fn crlf_line_endings() {
        let result = parse_ok("RouteInfo:\r\n    routed_gates = CX\r\n    step_cost = 1\r\n");
        assert_eq!(blocks(&result)[0].fields().count(), 2);
    }

    // =========================================================================
    // Foreign blocks
    // =========================================================================

    #[test]
    fn foreign_block_positions() {
        let cases = [
            "{{ fn helper() { } }}\nRouteInfo:\n    routed_gates = CX\n",
            "RouteInfo:\n    routed_gates = CX\n{{ let a: i32 = 1; }}\nStateInfo:\n    cost = 1.0\n",
            "RouteInfo:\n    routed_gates = CX\n{{ trailing }}",
        ];
        for src in cases {
            let result = parse_ok(src);
            let foreign_count = result
                .file
                .items
                .iter()
                .map(|item| match item {
                    Item::Foreign(_) => 1,
                    Item::Block(b) => b.items.iter().filter(|i| matches!(i, BlockItem::Foreign(_))).count(),
                })
                .sum::<usize>();
            assert_eq!(foreign_count, 1, "source: {}", src);
        }
    }

    #[test]
    fn foreign_block_at_start_is_top_level() {
        let src = "{{ x }}\nRouteInfo:\n    routed_gates = CX\n";
        let result = parse_ok(src);
        match &result.file.items[0] {
            Item::Foreign(f) => assert_eq!(f.text(src), "{{ x }}"),
            other => panic!("expected foreign block, got {:?}", other),
        }
    }

    // =========================================================================
    // Struct definitions and types
    // =========================================================================

    #[test]
    fn parse_struct_definitions() {
        let src = "\
RouteInfo:
    GateRealization{path : Vec<Location>, cost : Float}
    Pair{ends : (Location, Location)}
    Grid{rows : Vec<Vec<Float>>}
    Open{items : Vec()}
";
        let result = parse_ok(src);
        let block = blocks(&result)[0];
        let defs: Vec<_> = block.structs().collect();
        assert_eq!(defs.len(), 4);
        assert_eq!(defs[0].name, "GateRealization");
        assert_eq!(defs[0].fields.len(), 2);

        match &defs[1].fields[0].ty.kind {
            TypeExprKind::Tuple(elems) => assert_eq!(elems.len(), 2),
            other => panic!("expected tuple type, got {:?}", other),
        }
        match &defs[2].fields[0].ty.kind {
            TypeExprKind::Named { name, args } => {
                assert_eq!(name, "Vec");
                assert!(matches!(&args[0].kind, TypeExprKind::Named { name, args } if name == "Vec" && args.len() == 1));
            }
            other => panic!("expected named type, got {:?}", other),
        }
        assert!(matches!(&defs[3].fields[0].ty.kind, TypeExprKind::Named { name, args } if name == "Vec" && args.is_empty()));
    }

    #[test]
    fn multiline_struct_definition() {
        let result = parse_ok("B:\n    Transition{\n        na : Location,\n        nb : Location\n    }\n    x = 1\n");
        let block = blocks(&result)[0];
        assert_eq!(block.structs().next().map(|d| d.fields.len()), Some(2));
        assert!(block.field("x").is_some());
    }

    #[test]
    fn struct_definition_missing_colon() {
        let result = parse("B:\n    Transition{na Location}\n    x = 1\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].hint.is_some());
        assert!(blocks(&result)[0].field("x").is_some());
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    #[test]
    fn precedence_and_over_equality() {
        let e = expr("(A == B) && (C != D)");
        assert!(matches!(e.kind, ExprKind::Binary { op: BinOp::And, .. }));

        let e = expr("x == y && a < b");
        match e.kind {
            ExprKind::Binary { op: BinOp::And, left, right } => {
                assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Eq, .. }));
                assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Lt, .. }));
            }
            other => panic!("expected &&, got {:?}", other),
        }
    }

    #[test]
    fn precedence_arithmetic() {
        match expr("1 + 2 * 3 - 4").kind {
            ExprKind::Binary { op: BinOp::Sub, left, .. } => match left.kind {
                ExprKind::Binary { op: BinOp::Add, right, .. } => {
                    assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }))
                }
                other => panic!("expected +, got {:?}", other),
            },
            other => panic!("expected -, got {:?}", other),
        }
        let e = expr("0..n + 1");
        assert!(matches!(e.kind, ExprKind::Range { .. }));
        let e = expr("a || b && c");
        assert!(matches!(e.kind, ExprKind::Binary { op: BinOp::Or, .. }));
    }

    #[test]
    fn unary_operators() {
        assert!(matches!(expr("-x").kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
        assert!(matches!(expr("!done").kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
        match expr("not a && b").kind {
            ExprKind::Binary { op: BinOp::And, left, .. } => {
                assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Not, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bare_comma_list_is_vector() {
        let bare = expr("CX, T");
        let bracketed = expr("[CX, T]");
        match (&bare.kind, &bracketed.kind) {
            (ExprKind::Vec(a), ExprKind::Vec(b)) => {
                assert_eq!(a.len(), 2);
                assert_eq!(a.len(), b.len());
            }
            other => panic!("expected two vectors, got {:?}", other),
        }
    }

    #[test]
    fn comma_before_next_field_is_separator() {
        let result = parse_ok("GateRealization[name = 'a', cost = 2]");
        let block = blocks(&result)[0];
        assert!(matches!(block.field("name").map(|f| &f.value.kind), Some(ExprKind::String(_))));
        assert!(matches!(block.field("cost").map(|f| &f.value.kind), Some(ExprKind::Int(2))));
    }

    #[test]
    fn tuple_index_forms() {
        match expr("tuple.(0).(1)").kind {
            ExprKind::TupleIndex { object, index: 1 } => {
                assert!(matches!(object.kind, ExprKind::TupleIndex { index: 0, .. }))
            }
            other => panic!("expected tuple index, got {:?}", other),
        }
        match expr("pair.0.1").kind {
            ExprKind::TupleIndex { object, index: 1 } => {
                assert!(matches!(object.kind, ExprKind::TupleIndex { index: 0, .. }))
            }
            other => panic!("expected tuple index, got {:?}", other),
        }
    }

    #[test]
    fn projection() {
        match expr("x.implementation.(path())").kind {
            ExprKind::Projection { object, path } => {
                assert!(matches!(object.kind, ExprKind::Field { ref field, .. } if field == "implementation"));
                assert!(matches!(path.kind, ExprKind::Call { .. }));
            }
            other => panic!("expected projection, got {:?}", other),
        }
    }

    #[test]
    fn method_chain_ends_in_call() {
        let e = expr("obj.field1.method1().field2.method2(arg)");
        match e.kind {
            ExprKind::Call { func, args } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(func.kind, ExprKind::Field { ref field, .. } if field == "method2"));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn tuple_argument() {
        match expr("Arch.contains_edge((a, b))").kind {
            ExprKind::Call { args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(&args[0].kind, ExprKind::Tuple(elems) if elems.len() == 2));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn option_and_struct_literals() {
        assert!(matches!(expr("Some(1)").kind, ExprKind::Some(_)));
        assert!(matches!(expr("None").kind, ExprKind::None));
        match expr("Transition{na = Location(0), nb: Location(1)}").kind {
            ExprKind::StructLit { name, fields, .. } => {
                assert_eq!(name, "Transition");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected struct literal, got {:?}", other),
        }
    }

    #[test]
    fn let_chain_is_flattened() {
        match expr("let a = 1 in let b = a in b").kind {
            ExprKind::Let { bindings, body } => {
                assert_eq!(bindings.len(), 2);
                assert_eq!(bindings[1].name, "b");
                assert!(matches!(body.kind, ExprKind::Ident(ref n) if n == "b"));
            }
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn lambda_forms() {
        match expr("map(v, |x, y| -> x + y)").kind {
            ExprKind::Call { args, .. } => match &args[1].kind {
                ExprKind::Lambda { params, body } => {
                    assert_eq!(params.len(), 2);
                    assert!(matches!(body.kind, ExprKind::Binary { op: BinOp::Add, .. }));
                }
                other => panic!("expected lambda, got {:?}", other),
            },
            other => panic!("expected call, got {:?}", other),
        }
        assert!(matches!(expr("|| -> 1").kind, ExprKind::Lambda { ref params, .. } if params.is_empty()));
    }

    #[test]
    fn lambda_requires_arrow() {
        let result = parse("B:\n    x = |a| a\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("'->'"));
    }

    // =========================================================================
    // Newlines inside expressions
    // =========================================================================

    #[test]
    fn multiline_if() {
        let src = "\
RouteInfo:
    realize_gate =
        if (Gate.gate_type()) == CX
        then
            Vec()
        else
            Vec()
    step_cost = 1
";
        let result = parse_ok(src);
        assert!(matches!(field_value(&result, "RouteInfo", "realize_gate").kind, ExprKind::If { .. }));
        assert!(blocks(&result)[0].field("step_cost").is_some());
    }

    #[test]
    fn multiline_let() {
        let src = "\
B:
    x = (let v = Vec() in
        let v2 = v.push(Location(0)) in
        v2)
";
        let result = parse_ok(src);
        match &field_value(&result, "B", "x").kind {
            ExprKind::Let { bindings, .. } => assert_eq!(bindings.len(), 2),
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn multiline_lambda_arrow() {
        let result = parse_ok("B:\n    x = map(v, |x|\n        -> x + 1)\n");
        assert!(matches!(field_value(&result, "B", "x").kind, ExprKind::Call { .. }));
    }

    #[test]
    fn operator_on_following_lines() {
        let result = parse_ok("B:\n    check = Gate.type\n        ==\n        CX\n");
        assert!(matches!(
            field_value(&result, "B", "check").kind,
            ExprKind::Binary { op: BinOp::Eq, .. }
        ));
    }

    #[test]
    fn method_call_on_following_line() {
        let result = parse_ok("B:\n    x = v\n        .push(1)\n    y = 2\n");
        assert!(matches!(field_value(&result, "B", "x").kind, ExprKind::Call { .. }));
    }

    #[test]
    fn newlines_inside_delimiters() {
        let result = parse_ok("B:\n    x = f(\n        a,\n        b\n    )\n    y = [\n        1,\n        2,\n    ]\n");
        match &field_value(&result, "B", "x").kind {
            ExprKind::Call { args, .. } => assert_eq!(args.len(), 2),
            other => panic!("expected call, got {:?}", other),
        }
        assert!(matches!(&field_value(&result, "B", "y").kind, ExprKind::Vec(v) if v.len() == 2));
    }

    #[test]
    fn missing_else_reported_on_same_field() {
        let result = parse("B:\n    x = if a then b\n    y = 1\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("'else'"));
        assert!(blocks(&result)[0].field("y").is_some());
    }

    #[test]
    fn branch_values_start_on_their_own_line() {
        let src = "\
B:
    x = if true
        then
            Location{index = 1}
        else
            v[0]
    y = 1
";
        let result = parse_ok(src);
        match &field_value(&result, "B", "x").kind {
            ExprKind::If { then_branch, else_branch, .. } => {
                assert!(matches!(then_branch.kind, ExprKind::StructLit { .. }), "{:?}", then_branch);
                assert!(matches!(else_branch.kind, ExprKind::Index { .. }), "{:?}", else_branch);
            }
            other => panic!("expected if, got {:?}", other),
        }
        assert_eq!(blocks(&result).len(), 1);
        assert!(blocks(&result)[0].field("y").is_some());
    }

    #[test]
    fn let_and_lambda_values_start_on_their_own_line() {
        let result = parse_ok("B:\n    x = let a =\n        v[0] in a\n    y = map(q, |i| ->\n        State.map[i])\n");
        match &field_value(&result, "B", "x").kind {
            ExprKind::Let { bindings, .. } => {
                assert!(matches!(bindings[0].value.kind, ExprKind::Index { .. }))
            }
            other => panic!("expected let, got {:?}", other),
        }
        match &field_value(&result, "B", "y").kind {
            ExprKind::Call { args, .. } => match &args[1].kind {
                ExprKind::Lambda { body, .. } => assert!(matches!(body.kind, ExprKind::Index { .. })),
                other => panic!("expected lambda, got {:?}", other),
            },
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn field_value_on_next_line_may_be_literal_or_index() {
        let src = "B:\n    x =\n        Transition{na = Location(1)}\n    y =\n        v[0]\n    Pair{a : Int}\n";
        let result = parse_ok(src);
        assert!(matches!(field_value(&result, "B", "x").kind, ExprKind::StructLit { .. }));
        assert!(matches!(field_value(&result, "B", "y").kind, ExprKind::Index { .. }));
        assert_eq!(blocks(&result)[0].structs().count(), 1);
    }

    #[test]
    fn dangling_keyword_does_not_swallow_next_field() {
        let result = parse("B:\n    x = if a then\n    y = 1\n");
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert!(blocks(&result)[0].field("y").is_some());
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    /// Fully parenthesized rendering of operator structure.
    fn shape(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Binary { op, left, right } => format!("({} {} {})", shape(left), op, shape(right)),
            ExprKind::Unary { op, operand } => format!("({}{})", op, shape(operand)),
            ExprKind::Range { start, end } => format!("({}..{})", shape(start), shape(end)),
            ExprKind::Field { object, field, .. } => format!("{}.{}", shape(object), field),
            ExprKind::TupleIndex { object, index } => format!("{}.{}", shape(object), index),
            ExprKind::Index { object, index } => format!("{}[{}]", shape(object), shape(index)),
            ExprKind::Call { func, args } => {
                let args: Vec<String> = args.iter().map(shape).collect();
                format!("{}({})", shape(func), args.join(", "))
            }
            ExprKind::Lambda { params, body } => {
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                format!("(|{}| -> {})", names.join(", "), shape(body))
            }
            ExprKind::Let { bindings, body } => {
                let mut out = String::from("(");
                for b in bindings {
                    out.push_str(&format!("let {} = {} in ", b.name, shape(&b.value)));
                }
                out.push_str(&shape(body));
                out.push(')');
                out
            }
            ExprKind::If { cond, then_branch, else_branch } => format!(
                "(if {} then {} else {})",
                shape(cond),
                shape(then_branch),
                shape(else_branch)
            ),
            _ => e.to_string(),
        }
    }

    #[test]
    fn precedence_table() {
        let cases = [
            // adjacent tiers, both orders
            ("a || b && c", "(a || (b && c))"),
            ("a && b || c", "((a && b) || c)"),
            ("a && b == c", "(a && (b == c))"),
            ("a != b && c", "((a != b) && c)"),
            ("a == b < c", "(a == (b < c))"),
            ("a < b == c", "((a < b) == c)"),
            ("a < 0..n", "(a < (0..n))"),
            ("0..n < m", "((0..n) < m)"),
            ("0..n + 1", "(0..(n + 1))"),
            ("a + 1..b", "((a + 1)..b)"),
            ("a + b * c", "(a + (b * c))"),
            ("a * b - c", "((a * b) - c)"),
            ("a % b + c", "((a % b) + c)"),
            ("-a * b", "((-a) * b)"),
            ("a * -b", "(a * (-b))"),
            // unary binds looser than postfix
            ("-a.b", "(-a.b)"),
            ("not x.y()", "(!x.y())"),
            ("-t.0", "(-t.0)"),
            ("!v[0]", "(!v[0])"),
            ("- -a", "(-(-a))"),
            // left associativity within a tier
            ("a - b - c", "((a - b) - c)"),
            ("a / b / c", "((a / b) / c)"),
            ("a % b * c", "((a % b) * c)"),
            ("a < b >= c", "((a < b) >= c)"),
            ("a == b != c", "((a == b) != c)"),
            ("a && b && c", "((a && b) && c)"),
            ("a || b || c", "((a || b) || c)"),
            ("a..b..c", "((a..b)..c)"),
            ("f(x)(y).z[0]", "f(x)(y).z[0]"),
            // bodies extend as far right as possible
            ("|x| -> x + 1", "(|x| -> (x + 1))"),
            ("if c then a else b + 1", "(if c then a else (b + 1))"),
            ("if c then a + 1 else b", "(if c then (a + 1) else b)"),
            ("let a = 1 in a * 2", "(let a = 1 in (a * 2))"),
            ("let a = b || c in a", "(let a = (b || c) in a)"),
        ];
        for (src, expected) in cases {
            assert_eq!(shape(&expr(src)), expected, "source: {}", src);
        }
    }

    #[test]
    fn parenthesized_groups_override_precedence() {
        assert_eq!(shape(&expr("(a + b) * c")), "((a + b) * c)");
        assert_eq!(shape(&expr("a - (b - c)")), "(a - (b - c))");
        assert_eq!(shape(&expr("(-a).b")), "(-a).b");
    }

    // =========================================================================
    // Limits and ids
    // =========================================================================

    #[test]
    fn deep_nesting_is_rejected_not_crashed() {
        let depth = MAX_DEPTH * 3;
        let src = format!("B:\n    x = {}1{}\n    y = 2\n", "(".repeat(depth), ")".repeat(depth));
        let result = parse(&src);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::NestingTooDeep);
        assert!(blocks(&result)[0].field("y").is_some());
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let chains = [
            vec!["1"; 1500].join(" + "),
            format!("v{}", ".a".repeat(1500)),
            format!("f{}", "()".repeat(1500)),
        ];
        for value in chains {
            let result = parse(&format!("B:\n    x = {}\n    y = 2\n", value));
            assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
            assert_eq!(result.errors[0].kind, ParseErrorKind::NestingTooDeep);
            let block = blocks(&result)[0];
            assert!(block.field("x").map(|f| f.value.is_error()).unwrap_or(false));
            assert!(block.field("y").is_some());
        }
    }

    #[test]
    fn chains_below_the_limit_parse() {
        let sum = vec!["1"; MAX_DEPTH / 2].join(" + ");
        let result = parse_ok(&format!("B:\n    x = {}\n", sum));
        assert!(matches!(field_value(&result, "B", "x").kind, ExprKind::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn moderate_nesting_is_fine() {
        let src = format!("B:\n    x = {}1{}\n", "(".repeat(50), ")".repeat(50));
        parse_ok(&src);
    }

    #[test]
    fn node_ids_unique_within_file() {
        let result = parse_ok("B:\n    x = f(a, b) + g(c)\n    y = [1, 2, 3]\n");
        let mut ids = Vec::new();
        fn collect(e: &Expr, ids: &mut Vec<u64>) {
            ids.push(e.id.0);
            match &e.kind {
                ExprKind::Binary { left, right, .. } => {
                    collect(left, ids);
                    collect(right, ids);
                }
                ExprKind::Call { func, args } => {
                    collect(func, ids);
                    args.iter().for_each(|a| collect(a, ids));
                }
                ExprKind::Vec(items) => items.iter().for_each(|a| collect(a, ids)),
                _ => {}
            }
        }
        for field in blocks(&result)[0].fields() {
            ids.push(field.id.0);
            collect(&field.value, &mut ids);
        }
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
