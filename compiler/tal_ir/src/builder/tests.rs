use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_finish_records_top_level_body() {
    let interner = StringInterner::new();
    let mut b = AstBuilder::new(&interner);
    let one = b.number(1.0);
    let s1 = b.let_stmt("x", one);
    let x = b.ident("x");
    let s2 = b.ret(x);
    let program = b.finish(vec![s1, s2]);

    assert_eq!(program.arena.get_stmt_list(program.body), &[s1, s2]);
    match &program.arena.get_stmt(s1).kind {
        StmtKind::Let { name, init } => {
            assert_eq!(interner.lookup(*name), "x");
            assert_eq!(*init, Some(one));
        }
        other => panic!("expected let, got {other:?}"),
    }
}

#[test]
fn test_number_literal_round_trips_bits() {
    let interner = StringInterner::new();
    let mut b = AstBuilder::new(&interner);
    let n = b.number(2.5);
    let program = b.finish(vec![]);
    match program.arena.get_expr(n).kind {
        ExprKind::Number(bits) => assert_eq!(ExprKind::number_value(bits), 2.5),
        ref other => panic!("expected number, got {other:?}"),
    }
}

#[test]
fn test_function_params_and_name() {
    let interner = StringInterner::new();
    let mut b = AstBuilder::new(&interner);
    let a = b.ident("a");
    let body = b.ret(a);
    let decl = b.function("identity", &["a"], vec![body]);
    let program = b.finish(vec![decl]);

    let StmtKind::Function(id) = program.arena.get_stmt(decl).kind else {
        panic!("expected function declaration");
    };
    let def = program.arena.get_function(id);
    assert_eq!(def.name.map(|n| interner.lookup(n)), Some("identity"));
    let params: Vec<&str> = program
        .arena
        .get_params(def.params)
        .iter()
        .map(|p| interner.lookup(*p))
        .collect();
    assert_eq!(params, vec!["a"]);
}

#[test]
fn test_at_stamps_span() {
    let interner = StringInterner::new();
    let mut b = AstBuilder::new(&interner);
    b.at(Span::new(10, 14));
    let t = b.boolean(true);
    let program = b.finish(vec![]);
    assert_eq!(program.arena.get_expr(t).span, Span::new(10, 14));
}

#[test]
fn test_if_chain_keeps_branch_order() {
    let interner = StringInterner::new();
    let mut b = AstBuilder::new(&interner);
    let c1 = b.boolean(false);
    let c2 = b.boolean(true);
    let stmt = b.if_chain(vec![(c1, vec![]), (c2, vec![])], Some(vec![]));
    let program = b.finish(vec![stmt]);
    let StmtKind::If {
        branches,
        else_body,
    } = program.arena.get_stmt(stmt).kind
    else {
        panic!("expected if");
    };
    let conds: Vec<ExprId> = program
        .arena
        .get_branches(branches)
        .iter()
        .map(|br| br.cond)
        .collect();
    assert_eq!(conds, vec![c1, c2]);
    assert!(else_body.is_some());
}
