use super::*;

#[test]
fn test_render_nested_blocks() {
    let mut f = Fragment::new();
    f.line("fn main() {");
    f.block_with("if ready {", "}", |body| {
        body.line("go();");
        body.block_with("loop {", "}", |inner| {
            inner.line("break;");
        });
    });
    f.line("}");

    assert_eq!(
        render(&f, &Style::rust()),
        "fn main() {\nif ready {\n    go();\n    loop {\n        break;\n    }\n}\n}\n"
    );
}

#[test]
fn test_render_tabs_and_blanks() {
    let mut f = Fragment::new();
    f.block_with("void f() {", "}", |body| {
        body.line("int x = 0;").blank().line("return;");
    });
    assert_eq!(render(&f, &Style::c()), "void f() {\n\tint x = 0;\n\n\treturn;\n}\n");
}

#[test]
fn test_empty_close_and_lines() {
    let mut f = Fragment::new();
    f.block("case 1:", "", {
        let mut body = Fragment::new();
        body.lines(["a();", "b();"]);
        body
    });
    assert_eq!(render(&f, &Style::c()), "case 1:\n\ta();\n\tb();\n");
}

#[test]
fn test_empty_lines_carry_no_indent() {
    let mut f = Fragment::new();
    f.block_with("{", "}", |body| {
        body.line("");
    });
    assert_eq!(render(&f, &Style::rust()), "{\n\n}\n");
}

#[test]
fn test_append() {
    let mut a = Fragment::new();
    a.line("a");
    let mut b = Fragment::new();
    b.line("b");
    a.append(b);
    assert_eq!(a.nodes().len(), 2);
    assert!(!a.is_empty());
    assert!(Fragment::new().is_empty());
}
