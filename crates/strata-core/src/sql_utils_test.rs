use super::*;

#[test]
fn test_quote_ident_simple() {
    assert_eq!(quote_ident("widgets"), r#""widgets""#);
}

#[test]
fn test_quote_ident_with_embedded_quotes() {
    assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
}

#[test]
fn test_quote_ident_keeps_dots() {
    assert_eq!(quote_ident("public.t"), r#""public.t""#);
}

#[test]
fn test_quote_qualified() {
    assert_eq!(quote_qualified("t"), r#""t""#);
    assert_eq!(
        quote_qualified("public.schema_version"),
        r#""public"."schema_version""#
    );
    assert_eq!(
        quote_qualified(r#"my"schema.t"#),
        r#""my""schema"."t""#
    );
}

#[test]
fn test_split_qualified_name() {
    assert_eq!(split_qualified_name("t"), (None, "t"));
    assert_eq!(split_qualified_name("s.t"), (Some("s"), "t"));
    assert_eq!(split_qualified_name("db.s.t"), (Some("db.s"), "t"));
}

#[test]
fn test_escape_and_quote_literal() {
    assert_eq!(escape_sql_string("it's"), "it''s");
    assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    assert_eq!(quote_literal(""), "''");
}
