use super::*;

#[test]
fn test_empty_input_is_single_empty_statement() {
    assert_eq!(split_statements(""), vec![""]);
}

#[test]
fn test_single_statement_without_delimiter() {
    assert_eq!(split_statements("select 42"), vec!["select 42"]);
}

#[test]
fn test_positional_parameter_is_not_dollar_quote() {
    assert_eq!(split_statements("select $1"), vec!["select $1"]);
}

#[test]
fn test_two_statements() {
    assert_eq!(
        split_statements("select 1; select 2;"),
        vec!["select 1;", "select 2;"]
    );
}

#[test]
fn test_trailing_statement_without_delimiter() {
    assert_eq!(
        split_statements("select 42; select 7"),
        vec!["select 42;", "select 7"]
    );
}

#[test]
fn test_whitespace_only_statements_dropped() {
    assert_eq!(
        split_statements("select 1;\n\n   \nselect 2;\n  "),
        vec!["select 1;", "select 2;"]
    );
}

#[test]
fn test_delimiter_inside_quotes() {
    assert_eq!(
        split_statements(r#"select 42, ';' ";"; select 7;"#),
        vec![r#"select 42, ';' ";";"#, "select 7;"]
    );
}

#[test]
fn test_doubled_quotes_are_escapes() {
    assert_eq!(
        split_statements(r#"select 'it''s; fine', "a"";b"; select 2;"#),
        vec![r#"select 'it''s; fine', "a"";b";"#, "select 2;"]
    );
}

#[test]
fn test_escape_string_backslash_quote() {
    assert_eq!(
        split_statements(r"select E'don\'t; stop'; select 2;"),
        vec![r"select E'don\'t; stop';", "select 2;"]
    );
}

#[test]
fn test_plain_string_backslash_is_literal() {
    // Without the E prefix a backslash does not escape the closing quote.
    assert_eq!(
        split_statements(r"select 'a\'; select 2;"),
        vec![r"select 'a\';", "select 2;"]
    );
}

#[test]
fn test_dollar_quoted_body() {
    assert_eq!(split_statements("select $$a;b$$;"), vec!["select $$a;b$$;"]);
}

#[test]
fn test_tagged_dollar_quotes_nest() {
    let sql = "create function f() returns text as $fn$
begin
  return $body$ x; y $body$;
end;
$fn$ language plpgsql;
select 1;";
    let statements = split_statements(sql);
    assert_eq!(statements.len(), 2);
    assert!(statements[0].ends_with("$fn$ language plpgsql;"));
    assert_eq!(statements[1], "select 1;");
}

#[test]
fn test_dollar_quote_closes_only_on_matching_tag() {
    let statements = split_statements("select $a$ $$ ; $b$ ; $a$; select 2;");
    assert_eq!(statements, vec!["select $a$ $$ ; $b$ ; $a$;", "select 2;"]);
}

#[test]
fn test_single_line_comments() {
    let sql = "select * -- foo ; bar
from users -- ; single line comments
where id = $1;
select 1;
";
    assert_eq!(
        split_statements(sql),
        vec![
            "select * -- foo ; bar
from users -- ; single line comments
where id = $1;",
            "select 1;"
        ]
    );
}

#[test]
fn test_nested_block_comments() {
    let sql = "select * /* ; multi line ;
;
*/
/* /* ; with nesting ; */ */
from users
where id = $1;
select 1;
";
    assert_eq!(
        split_statements(sql),
        vec![
            "select * /* ; multi line ;
;
*/
/* /* ; with nesting ; */ */
from users
where id = $1;",
            "select 1;"
        ]
    );
}

#[test]
fn test_nested_block_comment_alone() {
    assert_eq!(
        split_statements("/* /* x; */ ; */ select 1; select 2;"),
        vec!["/* /* x; */ ; */ select 1;", "select 2;"]
    );
}

#[test]
fn test_statements_are_substrings_in_order() {
    let sql = "create table a(id int);\n\ninsert into a values (1);\n";
    let statements = split_statements(sql);
    let mut cursor = 0;
    for statement in &statements {
        let found = sql[cursor..].find(statement).unwrap();
        cursor += found + statement.len();
    }
    assert_eq!(sql[cursor..].trim(), "");
}

#[test]
fn test_unterminated_quote_keeps_rest() {
    assert_eq!(
        split_statements("select 1; select 'oops;"),
        vec!["select 1;", "select 'oops;"]
    );
}

#[test]
fn test_non_ascii_text() {
    assert_eq!(
        split_statements("select 'héllo; wörld'; select 'ü';"),
        vec!["select 'héllo; wörld';", "select 'ü';"]
    );
}
