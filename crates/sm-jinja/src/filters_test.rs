use super::*;
use serde_json::json;

#[test]
fn test_ruby_literal() {
    assert_eq!(ruby_literal(&json!(null)), "nil");
    assert_eq!(ruby_literal(&json!(false)), "false");
    assert_eq!(ruby_literal(&json!(42)), "42");
    assert_eq!(ruby_literal(&json!(1.5)), "1.5");
    assert_eq!(ruby_literal(&json!("pending")), "\"pending\"");
    assert_eq!(ruby_literal(&json!([1, "a"])), "[1, \"a\"]");
    assert_eq!(ruby_literal(&json!({})), "{}");
    assert_eq!(ruby_literal(&json!({"a": 1, "b c": null})), "{ a: 1, \"b c\": nil }");
}

#[test]
fn test_ruby_string_escapes() {
    assert_eq!(ruby_string("say \"hi\""), "\"say \\\"hi\\\"\"");
    assert_eq!(ruby_string("#{danger}"), "\"\\#{danger}\"");
    assert_eq!(ruby_string("a\\b"), "\"a\\\\b\"");
    assert_eq!(ruby_string("a\nb"), "\"a\\nb\"");
}

#[test]
fn test_ruby_symbol() {
    assert_eq!(ruby_symbol(&json!("payer")), ":payer");
    assert_eq!(ruby_symbol(&json!("valid?")), ":valid?");
    assert_eq!(ruby_symbol(&json!("payer id")), ":\"payer id\"");
    assert_eq!(ruby_symbol(&json!(["payer", "created_at"])), "[:payer, :created_at]");
    assert_eq!(ruby_symbol(&json!(3)), "3");
}

#[test]
fn test_ruby_kwargs() {
    let options = json!({
        "algorithm": "concurrently",
        "column": ["payer", "payee"],
        "default": "pending",
        "name": "index_payments_on_payer",
        "unique": true,
    });
    assert_eq!(
        ruby_kwargs(&options, &[]).unwrap(),
        ", algorithm: :concurrently, column: [:payer, :payee], default: \"pending\", name: \"index_payments_on_payer\", unique: true"
    );
    assert_eq!(
        ruby_kwargs(&options, &["algorithm".to_string(), "name".to_string()]).unwrap(),
        ", column: [:payer, :payee], default: \"pending\", unique: true"
    );
}

#[test]
fn test_ruby_kwargs_empty_and_invalid() {
    assert_eq!(ruby_kwargs(&json!({}), &[]).unwrap(), "");
    assert_eq!(ruby_kwargs(&json!(null), &[]).unwrap(), "");
    assert!(ruby_kwargs(&json!([1, 2]), &[]).is_err());
}

#[test]
fn test_filters_in_environment() {
    let mut env = minijinja::Environment::new();
    env.add_filter("sym", sym);
    env.add_filter("ruby", ruby);
    env.add_filter("kwargs", kwargs);

    let rendered = env
        .render_str(
            "add_index {{ args[0] | sym }}, {{ args[1] | sym }}{{ options | kwargs('algorithm') }}",
            minijinja::context! {
                args => vec![json!("payments"), json!(["payer"])],
                options => json!({"algorithm": "btree", "unique": true}),
            },
        )
        .unwrap();
    assert_eq!(rendered, "add_index :payments, [:payer], unique: true");
}

#[test]
fn test_sym_rejects_missing_argument() {
    let mut env = minijinja::Environment::new();
    env.add_filter("sym", sym);
    let result = env.render_str("{{ args[1] | sym }}", minijinja::context! { args => vec!["payments"] });
    assert!(result.is_err());
}

#[test]
fn test_kwargs_on_undefined_is_empty() {
    let mut env = minijinja::Environment::new();
    env.add_filter("kwargs", kwargs);
    assert_eq!(env.render_str("x{{ missing | kwargs }}", ()).unwrap(), "x");
}
