use serde_json::json;
use tinystencil::{compile, render, Context, Engine, Error, SyntaxError, Value};

fn ctx(v: serde_json::Value) -> Context {
    Context::from_json(v)
}

#[test]
fn interpolation_with_filter() {
    let out = render(
        "Hello {{ name|upper }}!",
        &ctx(json!({"name": "ada"})),
    )
    .unwrap();
    assert_eq!(out, "Hello ADA!");
}

#[test]
fn loop_with_condition_keeps_cheap_items_only() {
    let template = "{% for item in items %}{% if item.price < 100 %}<li>{{ item.name }}</li>{% endif %}{% endfor %}";
    let context = ctx(json!({
        "items": [
            {"name": "X", "price": 25},
            {"name": "Y", "price": 150},
        ]
    }));
    assert_eq!(render(template, &context).unwrap(), "<li>X</li>");
}

#[test]
fn missing_path_renders_empty() {
    assert_eq!(render("{{ a.b.c }}", &Context::new()).unwrap(), "");
}

#[test]
fn html_is_escaped_by_default() {
    let out = render("{{ name }}", &ctx(json!({"name": "<script>"}))).unwrap();
    assert_eq!(out, "&lt;script&gt;");
}

#[test]
fn numeric_zero_is_falsy() {
    let template = "{% if x %}A{% else %}B{% endif %}";
    assert_eq!(render(template, &ctx(json!({"x": 0}))).unwrap(), "B");
    assert_eq!(render(template, &ctx(json!({"x": 1}))).unwrap(), "A");
}

#[test]
fn missing_endif_is_a_syntax_error_naming_the_if() {
    let err = compile("{% if x %}A").unwrap_err();
    let Error::Syntax(syntax) = err else {
        panic!("expected a syntax error");
    };
    assert_eq!(syntax, SyntaxError::Unclosed("if"));
    assert!(syntax.to_string().contains("if"));
}

#[test]
fn tagless_template_round_trips() {
    let template = "no tags here, just { braces } and %\n";
    assert_eq!(render(template, &Context::new()).unwrap(), template);
}

#[test]
fn renders_are_deterministic_across_equal_contexts() {
    let template =
        compile("{% for x in xs %}{{ x }}-{% endfor %}{% if n > 1 %}big{% endif %}").unwrap();
    let a = template
        .render(&ctx(json!({"xs": [1, 2, 3], "n": 5})))
        .unwrap();
    let b = template
        .render(&ctx(json!({"xs": [1, 2, 3], "n": 5})))
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a, "1-2-3-big");
}

#[test]
fn elif_chain_renders_exactly_one_branch() {
    let template = "{% if x == 1 %}one{% elif x == 2 %}two{% elif x %}some{% else %}none{% endif %}";
    assert_eq!(render(template, &ctx(json!({"x": 1}))).unwrap(), "one");
    assert_eq!(render(template, &ctx(json!({"x": 2}))).unwrap(), "two");
    assert_eq!(render(template, &ctx(json!({"x": 7}))).unwrap(), "some");
    assert_eq!(render(template, &ctx(json!({"x": 0}))).unwrap(), "none");
}

#[test]
fn list_iteration_is_in_order_and_map_in_insertion_order() {
    let out = render(
        "{% for x in xs %}{{ x }}{% endfor %}",
        &ctx(json!({"xs": ["c", "a", "b"]})),
    )
    .unwrap();
    assert_eq!(out, "cab");

    // Maps bind the values, keys walked in insertion order.
    let out = render(
        "{% for v in m %}{{ v }},{% endfor %}",
        &ctx(json!({"m": {"z": 1, "a": 2, "k": 3}})),
    )
    .unwrap();
    assert_eq!(out, "1,2,3,");
}

#[test]
fn non_iterable_loop_subjects_render_nothing() {
    let template = "[{% for x in subject %}{{ x }}{% endfor %}]";
    assert_eq!(render(template, &Context::new()).unwrap(), "[]");
    assert_eq!(render(template, &ctx(json!({"subject": null}))).unwrap(), "[]");
    assert_eq!(render(template, &ctx(json!({"subject": 42}))).unwrap(), "[]");
    assert_eq!(
        render(template, &ctx(json!({"subject": "str"}))).unwrap(),
        "[]"
    );
}

#[test]
fn loop_binding_shadows_outer_context_and_outer_loop() {
    let context = ctx(json!({"x": "ctx", "outer": ["o"], "inner": ["i"]}));
    let template = "{{ x }}/{% for x in outer %}{{ x }}/{% for x in inner %}{{ x }}{% endfor %}/{{ x }}{% endfor %}/{{ x }}";
    // Innermost binding wins; each scope is restored when its loop ends.
    assert_eq!(render(template, &context).unwrap(), "ctx/o/i/o/ctx");
}

#[test]
fn nested_loops_over_structures() {
    let context = ctx(json!({
        "rows": [
            {"name": "a", "cells": [1, 2]},
            {"name": "b", "cells": [3]},
        ]
    }));
    let template =
        "{% for row in rows %}{{ row.name }}:{% for c in row.cells %}{{ c }}{% endfor %};{% endfor %}";
    assert_eq!(render(template, &context).unwrap(), "a:12;b:3;");
}

#[test]
fn filter_pipeline_applies_left_to_right() {
    let out = render(
        "{{ name | upper | truncate: 2 }}",
        &ctx(json!({"name": "adalovelace"})),
    )
    .unwrap();
    assert_eq!(out, "AD…");
}

#[test]
fn unregistered_filter_is_a_no_op() {
    let out = render("{{ name | nosuchfilter }}", &ctx(json!({"name": "ada"}))).unwrap();
    assert_eq!(out, "ada");
}

#[test]
fn failing_filter_aborts_the_render() {
    let mut engine = Engine::new();
    engine.add_filter("boom", |_, _| Err("kaboom".to_string()));
    let err = engine
        .render("{{ x | boom }}", &ctx(json!({"x": 1})))
        .unwrap_err();
    let Error::Filter { name, message } = err else {
        panic!("expected a filter error");
    };
    assert_eq!(name, "boom");
    assert_eq!(message, "kaboom");
}

#[test]
fn filter_arguments_resolve_against_the_current_scope() {
    // The truncate length comes from the loop binding.
    let out = render(
        "{% for n in lengths %}{{ word | truncate: n }} {% endfor %}",
        &ctx(json!({"word": "template", "lengths": [3, 6]})),
    )
    .unwrap();
    assert_eq!(out, "tem… templa… ");
}

#[test]
fn bare_filter_argument_falls_back_to_literal_on_miss() {
    let mut engine = Engine::new();
    engine.add_filter("append", |v, args| {
        let suffix = args.first().cloned().unwrap_or(Value::Null);
        Ok(Value::String(format!("{v}{suffix}")))
    });

    // `sep` is absent: the token itself becomes the argument.
    let out = engine
        .render("{{ x | append: sep }}", &ctx(json!({"x": "a"})))
        .unwrap();
    assert_eq!(out, "asep");

    // `sep` present: its value is used instead.
    let out = engine
        .render("{{ x | append: sep }}", &ctx(json!({"x": "a", "sep": "-"})))
        .unwrap();
    assert_eq!(out, "a-");

    // Quoting always forces the literal.
    let out = engine
        .render("{{ x | append: 'sep' }}", &ctx(json!({"x": "a", "sep": "-"})))
        .unwrap();
    assert_eq!(out, "asep");
}

#[test]
fn default_filters_compose_with_data() {
    let context = ctx(json!({
        "title": "Monthly Report",
        "total": 1234.5,
        "when": "2024-03-09",
    }));
    let out = render(
        "{{ title | lower }} / {{ total | formatUSD }} / {{ when | formatDate }}",
        &context,
    )
    .unwrap();
    assert_eq!(out, "monthly report / $1,234.50 / Mar 9, 2024");
}

#[test]
fn expressions_in_conditions_and_interpolations() {
    let context = ctx(json!({"a": 3, "b": 4, "name": "ada"}));
    assert_eq!(
        render("{{ a * b + 1 }}", &context).unwrap(),
        "13"
    );
    assert_eq!(
        render("{{ 'hi ' + name }}", &context).unwrap(),
        "hi ada"
    );
    assert_eq!(
        render("{% if a < b && name == 'ada' %}yes{% endif %}", &context).unwrap(),
        "yes"
    );
    assert_eq!(
        render("{% if !(a < b) %}no{% else %}yes{% endif %}", &context).unwrap(),
        "yes"
    );
}

#[test]
fn concurrent_renders_share_one_compiled_template() {
    let template = compile("{% for x in xs %}{{ x | upper }}{% endfor %}").unwrap();
    let template = &template;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    let context = ctx(json!({"xs": [format!("a{i}"), format!("b{i}")]}));
                    template.render(&context).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("A{i}B{i}"));
        }
    });
}
