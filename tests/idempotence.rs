// tests/idempotence.rs

use proptest::prelude::*;

use stylepipe::steps::{minify_css, strip_comments};
use stylepipe::types::Compatibility;

// Fragments that exercise comments, strings and escapes in any order.
fn css_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a { color: red; }".to_string()),
        Just("/* note */".to_string()),
        Just("/*! keep */".to_string()),
        Just("/*".to_string()),
        Just("*/".to_string()),
        Just("/".to_string()),
        Just("*".to_string()),
        Just("\"/* in string */\"".to_string()),
        Just("'it\\'s /* */'".to_string()),
        Just("\\\"".to_string()),
        "[a-z{}:; \n]{0,8}",
    ]
}

fn css_soup() -> impl Strategy<Value = String> {
    proptest::collection::vec(css_fragment(), 0..12).prop_map(|parts| parts.concat())
}

fn rule() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("a"), Just(".nav"), Just("#main li"), Just("p:hover")],
        prop_oneof![
            Just("color: #336699"),
            Just("margin: 0 auto"),
            Just("padding: 1px 2px 1px 2px"),
            Just("font-weight: bold"),
            Just("background: #fff url(x.png) no-repeat"),
        ],
    )
        .prop_map(|(sel, decl)| format!("{sel} {{ {decl}; }}\n"))
}

proptest! {
    #[test]
    fn clean_is_idempotent(css in css_soup(), keep in any::<bool>()) {
        let once = strip_comments(&css, keep);
        let twice = strip_comments(&once, keep);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn minify_is_idempotent(rules in proptest::collection::vec(rule(), 1..6)) {
        let css = rules.concat();
        let once = minify_css(&css, "gen.css", Compatibility::Ie8).unwrap();
        let twice = minify_css(&once, "gen.css", Compatibility::Ie8).unwrap();
        prop_assert_eq!(once, twice);
    }
}
