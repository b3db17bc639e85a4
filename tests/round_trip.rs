use filterspec::dsl::Logic;
use filterspec::{Filter, parse, render};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Filter> {
    (
        "[a-z][a-z0-9_.]{0,6}",
        "[a-z]{1,10}",
        "[A-Za-z0-9 ,:.-]{1,8}",
    )
        .prop_map(|(field, op, value)| Filter::leaf(field, op, value))
}

fn tree() -> impl Strategy<Value = Filter> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        (
            prop_oneof![Just(Logic::And), Just(Logic::Or)],
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(logic, children)| Filter::group(logic, children))
    })
}

proptest! {
    #[test]
    fn parse_inverts_render(tree in tree()) {
        let text = render(Some(&tree));
        let parsed = parse(&text).unwrap();
        prop_assert_eq!(parsed, Some(tree.simplify()));
    }

    #[test]
    fn render_is_idempotent(tree in tree()) {
        let text = render(Some(&tree));
        let reparsed = parse(&text).unwrap();
        prop_assert_eq!(render(reparsed.as_ref()), text);
    }
}
