use super::*;
use proptest::prelude::*;

#[test]
fn pointer_joins_and_escapes_tokens() {
    let tokens = vec!["screen".to_owned(), "vm".to_owned(), "a/b~c".to_owned()];
    assert_eq!(pointer(&tokens), "/screen/vm/a~1b~0c");
}

#[test]
fn parse_pointer_rejects_missing_leading_slash() {
    assert_eq!(parse_pointer("foo"), Err(CoreError::InvalidPointer("foo".to_owned())));
}

#[test]
fn parse_pointer_accepts_empty_string_as_root() {
    assert_eq!(parse_pointer(""), Ok(Vec::new()));
}

#[test]
fn parse_pointer_rejects_bare_tilde() {
    assert_eq!(parse_pointer("/a~b"), Err(CoreError::InvalidEscape("/a~b".to_owned())));
}

#[test]
fn parse_pointer_rejects_unknown_escape() {
    assert_eq!(parse_pointer("/a~9"), Err(CoreError::InvalidEscape("/a~9".to_owned())));
}

#[test]
fn patch_op_path_returns_inner_path_for_every_variant() {
    let add = PatchOp::add(&["a".to_owned()], Value::Bool(true));
    let remove = PatchOp::remove(&["a".to_owned()]);
    let replace = PatchOp::replace(&["a".to_owned()], Value::Bool(false));
    assert_eq!(add.path(), "/a");
    assert_eq!(remove.path(), "/a");
    assert_eq!(replace.path(), "/a");
}

proptest! {
    #[test]
    fn pointer_round_trip(tokens in proptest::collection::vec("[a-zA-Z0-9_-]+", 0..8)) {
        let built = pointer(&tokens);
        prop_assert_eq!(parse_pointer(&built).unwrap(), tokens);
    }

    #[test]
    fn unescape_round_trip(s in ".*") {
        prop_assert_eq!(unescape_token(&escape_token(&s)), s);
    }
}
