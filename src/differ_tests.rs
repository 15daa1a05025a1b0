use super::*;
use crate::vm;

#[test]
fn diff_of_identical_trees_is_empty() {
    let a = vm! { "x" => 1_i64 };
    assert_eq!(diff(&a, &a), Vec::new());
}

#[test]
fn diff_emits_add_remove_replace() {
    let prev = vm! { "a" => 1_i64, "b" => "keep" };
    let next = vm! { "b" => "keep", "c" => true };
    let ops = diff(&prev, &next);
    assert_eq!(
        ops,
        vec![PatchOp::remove(&["a".to_owned()]), PatchOp::add(&["c".to_owned()], true.into())]
    );
}

#[test]
fn diff_recurses_into_nested_maps() {
    let prev = vm! { "devices" => vm! { "by_id" => vm! { "dev-1" => "Online" } } };
    let next = vm! { "devices" => vm! { "by_id" => vm! { "dev-1" => "Offline" } } };
    let ops = diff(&prev, &next);
    assert_eq!(
        ops,
        vec![PatchOp::replace(
            &["devices".to_owned(), "by_id".to_owned(), "dev-1".to_owned()],
            "Offline".into()
        )]
    );
}

#[test]
fn diff_replaces_whole_subtree_when_type_changes_from_map_to_leaf() {
    let prev = vm! { "x" => vm! { "y" => 1_i64 } };
    let next = vm! { "x" => "now a string" };
    let ops = diff(&prev, &next);
    assert_eq!(ops, vec![PatchOp::replace(&["x".to_owned()], "now a string".into())]);
}

#[test]
fn scoped_diff_on_500_row_table_touches_a_single_leaf() {
    let mut by_id = Vm::new();
    for i in 1..=500 {
        by_id.insert(format!("dev-{i}"), vm! { "status" => "Online" }.into());
    }
    let prev = vm! { "devices" => vm! { "by_id" => by_id.clone() } };
    by_id.insert("dev-250".to_owned(), vm! { "status" => "Offline (2m)" }.into());
    let next = vm! { "devices" => vm! { "by_id" => by_id } };

    let ops = diff_at_paths(&prev, &next, &[vec!["devices".to_owned()]]);
    assert_eq!(
        ops,
        vec![PatchOp::replace(
            &["devices".to_owned(), "by_id".to_owned(), "dev-250".to_owned(), "status".to_owned()],
            "Offline (2m)".into()
        )]
    );
}

#[test]
fn scoped_diff_ignores_paths_outside_the_given_set() {
    let prev = vm! { "a" => 1_i64, "b" => 1_i64 };
    let next = vm! { "a" => 2_i64, "b" => 2_i64 };
    let ops = diff_at_paths(&prev, &next, &[vec!["a".to_owned()]]);
    assert_eq!(ops, vec![PatchOp::replace(&["a".to_owned()], 2_i64.into())]);
}

#[test]
fn scoped_diff_treats_missing_intermediate_nodes_as_absent() {
    let prev = vm! { "a" => 1_i64 };
    let next = vm! { "b" => 1_i64 };
    let ops = diff_at_paths(&prev, &next, &[vec!["missing".to_owned()]]);
    assert_eq!(ops, Vec::new());
}

#[test]
fn scoped_diff_root_path_falls_back_to_unscoped() {
    let prev = vm! { "a" => 1_i64 };
    let next = vm! { "a" => 2_i64 };
    assert_eq!(diff_at_paths(&prev, &next, &[vec![]]), diff(&prev, &next));
}
