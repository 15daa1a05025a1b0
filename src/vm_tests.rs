use super::*;

#[test]
fn vm_macro_builds_sorted_map() {
    let m = vm! {
        "zebra" => "z",
        "alpha" => 1_i64,
    };
    let keys: Vec<&String> = m.keys().collect();
    assert_eq!(keys, vec!["alpha", "zebra"]);
}

#[test]
fn numeric_type_distinction_is_not_equal() {
    assert_ne!(Value::Int(1), Value::Double(1.0));
}

#[test]
fn list_conversion_maps_each_element() {
    let v: Value = vec!["a", "b"].into();
    assert_eq!(v, Value::List(vec![Value::String("a".into()), Value::String("b".into())]));
}
