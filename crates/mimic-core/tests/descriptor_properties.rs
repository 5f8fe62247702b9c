//! Property tests for descriptor encoding and class-name forms
//!
//! # Running Tests
//! ```bash
//! cargo test --test descriptor_properties
//! ```

use mimic_core::{
    canonicalize, encode_method_descriptor, parse_method_descriptor, parse_parameter_types,
    ClassTable, MockClass,
};
use mimic_sdk::{Primitive, Type};
use proptest::prelude::*;

fn arb_primitive() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        Just(Primitive::Boolean),
        Just(Primitive::Char),
        Just(Primitive::Byte),
        Just(Primitive::Short),
        Just(Primitive::Int),
        Just(Primitive::Long),
        Just(Primitive::Float),
        Just(Primitive::Double),
    ]
}

fn arb_class() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::object()),
        Just(Type::string()),
        Just(Type::invocation()),
        Just(Type::class("demo.Greeter")),
        Just(Type::class("demo.inner.Clock")),
    ]
}

fn arb_param() -> impl Strategy<Value = Type> {
    let leaf = prop_oneof![arb_primitive().prop_map(Type::Primitive), arb_class()];
    leaf.prop_recursive(2, 4, 1, |inner| inner.prop_map(Type::array_of))
}

fn arb_return() -> impl Strategy<Value = Type> {
    prop_oneof![Just(Type::Void), arb_param()]
}

fn classes() -> ClassTable {
    let table = ClassTable::new();
    for name in ["demo/Greeter", "demo/inner/Clock"] {
        table.register(MockClass::builder(name).build().unwrap());
    }
    table
}

proptest! {
    /// Property: encoding N parameter types then parsing yields the same types
    #[test]
    fn prop_parameter_types_round_trip(
        params in prop::collection::vec(arb_param(), 0..8),
        ret in arb_return(),
    ) {
        let descriptor = encode_method_descriptor(&params, &ret);
        let parsed = parse_parameter_types(&descriptor, &classes()).unwrap();
        prop_assert_eq!(parsed, params);
    }

    /// Property: the return type survives encoding too
    #[test]
    fn prop_return_type_round_trip(
        params in prop::collection::vec(arb_param(), 0..4),
        ret in arb_return(),
    ) {
        let descriptor = encode_method_descriptor(&params, &ret);
        prop_assert_eq!(parse_method_descriptor(&descriptor).unwrap().ret, ret);
    }

    /// Property: canonicalize is idempotent
    #[test]
    fn prop_canonicalize_idempotent(name in "[a-zA-Z0-9_/.$]{0,32}") {
        let once = canonicalize(&name);
        prop_assert_eq!(canonicalize(&once), once.clone());
        prop_assert!(!once.contains('/'));
    }
}
