// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Generic declarations: instantiation, sharing, recursion and the errors
// reported through the public API.

use std::sync::Arc;
use std::thread;
use tyscale::{Error, Registry, ResolveError, TypeDescriptor, Value};

const TYPES: &str = r#"
// containers
Option<T> = <None, Some: T>
Result<T, E> = <Ok: T, Err: E>
Pair<A, B> = (A, B)
List<T> = <Nil, Cons: (T, List<T>)>

// concrete users
Account = {
    owner: str,
    balance: Option<u128>,
    history: [Result<u64, str>],
}
Point = Pair<i32, i32>
"#;

fn registry() -> Registry {
    Registry::parse(TYPES).unwrap()
}

fn inner_error(err: Error) -> ResolveError {
    match err {
        Error::Resolve(ResolveError::InDefinition { source, .. }) => *source,
        Error::Resolve(other) => other,
        other => panic!("Expected resolution error, got {other}"),
    }
}

#[test]
fn instances_are_shared() {
    let r = registry();
    let account = r.descriptor(r.lookup("Account").unwrap()).unwrap();
    let balance = account.field("balance").unwrap().ty;
    assert_eq!(r.resolve("Option<u128>").unwrap(), balance);
    assert_eq!(r.render(balance), "Option<u128>");

    // the same instance through a different spelling of its argument
    let r2 = Registry::parse(&format!("{TYPES}\nBig = u128\nB = Option<Big>")).unwrap();
    assert_eq!(r2.lookup("B"), r2.resolve("Option<u128>").ok());
}

#[test]
fn multi_parameter_instances() {
    let r = registry();
    let point = r.lookup("Point").unwrap();
    let TypeDescriptor::Tuple(members) = r.descriptor(point).unwrap() else {
        panic!("Expected tuple");
    };
    assert_eq!(members.len(), 2);
    assert_eq!(members[0], members[1]);

    let codec = r.codec("Point").unwrap();
    let bytes = codec.encode(&Value::list([-1i32, 2])).unwrap();
    assert_eq!(bytes, [0xff, 0xff, 0xff, 0xff, 2, 0, 0, 0]);
}

#[test]
fn nested_instances_encode() {
    let r = registry();
    let codec = r.codec("Account").unwrap();
    let account = Value::map([
        ("owner", Value::from("ann")),
        ("balance", Value::variant("Some", u128::MAX)),
        (
            "history",
            Value::list([
                Value::variant("Ok", 5u64),
                Value::variant("Err", "late"),
            ]),
        ),
    ]);
    let bytes = codec.encode(&account).unwrap();

    let mut expected = vec![0x0c, b'a', b'n', b'n', 0x01];
    expected.extend([0xff; 16]);
    expected.extend([0x08, 0x00, 5, 0, 0, 0, 0, 0, 0, 0]);
    expected.extend([0x01, 0x10, b'l', b'a', b't', b'e']);
    assert_eq!(bytes, expected);
    assert_eq!(codec.decode(&bytes).unwrap(), account);
}

#[test]
fn recursive_generic_list() {
    let r = registry();
    let codec = r.codec("List<u8>").unwrap();
    let list = Value::variant(
        "Cons",
        Value::list([
            Value::from(1u8),
            Value::variant(
                "Cons",
                Value::list([Value::from(2u8), Value::variant("Nil", ())]),
            ),
        ]),
    );
    let bytes = codec.encode(&list).unwrap();
    assert_eq!(bytes, [1, 1, 1, 2, 0]);
    assert_eq!(codec.decode(&bytes).unwrap(), list);
}

#[test]
fn instance_of_instance() {
    let r = registry();
    let codec = r.codec("Option<Option<bool>>").unwrap();
    let value = Value::variant("Some", Value::variant("None", ()));
    assert_eq!(codec.encode(&value).unwrap(), [1, 0]);
    assert_eq!(r.render(codec.type_id()), "Option<Option<bool>>");
}

#[test]
fn lazy_instances_do_not_disturb_existing_ids() {
    let r = registry();
    let before: Vec<_> = r.names();
    let len = r.len();
    r.resolve("Result<Pair<u8, str>, List<bool>>").unwrap();
    assert!(r.len() > len);
    assert_eq!(r.names(), before);
}

#[test]
fn arity_and_usage_errors() {
    let r = registry();
    assert_eq!(
        inner_error(r.resolve("Pair<u8>").unwrap_err()),
        ResolveError::GenericArity {
            name: "Pair".into(),
            expected: 2,
            found: 1,
        }
    );
    assert!(matches!(
        inner_error(r.resolve("Option").unwrap_err()),
        ResolveError::MissingTypeArguments(_)
    ));
    assert!(matches!(
        inner_error(r.resolve("Account<u8>").unwrap_err()),
        ResolveError::NotGeneric(_)
    ));
    assert!(matches!(
        inner_error(r.resolve("Option<Nope>").unwrap_err()),
        ResolveError::UnknownType(_)
    ));
}

#[test]
fn unbounded_expansion_is_rejected() {
    let r = Registry::parse("Grow<T> = <Stop, More: Grow<(T, T)>>").unwrap();
    let err = r.resolve("Grow<u8>").unwrap_err();
    assert!(matches!(
        inner_error(err),
        ResolveError::InstantiationTooDeep(_)
    ));
}

#[test]
fn concurrent_lazy_resolution() {
    let r = Arc::new(registry());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let r = Arc::clone(&r);
            thread::spawn(move || {
                let ty = if i % 2 == 0 { "Option<u16>" } else { "List<Option<u16>>" };
                let codec = r.codec(ty).unwrap();
                codec.type_id()
            })
        })
        .map(|h| h.join().unwrap())
        .collect();

    assert_eq!(handles[0], handles[2]);
    assert_eq!(handles[1], handles[3]);
    assert_eq!(r.resolve("Option<u16>").unwrap(), handles[0]);
}
