// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Golden vectors: byte-exact wire output for known values.
//
// Each case encodes a value, compares against the expected hex, decodes the
// bytes back and re-encodes them to check the roundtrip is stable.

#![allow(clippy::unreadable_literal)]

use num_bigint::BigInt;
use tyscale::{CodecError, Error, Registry, Value};

fn check(registry: &Registry, ty: &str, value: Value, expected_hex: &str) {
    let codec = registry.codec(ty).unwrap();
    let bytes = codec.encode(&value).unwrap();
    assert_eq!(hex::encode(&bytes), expected_hex, "encoding of {ty}");

    let decoded = codec.decode(&bytes).unwrap();
    let again = codec.encode(&decoded).unwrap();
    assert_eq!(again, bytes, "re-encoding of {ty}");
}

fn primitives() -> Registry {
    Registry::empty()
}

#[test]
fn golden_fixed_width_integers() {
    let r = primitives();
    check(&r, "u8", Value::from(0xabu8), "ab");
    check(&r, "u16", Value::from(0x0102u16), "0201");
    check(&r, "u32", Value::from(9u32), "09000000");
    check(&r, "u64", Value::from(u64::MAX), "ffffffffffffffff");
    check(&r, "i8", Value::from(-1i8), "ff");
    check(&r, "i32", Value::from(-2i32), "feffffff");
    check(&r, "i64", Value::from(i64::MIN), "0000000000000080");
    check(&r, "u128", Value::from(1u128 << 120), "00000000000000000000000000000001");
    check(
        &r,
        "i256",
        Value::BigInteger(BigInt::from(-1)),
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
    );
}

#[test]
fn golden_bool_and_str() {
    let r = primitives();
    check(&r, "bool", Value::Bool(false), "00");
    check(&r, "bool", Value::Bool(true), "01");
    check(&r, "str", Value::from(""), "00");
    check(&r, "str", Value::from("Tom"), "0c546f6d");
    check(&r, "str", Value::from("é"), "08c3a9");
}

#[test]
fn golden_compact_boundaries() {
    let r = primitives();
    let cases: &[(u128, &str)] = &[
        (0, "00"),
        (1, "04"),
        (63, "fc"),
        (64, "0101"),
        (16383, "fdff"),
        (16384, "02000100"),
        ((1 << 30) - 1, "feffffff"),
        (1 << 30, "0300000040"),
        ((1 << 32) - 1, "03ffffffff"),
        (1 << 32, "070000000001"),
        (u64::MAX as u128, "13ffffffffffffffff"),
        (u128::MAX, "33ffffffffffffffffffffffffffffffff"),
    ];
    for (value, expected) in cases {
        check(&r, "@u128", Value::from(*value), expected);
    }
}

#[test]
fn golden_sequences_and_arrays() {
    let r = primitives();
    check(&r, "[u16]", Value::list([1u16, 2, 3]), "0c010002000300");
    check(&r, "[u16; 3]", Value::list([1u16, 2, 3]), "010002000300");
    check(&r, "[u8]", Value::Bytes(vec![0xde, 0xad]), "08dead");
    check(&r, "[u8; 4]", Value::Bytes(vec![1, 2, 3, 4]), "01020304");
    check(&r, "[str]", Value::list(["a", "bc"]), "080461086263");
}

#[test]
fn golden_byte_blob_inputs_agree() {
    let codec = Registry::empty().codec("[u8]").unwrap();
    let expected = codec.encode(&Value::Bytes(b"hi".to_vec())).unwrap();
    assert_eq!(expected, [0x08, b'h', b'i']);
    for input in [
        Value::from("0x6869"),
        Value::from("hi"),
        Value::list([0x68u8, 0x69]),
    ] {
        assert_eq!(codec.encode(&input).unwrap(), expected);
    }
}

#[test]
fn golden_tuple_and_struct() {
    let r = Registry::parse("Person = {name: str, age: u32}").unwrap();
    check(
        &r,
        "Person",
        Value::map([("name", Value::from("Tom")), ("age", Value::from(9u32))]),
        "0c546f6d09000000",
    );
    check(
        &r,
        "(u8, bool, str)",
        Value::list([Value::from(1u8), Value::Bool(true), Value::from("x")]),
        "01010478",
    );
    check(&r, "()", Value::Null, "");
}

#[test]
fn golden_enum_tags() {
    let r = Registry::parse("E = <A, B: u16, C: (u8, u8), D::5, F: u8: 9>").unwrap();
    check(&r, "E", Value::variant("A", ()), "00");
    check(&r, "E", Value::variant("B", 0x0102u16), "010201");
    check(&r, "E", Value::variant("C", Value::list([3u8, 4])), "020304");
    check(&r, "E", Value::variant("D", ()), "05");
    check(&r, "E", Value::variant("F", 7u8), "0907");
}

#[test]
fn golden_native_option() {
    let r = Registry::parse("O = <_None, _Some: u32>\nS = {a: u8, b: O}").unwrap();
    check(&r, "O", Value::Null, "00");
    check(&r, "O", Value::from(7u32), "0107000000");
    check(&r, "S", Value::map([("a", 1u8)]), "0100");
    assert_eq!(
        r.codec("S").unwrap().decode(&[1, 0]).unwrap(),
        Value::map([("a", Value::from(1u8)), ("b", Value::Null)])
    );
}

#[test]
fn golden_generic_instance() {
    let r = Registry::parse("Option<T> = <None, Some: T>\nInfo<A> = {name: A}").unwrap();
    let value = Value::map([("name", Value::variant("Some", 7u32))]);
    check(&r, "Info<Option<u32>>", value, "0107000000");
    check(
        &r,
        "Info<Option<u32>>",
        Value::map([("name", Value::variant("None", ()))]),
        "00",
    );
}

#[test]
fn golden_recursive_tree() {
    let r = Registry::parse("Tree = <Leaf: u8, Node: (Tree, Tree)>").unwrap();
    let tree = Value::variant(
        "Node",
        Value::list([
            Value::variant("Leaf", 1u8),
            Value::variant("Node", Value::list([
                Value::variant("Leaf", 2u8),
                Value::variant("Leaf", 3u8),
            ])),
        ]),
    );
    check(&r, "Tree", tree, "0100010100020003");
}

#[test]
fn golden_decode_errors() {
    let r = primitives();
    let u32_codec = r.codec("u32").unwrap();
    assert_eq!(
        u32_codec.decode(&[1]),
        Err(CodecError::BufferTooSmall { need: 4, have: 1 })
    );
    assert_eq!(
        u32_codec.decode(&[1, 0, 0, 0, 0]),
        Err(CodecError::TrailingBytes(1))
    );
    assert_eq!(
        r.codec("@u32").unwrap().decode(&[0x05, 0x00]),
        Err(CodecError::NonCanonicalCompact)
    );
    assert!(matches!(
        tyscale::decode(&[3], "bool", None),
        Err(Error::Codec(CodecError::InvalidBool(3)))
    ));
}
