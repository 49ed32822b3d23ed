// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Randomized roundtrips: random values are generated from the descriptors
// of a registry, encoded, decoded and compared. Seeded, so failures replay.

use num_bigint::{BigInt, Sign};
use std::collections::BTreeMap;
use tyscale::{PrimitiveKind, Registry, TypeDescriptor, TypeId, Value};

const TYPES: &str = "
Option<T> = <None, Some: T>
Maybe<T> = <_None, _Some: T>
Shape = <Circle: u32, Rect: (u16, u16), Empty, Tagged::40>
Tree = <Leaf: i16, Node: (Tree, Tree)>
Record = {
    id: u64,
    label: str,
    digest: [u8; 32],
    payload: [u8],
    scores: [i32],
    nick: Maybe<str>,
    shape: Option<Shape>,
    count: @u32,
    big: @u128,
    wide: (u256, i256, i128),
    unit: (),
    flags: [bool; 3],
}
Batch = [Record]
";

const ROOTS: &[&str] = &["Record", "Batch", "Tree", "Shape", "Option<Tree>", "(u8, i8, u16, i64)"];

struct Generator<'a> {
    registry: &'a Registry,
    rng: fastrand::Rng,
}

impl Generator<'_> {
    fn int(&mut self, kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::U8 => Value::from(self.rng.u8(..)),
            PrimitiveKind::U16 => Value::from(self.rng.u16(..)),
            PrimitiveKind::U32 => Value::from(self.rng.u32(..)),
            PrimitiveKind::U64 => Value::from(self.rng.u64(..)),
            PrimitiveKind::U128 => Value::from(self.rng.u128(..)),
            PrimitiveKind::I8 => Value::from(self.rng.i8(..)),
            PrimitiveKind::I16 => Value::from(self.rng.i16(..)),
            PrimitiveKind::I32 => Value::from(self.rng.i32(..)),
            PrimitiveKind::I64 => Value::from(self.rng.i64(..)),
            PrimitiveKind::I128 => Value::from(self.rng.i128(..)),
            PrimitiveKind::U256 | PrimitiveKind::I256 => {
                let bytes: Vec<u8> = (0..32).map(|_| self.rng.u8(..)).collect();
                if kind == PrimitiveKind::U256 {
                    Value::BigInteger(BigInt::from_bytes_le(Sign::Plus, &bytes))
                } else {
                    Value::BigInteger(BigInt::from_signed_bytes_le(&bytes))
                }
            }
            PrimitiveKind::Bool | PrimitiveKind::Str => unreachable!("not an integer"),
        }
    }

    fn text(&mut self) -> String {
        let len = self.rng.usize(0..12);
        (0..len)
            .map(|_| if self.rng.u8(..10) == 0 { 'é' } else { self.rng.alphanumeric() })
            .collect()
    }

    fn bytes(&mut self, len: usize) -> Value {
        Value::Bytes((0..len).map(|_| self.rng.u8(..)).collect())
    }

    fn is_u8(&self, id: TypeId) -> bool {
        self.registry.descriptor(id) == Some(TypeDescriptor::Primitive(PrimitiveKind::U8))
    }

    fn value(&mut self, id: TypeId, depth: usize) -> Value {
        let desc = self.registry.descriptor(id).unwrap();
        match desc {
            TypeDescriptor::Primitive(PrimitiveKind::Bool) => Value::Bool(self.rng.bool()),
            TypeDescriptor::Primitive(PrimitiveKind::Str) => Value::Text(self.text()),
            TypeDescriptor::Primitive(kind) => self.int(kind),
            TypeDescriptor::Compact(inner) => {
                let Some(TypeDescriptor::Primitive(kind)) = self.registry.descriptor(inner) else {
                    panic!("compact over non-primitive");
                };
                // bias toward the mode boundaries
                match self.rng.u8(..4) {
                    0 => Value::from(self.rng.u64(..64)),
                    1 => Value::from(self.rng.u64(64..1 << 14)),
                    _ => self.int(kind),
                }
            }
            TypeDescriptor::Sequence(element) if self.is_u8(element) => {
                let len = self.rng.usize(0..80);
                self.bytes(len)
            }
            TypeDescriptor::Array { element, len } if self.is_u8(element) => self.bytes(len),
            TypeDescriptor::Sequence(element) => {
                let len = if depth > 3 { 0 } else { self.rng.usize(0..4) };
                Value::List((0..len).map(|_| self.value(element, depth + 1)).collect())
            }
            TypeDescriptor::Array { element, len } => {
                Value::List((0..len).map(|_| self.value(element, depth + 1)).collect())
            }
            TypeDescriptor::Tuple(members) if members.is_empty() => Value::Null,
            TypeDescriptor::Tuple(members) => {
                Value::List(members.iter().map(|&m| self.value(m, depth + 1)).collect())
            }
            TypeDescriptor::Struct(fields) => {
                let map: BTreeMap<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.clone(), self.value(f.ty, depth + 1)))
                    .collect();
                Value::Map(map)
            }
            TypeDescriptor::Enum(e) => {
                if let Some(payload) = e.native_option() {
                    return if self.rng.bool() {
                        Value::Null
                    } else {
                        self.value(payload, depth + 1)
                    };
                }
                // deep recursion: stick to the first variant
                let variant = if depth > 6 {
                    &e.variants[0]
                } else {
                    &e.variants[self.rng.usize(..e.variants.len())]
                };
                let payload = match variant.payload {
                    Some(p) => self.value(p, depth + 1),
                    None => Value::Null,
                };
                Value::variant(variant.name.clone(), payload)
            }
        }
    }
}

#[test]
fn random_roundtrips() {
    let registry = Registry::parse(TYPES).unwrap();
    let mut generator = Generator {
        registry: &registry,
        rng: fastrand::Rng::with_seed(0x5ca1e),
    };

    for root in ROOTS {
        let codec = registry.codec(*root).unwrap();
        for round in 0..200 {
            let value = generator.value(codec.type_id(), 0);
            let bytes = codec.encode(&value).unwrap();
            let decoded = codec
                .decode(&bytes)
                .unwrap_or_else(|e| panic!("{root} round {round}: {e}"));
            assert_eq!(decoded, value, "{root} round {round}");
            assert_eq!(codec.encode(&decoded).unwrap(), bytes, "{root} round {round}");
        }
    }
}

#[test]
fn truncated_input_never_panics() {
    let registry = Registry::parse(TYPES).unwrap();
    let codec = registry.codec("Batch").unwrap();
    let mut generator = Generator {
        registry: &registry,
        rng: fastrand::Rng::with_seed(7),
    };
    for _ in 0..20 {
        let bytes = codec.encode(&generator.value(codec.type_id(), 0)).unwrap();
        for cut in 0..bytes.len() {
            assert!(codec.decode(&bytes[..cut]).is_err(), "prefix of {cut} bytes decoded");
        }
    }
}

#[test]
fn random_garbage_is_rejected_or_consistent() {
    let registry = Registry::parse(TYPES).unwrap();
    let mut rng = fastrand::Rng::with_seed(42);
    for root in ROOTS {
        let codec = registry.codec(*root).unwrap();
        for _ in 0..300 {
            let len = rng.usize(0..64);
            let bytes: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
            if let Ok((value, used)) = codec.decode_prefix(&bytes) {
                // accepted input must be canonical
                assert_eq!(codec.encode(&value).unwrap(), &bytes[..used]);
            }
        }
    }
}
