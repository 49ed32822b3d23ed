// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tyscale::{Codec, Registry};

const TYPES: &str = "
Option<T> = <None, Some: T>
Maybe<T> = <_None, _Some: T>
Tree = <Leaf: u8, Node: (Tree, Tree)>
Record = {
    id: @u64,
    label: str,
    blob: [u8],
    pairs: [(i16, bool)],
    tree: Option<Tree>,
    nick: Maybe<str>,
    wide: (u256, i128),
    empty: [()],
}
";

fn codecs() -> &'static [Codec] {
    static CODECS: OnceLock<Vec<Codec>> = OnceLock::new();
    CODECS.get_or_init(|| {
        let registry = Registry::parse(TYPES).expect("fuzz types");
        ["Record", "Tree", "[Record]", "@u128"]
            .iter()
            .map(|ty| registry.codec(*ty).expect("fuzz codec"))
            .collect()
    })
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let codecs = codecs();
    let codec = &codecs[selector as usize % codecs.len()];

    // Accepted input must re-encode to the same bytes
    if let Ok((value, used)) = codec.decode_prefix(input) {
        let bytes = codec.encode(&value).expect("decoded value encodes");
        assert_eq!(bytes, &input[..used]);
    }
});
