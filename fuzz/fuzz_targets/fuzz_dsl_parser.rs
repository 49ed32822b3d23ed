// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Fuzz the definition parser alone
    let _ = tyscale::parse_definitions(text);

    // Fuzz resolution, then compile every position that resolved
    if let Ok(registry) = tyscale::Registry::parse(text) {
        for position in 0..registry.position_count() {
            if let Ok(codec) = registry.codec(position) {
                let _ = codec.decode(&[0u8; 8]);
            }
        }
    }
});
