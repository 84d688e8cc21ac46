#![no_main]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use libfuzzer_sys::fuzz_target;
use quarry_assist::{CompletionParser, SelectionParser};
use quarry_syntax::ParserOptions;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Derive a cursor from the raw bytes, snapped to a character boundary.
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    let mut offset = if text.is_empty() {
        0
    } else {
        (hasher.finish() as usize) % (text.len() + 1)
    };
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let cursor = offset as u32;

    // The goal is simply "never panic / never hang" on malformed input.
    let completion = CompletionParser::new(ParserOptions::default());
    let _diet = completion.diet_parse(text, cursor);
    let parse = completion.method_parse(text, cursor);
    let _ = parse.unit.to_display_string();

    let selection = SelectionParser::new(ParserOptions::default());
    let _ = selection.select(text, cursor, cursor);
});
