#![no_main]

use libfuzzer_sys::fuzz_target;
use quarry_syntax::{Parser, ParserOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // The goal is simply "never panic / never hang" on malformed input, in
    // every recovery configuration.
    let _diet = quarry_syntax::parse_java_diet(text);
    let _full = quarry_syntax::parse_java(text);

    let options = ParserOptions {
        statements_recovery: true,
        methods_full_recovery: true,
        ..ParserOptions::default()
    };
    let parse = Parser::new(text, options).parse();

    // Whatever came out must render deterministically.
    let _ = parse.display();
});
