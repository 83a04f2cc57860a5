#![no_main]

use haskell_syntax::{ParseConfig, SyntaxKind, layout::LayoutMode, parse, parse_with};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let parse = parse(text);
    assert_eq!(parse.tree().root().text(), text);
    assert_eq!(
        parse.errors().len(),
        parse.tree().root().descendants().filter(|n| n.is_error()).count()
    );

    let config = ParseConfig {
        layout: LayoutMode::None,
        ..ParseConfig::default()
    };
    let _ = parse_with(text, SyntaxKind::Cdecls, &config);
});
