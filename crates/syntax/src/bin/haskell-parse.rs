use std::fs;

use haskell_syntax::layout::{self, LayoutMode};
use haskell_syntax::{ParseConfig, SyntaxKind, lexer, parse_with};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 && args.len() != 4 {
        println!("usage: haskell-parse [token|node|error|json] <file> [config.json]");
        return;
    }

    let text = match fs::read_to_string(&args[2]) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("cannot read {}: {err}", args[2]);
            std::process::exit(1);
        }
    };
    let config = match args.get(3).map(fs::read_to_string) {
        None => ParseConfig::default(),
        Some(Ok(json)) => match ParseConfig::from_json(&json) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        },
        Some(Err(err)) => {
            eprintln!("cannot read {}: {err}", args[3]);
            std::process::exit(1);
        }
    };

    match args[1].as_str() {
        "token" => token(&text, config.layout),
        "node" => node(&text, &config),
        "error" => error(&text, &config),
        "json" => dump_json(&text, &config),
        command => {
            eprintln!("unknown command: {command}");
            std::process::exit(1);
        }
    }
}

fn token(text: &str, mode: LayoutMode) {
    for token in layout::resolve(lexer::tokenize(text), text, mode) {
        match &token.error {
            Some(err) => println!("{:?}: Error({err})", token.range),
            None if token.is_virtual() => println!("{:?}: {:?} (virtual)", token.range, token.kind),
            None => println!("{:?}: {:?} {:?}", token.range, token.kind, token.text),
        }
    }
}

fn node(text: &str, config: &ParseConfig) {
    if let Ok(parse) = parse_with(text, SyntaxKind::Module, config) {
        print!("{}", parse.tree());
    }
}

fn error(text: &str, config: &ParseConfig) {
    if let Ok(parse) = parse_with(text, SyntaxKind::Module, config) {
        for error in parse.errors() {
            println!("{error}");
        }
    }
}

fn dump_json(text: &str, config: &ParseConfig) {
    if let Ok(parse) = parse_with(text, SyntaxKind::Module, config) {
        println!("{:#}", parse.to_json());
    }
}
