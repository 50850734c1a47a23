//! # Folio CLI
//!
//! Usage:
//!   folio input.json -o output.pdf
//!   echo '{ ... }' | folio -o output.pdf
//!   folio --example > hello.json
//!
//! Set `RUST_LOG=debug` to trace object writes and font decoding.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use folio::FolioError;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), FolioError> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.pdf".to_string());

    let pdf_bytes = folio::render_json(&input)?;
    fs::write(&output_path, &pdf_bytes)?;
    eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
    Ok(())
}

fn example_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Folio example",
    "author": "Folio"
  },
  "pages": [
    {
      "size": "Letter",
      "elements": [
        {
          "type": "Text",
          "content": "Invoice INV-2026-001",
          "x": 72,
          "y": 96,
          "fontFamily": "Helvetica",
          "fontStyle": "bold",
          "fontSize": 24,
          "color": { "r": 0.1, "g": 0.1, "b": 0.15, "a": 1.0 }
        },
        {
          "type": "Text",
          "content": "Acme Corp, 123 Business St",
          "x": 72,
          "y": 124,
          "fontFamily": "Helvetica",
          "fontSize": 11,
          "color": { "r": 0.4, "g": 0.4, "b": 0.4, "a": 1.0 }
        },
        {
          "type": "Text",
          "content": "Total due: $12,960.00",
          "x": 72,
          "y": 172,
          "fontFamily": "Times",
          "fontSize": 14,
          "decoration": "Underline",
          "width": 131.6
        },
        {
          "type": "Text",
          "content": "DRAFT",
          "x": 420,
          "y": 300,
          "fontFamily": "Courier",
          "fontStyle": "bold",
          "fontSize": 36,
          "rotate": -30,
          "color": { "r": 0.8, "g": 0.1, "b": 0.1, "a": 1.0 }
        }
      ]
    }
  ]
}"##
}
