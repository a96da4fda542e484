//! # Folio CLI
//!
//! Usage:
//!   folio report.xml
//!   cat report.xml | folio
//!   folio report.json --json
//!   folio report.xml --dump
//!   folio --example > report.xml
//!
//! Renders the document through a recording device and prints the draw
//! calls per page — a quick way to inspect pagination without a printer.

use std::env;
use std::fs;
use std::io::{self, Read};

use folio::render::device::{DrawOp, RecordingDevice};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_xml());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        match fs::read_to_string(&args[1]) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("✗ Failed to read {}: {}", args[1], e);
                std::process::exit(1);
            }
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            eprintln!("✗ Failed to read stdin: {e}");
            std::process::exit(1);
        }
        buf
    };

    let mut device = RecordingDevice::new();
    let result = if args.iter().any(|a| a == "--json") {
        folio::render_json(&input, &mut device)
    } else {
        folio::render_xml(&input, &mut device)
    };

    match result {
        Ok(pages) => {
            if args.iter().any(|a| a == "--dump") {
                let dump = serde_json::to_string_pretty(device.pages())
                    .expect("recorded ops always serialize");
                println!("{dump}");
            } else {
                print_listing(&device);
            }
            eprintln!("✓ Rendered {pages} page(s)");
        }
        Err(e) => {
            eprintln!("✗ {e}");
            std::process::exit(1);
        }
    }
}

fn print_listing(device: &RecordingDevice) {
    for (index, page) in device.pages().iter().enumerate() {
        println!("── page {} ──", index + 1);
        for op in page {
            match op {
                DrawOp::Text {
                    text, font, x, y, align, ..
                } => {
                    let flat = text.replace('\n', "⏎");
                    println!(
                        "  text  ({x:8.1}, {y:8.1}) {:?} {} {}pt{}  \"{flat}\"",
                        align,
                        font.name,
                        font.size,
                        if font.bold { " bold" } else { "" },
                    );
                }
                DrawOp::Line { x1, y1, x2, y2, .. } => {
                    println!("  line  ({x1:8.1}, {y1:8.1}) → ({x2:8.1}, {y2:8.1})");
                }
                DrawOp::Ellipse {
                    x, y, width, height, ..
                } => {
                    println!("  oval  ({x:8.1}, {y:8.1}) {width:.1}×{height:.1}");
                }
            }
        }
    }
}

fn example_report_xml() -> &'static str {
    r#"<report papersize="A4" left="20" right="15" top="20" bottom="20">
  <font name="Times New Roman" size="14" bold="1">
    <text align="center" absX="88">Annual Balance 2026</text>
  </font>
  <move relY="12"/>
  <font size="8"/>
  <table lineheight="4">
    <columns lineheight="5" topline="1" bottomline="1">
      <column width="20" leftline="1">Account</column>
      <column width="60">Name</column>
      <column width="25" align="right">Opening</column>
      <column width="25" align="right">Debit</column>
      <column width="25" align="right">Credit</column>
      <column width="25" align="right" rightline="1">Balance</column>
    </columns>
    <data>
      <tr><td>100</td><td>Bank Account</td><td>1,250.00</td><td>8,400.00</td><td>7,900.00</td><td>1,750.00</td></tr>
      <tr><td>400</td><td>Salary</td><td>0.00</td><td>0.00</td><td>4,200.00</td><td>-4,200.00</td></tr>
      <tr><td>600</td><td>Rent</td><td>0.00</td><td>1,400.00</td><td>0.00</td><td>1,400.00</td></tr>
    </data>
  </table>
  <move relY="6"/>
  <rectangle relFromX="0" relFromY="0" relToX="180" relToY="10"/>
  <move relX="2" relY="3"/>
  <text>Totals carried forward.</text>
</report>
"#
}
