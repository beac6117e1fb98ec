//! `ChipNotes` CLI entry point.

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::error::Error as _;

fn main() {
    if let Err(e) = chipnotes::run() {
        eprintln!("error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
