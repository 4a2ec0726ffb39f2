//! Info command implementation

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::models::{split_path, LibraryDesc, SpriteSource};
use crate::parser::SpriteBook;
use crate::registry::Registry;

use super::{open_book, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Debug, Serialize)]
struct EntryInfo {
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookInfo {
    palette_size: usize,
    digit_size: usize,
    filters: Vec<String>,
    entries: Vec<EntryInfo>,
}

fn collect_entries(desc: &LibraryDesc, path: &mut Vec<String>, out: &mut Vec<EntryInfo>) {
    match desc {
        LibraryDesc::Group(children) => {
            for (key, child) in children {
                let depth = path.len();
                path.extend(split_path(key));
                collect_entries(child, path, out);
                path.truncate(depth);
            }
        }
        LibraryDesc::Source(source) => {
            let target = match source {
                SpriteSource::Same { path } => Some(path.clone()),
                SpriteSource::Filter { path, filter } => Some(format!("{} @{}", path, filter)),
                SpriteSource::Multiple { direction, parts } => {
                    Some(format!("{} [{}]", direction, parts.keys().cloned().collect::<Vec<_>>().join(", ")))
                }
                SpriteSource::Literal(_) => None,
            };
            out.push(EntryInfo { name: path.join("."), kind: source.kind(), target });
        }
    }
}

fn book_info(book: &SpriteBook) -> BookInfo {
    let mut filters: Vec<String> = book.filters.names().cloned().collect();
    filters.sort();
    let mut entries = Vec::new();
    collect_entries(&book.sprites, &mut Vec::new(), &mut entries);
    BookInfo {
        palette_size: book.palette.len(),
        digit_size: book.palette.digit_size(),
        filters,
        entries,
    }
}

/// Execute the info command
pub fn run_info(book_path: &Path, json: bool) -> ExitCode {
    let book = match open_book(book_path) {
        Ok(book) => book,
        Err(code) => return code,
    };
    let info = book_info(&book);

    if json {
        return match serde_json::to_string_pretty(&info) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    println!("Palette: {} colors ({}-digit groups)", info.palette_size, info.digit_size);
    if info.filters.is_empty() {
        println!("Filters: none");
    } else {
        println!("Filters: {}", info.filters.join(", "));
    }
    println!("Entries:");
    for entry in &info.entries {
        match &entry.target {
            Some(target) => println!("  {:<24} {:<9} {}", entry.name, entry.kind, target),
            None => println!("  {:<24} {}", entry.name, entry.kind),
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
