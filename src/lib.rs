#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::errors::errors::{Error, ErrorTip, Warning};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A location in the source: byte offset, 1-based line and file name.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(offset: u32, line: u32, file: Rc<String>) -> Self {
        Position { offset, line, file }
    }

    pub fn null() -> Self {
        Position::new(0, 0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Finds the line containing `position` in `source`.
///
/// Returns the line number, the text of the line and the column of the
/// position inside it, or `None` when the position lies past the end.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = pos - start;
            return Some((line_number, line.to_string(), line_pos));
        }

        start = end;
        line_number += 1;
    }

    None
}

pub fn display_error(error: &Error, source: &str) {
    /*
        SemanticError: TypeMismatch (message)
        -> final.pcl:20
           |
        20 | x := 3.5;
           | -----^
    */

    if let ErrorTip::None = error.get_tip() {
        eprintln!("{}: {}", error.get_error_class(), error.get_error_name());
    } else {
        eprintln!(
            "{}: {} ({})",
            error.get_error_class(),
            error.get_error_name(),
            error.get_tip()
        );
    }

    display_excerpt(error.get_position(), source);
}

pub fn display_warning(warning: &Warning, source: &str) {
    eprintln!("Warning: {} ({})", warning.get_warning_name(), warning);
    display_excerpt(warning.get_position(), source);
}

fn display_excerpt(position: &Position, source: &str) {
    eprintln!("-> {}:{}", position.file, position.line);

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.offset) else {
        return;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    const SOURCE: &str = "program p;\nvar x : integer;\nbegin\n  x := 1\nend.\n";

    #[test]
    fn test_get_line_at_position() {
        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 4).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "program p;\n");
        assert_eq!(line_pos, 4);

        let (line_number, line, line_pos) = super::get_line_at_position(SOURCE, 36).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "  x := 1\n");
        assert_eq!(line_pos, 2);
    }

    #[test]
    fn test_get_line_past_end() {
        assert!(super::get_line_at_position(SOURCE, 500).is_none());
    }

    #[test]
    fn test_remove_starting_whitespace() {
        let (text, removed) = super::remove_starting_whitespace("    goto l");
        assert_eq!(text, "goto l");
        assert_eq!(removed, 4);
    }
}
