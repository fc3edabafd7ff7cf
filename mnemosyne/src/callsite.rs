//! Function names for call sites that only know their file and line.
//!
//! `Location` carries no function name, so the first record written from a
//! call site captures a backtrace and picks the symbol of the frame at that
//! file and line. The answer is cached per call site. Without debug info
//! nothing matches and the record simply has no function.

use once_cell::sync::Lazy;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

type Site = (&'static str, u32, u32);

static FUNCTIONS: Lazy<Mutex<HashMap<Site, Option<&'static str>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Path of the function containing `file:line`, if the current stack has it
pub(crate) fn function_at(file: &'static str, line: u32, column: u32) -> Option<&'static str> {
    let site = (file, line, column);
    if let Some(known) = lock().get(&site) {
        return *known;
    }

    let trace = Backtrace::force_capture().to_string();
    // One leaked string per call site.
    let found = find_function(&trace, file, line).map(|name| &*Box::leak(name.into_boxed_str()));
    *lock().entry(site).or_insert(found)
}

fn lock() -> std::sync::MutexGuard<'static, HashMap<Site, Option<&'static str>>> {
    FUNCTIONS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Scan a rendered backtrace for the innermost frame located at `file:line`
fn find_function(trace: &str, file: &str, line: u32) -> Option<String> {
    let wanted = format!("{}:{}:", file_name(file), line);
    let mut symbol: Option<&str> = None;

    for text in trace.lines().map(str::trim_start) {
        if let Some(location) = text.strip_prefix("at ") {
            if file_name(location).starts_with(&wanted) {
                return symbol.map(clean_symbol);
            }
        } else {
            symbol = Some(match text.split_once(": ") {
                Some((index, name)) if index.bytes().all(|b| b.is_ascii_digit()) => name,
                _ => text,
            });
        }
    }
    None
}

/// Drop the symbol hash and closure suffixes
fn clean_symbol(symbol: &str) -> String {
    let mut name = symbol.trim();
    if let Some((head, hash)) = name.rsplit_once("::h") {
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            name = head;
        }
    }
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:310:13
   1: mnemosyne::logger::Logger::log
             at ./src/logger.rs:193:13
   2: app::server::handle::{{closure}}
             at ./src/server.rs:88:9
   3: app::server::handle::h0123456789abcdef
             at ./src/server.rs:90:5
";

    #[test]
    fn test_finds_frame_by_file_and_line() {
        assert_eq!(
            find_function(TRACE, "app/src/server.rs", 90).as_deref(),
            Some("app::server::handle")
        );
        assert_eq!(
            find_function(TRACE, "app/src/server.rs", 88).as_deref(),
            Some("app::server::handle")
        );
        assert_eq!(find_function(TRACE, "app/src/server.rs", 12), None);
    }

    #[test]
    fn test_inlined_frames_without_index() {
        let trace = "   4: outer::run
             at ./src/outer.rs:10:5
      inner::step
             at ./src/inner.rs:3:9
";
        assert_eq!(find_function(trace, "src/inner.rs", 3).as_deref(), Some("inner::step"));
    }

    #[test]
    fn test_unsupported_backtrace() {
        assert_eq!(find_function("unsupported backtrace", "src/lib.rs", 1), None);
    }

    #[test]
    fn test_resolves_current_function() {
        let line = line!() + 1;
        let found = function_at(file!(), line, 0);
        assert_eq!(found, Some("mnemosyne::callsite::tests::test_resolves_current_function"));
    }
}
