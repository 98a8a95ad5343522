//! Thread-local parser reuse.
//!
//! Symbol lookups parse many files per call; each thread builds its Rust
//! parser once and hands it out for every subsequent parse.

use crate::ts::{RustParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static RUST_PARSER: RefCell<Option<RustParser>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's pooled parser, creating it on first use.
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut RustParser) -> R,
{
    RUST_PARSER.with(|cell| {
        let mut opt = cell.borrow_mut();
        if opt.is_none() {
            *opt = Some(RustParser::new()?);
        }
        Ok(f(opt.as_mut().expect("parser was just initialized above")))
    })
}
