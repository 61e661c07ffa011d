//! CLI commands

pub mod generate;
pub mod inspect;

use chartify_convert::Registry;

/// The default processors, plus the catch-all when `generic` is set
pub fn registry(generic: bool) -> Registry {
    let registry = Registry::with_defaults();
    if generic {
        registry.with_generic()
    } else {
        registry
    }
}
