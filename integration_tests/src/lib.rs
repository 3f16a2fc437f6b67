//! Cross-crate integration scenarios for the Meridian world core live in
//! `tests/`; this library target exists only to anchor the package.
