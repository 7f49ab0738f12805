//! Cross-module tests against in-memory backends

mod common;
mod test_directory;
mod test_poller;
mod test_scripts;
