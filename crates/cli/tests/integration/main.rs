mod common;
mod hook_tests;
mod info_tests;
mod run_tests;
