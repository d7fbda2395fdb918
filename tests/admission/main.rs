// tests/admission/main.rs

// test modules
mod concurrency_tests;
mod quota_tests;
mod reclaimer_tests;
