pub mod history_tests;
