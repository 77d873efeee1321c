mod history_tests;
mod render_tests;
