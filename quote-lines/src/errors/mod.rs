pub mod quote_lines_error;
