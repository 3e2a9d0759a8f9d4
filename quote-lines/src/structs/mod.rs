pub mod consolidated_line;
pub mod quote_header;
pub mod raw_quote_line;
pub mod variation_record;
