mod walk;

pub use walk::{build_size_to_files_map, is_pdf, list_source_pdfs};
