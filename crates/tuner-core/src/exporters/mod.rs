pub mod jsonl_exporter;

pub use jsonl_exporter::{
    ExportError, ExportResult, examples_from_jsonl, examples_to_jsonl, read_jsonl, write_jsonl,
};
