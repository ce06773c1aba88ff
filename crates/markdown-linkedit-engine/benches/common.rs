// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "Paragraph with a [link](https://example.com) and some content.\n\nAnother line with <https://docs.rs> inside.\n\n";
    base.repeat(size)
}
