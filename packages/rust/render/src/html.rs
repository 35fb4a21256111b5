//! Assembly of a [`PaperDocument`] into the simple HTML the PDF engine
//! consumes. Kept deliberately flat: headings, paragraphs, and a references
//! block, no CSS beyond a font family.

use paperforge_shared::PaperDocument;

/// Render the document as a minimal HTML page, escaping all generated text.
/// Deterministic: identical documents produce identical output.
pub fn document_html(doc: &PaperDocument) -> String {
    let mut html = String::new();
    html.push_str(
        "<!DOCTYPE html><html><head><style>body { font-family: sans-serif; }</style></head><body>",
    );

    html.push_str(&format!("<h1>{}</h1>", escape(&doc.title)));

    for section in &doc.sections {
        html.push_str(&format!("<h2>{}</h2>", escape(&section.heading)));
        // Blank lines in generated prose become paragraph breaks.
        for paragraph in section.body.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            html.push_str(&format!("<p>{}</p>", escape(paragraph)));
        }
    }

    if !doc.references.is_empty() {
        html.push_str("<h2>References</h2>");
        for reference in &doc.references {
            html.push_str(&format!("<p>{}</p>", escape(&reference.label)));
        }
    }

    if !doc.tools_used.is_empty() {
        html.push_str("<h2>Research Tools</h2>");
        for tool in &doc.tools_used {
            html.push_str(&format!("<p>• {}</p>", escape(tool)));
        }
    }

    html.push_str("</body></html>");
    html
}

/// Escape text for HTML element content and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
