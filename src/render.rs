//! HTML rendering helpers shared by all wizard pages.
//!
//! Generated text is treated as Markdown and converted for display only;
//! user-entered values echoed into pages go through [`escape_html`].

use pulldown_cmark::{Options, Parser, html};

/// Convert generated Markdown to display HTML (headings, emphasis, lists).
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Escape a user-entered value for embedding in HTML.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared document chrome.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <style>{STYLE}</style>\n\
         </head>\n\
         <body>\n\
         <main>\n{body}\n</main>\n\
         </body>\n\
         </html>\n",
        title = escape_html(title),
    )
}

/// Inline error box shown above the active stage.
pub fn error_box(message: &str) -> String {
    format!(
        "<div class=\"error\"><strong>Error:</strong> {}</div>",
        escape_html(message)
    )
}

/// Dark panel holding a rendered result. `heading_html` is trusted markup
/// built by the caller; `markdown` is the raw generated text.
pub fn result_box(heading_html: &str, markdown: &str) -> String {
    format!(
        "<div class=\"result\"><h2>{heading_html}</h2>{}</div>",
        markdown_to_html(markdown)
    )
}

/// Render a `<select>` option list with an empty placeholder entry,
/// re-selecting `selected` when it is one of `options`.
pub fn options_html(placeholder: &str, options: &[&str], selected: Option<&str>) -> String {
    let mut out = format!("<option value=\"\">-- {} --</option>", escape_html(placeholder));
    for option in options {
        let marker = if selected == Some(*option) { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{v}\"{marker}>{v}</option>",
            v = escape_html(option)
        ));
    }
    out
}

const STYLE: &str = "\
body{background:#f3f4f6;color:#1f2937;font-family:system-ui,sans-serif;margin:0}\
main{max-width:800px;margin:auto;padding:2rem}\
textarea,select,input{width:100%;box-sizing:border-box;margin-bottom:1rem;padding:.5rem;\
border:1px solid #ccc;border-radius:4px;font:inherit}\
select{width:auto}\
button{padding:.75rem 1.5rem;border:none;border-radius:4px;font-size:1rem;\
background:#007bff;color:#fff;cursor:pointer}\
button.submit{background:#28a745}\
.error{color:red;border:1px solid red;padding:1rem;border-radius:4px;\
background:#ffebee;margin-top:1rem}\
.result{margin-top:2rem;border:1px solid #333;padding:1.5rem;border-radius:8px;\
background:#1a1a1a;color:#f0f0f0;line-height:1.7}\
.result h2{color:#fff;border-bottom:1px solid #444;padding-bottom:.5rem}\
a.wizard{display:block;margin:.5rem 0;background:#3b82f6;color:#fff;\
padding:.75rem 1.5rem;border-radius:9999px;text-decoration:none;text-align:center}\
";
