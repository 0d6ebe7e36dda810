use crate::export::html::{declares_rtl, extract_body};
use crate::gateway::strip_code_fences;

const PRINT_STYLES: &str = r#"
    @page {
      size: letter;
      margin: 0.75in;
    }
    body {
      font-family: Arial, Helvetica, sans-serif;
      font-size: 11pt;
      line-height: 1.5;
      color: #000;
      margin: 0;
      padding: 0;
      -webkit-print-color-adjust: exact;
      print-color-adjust: exact;
    }
    h1 { color: #4D2B8C; font-size: 24pt; margin-top: 0; margin-bottom: 8pt; }
    h2 { color: #4D2B8C; font-size: 14pt; border-bottom: 2px solid #eee; padding-bottom: 4px; margin-top: 16pt; margin-bottom: 8pt; text-transform: uppercase; }
    h3 { font-size: 12pt; font-weight: bold; margin-bottom: 4px; margin-top: 12pt; }
    p, ul { margin-top: 4px; margin-bottom: 8px; }
    li { margin-bottom: 4px; }
    h1, h2, h3, h4 {
      page-break-after: avoid;
      break-after: avoid;
    }
    ul, li, p {
      page-break-inside: avoid;
      break-inside: avoid;
    }
"#;

const PRINT_SCRIPT: &str = r#"
    window.onload = () => {
      window.focus();
      setTimeout(() => {
        window.print();
      }, 300);
    };
"#;

/// Wraps the document body in a letter-sized print stylesheet that opens the
/// browser's print dialog once loaded. Direction follows the source markup.
pub fn render_print_document(html: &str) -> String {
    let html = strip_code_fences(html);
    let dir = if declares_rtl(&html) { "rtl" } else { "ltr" };
    let body = extract_body(&html);

    format!(
        r#"<!DOCTYPE html>
<html dir="{dir}">
<head>
  <meta charset="utf-8">
  <title>Optimized Resume</title>
  <style>{PRINT_STYLES}</style>
</head>
<body>
{body}
  <script>{PRINT_SCRIPT}</script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_document_unwraps_body() {
        let out = render_print_document(
            "<!DOCTYPE html><html><head><title>AI</title></head><body><h1>Jane</h1></body></html>",
        );
        assert!(out.starts_with("<!DOCTYPE html>\n<html dir=\"ltr\">"));
        assert!(out.contains("<h1>Jane</h1>"));
        assert_eq!(out.matches("<!DOCTYPE html>").count(), 1);
        assert!(!out.contains("<title>AI</title>"));
        assert!(out.contains("size: letter"));
        assert!(out.contains("window.print()"));
    }

    #[test]
    fn test_print_document_keeps_rtl() {
        let out = render_print_document(r#"<html dir="rtl"><body><p>سيرة</p></body></html>"#);
        assert!(out.contains(r#"<html dir="rtl">"#));
    }

    #[test]
    fn test_print_document_tolerates_fences_and_missing_body() {
        let out = render_print_document("```html\n<h1>Jane</h1>\n```");
        assert!(out.contains("<h1>Jane</h1>"));
        assert!(!out.contains("```"));
    }
}
