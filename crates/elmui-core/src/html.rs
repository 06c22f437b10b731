//! The `index.html` shell that boots the compiled Elm application, and the
//! error overlays the development server returns in place of `main.js` and
//! `main.css` when a compiler fails.

/// Render the HTML page, exposing `env` to the application as `window.ENV`.
pub fn render_html(env: &serde_json::Value) -> String {
    // `</` inside an inline script would close the tag early.
    let env = env.to_string().replace("</", "<\\/");
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <link rel="stylesheet" href="main.css">
  </head>
  <body style="overflow: hidden;margin:0;">
    <script>
      window.ENV = {env}
    </script>
    <script src="main.js" type="application/javascript"></script>
    <script>Elm.Main.fullscreen();</script>
  </body>
</html>
"#
    )
}

/// A script that replaces the page with `title` and the compiler `output`.
pub fn render_js_error(title: &str, output: &str) -> String {
    let page = format!(
        "<html><style>div.elm-error {{ overflow-y: scroll; font-family: sans; position: fixed; \
         padding: 40px; color: #333; bottom: 0; right: 0; left: 0; top: 0; }} \
         h2 {{ font-size: 24px; margin: 0; }}</style>\
         <div class='elm-error'><h2>{}</h2><pre>{}</pre></div></html>",
        escape_html(title),
        escape_html(output.trim()),
    );
    let literal = serde_json::Value::String(page).to_string();
    format!("document.write({literal})\n")
}

/// A stylesheet that paints `title` and the compiler `output` over the page.
pub fn render_css_error(title: &str, output: &str) -> String {
    format!(
        r#"body::before {{
  font-family: sans-serif;
  content: "{}";
  font-weight: bold;
  background: white;
  position: fixed;
  font-size: 24px;
  padding: 40px;
  color: #333;
  right: 0;
  left: 0;
  top: 0;
}}

body::after {{
  content: "{}";
  font-family: monospace;
  background: white;
  line-height: 25px;
  white-space: pre;
  position: fixed;
  font-size: 13px;
  display: block;
  color: #333;
  top: 90px;
  bottom: 0;
  right: 0;
  left: 0;
  padding: 40px;
  padding-top: 0;
}}
"#,
        css_string(title),
        css_string(output.trim())
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Body of a double-quoted CSS string; newlines become `\A`.
fn css_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\A ")
}
