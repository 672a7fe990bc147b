//! Landing page listing the known symptoms.

use axum::extract::State;
use axum::response::Html;

use crate::api::types::AppState;

/// `GET /`: symptom picker page
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.predictor.schema().names()))
}

fn render_index(symptoms: &[String]) -> String {
    let mut options = String::new();
    for symptom in symptoms {
        let escaped = escape_html(symptom);
        options.push_str(&format!(
            "      <li><label><input type=\"checkbox\" name=\"symptom\" value=\"{escaped}\"> {}</label></li>\n",
            escape_html(&symptom.replace('_', " "))
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Symptom checker</title>
</head>
<body>
  <h1>Symptom checker</h1>
  <p>Select your symptoms or send them to <code>POST /chat</code> as a comma-separated message.</p>
  <form id="symptoms">
    <ul>
{options}    </ul>
  </form>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
