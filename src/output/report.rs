use crate::render::{RowContent, StudentCard};

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_card(card: &StudentCard) -> String {
    let mut out = String::new();
    out.push_str("    <div class=\"student\">\n");
    out.push_str(&format!(
        "      <img class=\"image\" src=\"{}\" alt=\"\"/>\n",
        escape_html(&card.image)
    ));
    out.push_str(&format!(
        "      <h3 class=\"name\">{}</h3>\n",
        escape_html(&card.name)
    ));
    if let Some(phonetic) = card.phonetic_name.as_deref() {
        let phonetic = escape_html(phonetic);
        match card.name_recording.as_deref() {
            Some(recording) => out.push_str(&format!(
                "      <p class=\"pronunciation\"><a href=\"{}\">{phonetic}</a></p>\n",
                escape_html(recording)
            )),
            None => out.push_str(&format!(
                "      <p class=\"pronunciation\">{phonetic}</p>\n"
            )),
        }
    }
    if !card.pills.is_empty() {
        out.push_str("      <div class=\"pills\">\n");
        for pill in card.pills.iter() {
            out.push_str(&format!(
                "        <div class=\"pill\">{}</div>\n",
                escape_html(&pill.text())
            ));
        }
        out.push_str("      </div>\n");
    }
    for row in card.rows.iter() {
        let readout = match &row.content {
            RowContent::Text { value } => escape_html(value),
            RowContent::Link { href, text } => format!(
                "<a href=\"{}\">{}</a>",
                escape_html(href),
                escape_html(text)
            ),
            RowContent::Lines { lines } => lines
                .iter()
                .map(|l| escape_html(l))
                .collect::<Vec<_>>()
                .join("<br/>"),
        };
        out.push_str(&format!(
            "      <div class=\"row {key}\"><i class=\"fa fa-{icon}\"></i><p class=\"value {key}\">{readout}</p></div>\n",
            key = row.key,
            icon = row.icon,
        ));
    }
    out.push_str("    </div>\n");
    out
}

pub fn render_html(cards: &[StudentCard], base_url: &str) -> Vec<u8> {
    let body: String = cards.iter().map(render_card).collect();
    let count = cards.len();
    let base = escape_html(base_url.trim());

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <base href="{base}"/>
  <title>Student Directory</title>
  <link href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/4.7.0/css/font-awesome.min.css" rel="stylesheet"/>
  <style>
    body {{
      font-family: 'Inter', sans-serif;
      background: #f8fafc;
      color: #0f172a;
      margin: 0;
    }}
    header {{
      padding: 1rem 2rem;
      border-bottom: 1px solid #e2e8f0;
      background: #fff;
    }}
    #output {{
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(260px, 1fr));
      gap: 1rem;
      padding: 2rem;
    }}
    .student {{
      background: #fff;
      border-radius: 0.75rem;
      padding: 1rem;
      box-shadow: 0 1px 3px rgba(15, 23, 42, 0.1);
    }}
    .student .image {{
      width: 96px;
      height: 96px;
      object-fit: cover;
      border-radius: 9999px;
    }}
    .pills {{
      display: flex;
      gap: 0.25rem;
      flex-wrap: wrap;
    }}
    .pill {{
      font-size: 0.75rem;
      background: #e0e7ff;
      border-radius: 9999px;
      padding: 0.125rem 0.5rem;
    }}
    .row {{
      display: flex;
      gap: 0.5rem;
      align-items: baseline;
    }}
    .row i {{
      width: 1rem;
      color: #64748b;
    }}
    .value {{
      margin: 0.25rem 0;
    }}
    .value.leave {{
      color: #b45309;
    }}
  </style>
</head>
<body>
  <header>
    <h1>Student Directory</h1>
    <p>{count} students</p>
  </header>
  <div id="output">
{body}  </div>
</body>
</html>
"####
    );
    html.into_bytes()
}
