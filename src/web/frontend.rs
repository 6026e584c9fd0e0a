//! Embedded HTML/CSS/JS frontend for the medform web page.
//!
//! The page shell is a string constant; the four form containers and their
//! trigger buttons are generated from the form catalog when the page is
//! served. No external assets, no build tools, no CDN dependencies.

use crate::form::{FieldInput, FieldSpec, FormKind};

/// The complete page, with the form catalog rendered in.
pub fn index_html() -> String {
    let triggers: String = FormKind::ALL.into_iter().map(trigger_button).collect();
    let forms: String = FormKind::ALL.into_iter().map(form_container).collect();
    PAGE.replace("{{TRIGGERS}}", &triggers)
        .replace("{{FORMS}}", &forms)
}

fn trigger_button(kind: FormKind) -> String {
    format!(
        "      <button type=\"button\" class=\"trigger\" id=\"btn-{name}\" data-form=\"{name}\">{title}</button>\n",
        name = kind.name(),
        title = kind.title(),
    )
}

fn form_container(kind: FormKind) -> String {
    let fields: String = kind.fields().iter().map(field_row).collect();
    format!(
        r#"    <form class="card hidden" id="form-{name}" data-form="{name}">
      <h2>{title} <span class="model">{model}</span></h2>
      <div class="grid">
{fields}      </div>
      <button type="submit" class="submit">Predict</button>
      <div class="result" id="{result}"></div>
      <div class="probs" id="{probs}"></div>
    </form>
"#,
        name = kind.name(),
        title = kind.title(),
        model = kind.model_id(),
        result = kind.result_region_id(),
        probs = kind.probabilities_region_id(),
    )
}

fn field_row(field: &FieldSpec) -> String {
    let control = match field.input {
        FieldInput::Number => format!(
            "<input type=\"text\" inputmode=\"decimal\" name=\"{}\">",
            field.name
        ),
        FieldInput::Select { options } => {
            let options: String = options
                .iter()
                .map(|opt| format!("<option value=\"{opt}\">{opt}</option>"))
                .collect();
            format!("<select name=\"{}\">{options}</select>", field.name)
        }
    };
    format!(
        "        <label><span>{}</span>{control}</label>\n",
        field.label
    )
}

const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>medform</title>
<style>
:root {
  --bg: #f6f8fa;
  --surface: #ffffff;
  --border: #d0d7de;
  --text: #1f2328;
  --text-muted: #656d76;
  --accent: #0969da;
  --red: #cf222e;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}
:root.dark {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --red: #f85149;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 900px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }

.toggle {
  width: 44px; height: 24px;
  border-radius: 12px;
  background: var(--border);
  position: relative;
  cursor: pointer;
}
.toggle-knob {
  position: absolute; top: 3px; left: 3px;
  width: 18px; height: 18px;
  border-radius: 50%;
  background: var(--surface);
  transition: transform 0.15s;
}
.toggle-knob.toggled { transform: translateX(20px); }

.triggers { display: flex; gap: 8px; margin-bottom: 16px; }
.trigger {
  padding: 6px 14px;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  background: var(--surface);
  color: var(--text);
  cursor: pointer;
}
.trigger.active { border-color: var(--accent); color: var(--accent); }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
}
.card h2 { font-size: 18px; margin-bottom: 12px; }
.card .model { font-family: var(--mono); font-size: 12px; color: var(--text-muted); }
.grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 10px 16px; }
label { display: flex; flex-direction: column; gap: 4px; color: var(--text-muted); }
input, select {
  padding: 6px 8px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--bg);
  color: var(--text);
}
.submit {
  margin-top: 16px;
  padding: 8px 20px;
  border: none;
  border-radius: var(--radius);
  background: var(--accent);
  color: #fff;
  cursor: pointer;
  transition: transform 0.1s;
}
.submit.pressed { transform: scale(0.95); }
.result { margin-top: 14px; font-weight: 600; }
.result.failed { color: var(--red); }
.probs ul { margin: 6px 0 0; padding-left: 1rem; }
.hidden { display: none; }
#local-output { margin-top: 16px; font-family: var(--mono); font-size: 12px; }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>medform</h1>
    <div class="toggle" id="dark-toggle" role="switch" tabindex="0" aria-checked="false" aria-label="Dark mode">
      <div class="toggle-knob"></div>
    </div>
  </header>
  <nav class="triggers">
{{TRIGGERS}}  </nav>
  <main>
{{FORMS}}    <div id="local-output" class="card hidden"></div>
  </main>
</div>
<script>
// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------
const root = document.documentElement;
const toggle = document.getElementById('dark-toggle');

function setTheme(theme) {
  const isDark = theme === 'dark';
  root.classList.toggle('dark', isDark);
  toggle.setAttribute('aria-checked', String(isDark));
  toggle.querySelector('.toggle-knob').classList.toggle('toggled', isDark);
}

function flipTheme() {
  const next = root.classList.contains('dark') ? 'light' : 'dark';
  setTheme(next);
  api('PUT', '/api/theme', { theme: next }).catch(() => {});
}

toggle.addEventListener('click', flipTheme);
toggle.addEventListener('keydown', (e) => {
  if (e.key === ' ' || e.key === 'Spacebar' || e.key === 'Enter') {
    e.preventDefault();
    flipTheme();
  }
});

// ---------------------------------------------------------------------------
// Form selection
// ---------------------------------------------------------------------------
function showForm(name) {
  document.querySelectorAll('form[data-form]').forEach(f => {
    f.classList.toggle('hidden', f.dataset.form !== name);
  });
  document.querySelectorAll('.trigger').forEach(b => {
    b.classList.toggle('active', b.dataset.form === name);
  });
  document.getElementById('local-output').classList.add('hidden');
}

document.querySelectorAll('.trigger').forEach(b => {
  b.addEventListener('click', () => showForm(b.dataset.form));
});

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------
function renderProbabilities(el, labels) {
  el.innerHTML = '';
  if (!labels || labels.length === 0) return;
  const list = document.createElement('ul');
  labels.forEach(text => {
    const li = document.createElement('li');
    li.innerText = text;
    list.appendChild(li);
  });
  el.appendChild(list);
}

document.querySelectorAll('form[data-form]').forEach(form => {
  const name = form.dataset.form;
  const resultEl = document.getElementById(name + '-result');
  const probsEl = document.getElementById(name + '-result-probs');
  const btn = form.querySelector('button[type="submit"]');

  form.addEventListener('submit', (e) => {
    e.preventDefault();
    const fields = {};
    new FormData(form).forEach((v, k) => { fields[k] = v; });

    api('POST', '/api/submit/' + name, fields)
      .then(res => {
        if (res.error) throw new Error(res.error);
        resultEl.textContent = res.result;
        resultEl.classList.toggle('failed', res.failed);
        if (!res.failed) renderProbabilities(probsEl, res.probabilities);
      })
      .catch(err => {
        resultEl.textContent = 'Prediction failed: ' + (err.message || String(err));
        resultEl.classList.add('failed');
      });

    btn.classList.add('pressed');
    setTimeout(() => btn.classList.remove('pressed'), 150);
  });
});

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
api('GET', '/api/theme')
  .then(res => setTheme(res.theme))
  .catch(() => setTheme('light'));
showForm('blood');
</script>
</body>
</html>
"##;
