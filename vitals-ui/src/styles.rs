#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-vitals-ui]";

/// Default CSS for the form and report, with overridable design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --vitals-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --vitals-bg: #ffffff;
  --vitals-surface: #f8fafc;
  --vitals-card-border: rgba(148, 163, 184, 0.28);
  --vitals-radius: 14px;
  --vitals-text: #1f2933;
  --vitals-muted: #52606d;
  --vitals-heading: #11181c;
  --vitals-accent: #2563eb;
  --vitals-warning-bg: rgba(220, 104, 3, 0.12);
  --vitals-warning-text: #b54708;
  --vitals-error-bg: rgba(180, 35, 24, 0.1);
  --vitals-error-text: #b42318;
  --vitals-risk-high: red;
  --vitals-risk-medium: orange;
  --vitals-risk-low: green;
}

.vitals-root {
  display: grid;
  grid-template-columns: minmax(240px, 300px) 1fr;
  gap: 24px;
  font-family: var(--vitals-font-family);
  color: var(--vitals-text);
  background: var(--vitals-bg);
}

.vitals-sidebar,
.vitals-card {
  background: var(--vitals-surface);
  border: 1px solid var(--vitals-card-border);
  border-radius: var(--vitals-radius);
  padding: 18px;
}

.vitals-sidebar h2,
.vitals-card h2,
.vitals-card h3 {
  color: var(--vitals-heading);
  margin: 0 0 12px;
}

.vitals-field {
  display: flex;
  flex-direction: column;
  gap: 4px;
  margin-bottom: 12px;
}

.vitals-field label {
  font-size: 0.85rem;
  color: var(--vitals-muted);
}

.vitals-field input,
.vitals-field select {
  padding: 6px 8px;
  border: 1px solid var(--vitals-card-border);
  border-radius: 8px;
  font: inherit;
}

.vitals-mode {
  display: flex;
  flex-direction: column;
  gap: 6px;
  margin-bottom: 16px;
}

.vitals-main {
  display: flex;
  flex-direction: column;
  gap: 18px;
}

.vitals-button,
.vitals-download {
  align-self: flex-start;
  padding: 8px 16px;
  border-radius: 8px;
  border: none;
  background: var(--vitals-accent);
  color: #ffffff;
  font-weight: 600;
  text-decoration: none;
  cursor: pointer;
}

.vitals-hint {
  color: var(--vitals-muted);
  margin: 0 0 8px;
}

.vitals-warning {
  background: var(--vitals-warning-bg);
  color: var(--vitals-warning-text);
  border-radius: 8px;
  padding: 10px 12px;
}

.vitals-error {
  background: var(--vitals-error-bg);
  color: var(--vitals-error-text);
  border-radius: 8px;
  padding: 10px 12px;
}

.risk-summary {
  list-style: none;
  padding: 0;
  margin: 0 0 12px;
}

.risk-summary li {
  margin-bottom: 6px;
}

.risk-label,
.report-table td[data-level] {
  font-weight: bold;
}

[data-level="high"] {
  color: var(--vitals-risk-high);
}

[data-level="medium"] {
  color: var(--vitals-risk-medium);
}

[data-level="low"] {
  color: var(--vitals-risk-low);
}

.report-table-wrap {
  overflow-x: auto;
}

.report-table {
  border-collapse: collapse;
  width: 100%;
  font-size: 0.9rem;
}

.report-table th,
.report-table td {
  border-bottom: 1px solid var(--vitals-card-border);
  padding: 6px 8px;
  text-align: left;
  white-space: nowrap;
}

.report-generated {
  color: var(--vitals-muted);
  font-size: 0.8rem;
}

@media (max-width: 720px) {
  .vitals-root {
    grid-template-columns: 1fr;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document has no <head> element"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-vitals-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.dyn_into::<Node>()?)?;

    Ok(())
}
