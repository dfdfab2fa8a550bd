use ego_tree::NodeRef;
use scraper::{Html, Node};

// Elements removed together with their content before text extraction.
const PRUNED: [&str; 3] = ["br", "ul", "li"];

/// Strip markup from a free-text field. The input may be HTML, plain text, or
/// empty; the output never contains tags. Text nodes outside pruned elements
/// are trimmed and joined with single spaces. Parsing is recovering, so
/// malformed markup degrades to best-effort extraction instead of failing.
pub fn clean(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut parts: Vec<String> = Vec::new();
    collect_text(fragment.tree.root(), &mut parts);
    parts.join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, parts: &mut Vec<String>) {
    match node.value() {
        Node::Element(el) if PRUNED.contains(&el.name()) => return,
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
        _ => {}
    }
    for child in node.children() {
        collect_text(child, parts);
    }
}
