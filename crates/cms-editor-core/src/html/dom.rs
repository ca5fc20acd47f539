//! Minimal DOM tree built from the token stream.
//!
//! The builder keeps a stack of open elements and repairs what it can:
//! void elements never take children, a new block closes an open `<p>`, a new
//! `<li>` closes the previous item of the same list, end tags with no
//! matching open element are ignored and everything still open at the end of
//! input is closed. Start tags nested deeper than [`MAX_OPEN_ELEMENTS`] are
//! ignored and their content goes to the deepest open element.

use smol_str::SmolStr;

use super::tokenizer::{Attribute, Token};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Deepest nesting the builder keeps. Importing and dropping the tree recurse
/// once per level.
pub(crate) const MAX_OPEN_ELEMENTS: usize = 256;

/// Elements whose start tag implies `</p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: SmolStr,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(name: SmolStr, attrs: Vec<Attribute>) -> Self {
        Self {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of one property from the inline `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<&str> {
        self.attr("style")?
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Build the top-level node list of a fragment.
pub(crate) fn build(tokens: Vec<Token>) -> Vec<Node> {
    let mut builder = TreeBuilder::default();
    for token in tokens {
        builder.push(token);
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn push(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.append(Node::Text(text)),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if CLOSES_PARAGRAPH.contains(&name.as_str()) {
                    self.close_open_paragraph();
                }
                if name == "li" {
                    self.close_open_list_item();
                }
                let element = Element::new(name, attrs);
                if self_closing || VOID_ELEMENTS.contains(&element.name.as_str()) {
                    self.append(Node::Element(element));
                } else if self.open.len() >= MAX_OPEN_ELEMENTS {
                    tracing::trace!(target: "cms_editor::html", name = %element.name, "ignoring start tag nested too deep");
                } else {
                    self.open.push(element);
                }
            }
            Token::EndTag { name } => {
                if let Some(index) = self.open.iter().rposition(|el| el.name == name) {
                    self.close_to(index);
                } else if name == "p" {
                    // `</p>` with no open paragraph still produces one.
                    self.append(Node::Element(Element::new(name, Vec::new())));
                } else {
                    tracing::trace!(target: "cms_editor::html", %name, "ignoring stray end tag");
                }
            }
        }
    }

    /// Pop elements until the one at `index` (inclusive) is closed.
    fn close_to(&mut self, index: usize) {
        while self.open.len() > index {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
    }

    fn close_open_paragraph(&mut self) {
        let scope = self
            .open
            .iter()
            .rposition(|el| matches!(el.name.as_str(), "blockquote" | "li" | "td" | "th"))
            .map(|i| i + 1)
            .unwrap_or(0);
        if let Some(index) = self.open[scope..].iter().rposition(|el| el.name == "p") {
            self.close_to(scope + index);
        }
    }

    fn close_open_list_item(&mut self) {
        let scope = self
            .open
            .iter()
            .rposition(|el| matches!(el.name.as_str(), "ul" | "ol"))
            .map(|i| i + 1)
            .unwrap_or(0);
        if let Some(index) = self.open[scope..].iter().rposition(|el| el.name == "li") {
            self.close_to(scope + index);
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.close_to(0);
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::tokenizer::tokenize;

    fn parse(input: &str) -> Vec<Node> {
        build(tokenize(input))
    }

    /// Compact outline of a node list, e.g. `p(text b(text))`.
    fn outline(nodes: &[Node]) -> String {
        nodes
            .iter()
            .map(|node| match node {
                Node::Text(_) => "text".to_string(),
                Node::Element(el) if el.children.is_empty() => el.name.to_string(),
                Node::Element(el) => format!("{}({})", el.name, outline(&el.children)),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_nesting() {
        assert_eq!(outline(&parse("<p>a<b>b</b></p><p>c</p>")), "p(text b(text)) p(text)");
    }

    #[test]
    fn test_unclosed_paragraphs_are_closed_by_next_block() {
        assert_eq!(outline(&parse("<p>one<p>two<h2>three</h2>")), "p(text) p(text) h2(text)");
    }

    #[test]
    fn test_list_items_close_each_other() {
        assert_eq!(
            outline(&parse("<ul><li>a<li>b<ol><li>c</ol><li>d</ul>")),
            "ul(li(text) li(text ol(li(text))) li(text))"
        );
    }

    #[test]
    fn test_void_and_stray_end_tags() {
        assert_eq!(outline(&parse("<p>a<br>b</em></p>")), "p(text br text)");
        assert_eq!(outline(&parse("</p>")), "p");
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        assert_eq!(outline(&parse("<p><strong>bold")), "p(strong(text))");
    }

    #[test]
    fn test_misnested_inline_closes_inner_elements() {
        // `</b>` closes the open `<i>` on its way out.
        assert_eq!(outline(&parse("<p><b>x<i>y</b>z</i></p>")), "p(b(text i(text)) text)");
    }

    #[test]
    fn test_style_property() {
        let nodes = parse(r#"<span style="COLOR: red ; background-color:#fff;">x</span>"#);
        let Node::Element(span) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(span.style_property("color"), Some("red"));
        assert_eq!(span.style_property("background-color"), Some("#fff"));
        assert_eq!(span.style_property("font-weight"), None);
    }

    #[test]
    fn test_nesting_is_capped() {
        let input = format!("{}x{}", "<span>".repeat(10_000), "</span>".repeat(10_000));
        let mut nodes = parse(&input);
        let mut depth = 0;
        while let [Node::Element(el)] = nodes.as_slice() {
            depth += 1;
            nodes = el.children.clone();
        }
        assert_eq!(depth, MAX_OPEN_ELEMENTS);
        assert_eq!(nodes, vec![Node::Text("x".into())]);
    }
}
