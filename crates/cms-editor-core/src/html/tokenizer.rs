//! Tolerant HTML fragment tokenizer.
//!
//! Produces a flat token stream and never fails: anything that does not look
//! like markup is passed through as text. Tag and attribute names are
//! lowercased, entities in text and attribute values are decoded.

use smol_str::SmolStr;

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title", "xmp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attribute {
    pub name: SmolStr,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    StartTag {
        name: SmolStr,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: SmolStr,
    },
    Text(String),
}

pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer::new(input).run()
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    text: String,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
            text: String::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(lt) = self.rest().find('<') {
            let start = self.pos;
            self.text.push_str(&self.input[start..start + lt]);
            self.pos = start + lt;

            let after = &self.rest()[1..];
            if after.starts_with("!--") {
                self.skip_comment();
            } else if after.starts_with('!') || after.starts_with('?') {
                // Doctype or processing instruction.
                self.skip_past('>');
            } else if after.starts_with('/') {
                self.end_tag();
            } else if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.start_tag();
            } else {
                self.text.push('<');
                self.pos += 1;
            }
        }
        let tail = self.rest();
        self.text.push_str(tail);
        self.pos = self.input.len();
        self.flush_text();
        self.tokens
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let decoded = html_escape::decode_html_entities(&self.text).into_owned();
        self.text.clear();
        self.tokens.push(Token::Text(decoded));
    }

    fn push(&mut self, token: Token) {
        self.flush_text();
        self.tokens.push(token);
    }

    fn skip_comment(&mut self) {
        match self.rest()[4..].find("-->") {
            Some(end) => self.pos += 4 + end + 3,
            None => self.pos = self.input.len(),
        }
    }

    fn skip_past(&mut self, ch: char) {
        match self.rest().find(ch) {
            Some(end) => self.pos += end + ch.len_utf8(),
            None => self.pos = self.input.len(),
        }
    }

    fn end_tag(&mut self) {
        // Skip "</".
        self.pos += 2;
        let name = self.read_name();
        self.skip_past('>');
        if !name.is_empty() {
            self.push(Token::EndTag { name });
        }
    }

    fn start_tag(&mut self) {
        // Skip "<".
        self.pos += 1;
        let name = self.read_name();
        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with("/>") {
                self_closing = true;
                self.pos += 2;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let attr_name = self.read_attr_name();
            if attr_name.is_empty() {
                // Unreadable byte inside a tag; step over it.
                self.advance_char();
                continue;
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attr_value()
            } else {
                String::new()
            };
            if !attrs.iter().any(|a: &Attribute| a.name == attr_name) {
                attrs.push(Attribute {
                    name: attr_name,
                    value: html_escape::decode_html_entities(&value).into_owned(),
                });
            }
        }

        let raw_text = RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing;
        self.push(Token::StartTag {
            name: name.clone(),
            attrs,
            self_closing,
        });
        if raw_text {
            self.raw_text(&name);
        }
    }

    /// Consume everything up to `</name`, emitting it as text.
    fn raw_text(&mut self, name: &str) {
        let closing = format!("</{name}");
        let rest = self.rest();
        let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
        if end > 0 {
            self.tokens.push(Token::Text(rest[..end].to_string()));
        }
        self.pos += end;
        if self.pos < self.input.len() {
            self.end_tag();
        }
    }

    fn read_name(&mut self) -> SmolStr {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        self.pos += len;
        SmolStr::new(rest[..len].to_ascii_lowercase())
    }

    fn read_attr_name(&mut self) -> SmolStr {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>' || c == '=')
            .unwrap_or(rest.len());
        self.pos += len;
        SmolStr::new(rest[..len].to_ascii_lowercase())
    }

    fn read_attr_value(&mut self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                match body.find(quote) {
                    Some(end) => {
                        self.pos += end + 2;
                        body[..end].to_string()
                    }
                    None => {
                        self.pos = self.input.len();
                        body.to_string()
                    }
                }
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += len;
                rest[..len].to_string()
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn advance_char(&mut self) {
        self.pos += self.rest().chars().next().map(char::len_utf8).unwrap_or(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str) -> Token {
        Token::StartTag {
            name: name.into(),
            attrs: Vec::new(),
            self_closing: false,
        }
    }

    fn end(name: &str) -> Token {
        Token::EndTag { name: name.into() }
    }

    #[test]
    fn test_simple_markup() {
        assert_eq!(
            tokenize("<P>Hi <b>there</b></p>"),
            vec![
                start("p"),
                Token::Text("Hi ".into()),
                start("b"),
                Token::Text("there".into()),
                end("b"),
                end("p"),
            ]
        );
    }

    #[test]
    fn test_attributes_quoting_and_entities() {
        let tokens = tokenize(r#"<a href="/x?a=1&amp;b=2" title='it&#39;s' data-x=plain hidden>"#);
        let Token::StartTag { name, attrs, .. } = &tokens[0] else {
            panic!("expected start tag, got {tokens:?}");
        };
        assert_eq!(name, "a");
        let values: Vec<_> = attrs.iter().map(|a| (a.name.as_str(), a.value.as_str())).collect();
        assert_eq!(
            values,
            vec![
                ("href", "/x?a=1&b=2"),
                ("title", "it's"),
                ("data-x", "plain"),
                ("hidden", ""),
            ]
        );
    }

    #[test]
    fn test_self_closing_and_void() {
        let tokens = tokenize(r#"<img src="a.png"/><br>"#);
        assert!(matches!(&tokens[0], Token::StartTag { name, self_closing: true, .. } if name == "img"));
        assert!(matches!(&tokens[1], Token::StartTag { name, self_closing: false, .. } if name == "br"));
    }

    #[test]
    fn test_script_content_is_raw_text() {
        assert_eq!(
            tokenize("<script>if (a < b) { go('<p>') }</SCRIPT>after"),
            vec![
                start("script"),
                Token::Text("if (a < b) { go('<p>') }".into()),
                end("script"),
                Token::Text("after".into()),
            ]
        );
    }

    #[test]
    fn test_comments_and_doctype_are_skipped() {
        assert_eq!(
            tokenize("<!DOCTYPE html><!-- note --><p>x</p>"),
            vec![start("p"), Token::Text("x".into()), end("p")]
        );
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        assert_eq!(tokenize("1 < 2 &lt; 3"), vec![Token::Text("1 < 2 < 3".into())]);
    }

    #[test]
    fn test_unterminated_input_does_not_panic() {
        for input in ["<p", "<a href=\"x", "<!-- open", "</", "<p class=", "<script>never closed", "é<ü"] {
            let _ = tokenize(input);
        }
    }
}
