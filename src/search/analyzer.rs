//! The **risp-html** analyzer (§4.4, §4.9): a custom tokenization pipeline
//! for HTML text fields — an HTML tag-stripping char filter feeding the
//! same simple/web-style tokenizer used for plain text, so HTML markup
//! never pollutes token matches while the stored field keeps the original
//! (already-sanitized) markup for highlighting.

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, Token, TokenStream, Tokenizer};

pub const RISP_HTML_TOKENIZER: &str = "risp-html";

/// Strip SGML-style tags, replacing each with a single space so textual
/// content on either side never gets glued together.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if in_tag => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Tokenizer pairing the HTML char-filter with the default word tokenizer.
/// Tokenizes eagerly against the stripped text so the returned stream owns
/// its tokens outright, sidestepping the borrow-of-a-temporary issue that
/// would arise from streaming over a locally stripped buffer.
#[derive(Clone, Default)]
pub struct HtmlTokenizer {
    inner: SimpleTokenizer,
}

pub struct HtmlTokenStream {
    tokens: std::vec::IntoIter<Token>,
    current: Token,
}

impl TokenStream for HtmlTokenStream {
    fn advance(&mut self) -> bool {
        match self.tokens.next() {
            Some(token) => {
                self.current = token;
                true
            }
            None => false,
        }
    }

    fn token(&self) -> &Token {
        &self.current
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.current
    }
}

impl Tokenizer for HtmlTokenizer {
    type TokenStream<'a> = HtmlTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let stripped = strip_tags(text);
        let mut tokens = Vec::new();
        {
            let mut stream = self.inner.token_stream(&stripped);
            while stream.advance() {
                tokens.push(stream.token().clone());
            }
        }
        HtmlTokenStream {
            tokens: tokens.into_iter(),
            current: Token::default(),
        }
    }
}

pub fn risp_html_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(HtmlTokenizer::default()).filter(LowerCaser).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_before_tokenizing() {
        let mut tokenizer = HtmlTokenizer::default();
        let mut stream = tokenizer.token_stream("<p>hello <b>world</b></p>");
        let mut words = Vec::new();
        while stream.advance() {
            words.push(stream.token().text.clone());
        }
        assert_eq!(words, vec!["hello", "world"]);
    }
}
