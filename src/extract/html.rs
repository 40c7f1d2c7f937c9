// src/extract/html.rs
// =============================================================================
// This module pulls links out of HTML as it streams in.
//
// We drive the html5ever tokenizer directly (it is the tokenizer the scraper
// crate builds its DOM with) instead of parsing a whole document. That way
// the page is scanned chunk by chunk in a single forward pass and never has
// to be held in memory as a tree.
//
// Anchor pairing is a small state machine:
//
//   Outside --<a attrs..>--> InsideAnchor { href, text }
//   InsideAnchor --<a attrs..>--> InsideAnchor   (href replaced, text kept)
//   InsideAnchor --text--> InsideAnchor          (text appended)
//   InsideAnchor --</a>--> Outside               (link emitted)
//   Outside --</a>--> Outside                    (warning, nothing emitted)
//
// End of input and a broken body both simply stop the scan.
//
// Bytes are turned into text by an encoding_rs Decoder for whatever charset
// the server declared. The decoder keeps partial characters between chunks
// and replaces invalid bytes with U+FFFD.
// =============================================================================

use encoding_rs::{Decoder, Encoding};
use futures::{Stream, StreamExt};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::fmt::Display;
use tracing::{debug, trace, warn};

use super::link::Link;

#[derive(Debug)]
enum AnchorState {
    Outside,
    InsideAnchor { href: String, text: String },
}

// Token sink that turns anchor start/end pairs into Links
//
// Only links that pass Link::is_valid are kept.
#[derive(Debug)]
pub struct LinkScanner {
    depth: usize,
    max_depth: usize,
    state: AnchorState,
    links: Vec<Link>,
}

impl LinkScanner {
    pub fn new(depth: usize, max_depth: usize) -> Self {
        Self {
            depth,
            max_depth,
            state: AnchorState::Outside,
            links: Vec::new(),
        }
    }

    pub fn into_links(self) -> Vec<Link> {
        self.links
    }

    fn start_anchor(&mut self, tag: &Tag) {
        // <a> without attributes can't point anywhere, skip it
        if tag.attrs.is_empty() {
            return;
        }

        // First href in the tag (the tokenizer already dropped any repeats)
        let href = tag
            .attrs
            .iter()
            .find(|attr| &*attr.name.local == "href")
            .map(|attr| attr.value.trim().to_string())
            .unwrap_or_default();

        // An anchor that is still open gets replaced, its text carries over
        self.state = match std::mem::replace(&mut self.state, AnchorState::Outside) {
            AnchorState::Outside => AnchorState::InsideAnchor {
                href,
                text: String::new(),
            },
            AnchorState::InsideAnchor { href: dropped, text } => {
                trace!(href = %dropped, "Unclosed link replaced by a newer one");
                AnchorState::InsideAnchor { href, text }
            }
        };
    }

    fn push_text(&mut self, chunk: &str) {
        if let AnchorState::InsideAnchor { text, .. } = &mut self.state {
            text.push_str(chunk);
        }
    }

    fn end_anchor(&mut self) {
        match std::mem::replace(&mut self.state, AnchorState::Outside) {
            AnchorState::Outside => {
                warn!("Link end found without start");
            }
            AnchorState::InsideAnchor { href, text } => {
                let link = Link::new(&href, &text, self.depth);
                if link.is_valid(self.max_depth) {
                    debug!(%link, "Link found");
                    self.links.push(link);
                }
            }
        }
    }

    fn process_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        match tag.kind {
            TagKind::StartTag if tag.self_closing => TokenSinkResult::Continue,
            TagKind::StartTag => {
                if &*tag.name == "a" {
                    self.start_anchor(&tag);
                }
                raw_text_mode(&tag.name)
            }
            TagKind::EndTag => {
                if &*tag.name == "a" {
                    self.end_anchor();
                }
                TokenSinkResult::Continue
            }
        }
    }
}

// Elements whose contents are text, not markup. Without a tree builder the
// tokenizer has to be told to switch modes, otherwise a `<a href` inside a
// script string would look like a real link.
fn raw_text_mode(name: &str) -> TokenSinkResult<()> {
    match name {
        "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

impl TokenSink for LinkScanner {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.process_tag(tag),
            Token::CharacterTokens(text) => self.push_text(&text),
            // The tokenizer recovers from these on its own
            Token::ParseError(reason) => trace!(%reason, "HTML parse error"),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

// Feeds text or bytes into a LinkScanner one piece at a time
pub struct LinkExtractor {
    tokenizer: Tokenizer<LinkScanner>,
    input: BufferQueue,
    decoder: Decoder,
}

impl LinkExtractor {
    // Parameters:
    //   encoding: charset of the bytes passed to feed_bytes
    //   depth, max_depth: handed on to the LinkScanner
    pub fn new(encoding: &'static Encoding, depth: usize, max_depth: usize) -> Self {
        Self {
            tokenizer: Tokenizer::new(LinkScanner::new(depth, max_depth), TokenizerOpts::default()),
            input: BufferQueue::new(),
            decoder: encoding.new_decoder(),
        }
    }

    pub fn feed_bytes(&mut self, chunk: &[u8]) {
        let text = self.decode(chunk, false);
        self.feed_str(text);
    }

    // Runs one chunk through the decoder. With last = true the decoder also
    // flushes any partial character it was holding on to.
    fn decode(&mut self, chunk: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(chunk.len())
            .unwrap_or(chunk.len() * 3 + 16);
        let mut text = String::with_capacity(capacity);
        // The buffer is big enough for the worst case, so one call does it
        let (_result, _read, _replaced) = self.decoder.decode_to_string(chunk, &mut text, last);
        text
    }

    pub fn feed_str(&mut self, text: impl Into<StrTendril>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.input.push_back(text);
        // The sink never hands back a script handle, so one call drains
        // the queue
        let _ = self.tokenizer.feed(&mut self.input);
    }

    // Flushes the tokenizer and returns the links in document order
    pub fn finish(mut self) -> Vec<Link> {
        // A body cut inside a multi-byte character leaves bytes behind
        let tail = self.decode(&[], true);
        self.feed_str(tail);
        self.tokenizer.end();
        self.tokenizer.sink.into_links()
    }
}

// Extracts the valid links from a streaming response body
//
// Parameters:
//   body: the body chunks, consumed exactly once
//   encoding: charset the body is written in
//   depth: depth of the page the body belongs to
//   max_depth: links found at or past this depth are dropped
//
// A chunk error ends the scan early; whatever was found up to that point
// is still returned.
pub async fn extract_links<S, E>(
    mut body: S,
    encoding: &'static Encoding,
    depth: usize,
    max_depth: usize,
) -> Vec<Link>
where
    S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
    E: Display,
{
    let mut extractor = LinkExtractor::new(encoding, depth, max_depth);

    // Feed chunks as they arrive, stop at the first broken one
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => extractor.feed_bytes(&bytes),
            Err(e) => {
                debug!(error = %e, "Body ended early");
                break;
            }
        }
    }

    let links = extractor.finish();
    debug!(depth, count = links.len(), "Links extracted");
    links
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a TokenSink instead of scraper::Html?
//    - Html::parse_document needs the whole page up front
//    - The tokenizer accepts input piece by piece and calls process_token
//      for every tag and run of text as soon as it is complete
//
// 2. Nested or unclosed anchors
//    - HTML doesn't allow <a> inside <a>, but real pages do it anyway
//    - The newest start tag wins; text collected so far carries over, so
//      <a href="u1">one<a href="u2">two</a> yields a single link to u2
//      with the text "onetwo"
//
// 3. Duplicate attributes
//    - The tokenizer keeps only the first copy of a repeated attribute,
//      so <a href="x" href="y"> always points at x
//
// 4. Character sets
//    - encoding_rs follows the WHATWG encoding standard, the same one
//      browsers use, so "ISO-8859-1" is decoded as windows-1252
// -----------------------------------------------------------------------------
