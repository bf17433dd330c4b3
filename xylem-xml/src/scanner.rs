//! The byte-level tokenizer.
//!
//! The scanner alternates between character data and markup. Character
//! data is located with a vectorized three-byte search (`<`, `&`, `]`);
//! markup is classified by the bytes after `<`. Events are dispatched to a
//! [`TokenSink`] as byte ranges into the input — the scanner never copies
//! or decodes anything.
//!
//! Well-formedness enforcement beyond basic structure is keyed off
//! [`ParseMode`]: strict mode checks name alphabets, comment contents,
//! `]]>` in text, entity references, attribute uniqueness and the
//! root/DOCTYPE position rules; lenient mode suppresses those and keeps
//! going. An end tag that does not match its start tag is fatal in both
//! modes.

use std::ops::Range;

use memchr::{memchr, memchr3, memmem};

use crate::chars;
use crate::entity;
use crate::error::{Error, Result};
use crate::ParseMode;

/// One attribute inside a start tag or the XML declaration. `prefix_len`
/// is 0 for unprefixed names; otherwise `name` covers `prefix:local` and
/// the prefix is its first `prefix_len` bytes.
#[derive(Debug, Clone)]
pub struct AttrToken {
    pub name: Range<usize>,
    pub prefix_len: usize,
    pub value: Range<usize>,
    pub needs_decode: bool,
}

/// Receiver for scanner events. Ranges index the scanner's input buffer;
/// `tag` is always the full construct from `<` through `>`.
pub trait TokenSink {
    fn start_element(
        &mut self,
        name: Range<usize>,
        prefix_len: usize,
        attrs: &[AttrToken],
        is_empty: bool,
        tag: Range<usize>,
    ) -> Result<()> {
        let _ = (name, prefix_len, attrs, is_empty, tag);
        Ok(())
    }

    fn end_element(&mut self, name: Range<usize>, tag: Range<usize>) -> Result<()> {
        let _ = (name, tag);
        Ok(())
    }

    fn text(&mut self, run: Range<usize>, needs_decode: bool) -> Result<()> {
        let _ = (run, needs_decode);
        Ok(())
    }

    fn cdata(&mut self, run: Range<usize>, tag: Range<usize>) -> Result<()> {
        let _ = (run, tag);
        Ok(())
    }

    fn comment(&mut self, run: Range<usize>, tag: Range<usize>) -> Result<()> {
        let _ = (run, tag);
        Ok(())
    }

    fn processing_instruction(
        &mut self,
        target: Range<usize>,
        data: Option<Range<usize>>,
        tag: Range<usize>,
    ) -> Result<()> {
        let _ = (target, data, tag);
        Ok(())
    }

    fn xml_declaration(&mut self, attrs: &[AttrToken]) -> Result<()> {
        let _ = attrs;
        Ok(())
    }

    fn doctype(&mut self, tag: Range<usize>) -> Result<()> {
        let _ = tag;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub mode: ParseMode,
    /// Allow multiple top-level elements and delegate end-tag matching to
    /// the sink (the streaming parser keeps its stack across chunks).
    pub fragment: bool,
    /// Treat end-of-buffer inside a construct as "more data follows":
    /// `scan` returns the offset of the last complete event instead of an
    /// error.
    pub streaming: bool,
    /// `<?xml ...?>` at offset 0 parses as the XML declaration.
    pub allow_xml_decl: bool,
}

impl ScanOptions {
    pub fn document(mode: ParseMode) -> Self {
        ScanOptions {
            mode,
            fragment: false,
            streaming: false,
            allow_xml_decl: true,
        }
    }
}

pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    opts: ScanOptions,
    attr_buf: Vec<AttrToken>,
    /// Open start tags: (name range, tag offset). Unused in fragment mode.
    open: Vec<(Range<usize>, usize)>,
    root_seen: bool,
    doctype_seen: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8], opts: ScanOptions) -> Self {
        Scanner::with_pos(input, 0, opts)
    }

    pub fn with_pos(input: &'a [u8], pos: usize, opts: ScanOptions) -> Self {
        Scanner {
            input,
            pos,
            opts,
            attr_buf: Vec::new(),
            open: Vec::new(),
            root_seen: false,
            doctype_seen: false,
        }
    }

    /// Run to the end of the buffer, dispatching events. Returns the
    /// offset scanning stopped at: the buffer length, or in streaming
    /// mode the end of the last complete event.
    pub fn scan<S: TokenSink>(&mut self, sink: &mut S) -> Result<usize> {
        while self.pos < self.input.len() {
            let event_start = self.pos;
            let result = if self.input[self.pos] == b'<' {
                self.markup(sink)
            } else {
                self.char_data(sink)
            };
            match result {
                Ok(()) => {}
                Err(Error::UnexpectedEof) if self.opts.streaming => {
                    self.pos = event_start;
                    return Ok(event_start);
                }
                Err(e) => return Err(e),
            }
        }
        if !self.opts.streaming {
            self.finish()?;
        }
        Ok(self.pos)
    }

    fn finish(&self) -> Result<()> {
        if let Some((_, tag_start)) = self.open.last() {
            return Err(Error::UnclosedTag(*tag_start));
        }
        if self.strict() && !self.opts.fragment && !self.root_seen {
            return Err(Error::NoRootElement);
        }
        Ok(())
    }

    fn strict(&self) -> bool {
        self.opts.mode.is_strict()
    }

    /// Specific error normally, `UnexpectedEof` when more data may follow.
    fn eof_or(&self, err: Error) -> Error {
        if self.opts.streaming {
            Error::UnexpectedEof
        } else {
            err
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.pos < self.input.len() && chars::is_xml_whitespace(self.input[self.pos]) {
            self.pos += 1;
        }
        self.pos > start
    }

    // ---- character data ----

    fn char_data<S: TokenSink>(&mut self, sink: &mut S) -> Result<()> {
        let start = self.pos;
        let mut needs_decode = false;
        let mut i = self.pos;
        let end;
        loop {
            match memchr3(b'<', b'&', b']', &self.input[i..]) {
                None => {
                    if self.opts.streaming {
                        return Err(Error::UnexpectedEof);
                    }
                    end = self.input.len();
                    break;
                }
                Some(off) => {
                    let at = i + off;
                    match self.input[at] {
                        b'<' => {
                            end = at;
                            break;
                        }
                        b'&' => {
                            needs_decode = true;
                            if self.strict() {
                                i = at + entity::validate_reference(self.input, at)?;
                            } else {
                                i = at + 1;
                            }
                        }
                        _ => {
                            if self.strict() && self.input[at..].starts_with(b"]]>") {
                                return Err(Error::ForbiddenSequence(at));
                            }
                            i = at + 1;
                        }
                    }
                }
            }
        }
        self.pos = end;
        let run = start..end;
        // character data outside the root: whitespace is dropped, anything
        // else violates well-formedness
        if !self.opts.fragment && self.open.is_empty() {
            if let Some(off) = self.input[run.clone()]
                .iter()
                .position(|b| !chars::is_xml_whitespace(*b))
            {
                if self.strict() {
                    return Err(Error::MalformedMarkup(run.start + off));
                }
            }
            return Ok(());
        }
        sink.text(run, needs_decode)
    }

    // ---- markup ----

    fn markup<S: TokenSink>(&mut self, sink: &mut S) -> Result<()> {
        let tag_start = self.pos;
        let rest = &self.input[self.pos..];
        match rest.get(1).copied() {
            None => Err(Error::UnexpectedEof),
            Some(b'?') => self.pi(sink, tag_start),
            Some(b'/') => self.end_tag(sink, tag_start),
            Some(b'!') => {
                if rest.len() >= 4 && rest[..4] == *b"<!--" {
                    self.comment(sink, tag_start)
                } else if rest.len() >= 9 && rest[..9] == *b"<![CDATA[" {
                    self.cdata(sink, tag_start)
                } else if rest.len() >= 9 && rest[..9] == *b"<!DOCTYPE" {
                    self.doctype(sink, tag_start)
                } else if is_prefix_of(rest, b"<!--")
                    || is_prefix_of(rest, b"<![CDATA[")
                    || is_prefix_of(rest, b"<!DOCTYPE")
                {
                    Err(Error::UnexpectedEof)
                } else {
                    Err(Error::MalformedMarkup(tag_start))
                }
            }
            Some(_) => self.start_tag(sink, tag_start),
        }
    }

    fn start_tag<S: TokenSink>(&mut self, sink: &mut S, tag_start: usize) -> Result<()> {
        self.pos = tag_start + 1;
        let (name, prefix_len) = self.qname()?;
        self.attr_buf.clear();
        let is_empty;
        loop {
            let had_ws = self.skip_whitespace();
            let b = match self.input.get(self.pos) {
                Some(b) => *b,
                None => return Err(Error::UnexpectedEof),
            };
            match b {
                b'>' => {
                    self.pos += 1;
                    is_empty = false;
                    break;
                }
                b'/' => match self.input.get(self.pos + 1).copied() {
                    Some(b'>') => {
                        self.pos += 2;
                        is_empty = true;
                        break;
                    }
                    Some(_) => return Err(Error::MalformedMarkup(self.pos)),
                    None => return Err(Error::UnexpectedEof),
                },
                _ => {
                    if self.strict() && !had_ws {
                        return Err(Error::BadAttribute(self.pos));
                    }
                    self.attribute()?;
                }
            }
        }
        if !self.opts.fragment {
            if self.open.is_empty() {
                if self.root_seen && self.strict() {
                    return Err(Error::MultipleRootElements(tag_start));
                }
                self.root_seen = true;
            }
            if !is_empty {
                self.open.push((name.clone(), tag_start));
            }
        }
        sink.start_element(name, prefix_len, &self.attr_buf, is_empty, tag_start..self.pos)
    }

    fn end_tag<S: TokenSink>(&mut self, sink: &mut S, tag_start: usize) -> Result<()> {
        self.pos = tag_start + 2;
        let (name, _) = self.qname()?;
        self.skip_whitespace();
        match self.input.get(self.pos).copied() {
            Some(b'>') => self.pos += 1,
            Some(_) => return Err(Error::UnclosedTag(tag_start)),
            None => return Err(Error::UnexpectedEof),
        }
        if !self.opts.fragment {
            let found = &self.input[name.clone()];
            match self.open.pop() {
                Some((expected, _)) if self.input[expected.clone()] == *found => {}
                Some((expected, _)) => {
                    return Err(Error::MismatchedEndTag {
                        expected: String::from_utf8_lossy(&self.input[expected]).into_owned(),
                        found: String::from_utf8_lossy(found).into_owned(),
                        pos: tag_start,
                    })
                }
                None => {
                    return Err(Error::MismatchedEndTag {
                        expected: String::new(),
                        found: String::from_utf8_lossy(found).into_owned(),
                        pos: tag_start,
                    })
                }
            }
        }
        sink.end_element(name, tag_start..self.pos)
    }

    fn attribute(&mut self) -> Result<()> {
        let attr_start = self.pos;
        let (name, prefix_len) = self.qname().map_err(|e| match e {
            Error::BadName(p) => Error::BadAttribute(p),
            e => e,
        })?;
        self.skip_whitespace();
        match self.input.get(self.pos).copied() {
            Some(b'=') => self.pos += 1,
            Some(_) => return Err(Error::BadAttribute(attr_start)),
            None => return Err(Error::UnexpectedEof),
        }
        self.skip_whitespace();
        let quote = match self.input.get(self.pos).copied() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(Error::BadAttribute(attr_start)),
            None => return Err(Error::UnexpectedEof),
        };
        self.pos += 1;
        let value_start = self.pos;
        let mut needs_decode = false;
        let value_end;
        let mut i = self.pos;
        loop {
            match memchr3(quote, b'<', b'&', &self.input[i..]) {
                None => return Err(Error::UnexpectedEof),
                Some(off) => {
                    let at = i + off;
                    match self.input[at] {
                        b'<' => {
                            if self.strict() {
                                return Err(Error::BadAttribute(at));
                            }
                            i = at + 1;
                        }
                        b'&' => {
                            needs_decode = true;
                            if self.strict() {
                                i = at + entity::validate_reference(self.input, at)?;
                            } else {
                                i = at + 1;
                            }
                        }
                        _ => {
                            value_end = at;
                            break;
                        }
                    }
                }
            }
        }
        self.pos = value_end + 1;
        if self.strict() {
            let name_bytes = &self.input[name.clone()];
            if self
                .attr_buf
                .iter()
                .any(|a| &self.input[a.name.clone()] == name_bytes)
            {
                return Err(Error::DuplicateAttribute(attr_start));
            }
        }
        self.attr_buf.push(AttrToken {
            name,
            prefix_len,
            value: value_start..value_end,
            needs_decode,
        });
        Ok(())
    }

    fn comment<S: TokenSink>(&mut self, sink: &mut S, tag_start: usize) -> Result<()> {
        let content_start = tag_start + 4;
        let off = match memmem::find(&self.input[content_start..], b"-->") {
            Some(off) => off,
            None => return Err(self.eof_or(Error::BadComment(tag_start))),
        };
        let content = content_start..content_start + off;
        if self.strict() {
            let c = &self.input[content.clone()];
            if let Some(i) = memmem::find(c, b"--") {
                return Err(Error::ForbiddenSequence(content_start + i));
            }
            // a comment may not end with '-' ("--->")
            if c.last() == Some(&b'-') {
                return Err(Error::BadComment(tag_start));
            }
        }
        self.pos = content.end + 3;
        sink.comment(content, tag_start..self.pos)
    }

    fn cdata<S: TokenSink>(&mut self, sink: &mut S, tag_start: usize) -> Result<()> {
        let content_start = tag_start + 9;
        let off = match memmem::find(&self.input[content_start..], b"]]>") {
            Some(off) => off,
            None => return Err(self.eof_or(Error::BadCData(tag_start))),
        };
        if self.open.is_empty() && !self.opts.fragment && self.strict() {
            // CDATA is character data; it may not appear outside the root
            return Err(Error::MalformedMarkup(tag_start));
        }
        let content = content_start..content_start + off;
        self.pos = content.end + 3;
        if self.open.is_empty() && !self.opts.fragment {
            return Ok(());
        }
        sink.cdata(content, tag_start..self.pos)
    }

    fn pi<S: TokenSink>(&mut self, sink: &mut S, tag_start: usize) -> Result<()> {
        self.pos = tag_start + 2;
        let (target, _) = self.qname()?;
        let target_bytes = &self.input[target.clone()];
        if target_bytes == b"xml" && tag_start == 0 && self.opts.allow_xml_decl {
            return self.xml_decl(sink);
        }
        if target_bytes.eq_ignore_ascii_case(b"xml") && self.strict() {
            // the xml target is reserved for the declaration at offset 0
            return Err(Error::MalformedMarkup(tag_start));
        }
        self.skip_whitespace();
        let off = match memmem::find(&self.input[self.pos..], b"?>") {
            Some(off) => off,
            None => return Err(self.eof_or(Error::MalformedMarkup(tag_start))),
        };
        let data = if off == 0 {
            None
        } else {
            Some(self.pos..self.pos + off)
        };
        self.pos += off + 2;
        sink.processing_instruction(target, data, tag_start..self.pos)
    }

    fn xml_decl<S: TokenSink>(&mut self, sink: &mut S) -> Result<()> {
        self.attr_buf.clear();
        loop {
            let had_ws = self.skip_whitespace();
            let rest = &self.input[self.pos..];
            if rest.starts_with(b"?>") {
                self.pos += 2;
                break;
            }
            if rest.is_empty() || (rest.len() == 1 && rest[0] == b'?') {
                return Err(Error::UnexpectedEof);
            }
            if self.strict() && !had_ws {
                return Err(Error::BadXmlDecl(self.pos));
            }
            self.attribute().map_err(|e| match e {
                Error::BadAttribute(p) | Error::DuplicateAttribute(p) => Error::BadXmlDecl(p),
                e => e,
            })?;
        }
        if self.strict() {
            self.check_xml_decl()?;
        }
        sink.xml_declaration(&self.attr_buf)
    }

    fn check_xml_decl(&self) -> Result<()> {
        let mut saw_version = false;
        for a in &self.attr_buf {
            let name = &self.input[a.name.clone()];
            let value = &self.input[a.value.clone()];
            match name {
                b"version" => {
                    saw_version = true;
                    if !value.starts_with(b"1.") {
                        return Err(Error::BadXmlDecl(a.value.start));
                    }
                }
                b"encoding" => {
                    if !encoding_label_supported(value) {
                        return Err(Error::BadXmlDecl(a.value.start));
                    }
                }
                b"standalone" => {
                    if value != b"yes" && value != b"no" {
                        return Err(Error::BadXmlDecl(a.value.start));
                    }
                }
                _ => return Err(Error::BadXmlDecl(a.name.start)),
            }
        }
        if !saw_version {
            return Err(Error::BadXmlDecl(0));
        }
        Ok(())
    }

    /// Skip the DOCTYPE without interpreting it: balanced `[` `]` for the
    /// internal subset, balanced `<` `>` for markup declarations inside
    /// it, quoted strings opaque.
    fn doctype<S: TokenSink>(&mut self, sink: &mut S, tag_start: usize) -> Result<()> {
        if self.strict() && !self.opts.fragment && (self.root_seen || self.doctype_seen) {
            return Err(Error::BadDoctype(tag_start));
        }
        let mut i = tag_start + 9;
        let mut square = 0usize;
        let mut angle = 0usize;
        while i < self.input.len() {
            match self.input[i] {
                q @ (b'"' | b'\'') => {
                    match memchr(q, &self.input[i + 1..]) {
                        Some(off) => i += off + 2,
                        None => return Err(self.eof_or(Error::BadDoctype(tag_start))),
                    }
                    continue;
                }
                b'[' => square += 1,
                b']' => {
                    if square == 0 {
                        if self.strict() {
                            return Err(Error::BadDoctype(i));
                        }
                    } else {
                        square -= 1;
                    }
                }
                b'<' => angle += 1,
                b'>' => {
                    if angle > 0 {
                        angle -= 1;
                    } else if square == 0 {
                        self.pos = i + 1;
                        self.doctype_seen = true;
                        return sink.doctype(tag_start..self.pos);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.eof_or(Error::BadDoctype(tag_start)))
    }

    // ---- names ----

    /// Scan a (possibly prefixed) name. Returns its range and the prefix
    /// length (0 when unprefixed).
    fn qname(&mut self) -> Result<(Range<usize>, usize)> {
        let start = self.pos;
        let mut colon = None;
        let mut i = self.pos;
        while i < self.input.len() {
            let b = self.input[i];
            if b == b':' {
                if colon.is_none() {
                    colon = Some(i);
                } else if self.strict() {
                    return Err(Error::BadName(start));
                }
            } else if !(chars::is_ascii_name(b) || b >= 0x80) {
                break;
            }
            i += 1;
        }
        if i == start {
            return if i == self.input.len() {
                Err(Error::UnexpectedEof)
            } else {
                Err(Error::BadName(start))
            };
        }
        self.pos = i;
        let range = start..i;
        if self.strict() {
            self.check_name(&range, colon)?;
        }
        let prefix_len = colon.map(|c| c - start).unwrap_or(0);
        Ok((range, prefix_len))
    }

    fn check_name(&self, range: &Range<usize>, colon: Option<usize>) -> Result<()> {
        match colon {
            Some(c) => {
                self.check_name_part(range.start, c)?;
                self.check_name_part(c + 1, range.end)
            }
            None => self.check_name_part(range.start, range.end),
        }
    }

    fn check_name_part(&self, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Err(Error::BadName(start));
        }
        let s = std::str::from_utf8(&self.input[start..end]).map_err(|_| Error::BadName(start))?;
        let mut cs = s.chars();
        match cs.next() {
            Some(c) if chars::is_name_start_char(c) => {}
            _ => return Err(Error::BadName(start)),
        }
        if cs.any(|c| !chars::is_name_char(c)) {
            return Err(Error::BadName(start));
        }
        Ok(())
    }
}

fn is_prefix_of(rest: &[u8], pat: &[u8]) -> bool {
    rest.len() < pat.len() && pat.starts_with(rest)
}

fn encoding_label_supported(v: &[u8]) -> bool {
    const LABELS: [&[u8]; 7] = [
        b"utf-8",
        b"utf8",
        b"utf-16",
        b"utf-16le",
        b"utf-16be",
        b"us-ascii",
        b"ascii",
    ];
    LABELS.iter().any(|l| v.eq_ignore_ascii_case(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders events as short strings so tests can assert on sequences.
    #[derive(Default)]
    struct EventLog {
        doc: Vec<u8>,
        events: Vec<String>,
    }

    impl EventLog {
        fn s(&self, r: &Range<usize>) -> String {
            String::from_utf8_lossy(&self.doc[r.clone()]).into_owned()
        }
    }

    impl TokenSink for EventLog {
        fn start_element(
            &mut self,
            name: Range<usize>,
            _prefix_len: usize,
            attrs: &[AttrToken],
            is_empty: bool,
            _tag: Range<usize>,
        ) -> Result<()> {
            let mut e = format!("start {}", self.s(&name));
            for a in attrs {
                e.push_str(&format!(" {}={}", self.s(&a.name), self.s(&a.value)));
            }
            if is_empty {
                e.push_str(" /");
            }
            self.events.push(e);
            Ok(())
        }

        fn end_element(&mut self, name: Range<usize>, _tag: Range<usize>) -> Result<()> {
            self.events.push(format!("end {}", self.s(&name)));
            Ok(())
        }

        fn text(&mut self, run: Range<usize>, needs_decode: bool) -> Result<()> {
            let mut e = format!("text {}", self.s(&run));
            if needs_decode {
                e.push_str(" &");
            }
            self.events.push(e);
            Ok(())
        }

        fn cdata(&mut self, run: Range<usize>, _tag: Range<usize>) -> Result<()> {
            self.events.push(format!("cdata {}", self.s(&run)));
            Ok(())
        }

        fn comment(&mut self, run: Range<usize>, _tag: Range<usize>) -> Result<()> {
            self.events.push(format!("comment {}", self.s(&run)));
            Ok(())
        }

        fn processing_instruction(
            &mut self,
            target: Range<usize>,
            data: Option<Range<usize>>,
            _tag: Range<usize>,
        ) -> Result<()> {
            let data = data.map(|d| self.s(&d)).unwrap_or_default();
            self.events.push(format!("pi {} {}", self.s(&target), data));
            Ok(())
        }

        fn doctype(&mut self, _tag: Range<usize>) -> Result<()> {
            self.events.push("doctype".to_string());
            Ok(())
        }
    }

    fn scan(doc: &str, mode: ParseMode) -> Result<Vec<String>> {
        let mut log = EventLog {
            doc: doc.as_bytes().to_vec(),
            events: Vec::new(),
        };
        let mut scanner = Scanner::new(doc.as_bytes(), ScanOptions::document(mode));
        scanner.scan(&mut log)?;
        Ok(log.events)
    }

    fn scan_strict(doc: &str) -> Result<Vec<String>> {
        scan(doc, ParseMode::Strict)
    }

    #[test]
    fn simple_document() {
        assert_eq!(
            scan_strict("<a><b>hi</b></a>").unwrap(),
            ["start a", "start b", "text hi", "end b", "end a"]
        );
    }

    #[test]
    fn attributes_and_empty_tags() {
        assert_eq!(
            scan_strict(r#"<a x="1" y='2'><b/></a>"#).unwrap(),
            ["start a x=1 y=2", "start b /", "end a"]
        );
    }

    #[test]
    fn entity_flag_on_text() {
        assert_eq!(
            scan_strict("<a>x &amp; y</a>").unwrap(),
            ["start a", "text x &amp; y &", "end a"]
        );
    }

    #[test]
    fn comment_and_pi() {
        assert_eq!(
            scan_strict("<a><!-- note --><?go now?></a>").unwrap(),
            ["start a", "comment  note ", "pi go now", "end a"]
        );
    }

    #[test]
    fn cdata_section() {
        assert_eq!(
            scan_strict("<a><![CDATA[<not a tag>]]></a>").unwrap(),
            ["start a", "cdata <not a tag>", "end a"]
        );
    }

    #[test]
    fn doctype_with_internal_subset() {
        let doc = r#"<!DOCTYPE r [ <!ENTITY e "v"> ]><r/>"#;
        assert_eq!(scan_strict(doc).unwrap(), ["doctype", "start r /"]);
    }

    #[test]
    fn xml_declaration_ok() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a/>"#;
        assert_eq!(scan_strict(doc).unwrap(), ["start a /"]);
    }

    #[test]
    fn xml_declaration_bad_standalone() {
        let doc = r#"<?xml version="1.0" standalone="maybe"?><a/>"#;
        assert!(matches!(scan_strict(doc), Err(Error::BadXmlDecl(_))));
        assert!(scan(doc, ParseMode::Lenient).is_ok());
    }

    #[test]
    fn xml_target_only_at_start() {
        let doc = "<a><?xml version=\"1.0\"?></a>";
        assert!(matches!(scan_strict(doc), Err(Error::MalformedMarkup(_))));
        assert!(scan(doc, ParseMode::Lenient).is_ok());
    }

    #[test]
    fn mismatched_end_tag_fatal_in_both_modes() {
        for mode in [ParseMode::Strict, ParseMode::Lenient] {
            assert!(matches!(
                scan("<a><b></a></b>", mode),
                Err(Error::MismatchedEndTag { .. })
            ));
        }
    }

    #[test]
    fn prefixed_names() {
        let events = scan_strict("<ns:a ns:x=\"1\"></ns:a>").unwrap();
        assert_eq!(events, ["start ns:a ns:x=1", "end ns:a"]);
    }

    #[test]
    fn bad_name_strict_only() {
        assert!(matches!(scan_strict("<1invalid/>"), Err(Error::BadName(_))));
        assert_eq!(scan("<1invalid/>", ParseMode::Lenient).unwrap(), ["start 1invalid /"]);
    }

    #[test]
    fn duplicate_attribute_strict_only() {
        let doc = r#"<a x="1" x="2"/>"#;
        assert!(matches!(scan_strict(doc), Err(Error::DuplicateAttribute(_))));
        assert_eq!(
            scan(doc, ParseMode::Lenient).unwrap(),
            ["start a x=1 x=2 /"]
        );
    }

    #[test]
    fn cdata_end_in_text_strict_only() {
        let doc = "<a>x]]>y</a>";
        assert!(matches!(scan_strict(doc), Err(Error::ForbiddenSequence(_))));
        assert_eq!(
            scan(doc, ParseMode::Lenient).unwrap(),
            ["start a", "text x]]>y", "end a"]
        );
    }

    #[test]
    fn double_dash_in_comment_strict_only() {
        let doc = "<a><!-- x -- y --></a>";
        assert!(matches!(scan_strict(doc), Err(Error::ForbiddenSequence(_))));
        assert!(scan(doc, ParseMode::Lenient).is_ok());
    }

    #[test]
    fn unknown_entity_strict_only() {
        assert!(matches!(
            scan_strict("<a>&nope;</a>"),
            Err(Error::UnknownEntity(_))
        ));
        assert!(scan("<a>&nope;</a>", ParseMode::Lenient).is_ok());
    }

    #[test]
    fn char_ref_out_of_range() {
        assert!(matches!(
            scan_strict("<a>&#x0;</a>"),
            Err(Error::InvalidCharRef(_))
        ));
    }

    #[test]
    fn multiple_roots_strict_only() {
        assert!(matches!(
            scan_strict("<a/><b/>"),
            Err(Error::MultipleRootElements(_))
        ));
        assert_eq!(
            scan("<a/><b/>", ParseMode::Lenient).unwrap(),
            ["start a /", "start b /"]
        );
    }

    #[test]
    fn no_root_element() {
        assert_eq!(scan_strict("<!-- only this -->"), Err(Error::NoRootElement));
    }

    #[test]
    fn text_outside_root() {
        assert!(matches!(
            scan_strict("<a/>junk"),
            Err(Error::MultipleRootElements(_)) | Err(Error::MalformedMarkup(_))
        ));
        // surrounding whitespace is fine
        assert_eq!(scan_strict("\n<a/>\n").unwrap(), ["start a /"]);
    }

    #[test]
    fn unclosed_tag() {
        assert!(matches!(scan_strict("<a><b></b>"), Err(Error::UnclosedTag(_))));
    }

    #[test]
    fn truncated_markup() {
        assert!(matches!(scan_strict("<a>text"), Err(Error::UnclosedTag(_))));
        assert!(scan_strict("<a><!--").is_err());
        assert!(scan_strict("<a x=\"1").is_err());
    }

    #[test]
    fn streaming_stops_at_incomplete_event() {
        let doc = b"<a>one</a><b>two";
        let mut log = EventLog {
            doc: doc.to_vec(),
            events: Vec::new(),
        };
        let opts = ScanOptions {
            mode: ParseMode::Strict,
            fragment: true,
            streaming: true,
            allow_xml_decl: true,
        };
        let mut scanner = Scanner::new(doc, opts);
        let consumed = scanner.scan(&mut log).unwrap();
        assert_eq!(consumed, 13);
        assert_eq!(log.events, ["start a", "text one", "end a", "start b"]);
    }

    #[test]
    fn doctype_rejected_after_root() {
        let doc = "<a/><!DOCTYPE a>";
        assert!(matches!(scan_strict(doc), Err(Error::BadDoctype(_))));
    }
}
