//! Callback-style parsing: the full event sequence in document order,
//! with entities decoded and nothing retained beyond the events
//! themselves.

use std::ops::Range;

use crate::entity;
use crate::error::Result;
use crate::input;
use crate::scanner::{AttrToken, ScanOptions, Scanner, TokenSink};
use crate::ParseMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaxEvent {
    StartElement {
        name: String,
        attributes: Vec<(String, String)>,
    },
    EndElement {
        name: String,
    },
    Characters(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: Option<String>,
    },
}

struct SaxCollector<'a> {
    input: &'a [u8],
    events: Vec<SaxEvent>,
}

impl SaxCollector<'_> {
    fn s(&self, r: &Range<usize>) -> String {
        String::from_utf8_lossy(&self.input[r.clone()]).into_owned()
    }

    fn decoded(&self, r: &Range<usize>, needs_decode: bool) -> String {
        let raw = &self.input[r.clone()];
        let raw = String::from_utf8_lossy(raw);
        if needs_decode {
            entity::decode(&raw).into_owned()
        } else {
            raw.into_owned()
        }
    }
}

impl TokenSink for SaxCollector<'_> {
    fn start_element(
        &mut self,
        name: Range<usize>,
        _prefix_len: usize,
        attrs: &[AttrToken],
        is_empty: bool,
        _tag: Range<usize>,
    ) -> Result<()> {
        let name = self.s(&name);
        let attributes = attrs
            .iter()
            .map(|a| (self.s(&a.name), self.decoded(&a.value, a.needs_decode)))
            .collect();
        self.events.push(SaxEvent::StartElement {
            name: name.clone(),
            attributes,
        });
        // empty-element tags produce a start/end pair
        if is_empty {
            self.events.push(SaxEvent::EndElement { name });
        }
        Ok(())
    }

    fn end_element(&mut self, name: Range<usize>, _tag: Range<usize>) -> Result<()> {
        self.events.push(SaxEvent::EndElement { name: self.s(&name) });
        Ok(())
    }

    fn text(&mut self, run: Range<usize>, needs_decode: bool) -> Result<()> {
        self.events
            .push(SaxEvent::Characters(self.decoded(&run, needs_decode)));
        Ok(())
    }

    fn cdata(&mut self, run: Range<usize>, _tag: Range<usize>) -> Result<()> {
        self.events.push(SaxEvent::CData(self.s(&run)));
        Ok(())
    }

    fn comment(&mut self, run: Range<usize>, _tag: Range<usize>) -> Result<()> {
        self.events.push(SaxEvent::Comment(self.s(&run)));
        Ok(())
    }

    fn processing_instruction(
        &mut self,
        target: Range<usize>,
        data: Option<Range<usize>>,
        _tag: Range<usize>,
    ) -> Result<()> {
        self.events.push(SaxEvent::ProcessingInstruction {
            target: self.s(&target),
            data: data.map(|d| self.s(&d)),
        });
        Ok(())
    }
}

/// Parse `bytes` into the flat event sequence.
pub fn sax_parse(bytes: &[u8], mode: ParseMode) -> Result<Vec<SaxEvent>> {
    let buf = input::prepare(bytes, mode)?;
    let mut collector = SaxCollector {
        input: &buf,
        events: Vec::new(),
    };
    let mut scanner = Scanner::new(&buf, ScanOptions::document(mode));
    scanner.scan(&mut collector)?;
    Ok(collector.events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(doc: &str) -> Vec<SaxEvent> {
        sax_parse(doc.as_bytes(), ParseMode::Strict).unwrap()
    }

    #[test]
    fn event_sequence_in_document_order() {
        let events = strict("<a href=\"x\">one<b/><!-- c --><?p d?></a>");
        assert_eq!(
            events,
            vec![
                SaxEvent::StartElement {
                    name: "a".into(),
                    attributes: vec![("href".into(), "x".into())],
                },
                SaxEvent::Characters("one".into()),
                SaxEvent::StartElement {
                    name: "b".into(),
                    attributes: vec![],
                },
                SaxEvent::EndElement { name: "b".into() },
                SaxEvent::Comment(" c ".into()),
                SaxEvent::ProcessingInstruction {
                    target: "p".into(),
                    data: Some("d".into()),
                },
                SaxEvent::EndElement { name: "a".into() },
            ]
        );
    }

    #[test]
    fn entities_decoded_in_text_and_attributes() {
        let events = strict("<a t=\"1 &lt; 2\">&amp;&#65;</a>");
        assert_eq!(
            events[0],
            SaxEvent::StartElement {
                name: "a".into(),
                attributes: vec![("t".into(), "1 < 2".into())],
            }
        );
        assert_eq!(events[1], SaxEvent::Characters("&A".into()));
    }

    #[test]
    fn cdata_kept_verbatim() {
        let events = strict("<a><![CDATA[a&amp;b]]></a>");
        assert_eq!(events[1], SaxEvent::CData("a&amp;b".into()));
    }

    #[test]
    fn malformed_strict_fails() {
        assert!(sax_parse(b"<a><b></a>", ParseMode::Strict).is_err());
    }
}
