//! The structural index: the flat-array document representation.
//!
//! A parsed document is three arrays (elements, texts, attributes) plus a
//! flat children table, all referencing the owned input buffer by span.
//! The index is built once by [`IndexBuilder`] and immutable afterwards;
//! readers may share it freely.

use std::borrow::Cow;
use std::ops::Range;

use crate::entity;
use crate::error::{Error, Result};
use crate::scanner::{AttrToken, TokenSink};
use crate::span::Span;

/// Parent value of the root element; also `root_element` of an empty
/// document.
pub const SENTINEL: u32 = u32::MAX;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Element,
    Text,
    CData,
}

/// A child reference: kind in the top two bits, destination array index in
/// the low 30. Text and CData both index `texts[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef(u32);

impl ChildRef {
    const INDEX_BITS: u32 = 30;
    pub(crate) const INDEX_MASK: u32 = (1 << Self::INDEX_BITS) - 1;

    fn element(index: u32) -> ChildRef {
        ChildRef(index)
    }

    fn text(index: u32) -> ChildRef {
        ChildRef(1 << Self::INDEX_BITS | index)
    }

    fn cdata(index: u32) -> ChildRef {
        ChildRef(2 << Self::INDEX_BITS | index)
    }

    pub fn kind(&self) -> ChildKind {
        match self.0 >> Self::INDEX_BITS {
            0 => ChildKind::Element,
            1 => ChildKind::Text,
            _ => ChildKind::CData,
        }
    }

    pub fn index(&self) -> u32 {
        self.0 & Self::INDEX_MASK
    }
}

#[derive(Debug, Clone)]
pub struct IndexElement {
    pub name: Span,
    pub prefix_len: u8,
    pub parent: u32,
    order: u32,
    children_start: u32,
    children_len: u32,
    attrs_start: u32,
    attrs_len: u16,
}

impl IndexElement {
    pub fn children_range(&self) -> Range<u32> {
        self.children_start..self.children_start + self.children_len
    }

    pub fn attrs_range(&self) -> Range<u32> {
        self.attrs_start..self.attrs_start + u32::from(self.attrs_len)
    }

    /// Position in document order, shared with text nodes.
    pub fn order(&self) -> u32 {
        self.order
    }
}

const TEXT_FLAG_CDATA: u32 = 1 << 31;
const TEXT_FLAG_DECODE: u32 = 1 << 30;
const TEXT_PARENT_MASK: u32 = (1 << 30) - 1;

/// One text or CDATA run. Parent index and the two flags share a word to
/// keep the struct within 16 bytes.
#[derive(Debug, Clone)]
pub struct IndexText {
    pub span: Span,
    packed: u32,
    order: u32,
}

impl IndexText {
    fn new(span: Span, parent: u32, order: u32, is_cdata: bool, needs_decode: bool) -> Self {
        let mut packed = parent & TEXT_PARENT_MASK;
        if is_cdata {
            packed |= TEXT_FLAG_CDATA;
        }
        if needs_decode {
            packed |= TEXT_FLAG_DECODE;
        }
        IndexText { span, packed, order }
    }

    pub fn parent(&self) -> u32 {
        self.packed & TEXT_PARENT_MASK
    }

    pub fn is_cdata(&self) -> bool {
        self.packed & TEXT_FLAG_CDATA != 0
    }

    /// Set when the run contains `&`, so accessors know to decode.
    pub fn needs_decode(&self) -> bool {
        self.packed & TEXT_FLAG_DECODE != 0
    }

    pub fn order(&self) -> u32 {
        self.order
    }
}

#[derive(Debug, Clone)]
pub struct IndexAttribute {
    pub name: Span,
    pub value: Span,
    pub prefix_len: u8,
    pub needs_decode: bool,
}

const _: () = {
    assert!(std::mem::size_of::<IndexElement>() <= 32);
    assert!(std::mem::size_of::<IndexText>() <= 16);
    assert!(std::mem::size_of::<ChildRef>() == 4);
};

/// The result of a full parse. Owns the (normalized) input buffer; every
/// span in the arrays points into it.
#[derive(Debug)]
pub struct StructuralIndex {
    input: Vec<u8>,
    elements: Vec<IndexElement>,
    texts: Vec<IndexText>,
    attrs: Vec<IndexAttribute>,
    children_data: Vec<ChildRef>,
    root_element: u32,
    doctype_seen: bool,
}

impl StructuralIndex {
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn root_element(&self) -> Option<u32> {
        (self.root_element != SENTINEL).then_some(self.root_element)
    }

    pub fn doctype_seen(&self) -> bool {
        self.doctype_seen
    }

    pub fn element_count(&self) -> u32 {
        self.elements.len() as u32
    }

    pub fn text_count(&self) -> u32 {
        self.texts.len() as u32
    }

    pub fn attr_count(&self) -> u32 {
        self.attrs.len() as u32
    }

    pub fn element(&self, index: u32) -> &IndexElement {
        &self.elements[index as usize]
    }

    pub fn text(&self, index: u32) -> &IndexText {
        &self.texts[index as usize]
    }

    pub fn attr(&self, index: u32) -> &IndexAttribute {
        &self.attrs[index as usize]
    }

    pub fn children(&self, element: u32) -> &[ChildRef] {
        let r = self.elements[element as usize].children_range();
        &self.children_data[r.start as usize..r.end as usize]
    }

    fn str_at(&self, span: Span) -> &str {
        // the buffer is validated (or lossily repaired) UTF-8
        std::str::from_utf8(span.bytes(&self.input)).unwrap_or("")
    }

    pub fn qname(&self, element: u32) -> &str {
        self.str_at(self.elements[element as usize].name)
    }

    pub fn local_name(&self, element: u32) -> &str {
        let e = &self.elements[element as usize];
        split_local(self.str_at(e.name), e.prefix_len)
    }

    pub fn prefix(&self, element: u32) -> Option<&str> {
        let e = &self.elements[element as usize];
        split_prefix(self.str_at(e.name), e.prefix_len)
    }

    pub fn attr_qname(&self, attr: &IndexAttribute) -> &str {
        self.str_at(attr.name)
    }

    pub fn attr_local_name(&self, attr: &IndexAttribute) -> &str {
        split_local(self.str_at(attr.name), attr.prefix_len)
    }

    pub fn attr_prefix(&self, attr: &IndexAttribute) -> Option<&str> {
        split_prefix(self.str_at(attr.name), attr.prefix_len)
    }

    /// Attribute value with entities decoded on demand.
    pub fn attr_value(&self, attr: &IndexAttribute) -> Cow<'_, str> {
        let raw = self.str_at(attr.value);
        if attr.needs_decode {
            entity::decode(raw)
        } else {
            Cow::Borrowed(raw)
        }
    }

    /// Text value with entities decoded on demand; CDATA is verbatim.
    pub fn text_value(&self, text: &IndexText) -> Cow<'_, str> {
        let raw = self.str_at(text.span);
        if text.needs_decode() && !text.is_cdata() {
            entity::decode(raw)
        } else {
            Cow::Borrowed(raw)
        }
    }

    pub fn attribute_by_name(&self, element: u32, qname: &str) -> Option<&IndexAttribute> {
        let r = self.elements[element as usize].attrs_range();
        self.attrs[r.start as usize..r.end as usize]
            .iter()
            .find(|a| self.attr_qname(a) == qname)
    }

    /// Concatenated descendant text of an element, decoded. Iterative so
    /// nesting depth cannot overflow the stack.
    pub fn string_value(&self, element: u32) -> String {
        let mut out = String::new();
        let mut stack: Vec<&[ChildRef]> = vec![self.children(element)];
        while let Some(top) = stack.last_mut() {
            match top.split_first() {
                None => {
                    stack.pop();
                }
                Some((head, rest)) => {
                    *top = rest;
                    match head.kind() {
                        ChildKind::Element => stack.push(self.children(head.index())),
                        ChildKind::Text | ChildKind::CData => {
                            out.push_str(&self.text_value(self.text(head.index())));
                        }
                    }
                }
            }
        }
        out
    }

    /// In-scope namespace URI for `prefix` (`None` = the default
    /// namespace), resolved by walking `xmlns` declarations up from
    /// `start`. The `xml` prefix is implicitly bound.
    pub fn lookup_namespace(&self, start: u32, prefix: Option<&str>) -> Option<Cow<'_, str>> {
        let mut current = start;
        loop {
            let e = &self.elements[current as usize];
            let r = e.attrs_range();
            for attr in &self.attrs[r.start as usize..r.end as usize] {
                let matched = match prefix {
                    Some(p) => {
                        self.attr_prefix(attr) == Some("xmlns") && self.attr_local_name(attr) == p
                    }
                    None => attr.prefix_len == 0 && self.attr_qname(attr) == "xmlns",
                };
                if matched {
                    let value = self.attr_value(attr);
                    // xmlns="" undeclares
                    return (!value.is_empty()).then_some(value);
                }
            }
            if e.parent == SENTINEL {
                break;
            }
            current = e.parent;
        }
        (prefix == Some("xml")).then(|| Cow::Borrowed(XML_NAMESPACE))
    }

    pub fn namespace_uri(&self, element: u32) -> Option<Cow<'_, str>> {
        self.lookup_namespace(element, self.prefix(element))
    }
}

fn split_local(qname: &str, prefix_len: u8) -> &str {
    if prefix_len == 0 {
        qname
    } else {
        &qname[usize::from(prefix_len) + 1..]
    }
}

fn split_prefix(qname: &str, prefix_len: u8) -> Option<&str> {
    (prefix_len > 0).then(|| &qname[..usize::from(prefix_len)])
}

struct OpenElement {
    index: u32,
    children: Vec<ChildRef>,
}

/// Scanner consumer that materializes a [`StructuralIndex`].
pub(crate) struct IndexBuilder {
    elements: Vec<IndexElement>,
    texts: Vec<IndexText>,
    attrs: Vec<IndexAttribute>,
    children_data: Vec<ChildRef>,
    stack: Vec<OpenElement>,
    root: u32,
    next_order: u32,
    doctype_seen: bool,
}

impl IndexBuilder {
    /// Capacities are advisory, tuned to markup-heavy documents; growth
    /// beyond them is geometric.
    pub(crate) fn new(input_len: usize) -> Self {
        IndexBuilder {
            elements: Vec::with_capacity(input_len / 50),
            texts: Vec::with_capacity(input_len / 40),
            attrs: Vec::with_capacity(input_len / 30),
            children_data: Vec::with_capacity(input_len / 25),
            stack: Vec::new(),
            root: SENTINEL,
            next_order: 1,
            doctype_seen: false,
        }
    }

    fn span(&self, r: &Range<usize>) -> Result<Span> {
        Span::from_range(r).ok_or(Error::OversizedToken(r.start))
    }

    fn close(&mut self, open: OpenElement) {
        let start = self.children_data.len() as u32;
        self.children_data.extend_from_slice(&open.children);
        let e = &mut self.elements[open.index as usize];
        e.children_start = start;
        e.children_len = open.children.len() as u32;
    }

    fn push_text_run(&mut self, run: Range<usize>, needs_decode: bool, is_cdata: bool) -> Result<()> {
        let parent_index = match self.stack.last() {
            Some(open) => open.index,
            // nothing to attach character data to; the scanner has
            // already policed text outside the root
            None => return Ok(()),
        };
        // runs longer than a 16-bit span split into consecutive entries
        let mut start = run.start;
        while start < run.end {
            let len = (run.end - start).min(usize::from(u16::MAX));
            let index = self.texts.len() as u32;
            if index > ChildRef::INDEX_MASK {
                return Err(Error::InputTooLarge);
            }
            let span = Span {
                offset: start as u32,
                len: len as u16,
            };
            let order = self.next_order;
            self.next_order += 1;
            self.texts
                .push(IndexText::new(span, parent_index, order, is_cdata, needs_decode));
            let child = if is_cdata {
                ChildRef::cdata(index)
            } else {
                ChildRef::text(index)
            };
            if let Some(open) = self.stack.last_mut() {
                open.children.push(child);
            }
            start += len;
        }
        Ok(())
    }

    pub(crate) fn into_index(mut self, input: Vec<u8>) -> StructuralIndex {
        // lenient parses can stop mid-tree; flush whatever is still open
        while let Some(open) = self.stack.pop() {
            self.close(open);
        }
        StructuralIndex {
            input,
            elements: self.elements,
            texts: self.texts,
            attrs: self.attrs,
            children_data: self.children_data,
            root_element: self.root,
            doctype_seen: self.doctype_seen,
        }
    }
}

impl TokenSink for IndexBuilder {
    fn start_element(
        &mut self,
        name: Range<usize>,
        prefix_len: usize,
        attrs: &[AttrToken],
        is_empty: bool,
        tag: Range<usize>,
    ) -> Result<()> {
        let index = self.elements.len() as u32;
        if index > ChildRef::INDEX_MASK {
            return Err(Error::InputTooLarge);
        }
        let attrs_start = self.attrs.len() as u32;
        for a in attrs {
            self.attrs.push(IndexAttribute {
                name: self.span(&a.name)?,
                value: self.span(&a.value)?,
                prefix_len: u8::try_from(a.prefix_len)
                    .map_err(|_| Error::OversizedToken(a.name.start))?,
                needs_decode: a.needs_decode,
            });
        }
        let attrs_len =
            u16::try_from(attrs.len()).map_err(|_| Error::OversizedToken(tag.start))?;
        let parent = self.stack.last().map(|open| open.index).unwrap_or(SENTINEL);
        let order = self.next_order;
        self.next_order += 1;
        self.elements.push(IndexElement {
            name: self.span(&name)?,
            prefix_len: u8::try_from(prefix_len).map_err(|_| Error::OversizedToken(name.start))?,
            parent,
            order,
            children_start: 0,
            children_len: 0,
            attrs_start,
            attrs_len,
        });
        match self.stack.last_mut() {
            Some(open) => open.children.push(ChildRef::element(index)),
            None => {
                if self.root == SENTINEL {
                    self.root = index;
                }
            }
        }
        if !is_empty {
            self.stack.push(OpenElement {
                index,
                children: Vec::new(),
            });
        }
        Ok(())
    }

    fn end_element(&mut self, _name: Range<usize>, _tag: Range<usize>) -> Result<()> {
        // the scanner has already verified the match
        if let Some(open) = self.stack.pop() {
            self.close(open);
        }
        Ok(())
    }

    fn text(&mut self, run: Range<usize>, needs_decode: bool) -> Result<()> {
        // coalesce with the previous run when the two are contiguous in
        // the buffer (no structural event sat between them)
        if let Some(open) = self.stack.last() {
            if let Some(last) = open.children.last().copied() {
                if last.kind() == ChildKind::Text {
                    let t = &mut self.texts[last.index() as usize];
                    let combined = usize::from(t.span.len) + (run.end - run.start);
                    if t.span.end() == run.start && combined <= usize::from(u16::MAX) {
                        t.span.len = combined as u16;
                        if needs_decode {
                            t.packed |= TEXT_FLAG_DECODE;
                        }
                        return Ok(());
                    }
                }
            }
        }
        self.push_text_run(run, needs_decode, false)
    }

    fn cdata(&mut self, run: Range<usize>, _tag: Range<usize>) -> Result<()> {
        self.push_text_run(run, false, true)
    }

    fn doctype(&mut self, _tag: Range<usize>) -> Result<()> {
        self.doctype_seen = true;
        Ok(())
    }
}
