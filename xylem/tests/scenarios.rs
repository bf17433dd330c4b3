//! End-to-end scenarios across parse, query, SAX and streaming.

use xylem::{
    parse_lenient, parse_strict, root, sax_parse, streaming_new, xpath, xpath_text_list,
    DocumentAccess, IndexNode, ParseMode, SaxEvent, Value,
};

fn names(doc: &xylem::StructuralIndex, expr: &str) -> Vec<String> {
    match xpath(doc, expr).unwrap() {
        Value::NodeSet(nodes) => nodes.iter().map(|n| doc.name(*n)).collect(),
        v => panic!("expected node-set, got {v:?}"),
    }
}

#[test]
fn count_of_repeated_siblings() {
    let doc = parse_strict(b"<root><a/><a/><a/></root>").unwrap();
    assert_eq!(xpath(&doc, "count(//a)").unwrap(), Value::Number(3.0));
}

#[test]
fn attribute_values_as_strings() {
    let doc =
        parse_strict(br#"<root><item id="1">A</item><item id="2">B</item></root>"#).unwrap();
    assert_eq!(xpath_text_list(&doc, "//item/@id").unwrap(), ["1", "2"]);
}

#[test]
fn sum_over_element_contents() {
    let doc = parse_strict(b"<r><x>1</x><x>2</x><x>3</x></r>").unwrap();
    assert_eq!(xpath(&doc, "sum(/r/x)").unwrap(), Value::Number(6.0));
}

#[test]
fn ancestors_in_document_order() {
    let doc = parse_strict(b"<r><a><b><c/></b></a></r>").unwrap();
    assert_eq!(names(&doc, "//c/ancestor::*"), ["r", "a", "b"]);
}

#[test]
fn prolog_comment_and_cdata() {
    let doc = parse_strict(
        b"<?xml version=\"1.0\"?><!-- hi --><root><![CDATA[<not a tag>]]></root>",
    )
    .unwrap();
    assert_eq!(
        xpath(&doc, "string(/root)").unwrap(),
        Value::String("<not a tag>".to_string())
    );
}

#[test]
fn streaming_ten_thousand_items() {
    let mut stream = streaming_new(Some("item"), ParseMode::Strict);
    let chunk = b"<item/>".repeat(500);
    for _ in 0..20 {
        stream.feed(&chunk).unwrap();
    }
    let (available, _) = stream.feed(b"").unwrap();
    assert_eq!(available, 10_000);
    let taken = stream.take(5);
    assert_eq!(taken.len(), 5);
    assert!(taken.iter().all(|e| e == b"<item/>"));
}

#[test]
fn invalid_name_strict_vs_lenient() {
    assert!(parse_strict(b"<1invalid/>").is_err());
    let doc = parse_lenient(b"<1invalid/>");
    assert_eq!(doc.qname(doc.root_element().unwrap()), "1invalid");
}

#[test]
fn predefined_entities_decode() {
    let doc = parse_strict(b"<root><a>&amp;&lt;&gt;&apos;&quot;</a></root>").unwrap();
    assert_eq!(
        xpath(&doc, "string(/root/a)").unwrap(),
        Value::String("&<>'\"".to_string())
    );
}

#[test]
fn root_name_matches_outermost_element() {
    let doc = parse_strict(b"<outer><inner/></outer>").unwrap();
    let handle = root(&doc).unwrap();
    assert_eq!(doc.name(handle), "outer");
    // the path `/outer` selects the same node
    let Value::NodeSet(nodes) = xpath(&doc, "/outer").unwrap() else {
        panic!("expected node-set")
    };
    assert_eq!(nodes, vec![handle]);
}

#[test]
fn node_sets_are_ordered_and_unique() {
    let doc = parse_strict(b"<r><a><b/></a><a><b/></a></r>").unwrap();
    let Value::NodeSet(nodes) = xpath(&doc, "//a/b | //b | //a//b").unwrap() else {
        panic!("expected node-set")
    };
    assert_eq!(nodes.len(), 2);
    for pair in nodes.windows(2) {
        assert_eq!(
            doc.document_order(pair[0], pair[1]),
            std::cmp::Ordering::Less
        );
    }
}

#[test]
fn streaming_round_trips_flat_documents() {
    let input = b"<item a=\"1\">x</item><item a=\"2\"><sub/></item><item/>";
    let mut stream = streaming_new(None, ParseMode::Strict);
    stream.feed(input).unwrap();
    let parts = stream.finalize().unwrap();
    let rejoined: Vec<u8> = parts.concat();
    assert_eq!(rejoined, input);
}

#[test]
fn malformed_inputs_error_strictly_and_survive_leniently() {
    let cases: &[&[u8]] = &[
        b"<a>",
        b"<a></b>",
        b"<a attr=value/>",
        b"<a x=\"1\" x=\"2\"/>",
        b"<a>&undefined;</a>",
        b"<a>]]></a>",
        b"<a><!-- -- --></a>",
        b"<a/><b/>",
        b"<a b=\"<\"/>",
        b"<>",
        b"",
    ];
    for case in cases {
        assert!(parse_strict(case).is_err(), "{:?}", String::from_utf8_lossy(case));
        // must not panic; result may be partial
        let _ = parse_lenient(case);
    }
}

#[test]
fn sax_events_for_a_small_document() {
    let events = sax_parse(b"<a>x<b/></a>").unwrap();
    assert_eq!(
        events,
        vec![
            SaxEvent::StartElement {
                name: "a".into(),
                attributes: vec![],
            },
            SaxEvent::Characters("x".into()),
            SaxEvent::StartElement {
                name: "b".into(),
                attributes: vec![],
            },
            SaxEvent::EndElement { name: "b".into() },
            SaxEvent::EndElement { name: "a".into() },
        ]
    );
}

#[test]
fn xpath_errors_carry_the_expression() {
    let doc = parse_strict(b"<a/>").unwrap();
    let err = xpath(&doc, "$var").unwrap_err();
    assert!(err.to_string().contains("$var"));
    let err = xpath(&doc, "a[").unwrap_err();
    assert!(matches!(
        err,
        xylem::Error::Xpath {
            error: xylem::XPathError::Compile(_),
            ..
        }
    ));
}

#[test]
fn lang_property() {
    let doc = parse_strict(br#"<r xml:lang="en-GB"><p><q/></p></r>"#).unwrap();
    let Value::NodeSet(nodes) = xpath(&doc, "//q").unwrap() else {
        panic!("expected node-set")
    };
    let q: IndexNode = nodes[0];
    assert_eq!(
        xylem::xpath_at(&doc, q, "lang('en')").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        xylem::xpath_at(&doc, q, "lang('fr')").unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn utf16_and_crlf_inputs() {
    let text = "<?xml version=\"1.0\" encoding=\"utf-16\"?>\r\n<r>line1\r\nline2</r>";
    let mut utf16 = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    let doc = parse_strict(&utf16).unwrap();
    assert_eq!(
        xpath(&doc, "string(/r)").unwrap(),
        Value::String("line1\nline2".to_string())
    );
}

#[test]
fn doctype_is_skipped_but_recorded() {
    let doc = parse_strict(
        br#"<!DOCTYPE r [ <!ENTITY x "y"> ]><r>&amp;</r>"#,
    )
    .unwrap();
    assert!(doc.doctype_seen());
    assert_eq!(xpath(&doc, "string(/r)").unwrap(), Value::String("&".to_string()));
}
