//! Loading documents through the public parser API.

use yaml_bridge::{
    BuildFailure, Detection, Document, Encoding, Error, ErrorKind, Mark, Node, NodeValue, Parser,
};

fn load(bytes: &[u8]) -> Document {
    Parser::from_bytes(bytes).load().unwrap()
}

fn assert_single_pair(document: &Document) {
    let root = document.root().unwrap();
    let pairs = root.pairs().unwrap();
    assert_eq!(pairs.len(), 1);
    let (key, value) = &pairs[0];
    assert_eq!(key.as_str(), Some("a"));
    assert_eq!(value.as_str(), Some("b"));
    assert!(!key.is_quoted());
    assert!(!value.is_quoted());
}

#[test]
fn test_utf8_bom_input() {
    let mut parser = Parser::from_bytes(&[0xEF, 0xBB, 0xBF, 0x61, 0x3A, 0x20, 0x62]);
    assert_eq!(parser.encoding(), Encoding::Utf8);
    assert_eq!(parser.detection(), Detection::Utf8Bom);
    assert_single_pair(&parser.load().unwrap());
}

#[test]
fn test_utf16_le_bom_input() {
    let mut parser =
        Parser::from_bytes(&[0xFF, 0xFE, 0x61, 0x00, 0x3A, 0x00, 0x20, 0x00, 0x62, 0x00]);
    assert_eq!(parser.encoding(), Encoding::Utf16Le);
    assert_single_pair(&parser.load().unwrap());
}

#[test]
fn test_utf16_be_without_bom() {
    let bytes: Vec<u8> = "a: b\n".encode_utf16().flat_map(u16::to_be_bytes).collect();
    let mut parser = Parser::from_bytes(&bytes);
    assert_eq!(parser.detection(), Detection::Utf16BeHeuristic);
    assert_single_pair(&parser.load().unwrap());
}

#[test]
fn test_windows_1252_input() {
    let document = load(b"caf\xE9: \x80\n");
    let root = document.root().unwrap();
    assert_eq!(root.get("caf\u{E9}").and_then(Node::as_str), Some("\u{20AC}"));
}

#[test]
fn test_empty_input() {
    let mut parser = Parser::from_bytes(b"");
    assert_eq!(parser.detection(), Detection::Utf8);
    assert!(parser.load().unwrap().is_empty());
}

#[test]
fn test_duplicate_keys_are_kept() {
    let document = load(b"a: 1\na: 2\n");
    let root = document.root().unwrap();
    assert_eq!(root.len(), 2);
    let values: Vec<_> = root.get_all("a").filter_map(Node::as_str).collect();
    assert_eq!(values, ["1", "2"]);
}

#[test]
fn test_quoted_flag() {
    let document = load(b"- '123'\n- \"123\"\n- 123\n");
    let items = document.root().and_then(Node::items).unwrap();
    let quoted: Vec<_> = items.iter().map(Node::is_quoted).collect();
    assert_eq!(quoted, [true, true, false]);
    assert!(items.iter().all(|item| item.as_str() == Some("123")));
}

#[test]
fn test_nesting_limit() {
    let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));

    let document = load(nested(Document::MAX_NESTING_DEPTH).as_bytes());
    let mut node = document.root().unwrap();
    let mut depth = 1;
    while let Some([child]) = node.items() {
        node = child;
        depth += 1;
    }
    assert_eq!(depth, Document::MAX_NESTING_DEPTH);

    let err = Parser::from_str(&nested(Document::MAX_NESTING_DEPTH + 1))
        .load()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::BuildFailed(BuildFailure::TooManyNestedLayers { limit: 100 })
    ));
}

#[test]
fn test_recursive_alias_hits_nesting_limit() {
    let err = Parser::from_str("&a [*a]\n").load().unwrap_err();
    assert!(matches!(
        err,
        Error::BuildFailed(BuildFailure::TooManyNestedLayers { .. })
    ));
}

#[test]
fn test_invalid_mapping_key() {
    let err = Parser::from_str("? [a, b]\n: c\n").load().unwrap_err();
    let yaml = err.as_yaml().unwrap();
    assert_eq!(yaml.kind, ErrorKind::Policy);
    assert_eq!(yaml.problem, "invalid mapping key");
    assert_eq!(yaml.mark, Some(Mark::new(1, 3)));
}

#[test]
fn test_marks_point_at_node_starts() {
    let document = load(b"top: 1\nnested:\n  xy: 1\n");
    let root = document.root().unwrap();
    assert_eq!(root.mark, Some(Mark::new(1, 1)));
    assert_eq!(root.get("top").and_then(|n| n.mark), Some(Mark::new(1, 6)));
    assert_eq!(root.get("nested").and_then(|n| n.mark), Some(Mark::new(3, 3)));
}

#[test]
fn test_reader_error_after_bom() {
    let err = Parser::from_bytes(&[0xFE, 0xFF, 0x00, 0x61, 0xDC, 0x00])
        .load()
        .unwrap_err();
    let yaml = err.as_yaml().unwrap();
    assert_eq!(yaml.kind, ErrorKind::Reader);
    assert_eq!(yaml.problem, "unexpected low surrogate area");
    assert_eq!(yaml.value, Some(0xDC00));
    assert!(yaml.offset.is_some());
}

#[test]
fn test_syntax_errors_carry_marks() {
    let err = Parser::from_str("a: [b\n").load().unwrap_err();
    let yaml = err.as_yaml().unwrap();
    assert!(matches!(yaml.kind, ErrorKind::Scanner | ErrorKind::Parser));
    assert!(yaml.mark.is_some());

    let err = Parser::from_str("a: *missing\n").load().unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Composer));
}

#[test]
fn test_io_errors_surface() {
    struct Broken;
    impl std::io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk on fire"))
        }
    }
    assert!(matches!(Parser::from_reader(Broken), Err(Error::Io(_))));
}

#[test]
fn test_document_serializes() {
    let document = load(b"k: [v, 'w']\n");
    let json = serde_json::to_value(&document).unwrap();
    let back: Document = serde_json::from_value(json).unwrap();
    assert_eq!(back, document);
    assert!(matches!(
        back.root().map(|root| &root.value),
        Some(NodeValue::Mapping(_))
    ));
}
