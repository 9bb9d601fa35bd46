/*!
 * Tests for the tagged prompt protocol.
 */

use doctran::segment::Segment;
use doctran::translation::PromptCodec;

fn segment(index: usize, text: &str) -> Segment {
    Segment::new("file-1", index, text)
}

#[test]
fn test_decode_syntheticMarkers_shouldReturnExactlyOneEntryPerMarker() {
    // N synthetic markers with distinct trailing text
    let n = 25;
    let response: String = (0..n)
        .map(|i| format!("[SEG{}]\ntranslation number {}", i, i))
        .collect::<Vec<_>>()
        .join("\n\n");

    let decoded = PromptCodec::decode(&response);
    assert_eq!(decoded.len(), n);
    for i in 0..n {
        assert_eq!(decoded[&i], format!("translation number {}", i));
    }
}

#[test]
fn test_decode_shouldTrimWhitespaceAroundEntries() {
    let decoded = PromptCodec::decode("[SEG0]\n\n   spaced out   \n\n[SEG1]\nplain");
    assert_eq!(decoded[&0], "spaced out");
    assert_eq!(decoded[&1], "plain");
}

#[test]
fn test_decode_missingMarker_shouldBeAbsentNotEmpty() {
    let response = "[SEG0]\nfirst\n\n[SEG2]\nthird";
    let decoded = PromptCodec::decode(response);
    assert!(decoded.contains_key(&0));
    assert!(decoded.contains_key(&2));
    // Missing entries must be treated as failures by the caller, so they
    // must not surface as empty strings
    assert!(decoded.get(&1).is_none());
}

#[test]
fn test_decode_multilineEntries_shouldKeepInnerLineBreaks() {
    let decoded = PromptCodec::decode("[SEG0]\nline one\nline two\n\n[SEG1]\nnext");
    assert_eq!(decoded[&0], "line one\nline two");
}

#[test]
fn test_encode_nonContiguousIndices_shouldUseSegmentIndices() {
    // A batch planned from a snapshot of retryable segments can carry
    // arbitrary document indices
    let batch = vec![segment(4, "four"), segment(9, "nine")];
    let prompt = PromptCodec::encode(&batch);
    assert!(prompt.contains("[SEG4]\nfour"));
    assert!(prompt.contains("[SEG9]\nnine"));
    assert!(!prompt.contains("[SEG0]"));
}

#[test]
fn test_encode_decode_shouldRoundTripMarkupText() {
    let batch = vec![segment(0, "Click <g id=\"1\">here</g> now")];
    let decoded = PromptCodec::decode(&PromptCodec::encode(&batch));
    assert_eq!(decoded[&0], "Click <g id=\"1\">here</g> now");
}
