use std::io::{self, Cursor, Read};

use adiflog::adif::{Decoder, DecoderOptions, RawRecord, tags::scan_fields};

fn decode(bytes: &[u8]) -> Vec<RawRecord> {
    Decoder::new(Cursor::new(bytes.to_vec()))
        .expect("decoder")
        .collect::<Result<Vec<_>, _>>()
        .expect("decode")
}

fn calls(records: &[RawRecord]) -> Vec<&str> {
    records.iter().filter_map(|r| r.get("CALL")).collect()
}

#[test]
fn free_text_header_is_skipped_up_to_eoh() {
    let text = "Exported by some logger <not a field>\n\
                <ADIF_VER:5>3.1.4 <PROGRAMID:6>Logger\n\
                <EOH>\n\
                <CALL:5>K1ABC <BAND:3>20M <EOR>\n\
                <CALL:5>W2DEF <BAND:3>40M <EOR>\n";
    let records = decode(text.as_bytes());

    assert_eq!(calls(&records), vec!["K1ABC", "W2DEF"]);
    assert!(records.iter().all(|r| r.get("PROGRAMID").is_none()));
}

#[test]
fn missing_eoh_treats_whole_input_as_records() {
    let text = "some preamble\n<CALL:5>K1ABC <EOR>\n<CALL:5>W2DEF <EOR>\n";
    let records = decode(text.as_bytes());

    assert_eq!(calls(&records), vec!["K1ABC", "W2DEF"]);
}

#[test]
fn tag_only_header_before_first_record_is_dropped() {
    let text = "<ADIF_VER:5>3.1.4 <EOH>\n<CALL:5>K1ABC <EOR>\n";
    let records = decode(text.as_bytes());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("ADIF_VER"), None);
    assert_eq!(records[0].get("CALL"), Some("K1ABC"));
}

#[test]
fn record_terminators_match_case_insensitively_and_may_share_a_line() {
    let text = "<call:5>K1ABC <eor><CALL:5>W2DEF <EoR>\n";
    let records = decode(text.as_bytes());

    assert_eq!(calls(&records), vec!["K1ABC", "W2DEF"]);
}

#[test]
fn record_spanning_lines_is_joined() {
    let text = "<CALL:5>K1ABC\n<BAND:3>20M\n<MODE:2>CW\n<EOR>\n";
    let records = decode(text.as_bytes());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("BAND"), Some("20M"));
    assert_eq!(records[0].get("MODE"), Some("CW"));
}

#[test]
fn trailing_record_without_eor_is_still_emitted() {
    let text = "<CALL:5>K1ABC <EOR>\n<CALL:5>W2DEF <MODE:2>CW\n";
    let records = decode(text.as_bytes());

    assert_eq!(calls(&records), vec!["K1ABC", "W2DEF"]);
}

#[test]
fn chunks_without_fields_are_not_records() {
    let text = "<CALL:5>K1ABC <EOR>\n   \n<EOR>\nstray words <EOR>\n";
    let records = decode(text.as_bytes());

    assert_eq!(records.len(), 1);
}

#[test]
fn value_length_counts_characters_and_ignores_what_follows() {
    let text = "<CALL:5>K1ABCDEF<NAME:4>José<EOR>";
    let records = decode(text.as_bytes());

    assert_eq!(records[0].get("CALL"), Some("K1ABC"));
    assert_eq!(records[0].get("NAME"), Some("José"));
}

#[test]
fn zero_length_fields_are_absent() {
    let records = decode(b"<CALL:5>K1ABC <BAND:0> <EOR>");

    assert_eq!(records[0].get("BAND"), None);
}

#[test]
fn repeated_tag_keeps_last_value() {
    let records = decode(b"<MODE:2>CW <MODE:3>SSB <EOR>");

    assert_eq!(records[0].get("mode"), Some("SSB"));
}

#[test]
fn type_indicator_is_ignored() {
    let records = decode(b"<FREQ:6:N>14.025 <EOR>");

    assert_eq!(records[0].get("FREQ"), Some("14.025"));
}

#[test]
fn values_keep_case_by_default() {
    let records = decode(b"<CALL:5>K1ABC <COMMENT:9>Nice chat <EOR>");

    assert_eq!(records[0].get("COMMENT"), Some("Nice chat"));
}

#[test]
fn legacy_option_upper_cases_record_text() {
    let options = DecoderOptions {
        preserve_value_case: false,
        ..DecoderOptions::default()
    };
    let decoder = Decoder::with_options(Cursor::new(b"<call:5>k1abc <comment:9>Nice chat <eor>".to_vec()), options)
        .expect("decoder");
    let records: Vec<_> = decoder.collect::<Result<_, _>>().expect("decode");

    assert_eq!(records[0].get("CALL"), Some("K1ABC"));
    assert_eq!(records[0].get("COMMENT"), Some("NICE CHAT"));
}

#[test]
fn utf8_bom_is_stripped() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"<CALL:5>K1ABC <EOR>\n");
    let records = decode(&bytes);

    assert_eq!(calls(&records), vec!["K1ABC"]);
}

#[test]
fn ascii_input_decodes_as_utf8() {
    let decoder = Decoder::new(Cursor::new(b"<CALL:5>K1ABC <EOR>".to_vec())).expect("decoder");

    assert_eq!(decoder.encoding(), encoding_rs::UTF_8);
}

#[test]
fn latin1_input_is_transcoded() {
    let comment = "Très bien reçu, à bientôt et merci à vous, très cordialement";
    let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(comment);

    let mut bytes = b"<CALL:5>F5ABC <COMMENT:".to_vec();
    bytes.extend_from_slice(comment.chars().count().to_string().as_bytes());
    bytes.extend_from_slice(b">");
    bytes.extend_from_slice(&encoded);
    bytes.extend_from_slice(b" <EOR>\n");

    let decoder = Decoder::new(Cursor::new(bytes)).expect("decoder");
    assert_ne!(decoder.encoding(), encoding_rs::UTF_8);
    let records: Vec<_> = decoder.collect::<Result<_, _>>().expect("decode");

    assert_eq!(records[0].get("COMMENT"), Some(comment));
}

#[test]
fn raw_text_is_kept_for_diagnostics() {
    let records = decode(b"\n  <CALL:5>K1ABC <MODE:2>CW  <EOR>");

    assert_eq!(records[0].text(), "<CALL:5>K1ABC <MODE:2>CW");
}

#[test]
fn scanner_recovers_from_stray_angle_bracket() {
    let fields = scan_fields("a < b <CALL:5>K1ABC");

    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "CALL");
    assert_eq!(fields[0].declared_len, 5);
    assert_eq!(fields[0].value, "K1ABC");
}

#[test]
fn scanner_truncates_value_at_end_of_text() {
    let fields = scan_fields("<NAME:10>Bob");

    assert_eq!(fields[0].declared_len, 10);
    assert_eq!(fields[0].value, "Bob");
}

fn utf16_bytes(text: &str, big_endian: bool) -> Vec<u8> {
    let mut bytes = if big_endian { vec![0xFE, 0xFF] } else { vec![0xFF, 0xFE] };
    for unit in text.encode_utf16() {
        let pair = if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
        bytes.extend_from_slice(&pair);
    }
    bytes
}

#[test]
fn utf16_little_endian_with_bom_is_transcoded() {
    let text = "Exported\n<EOH>\n<CALL:5>K1ABC <NAME:4>José <EOR>\n<CALL:5>W2DEF <EOR>\n";
    let decoder = Decoder::new(Cursor::new(utf16_bytes(text, false))).expect("decoder");
    assert_eq!(decoder.encoding(), encoding_rs::UTF_16LE);

    let records: Vec<RawRecord> = decoder.collect::<Result<_, _>>().expect("decode");
    assert_eq!(calls(&records), vec!["K1ABC", "W2DEF"]);
    assert_eq!(records[0].get("NAME"), Some("José"));
}

#[test]
fn utf16_big_endian_with_bom_is_transcoded() {
    let text = "<CALL:5>K1ABC <BAND:3>20M <EOR>\n";
    let decoder = Decoder::new(Cursor::new(utf16_bytes(text, true))).expect("decoder");
    assert_eq!(decoder.encoding(), encoding_rs::UTF_16BE);

    let records: Vec<RawRecord> = decoder.collect::<Result<_, _>>().expect("decode");
    assert_eq!(calls(&records), vec!["K1ABC"]);
    assert_eq!(records[0].get("BAND"), Some("20M"));
}

#[test]
fn multibyte_text_split_across_reads_is_reassembled() {
    let mut text = String::from("<EOH>\n");
    for _ in 0..300 {
        text.push_str("<CALL:5>K1ABC <NAME:6>Jürgen <EOR>\n");
    }
    let options = DecoderOptions {
        sniff_bytes: 7,
        ..DecoderOptions::default()
    };
    let records: Vec<RawRecord> = Decoder::with_options(Cursor::new(text.into_bytes()), options)
        .expect("decoder")
        .collect::<Result<_, _>>()
        .expect("decode");

    assert_eq!(records.len(), 300);
    assert!(records.iter().all(|r| r.get("NAME") == Some("Jürgen")));
}

/// Serves its bytes, then fails every later read.
struct FailsAfter {
    data: Cursor<Vec<u8>>,
}

impl Read for FailsAfter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::other("source stalled")),
            n => Ok(n),
        }
    }
}

#[test]
fn records_stream_before_the_source_ends_without_eoh() {
    let mut text = String::from("exported by hand\n");
    for i in 0..40 {
        text.push_str(&format!("<CALL:5>K{}ABC <BAND:3>20M <MODE:2>CW <EOR>\n", i % 10));
    }
    assert!(text.len() > 1024);

    let source = FailsAfter {
        data: Cursor::new(text.into_bytes()),
    };
    let mut decoder = Decoder::new(source).expect("decoder");

    let first = decoder.next().expect("item").expect("record");
    assert_eq!(first.get("CALL"), Some("K0ABC"));

    let items: Vec<_> = decoder.collect();
    assert_eq!(items.iter().filter(|item| item.is_ok()).count(), 39);
    assert!(items.last().expect("error").is_err());
}

#[test]
fn leading_text_without_eoh_is_not_a_field() {
    let text = "hand written log\n<CALL:5>K1ABC <EOR>\n<CALL:5>W2DEF <EOR>";
    let records = decode(text.as_bytes());

    assert_eq!(calls(&records), vec!["K1ABC", "W2DEF"]);
    assert_eq!(records[0].fields().len(), 1);
}
