use sebkey::{from_str, serialize, sha256_hex, Config, Dictionary, ErrorKind, SebFile, Value};

const EXAM_SEB: &str = include_str!("fixtures/valid/exam.seb");
const BOM_SEB: &[u8] = include_bytes!("fixtures/valid/bom.seb");

const EXAM_SERIALIZED: &str = concat!(
    r#"{"allowQuit":false,"browserUserAgent":"","browserWindowWebView":3,"#,
    r#""defaultPageZoomLevel":1.5,"examKeySalt":"3715235948,1432883798,3512651009","#,
    r#""hashedQuitPassword":"ZmFrZQ==","permittedProcesses":[],"#,
    r#""prohibitedProcesses":[{"active":true,"executable":"Teams","os":1}],"#,
    r#""sendBrowserExamKey":true,"startURL":"https://moodle.example.edu/mod/quiz/view.php?id=42","#,
    r#""URLFilterRules":[{"action":1,"expression":"moodle.example.edu"}]}"#,
);

#[test]
fn test_exam_fixture_hashes() -> Result<(), Box<dyn std::error::Error>> {
    let seb = SebFile::from_xml(EXAM_SEB)?;

    assert_eq!(
        seb.start_url(),
        Some("https://moodle.example.edu/mod/quiz/view.php?id=42")
    );
    assert_eq!(seb.serialized_json(), EXAM_SERIALIZED);
    assert_eq!(
        seb.config_hash(),
        "6d4f47ac21da2838ff3a1236f25eaef129e3c3d32ba3026d7b7cf6111104474b"
    );
    assert_eq!(
        seb.request_hash(),
        "c1847e827b2bbc055fef089d0100f75c4187c7e902d363463c3f659cbde3b135"
    );
    assert_eq!(
        seb.config_key_for_start_url(),
        "ee392e21b78e4e990ff8d393e18fd32aa029bb73b5a213104251be5d80406004"
    );
    Ok(())
}

#[test]
fn test_exam_fixture_dictionary_keeps_everything() -> Result<(), Box<dyn std::error::Error>> {
    let dict = from_str(EXAM_SEB)?;

    // excluded keys are only dropped from the serialization
    assert!(dict.contains_key("originatorVersion"));
    assert_eq!(
        dict.get("embeddedCertificates"),
        Some(&Value::Dict(Dictionary::new()))
    );
    assert_eq!(dict.get("browserWindowWebView"), Some(&Value::Number(3.0)));
    assert_eq!(dict.len(), 13);
    Ok(())
}

#[test]
fn test_hashes_are_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let first = SebFile::from_xml(EXAM_SEB)?;
    let second = SebFile::from_xml(EXAM_SEB)?;

    assert_eq!(first.config_hash(), second.config_hash());
    assert_eq!(first.request_hash(), second.request_hash());
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_serialization_independent_of_construction() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = from_str("<dict><key>b</key><integer>1</integer><key>A</key><true/></dict>")?;

    let mut built = Dictionary::new();
    built.insert("b", 1i32);
    built.insert("A", true);

    assert_eq!(serialize(&parsed), serialize(&built));
    assert_eq!(serialize(&built), r#"{"A":true,"b":1}"#);
    Ok(())
}

#[test]
fn test_salt_and_missing_salt() -> Result<(), Box<dyn std::error::Error>> {
    let salted = SebFile::from_xml("<dict><key>examKeySalt</key><string>1,2,3</string></dict>")?;
    assert_eq!(salted.request_hash(), sha256_hex("1,2,3"));

    let unsalted = SebFile::from_xml("<dict/>")?;
    assert_eq!(unsalted.request_hash(), sha256_hex(""));
    assert_eq!(unsalted.serialized_json(), "{}");
    assert_eq!(unsalted.config_hash(), sha256_hex("{}"));
    Ok(())
}

#[test]
fn test_array_parsing() -> Result<(), Box<dyn std::error::Error>> {
    let dict = from_str("<dict><key>list</key><array><true/><false/><integer>5</integer></array></dict>")?;
    assert_eq!(
        dict.get("list"),
        Some(&Value::Array(vec![
            Value::Bool(true),
            Value::Bool(false),
            Value::Number(5.0)
        ]))
    );
    assert_eq!(serialize(&dict), r#"{"list":[true,false,5]}"#);
    Ok(())
}

#[test]
fn test_nested_dict_follows_outer_rules() -> Result<(), Box<dyn std::error::Error>> {
    let dict = from_str(
        "<dict><key>outer</key><dict>\
         <key>Zeta</key><true/>\
         <key>ORIGINATORVERSION</key><string>x</string>\
         <key>alpha</key><dict/>\
         <key>beta</key><array/>\
         </dict></dict>",
    )?;
    assert_eq!(serialize(&dict), r#"{"outer":{"beta":[],"Zeta":true}}"#);
    Ok(())
}

#[test]
fn test_malformed_input_is_error() {
    for input in ["", "not xml", "<plist><dict>", "<dict></plist>", "\u{0}\u{1}"] {
        assert!(SebFile::from_xml(input).is_err(), "accepted {input:?}");
    }
}

#[test]
fn test_config_key_composition() -> Result<(), Box<dyn std::error::Error>> {
    let seb = SebFile::from_xml(EXAM_SEB)?;
    for url in ["", "https://a.example", "not a url at all"] {
        let expected = sha256_hex(format!("{url}{}", seb.config_hash()));
        assert_eq!(seb.config_key(url), expected);
    }
    Ok(())
}

#[test]
fn test_byte_order_mark_does_not_change_hashes() -> Result<(), Box<dyn std::error::Error>> {
    assert!(BOM_SEB.starts_with(b"\xEF\xBB\xBF"));
    let with_bom = SebFile::from_bytes(BOM_SEB)?;
    let plain = SebFile::from_xml(EXAM_SEB)?;

    assert_eq!(with_bom.serialized_json(), EXAM_SERIALIZED);
    assert_eq!(with_bom.config_hash(), plain.config_hash());
    assert_eq!(with_bom.request_hash(), plain.request_hash());
    assert_eq!(with_bom.config_key_for_start_url(), plain.config_key_for_start_url());
    Ok(())
}

#[test]
fn test_deep_nesting_is_an_error_even_without_limits() {
    let depth = 200_000;
    let xml = format!(
        "<plist><dict><key>k</key>{}{}</dict></plist>",
        "<array>".repeat(depth),
        "</array>".repeat(depth)
    );
    let err = SebFile::from_xml_with_config(&xml, Config::unlimited()).err();
    assert!(matches!(
        err.map(|e| e.kind().clone()),
        Some(ErrorKind::MaxDepthExceeded { .. })
    ));
}
