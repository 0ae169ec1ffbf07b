//! Integration tests for `gprops aux` (auxiliary configuration passthrough).

mod common;

use common::TestEnv;
use predicates::prelude::*;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gradle-props>
  <source-level>11</source-level>
  <vendor-ext mode="fast">
    <!-- tuned by hand -->
    <flag>on</flag>
  </vendor-ext>
  <ide xmlns="urn:example:ide"><indent size="4"/></ide>
</gradle-props>
"#;

#[test]
fn test_aux_list_in_key_order() {
    let env = TestEnv::new();
    env.write_file("gradle-props.xml", DOCUMENT);
    let value = env.json(&["aux", "list"]);
    assert_eq!(
        value["elements"],
        serde_json::json!(["{urn:example:ide}ide", "vendor-ext"])
    );
}

#[test]
fn test_aux_get_returns_original_text() {
    let env = TestEnv::new();
    env.write_file("gradle-props.xml", DOCUMENT);
    env.gprops()
        .args(["-H", "aux", "get", "vendor-ext"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<!-- tuned by hand -->"));
}

#[test]
fn test_unrelated_set_keeps_aux_bytes() {
    let env = TestEnv::new();
    env.write_file("gradle-props.xml", DOCUMENT);
    env.json(&["set", "source-level", "17"]);

    let file = env.read_file("gradle-props.xml");
    assert!(file.contains("<source-level>17</source-level>"));
    assert!(file.contains(
        "<vendor-ext mode=\"fast\">\n    <!-- tuned by hand -->\n    <flag>on</flag>\n  </vendor-ext>"
    ));
    assert!(file.contains(r#"<ide xmlns="urn:example:ide"><indent size="4"/></ide>"#));
}

#[test]
fn test_aux_set_and_remove() {
    let env = TestEnv::new();
    env.json(&["aux", "set", "<lint><rule id=\"x\"/></lint>", "--profile", "debug"]);
    assert!(
        env.read_file(".gradle-props/profiles/debug.xml")
            .contains(r#"<lint><rule id="x"/></lint>"#)
    );

    let removed = env.json(&["aux", "remove", "lint", "--profile", "debug"]);
    assert_eq!(removed["xml"], serde_json::Value::Null);
    assert!(
        !env.read_file(".gradle-props/profiles/debug.xml")
            .contains("lint")
    );
}

#[test]
fn test_aux_get_standard_property_is_not_found() {
    let env = TestEnv::new();
    env.write_file("gradle-props.xml", DOCUMENT);
    env.gprops()
        .args(["aux", "get", "source-level"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No auxiliary element"));
}

#[test]
fn test_aux_set_rejects_malformed_xml() {
    let env = TestEnv::new();
    env.gprops()
        .args(["aux", "set", "<lint>"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("XML error"));
}

#[test]
fn test_aux_set_empty_and_attribute_only_elements() {
    let env = TestEnv::new();
    env.json(&["aux", "set", "<marker/>"]);
    env.json(&["aux", "set", r#"<flag enabled="true"/>"#]);

    let value = env.json(&["aux", "list"]);
    assert_eq!(value["elements"], serde_json::json!(["flag", "marker"]));
    let marker = env.json(&["aux", "get", "marker"]);
    assert_eq!(marker["xml"], "<marker/>");

    let file = env.read_file("gradle-props.xml");
    assert!(file.contains("  <marker/>\n"));
    assert!(file.contains(r#"  <flag enabled="true"/>"#));
}

#[test]
fn test_aux_set_with_prolog_keeps_file_readable() {
    let env = TestEnv::new();
    env.write_file("gradle-props.xml", DOCUMENT);
    let value = env.json(&[
        "aux",
        "set",
        "<?xml version=\"1.0\"?>\n<!-- exported -->\n  <ext>1</ext>\n\n",
    ]);
    assert_eq!(value["xml"], "<ext>1</ext>");

    let file = env.read_file("gradle-props.xml");
    assert_eq!(file.matches("<?xml").count(), 1);
    assert!(!file.contains("exported"));

    // Later saves still go through.
    env.json(&["set", "source-level", "21"]);
    assert_eq!(env.json(&["aux", "get", "ext"])["xml"], "<ext>1</ext>");
    assert!(env.read_file("gradle-props.xml").contains("<!-- tuned by hand -->"));
}

#[test]
fn test_aux_overwrite_then_remove() {
    let env = TestEnv::new();
    env.write_file("gradle-props.xml", DOCUMENT);
    env.json(&["aux", "set", "  <vendor-ext mode=\"slow\"/>  "]);
    let file = env.read_file("gradle-props.xml");
    assert!(file.contains("  <vendor-ext mode=\"slow\"/>\n"));
    assert!(!file.contains("tuned by hand"));

    env.json(&["aux", "remove", "vendor-ext"]);
    let value = env.json(&["aux", "list"]);
    assert_eq!(value["elements"], serde_json::json!(["{urn:example:ide}ide"]));
    assert!(env.read_file("gradle-props.xml").contains("<source-level>11</source-level>"));
}
