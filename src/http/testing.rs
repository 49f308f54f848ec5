//! Schema fixtures shared by the HTTP unit tests.

use std::fs;

use crate::registry::ServiceRegistry;
use crate::schema::ParseOptions;

pub const CALCULATOR: &str = r#"<?xml version="1.0"?>
<xhttp:service xmlns:xhttp="http://www.xhttp.org/schema">
  <xhttp:schema version="0.9"/>
  <xhttp:schema version="1.0">
    <xhttp:info name="service" value="calculator"/>
    <xhttp:info name="link" value="http://x"/>
    <xhttp:action name="add" function="add">
      <xhttp:return type="3"/>
      <xhttp:exception code="1" message="Overflow"/>
      <xhttp:argument name="a" type="3"/>
      <xhttp:argument name="b" type="3"/>
    </xhttp:action>
    <xhttp:action name="noop" function="noop">
      <xhttp:return type="0"/>
    </xhttp:action>
  </xhttp:schema>
</xhttp:service>
"#;

/// Declares only version 2.0, which this node does not speak.
pub const LEGACY: &str = r#"<xhttp:service xmlns:xhttp="http://www.xhttp.org/schema">
  <xhttp:schema version="2.0"/>
</xhttp:service>
"#;

/// Registry with the `calculator` and `legacy` services.
pub fn registry() -> ServiceRegistry {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("calculator.xml"), CALCULATOR).unwrap();
    fs::write(dir.path().join("legacy.xml"), LEGACY).unwrap();
    ServiceRegistry::load(dir.path(), ParseOptions::default()).unwrap()
}
