//! Shared utilities for integration and load testing.

use arc_swap::ArcSwap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

use xhttp_node::{ControllerRegistry, HttpServer, NodeConfig, ServiceRegistry, SharedRegistry, Shutdown};
use xhttp_sdk::XhttpClient;

pub const CALCULATOR: &str = r#"<?xml version="1.0"?>
<xhttp:service xmlns:xhttp="http://www.xhttp.org/schema">
  <xhttp:schema version="1.0">
    <xhttp:info name="service" value="calculator"/>
    <xhttp:info name="link" value="http://x"/>
    <xhttp:action name="add" function="add">
      <xhttp:return type="3"/>
      <xhttp:exception code="1" message="Overflow"/>
      <xhttp:exception code="99" message="Unknown"/>
      <xhttp:argument name="a" type="3"/>
      <xhttp:argument name="b" type="3"/>
    </xhttp:action>
  </xhttp:schema>
  <xhttp:schema version="0.9">
    <xhttp:info name="service" value="calculator"/>
  </xhttp:schema>
</xhttp:service>
"#;

pub const GREETER: &str = r#"<xhttp:service xmlns:xhttp="http://www.xhttp.org/schema">
  <xhttp:schema version="1.0">
    <xhttp:info name="service" value="greeter"/>
  </xhttp:schema>
</xhttp:service>
"#;

/// A node serving a temporary service directory.
pub struct TestNode {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub registry: SharedRegistry,
    shutdown: Shutdown,
}

impl TestNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> XhttpClient {
        XhttpClient::new(&self.url())
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn write_service(dir: &Path, name: &str, xml: &str) {
    fs::write(dir.join(format!("{}.xml", name)), xml).unwrap();
}

/// Start a node with the calculator service on an ephemeral port.
pub async fn start_node(controllers: ControllerRegistry) -> TestNode {
    start_node_with(NodeConfig::default(), controllers).await
}

#[allow(dead_code)]
pub async fn start_node_with(config: NodeConfig, controllers: ControllerRegistry) -> TestNode {
    let dir = tempfile::tempdir().unwrap();
    write_service(dir.path(), "calculator", CALCULATOR);

    let registry = ServiceRegistry::load(dir.path(), config.registry.parse_options()).unwrap();
    let registry: SharedRegistry = Arc::new(ArcSwap::from_pointee(registry));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, registry.clone(), controllers);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestNode {
        addr,
        dir,
        registry,
        shutdown,
    }
}
