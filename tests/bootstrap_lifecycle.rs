//! Listener bootstrap and lifecycle tests.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use blazorfront_host::http::AxumHandlerFactory;
use blazorfront_host::lifecycle::{
    BootstrapError, EndpointConfig, HandlerError, ServerFuture, ServerState,
};
use blazorfront_host::net::BoundListener;
use blazorfront_host::orchestration::ServiceContext;
use blazorfront_host::trust::{CertificateError, MemoryStore, Thumbprint};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

mod common;
use common::TestCert;

fn endpoint(port: u32, thumbprint: impl Into<String>) -> EndpointConfig {
    EndpointConfig::new(common::localhost(), port, thumbprint)
}

fn handler() -> AxumHandlerFactory {
    AxumHandlerFactory::new("does-not-exist").with_drain_timeout(Duration::from_secs(1))
}

#[tokio::test]
async fn test_presents_certificate_matching_thumbprint() {
    let other = TestCert::generate();
    let site = TestCert::generate();
    let store = common::memory_store(&[&other, &site]);
    let port = common::free_port();

    let bootstrap = common::bootstrap(store.clone());
    assert_eq!(bootstrap.state(), ServerState::Created);

    let server = bootstrap
        .start(endpoint(port, site.thumbprint.to_string()), handler())
        .await
        .unwrap();
    assert_eq!(server.state(), ServerState::Running);
    assert_eq!(u32::from(server.local_addr().port()), port);
    assert_eq!(store.open_handles(), 0);

    let presented = common::tls_connect(server.local_addr(), &site).await.unwrap();
    assert_eq!(presented, site.der);
    assert_eq!(Thumbprint::of_der(&presented), site.thumbprint);

    server.stop().await;
    assert!(server.wait().await.is_ok());
    assert_eq!(server.state(), ServerState::Stopped);
    assert!(common::port_is_free(port));
}

#[tokio::test]
async fn test_thumbprint_matching_ignores_case_and_separators() {
    let site = TestCert::generate();
    let store = common::memory_store(&[&site]);

    let hex = site.thumbprint.to_string().to_lowercase();
    let pretty = hex
        .as_bytes()
        .chunks(2)
        .map(|pair| std::str::from_utf8(pair).unwrap())
        .collect::<Vec<_>>()
        .join(":");

    let server = common::bootstrap(store)
        .start(endpoint(common::free_port(), format!("\u{200e}{}", pretty)), handler())
        .await
        .unwrap();

    let presented = common::tls_connect(server.local_addr(), &site).await.unwrap();
    assert_eq!(presented, site.der);
    server.stop().await;
}

#[tokio::test]
async fn test_unknown_thumbprint_fails_without_binding() {
    let site = TestCert::generate();
    let store = common::memory_store(&[&site]);
    let missing = TestCert::generate();
    let port = common::free_port();

    let bootstrap = common::bootstrap(store.clone());
    let states = bootstrap.subscribe();

    let err = bootstrap
        .start(endpoint(port, missing.thumbprint.to_string()), handler())
        .await
        .unwrap_err();

    match err {
        BootstrapError::Certificate(CertificateError::CertificateNotFound(thumbprint)) => {
            assert_eq!(thumbprint, missing.thumbprint)
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(*states.borrow(), ServerState::Failed);
    assert_eq!(store.open_handles(), 0);
    assert!(common::port_is_free(port));
}

#[tokio::test]
async fn test_short_thumbprint_is_not_found_and_leaves_port_unbound() {
    let site = TestCert::generate();
    let store = common::memory_store(&[&site]);

    for thumbprint in ["DEADBEEF", "not-a-thumbprint"] {
        let port = common::free_port();
        let bootstrap = common::bootstrap(store.clone());
        let states = bootstrap.subscribe();

        let err = bootstrap
            .start(endpoint(port, thumbprint), handler())
            .await
            .unwrap_err();

        assert!(
            matches!(
                err,
                BootstrapError::Certificate(CertificateError::CertificateNotFound(_))
            ),
            "{}: {}",
            thumbprint,
            err
        );
        assert_eq!(*states.borrow(), ServerState::Failed);
        assert!(common::port_is_free(port));
    }
    assert_eq!(store.opened_total(), 2);
    assert_eq!(store.open_handles(), 0);
}

#[tokio::test]
async fn test_unreadable_store_is_access_denied() {
    let site = TestCert::generate();
    let store = common::memory_store(&[&site]);
    store.deny_access(true);

    let bootstrap = common::bootstrap(store.clone());
    let states = bootstrap.subscribe();
    let err = bootstrap
        .start(endpoint(common::free_port(), site.thumbprint.to_string()), handler())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Certificate(CertificateError::StoreAccessDenied { .. })
    ));
    assert_eq!(*states.borrow(), ServerState::Failed);
}

#[tokio::test]
async fn test_port_in_use_fails_and_releases_store() {
    let site = TestCert::generate();
    let store = common::memory_store(&[&site]);
    let occupied = std::net::TcpListener::bind((common::localhost(), 0)).unwrap();
    let port = u32::from(occupied.local_addr().unwrap().port());

    let bootstrap = common::bootstrap(store.clone());
    let states = bootstrap.subscribe();
    let err = bootstrap
        .start(endpoint(port, site.thumbprint.to_string()), handler())
        .await
        .unwrap_err();

    match err {
        BootstrapError::PortBindFailure { addr, .. } => assert_eq!(u32::from(addr.port()), port),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(*states.borrow(), ServerState::Failed);
    assert_eq!(store.open_handles(), 0);
    assert_eq!(store.opened_total(), 1);
}

#[tokio::test]
async fn test_invalid_endpoint_config_is_rejected_before_store_access() {
    let site = TestCert::generate();

    for config in [
        endpoint(0, site.thumbprint.to_string()),
        endpoint(65536, site.thumbprint.to_string()),
        endpoint(common::free_port(), ""),
        endpoint(common::free_port(), " : \u{200e}"),
    ] {
        let store = common::memory_store(&[&site]);
        let bootstrap = common::bootstrap(store.clone());
        let states = bootstrap.subscribe();

        let err = bootstrap.start(config, handler()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidConfig(_)), "{}", err);
        assert_eq!(*states.borrow(), ServerState::Failed);
        assert_eq!(store.opened_total(), 0);
    }
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let site = TestCert::generate();
    let server = common::bootstrap(common::memory_store(&[&site]))
        .start(endpoint(common::free_port(), site.thumbprint.to_string()), handler())
        .await
        .unwrap();
    let mut states = server.subscribe();

    server.stop().await;
    assert_eq!(server.state(), ServerState::Stopped);

    tokio::time::timeout(Duration::from_millis(100), server.stop())
        .await
        .expect("second stop returns immediately");
    assert!(server.wait().await.is_ok());
    assert!(server.wait().await.is_ok());

    // No transitions after Stopped.
    let _ = states.borrow_and_update();
    assert!(!states.has_changed().unwrap());
}

#[tokio::test]
async fn test_stop_and_wait_from_different_tasks() {
    let site = TestCert::generate();
    let server = common::bootstrap(common::memory_store(&[&site]))
        .start(endpoint(common::free_port(), site.thumbprint.to_string()), handler())
        .await
        .unwrap();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let server = server.clone();
            tokio::spawn(async move { server.wait().await })
        })
        .collect();
    let stopper = {
        let server = server.clone();
        tokio::spawn(async move { server.stop().await })
    };

    stopper.await.unwrap();
    for waiter in waiters {
        assert!(waiter.await.unwrap().is_ok());
    }
}

#[tokio::test]
async fn test_stop_with_handshake_in_flight() {
    let site = TestCert::generate();
    let server = common::bootstrap(common::memory_store(&[&site]))
        .start(endpoint(common::free_port(), site.thumbprint.to_string()), handler())
        .await
        .unwrap();

    // Connected, but never sends a ClientHello.
    let _stalled = TcpStream::connect(server.local_addr()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop completes within the grace period");
    assert!(server.wait().await.is_ok());
    assert_eq!(server.state(), ServerState::Stopped);
}

#[tokio::test]
async fn test_failed_handshake_does_not_stop_listener() {
    let site = TestCert::generate();
    let server = common::bootstrap(common::memory_store(&[&site]))
        .start(endpoint(common::free_port(), site.thumbprint.to_string()), handler())
        .await
        .unwrap();

    let mut plaintext = TcpStream::connect(server.local_addr()).await.unwrap();
    plaintext
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.handshake_failures() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "handshake failure not recorded");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(server.state(), ServerState::Running);
    let presented = common::tls_connect(server.local_addr(), &site).await.unwrap();
    assert_eq!(presented, site.der);

    server.stop().await;
}

#[tokio::test]
async fn test_listener_error_is_reported_by_wait() {
    let site = TestCert::generate();
    let port = common::free_port();

    let failing = |listener: BoundListener, _: ServiceContext| -> Result<ServerFuture, HandlerError> {
        Ok(Box::pin(async move {
            drop(listener);
            Err(io::Error::new(io::ErrorKind::ConnectionAborted, "accept loop failed"))
        }))
    };

    let server = common::bootstrap(common::memory_store(&[&site]))
        .start(endpoint(port, site.thumbprint.to_string()), failing)
        .await
        .unwrap();

    match server.wait().await {
        Err(BootstrapError::ListenerIo(e)) => {
            assert_eq!(e.kind(), io::ErrorKind::ConnectionAborted);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(server.state(), ServerState::Stopped);
    assert!(common::port_is_free(port));
}

#[tokio::test]
async fn test_handler_factory_error_fails_startup() {
    let site = TestCert::generate();
    let store = common::memory_store(&[&site]);
    let port = common::free_port();

    let refusing = |_: BoundListener, _: ServiceContext| -> Result<ServerFuture, HandlerError> {
        Err("no handler configured".into())
    };

    let bootstrap = common::bootstrap(store);
    let states = bootstrap.subscribe();
    let err = bootstrap
        .start(endpoint(port, site.thumbprint.to_string()), refusing)
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::HandlerFactory(_)));
    assert_eq!(*states.borrow(), ServerState::Failed);
    assert!(common::port_is_free(port));
}

#[tokio::test]
async fn test_duplicate_thumbprints_use_first_entry() {
    let site = TestCert::generate();
    let store = std::sync::Arc::new(MemoryStore::new());
    store.insert_corrupt("broken");
    store.insert("first", site.chain(), site.key.clone_key());
    store.insert("second", site.chain(), site.key.clone_key());

    let server = common::bootstrap(store.clone())
        .start(endpoint(common::free_port(), site.thumbprint.to_string()), handler())
        .await
        .unwrap();

    let addr: SocketAddr = server.local_addr();
    assert_eq!(common::tls_connect(addr, &site).await.unwrap(), site.der);
    server.stop().await;
}
