use std::error::Error as _;
use std::io;
use std::sync::{Arc, Mutex};

use tac_indexer::{run, IndexerEngine, StartupError};
use tacindex_core::error::RegistryError;
use tacindex_core::msg::MsgTypeMap;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for Capture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with log output going to a fresh capture buffer.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, capture.lines())
}

#[derive(Default)]
struct Calls {
    registered: Vec<String>,
    executed: bool,
}

struct FakeEngine {
    calls: Arc<Mutex<Calls>>,
    reject: Option<RegistryError>,
    fail_execute: Option<String>,
}

impl FakeEngine {
    fn new(calls: Arc<Mutex<Calls>>) -> Self {
        Self {
            calls,
            reject: None,
            fail_execute: None,
        }
    }
}

impl IndexerEngine for FakeEngine {
    type Error = io::Error;

    fn register_custom_msg_types_by_type_urls(
        &mut self,
        types: MsgTypeMap,
    ) -> Result<(), RegistryError> {
        if let Some(e) = self.reject.clone() {
            return Err(e);
        }
        let mut urls: Vec<String> = types.into_keys().collect();
        urls.sort();
        self.calls.lock().unwrap().registered = urls;
        Ok(())
    }

    fn execute(self) -> Result<(), io::Error> {
        self.calls.lock().unwrap().executed = true;
        match self.fail_execute {
            Some(e) => Err(io::Error::other(e)),
            None => Ok(()),
        }
    }
}

#[test]
fn successful_startup_lists_types_then_executes() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let engine = FakeEngine::new(calls.clone());

    let (result, lines) = capture_logs(|| run(engine));

    assert!(result.is_ok());
    let calls = calls.lock().unwrap();
    assert!(calls.executed);
    assert_eq!(
        calls.registered,
        vec![
            "/cosmos.evm.vm.v1.DynamicFeeTx",
            "/cosmos.evm.vm.v1.LegacyTx",
            "/cosmos.evm.vm.v1.MsgEthereumTx",
        ]
    );

    assert_eq!(lines.len(), 4, "{lines:#?}");
    assert!(lines[0].ends_with("Registered EVM message types for TAC chain:"));
    assert!(lines[1].ends_with("  - /cosmos.evm.vm.v1.MsgEthereumTx"));
    assert!(lines[2].ends_with("  - /cosmos.evm.vm.v1.DynamicFeeTx"));
    assert!(lines[3].ends_with("  - /cosmos.evm.vm.v1.LegacyTx"));
    assert!(lines.iter().all(|l| l.contains("INFO")));
}

#[test]
fn registration_failure_skips_execute() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut engine = FakeEngine::new(calls.clone());
    engine.reject = Some(RegistryError::AlreadyRegistered {
        type_url: "/cosmos.evm.vm.v1.LegacyTx".into(),
    });

    let (result, lines) = capture_logs(|| run(engine));

    assert!(matches!(result, Err(StartupError::Register(_))));
    assert!(!calls.lock().unwrap().executed);
    assert_eq!(lines.len(), 1, "{lines:#?}");
    assert!(lines[0].contains("ERROR"));
    assert!(lines[0].contains("Failed to register EVM message types. Err: "));
    assert!(lines[0].contains("/cosmos.evm.vm.v1.LegacyTx is already registered"));
}

#[test]
fn execute_failure_is_logged_once() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut engine = FakeEngine::new(calls.clone());
    engine.fail_execute = Some("node unreachable".into());

    let (result, lines) = capture_logs(|| run(engine));

    let err = result.unwrap_err();
    assert!(matches!(err, StartupError::Execute(_)));
    assert_eq!(err.to_string(), "failed to execute: node unreachable");
    assert!(calls.lock().unwrap().executed);

    let errors: Vec<_> = lines.iter().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(errors.len(), 1, "{lines:#?}");
    assert!(errors[0].contains("Failed to execute. Err: node unreachable"));
    // the registration lines still come first
    assert_eq!(lines.len(), 5);
}

#[test]
fn execute_failure_keeps_the_engine_error_as_source() {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let mut engine = FakeEngine::new(calls);
    engine.fail_execute = Some("connection refused".into());

    let (result, _) = capture_logs(|| run(engine));

    let err = result.unwrap_err();
    let source = err.source().expect("engine error is the source");
    assert_eq!(source.to_string(), "connection refused");
    let io_err = source.downcast_ref::<io::Error>().expect("source keeps its type");
    assert_eq!(io_err.kind(), io::ErrorKind::Other);
}

#[test]
fn real_engine_accepts_the_evm_types() {
    let mut indexer = tacindex_cmd::Indexer::default();
    IndexerEngine::register_custom_msg_types_by_type_urls(
        &mut indexer,
        tac_indexer::tac_evm_type_map(),
    )
    .unwrap();
    assert_eq!(indexer.registry().len(), 3);
    assert!(indexer.registry().contains("/cosmos.evm.vm.v1.MsgEthereumTx"));
}
