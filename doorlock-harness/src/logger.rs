//! stderr logger for simulation runs
//!
//! Each line is tagged with the node that logged it. Run with
//! `DOORLOCK_LOG=debug` (or `trace`) to see the protocol exchange.

use std::cell::RefCell;
use std::io::Write;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static NODE: RefCell<&'static str> = const { RefCell::new("-") };
}

struct NodeLogger;

static LOGGER: NodeLogger = NodeLogger;
static INIT: Once = Once::new();

impl Log for NodeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let node = NODE.with(|n| *n.borrow());
        let _ = writeln!(
            std::io::stderr().lock(),
            "{:<5} [{}] {}",
            record.level(),
            node,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_from_env() -> LevelFilter {
    std::env::var("DOORLOCK_LOG")
        .ok()
        .and_then(|v| v.parse::<Level>().ok())
        .map_or(LevelFilter::Warn, |level| level.to_level_filter())
}

/// Install the logger once per process
///
/// Safe to call from every test; later calls do nothing.
pub fn init_logging() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level_from_env());
        }
    });
}

/// Tag log lines from the current thread with `name`
pub(crate) fn set_node(name: &'static str) {
    NODE.with(|n| *n.borrow_mut() = name);
}
