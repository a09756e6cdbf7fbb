/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::env;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::fmt::TestWriter;

/// A guard that stops log capturing when dropped.
#[derive(Debug)]
pub struct LogCaptureGuard(#[allow(dead_code)] DefaultGuard);

/// Capture every log emitted on the current thread, from every crate, at `TRACE` and above.
///
/// Logs are captured until the returned guard is dropped. Set `VERBOSE_TEST_LOGS` to also
/// print them.
#[must_use]
pub fn capture_test_logs() -> (LogCaptureGuard, Rx) {
    let buf: Arc<Mutex<Vec<u8>>> = Default::default();
    let writer = Tee {
        buf: buf.clone(),
        loud: env::var("VERBOSE_TEST_LOGS").is_ok(),
        inner: TestWriter::new(),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_writer(Mutex::new(writer))
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (LogCaptureGuard(guard), Rx(buf))
}

/// Receiver for the captured logs.
#[derive(Debug)]
pub struct Rx(Arc<Mutex<Vec<u8>>>);

impl Rx {
    /// Returns the captured logs as a string.
    ///
    /// # Panics
    /// If the logs are not valid UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

struct Tee<W> {
    buf: Arc<Mutex<Vec<u8>>>,
    loud: bool,
    inner: W,
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        if self.loud {
            self.inner.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
