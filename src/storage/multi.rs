//! Fan-out sink

use std::io;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::media::framer::TagHandler;

use super::Sink;

/// Writes each unit to several sinks, in order
///
/// Not transactional: when one target fails, the error is returned and the
/// targets before it keep what they already wrote. `None` entries are
/// optional outputs that are switched off, and are skipped.
pub struct MultiSink {
    sinks: Vec<Option<Box<dyn Sink + Send>>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Option<Box<dyn Sink + Send>>>) -> Self {
        Self { sinks }
    }

    /// Number of targets that are present
    pub fn active_targets(&self) -> usize {
        self.sinks.iter().filter(|s| s.is_some()).count()
    }
}

impl Sink for MultiSink {
    fn write(&mut self, data: &Bytes) -> io::Result<()> {
        for sink in self.sinks.iter_mut().flatten() {
            sink.write(data)?;
        }
        Ok(())
    }

    /// Close every target, reporting the first failure
    fn close(&mut self) -> io::Result<()> {
        let mut first_err = None;
        for sink in self.sinks.iter_mut().flatten() {
            if let Err(e) = sink.close() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Lets a framer write straight into the sinks
impl TagHandler for MultiSink {
    fn on_tag(&mut self, unit: Bytes) -> Result<()> {
        self.write(&unit).map_err(Error::Sink)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records writes into shared storage so the test can inspect them
    struct Recorder(Arc<Mutex<Vec<u8>>>);

    impl Sink for Recorder {
        fn write(&mut self, data: &Bytes) -> io::Result<()> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Failing;

    impl Sink for Failing {
        fn write(&mut self, _data: &Bytes) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "write failed"))
        }

        fn close(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "close failed"))
        }
    }

    fn failing() -> Box<dyn Sink + Send> {
        Box::new(Failing)
    }

    fn recorder() -> (Box<dyn Sink + Send>, Arc<Mutex<Vec<u8>>>) {
        let store = Arc::new(Mutex::new(Vec::new()));
        (Box::new(Recorder(Arc::clone(&store))), store)
    }

    #[test]
    fn test_writes_to_all_targets() {
        let (a, a_store) = recorder();
        let (b, b_store) = recorder();
        let mut multi = MultiSink::new(vec![Some(a), Some(b)]);

        multi.write(&Bytes::from_static(b"unit")).unwrap();

        assert_eq!(*a_store.lock().unwrap(), b"unit");
        assert_eq!(*b_store.lock().unwrap(), b"unit");
    }

    #[test]
    fn test_absent_targets_skipped() {
        let (a, a_store) = recorder();
        let mut multi = MultiSink::new(vec![None, Some(a), None]);
        assert_eq!(multi.active_targets(), 1);

        multi.write(&Bytes::from_static(b"x")).unwrap();
        multi.close().unwrap();

        assert_eq!(*a_store.lock().unwrap(), b"x");
    }

    #[test]
    fn test_first_failure_stops_without_rollback() {
        let (before, before_store) = recorder();
        let (after, after_store) = recorder();
        let mut multi = MultiSink::new(vec![Some(before), Some(failing()), Some(after)]);

        let err = multi.write(&Bytes::from_static(b"data")).unwrap_err();
        assert_eq!(err.to_string(), "write failed");

        // Earlier target keeps its write; later target never saw it
        assert_eq!(*before_store.lock().unwrap(), b"data");
        assert!(after_store.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_reports_first_error() {
        let (a, _) = recorder();
        let mut multi = MultiSink::new(vec![Some(failing()), Some(a)]);

        assert!(multi.close().is_err());
    }

    #[test]
    fn test_tag_handler_maps_sink_error() {
        let mut multi = MultiSink::new(vec![Some(failing())]);

        let err = multi.on_tag(Bytes::from_static(b"t")).unwrap_err();
        assert!(matches!(err, Error::Sink(_)));
    }

    #[test]
    fn test_empty_multi_sink() {
        let mut multi = MultiSink::new(Vec::new());

        multi.write(&Bytes::from_static(b"ignored")).unwrap();
        multi.close().unwrap();
    }
}
