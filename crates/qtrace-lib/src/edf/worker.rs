use super::catalog::ChannelDescriptor;
use super::header::RecordingHeader;
use super::records::{decode_records, DecodedRecords};
use super::EdfError;
use crossbeam_channel::{bounded, Receiver};
use log::debug;
use std::thread::JoinHandle;

/// Everything the background decode needs, moved onto the worker thread.
pub struct DecodeRequest {
    pub buffer: Vec<u8>,
    pub header: RecordingHeader,
    pub channels: Vec<ChannelDescriptor>,
}

/// Handle for one in-flight background decode. The worker sends exactly one
/// response; there is no streaming, no progress, and no cancellation.
pub struct DecodeJob {
    response_rx: Receiver<DecodedRecords>,
    handle: Option<JoinHandle<()>>,
}

/// Run the record walk on its own thread so large files do not block the
/// caller. One request in, one response out.
pub fn decode_in_background(request: DecodeRequest) -> DecodeJob {
    let (response_tx, response_rx) = bounded(1);
    let handle = std::thread::spawn(move || {
        debug!(
            "decoding {} records across {} channels off-thread",
            request.header.record_count,
            request.channels.len()
        );
        let decoded = decode_records(&request.buffer, &request.header, &request.channels);
        let _ = response_tx.send(decoded);
    });
    DecodeJob {
        response_rx,
        handle: Some(handle),
    }
}

impl DecodeJob {
    /// Block until the worker replies. A worker that died before responding
    /// surfaces as `WorkerFailed`; a partial result is never returned.
    pub fn wait(mut self) -> Result<DecodedRecords, EdfError> {
        let outcome = self.response_rx.recv();
        let join = self.handle.take().map(JoinHandle::join);
        match outcome {
            Ok(decoded) => Ok(decoded),
            Err(_) => {
                let reason = match join {
                    Some(Err(_)) => "decode thread panicked",
                    _ => "decode thread exited without a response",
                };
                Err(EdfError::WorkerFailed(reason.to_string()))
            }
        }
    }
}

impl Drop for DecodeJob {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edf::testdata::{edf_buffer, TestChannel};
    use crate::edf::{decode_channels, decode_header};

    #[test]
    fn background_decode_matches_synchronous_decode() {
        let channels = vec![TestChannel::default()];
        let records = vec![vec![vec![0, 1024, 2047, -1024]]];
        let buffer = edf_buffer(1, &channels, &records);
        let header = decode_header(&buffer).expect("header");
        let catalog = decode_channels(&buffer, header.channel_count).expect("catalog");

        let inline = decode_records(&buffer, &header, &catalog);
        let job = decode_in_background(DecodeRequest {
            buffer,
            header,
            channels: catalog,
        });
        let background = job.wait().expect("worker response");

        assert_eq!(background.skipped_samples, inline.skipped_samples);
        assert_eq!(background.channels.len(), inline.channels.len());
        assert_eq!(background.channels[0].points, inline.channels[0].points);
    }

    #[test]
    fn dead_worker_surfaces_as_worker_failed() {
        let (response_tx, response_rx) = bounded::<DecodedRecords>(1);
        let handle = std::thread::spawn(move || {
            // exit without responding, as a panicking worker would
            drop(response_tx);
        });
        let job = DecodeJob {
            response_rx,
            handle: Some(handle),
        };
        let err = job.wait().expect_err("should fail");
        assert!(matches!(err, EdfError::WorkerFailed(_)));
    }
}
