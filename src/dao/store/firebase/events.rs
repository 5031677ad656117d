//! Decoding of the `text/event-stream` feed served by the streaming REST API.

use async_stream::try_stream;
use futures::{Stream, StreamExt};

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub name: String,
    pub data: String,
}

/// Incremental line decoder; tolerates chunks split anywhere, including inside UTF-8.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    name: String,
    data: String,
}

impl EventDecoder {
    /// Feed raw bytes, returning the events completed by this chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.name.is_empty() {
                    events.push(StreamEvent {
                        name: std::mem::take(&mut self.name),
                        data: std::mem::take(&mut self.data),
                    });
                }
                self.data.clear();
            } else if let Some(value) = line.strip_prefix("event:") {
                self.name = value.trim().to_owned();
            } else if let Some(value) = line.strip_prefix("data:") {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value.trim_start());
            }
        }
        events
    }
}

/// Turn a byte stream into a stream of decoded events.
pub fn decode<S, B, E>(bytes: S) -> impl Stream<Item = Result<StreamEvent, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    try_stream! {
        let mut decoder = EventDecoder::default();
        futures::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for event in decoder.push(chunk.as_ref()) {
                yield event;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_put_and_keep_alive() {
        let mut decoder = EventDecoder::default();
        let events = decoder.push(
            b"event: put\ndata: {\"path\":\"/\",\"data\":null}\n\nevent: keep-alive\ndata: null\n\n",
        );
        assert_eq!(
            events,
            vec![
                StreamEvent {
                    name: "put".into(),
                    data: "{\"path\":\"/\",\"data\":null}".into(),
                },
                StreamEvent {
                    name: "keep-alive".into(),
                    data: "null".into(),
                },
            ]
        );
    }

    #[test]
    fn waits_for_blank_line_across_chunks() {
        let mut decoder = EventDecoder::default();
        assert!(decoder.push(b"event: pat").is_empty());
        assert!(decoder.push(b"ch\r\ndata: {}\r\n").is_empty());
        let events = decoder.push(b"\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "patch");
        assert_eq!(events[0].data, "{}");
    }

    #[test]
    fn split_multibyte_character_survives() {
        let payload = "event: put\ndata: \"নোট\"\n\n".as_bytes();
        let (head, tail) = payload.split_at(20);
        let mut decoder = EventDecoder::default();
        assert!(decoder.push(head).is_empty());
        let events = decoder.push(tail);
        assert_eq!(events[0].data, "\"নোট\"");
    }

    #[tokio::test]
    async fn decode_stream_propagates_events() {
        let chunks = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(b"event: put\n".to_vec()),
            Ok(b"data: 1\n\n".to_vec()),
        ]);
        let events: Vec<_> = decode(chunks).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().data, "1");
    }
}
