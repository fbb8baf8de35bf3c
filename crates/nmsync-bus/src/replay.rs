// ── Capture replay ──
//
// A capture is a JSON-lines file, one ChangeEvent per line. Blank lines
// and lines starting with `#` are skipped. The leading run of
// `object_added` lines is treated as the startup enumeration.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use crate::error::Error;
use crate::event::{ChangeEvent, RemoteObject};
use crate::session::BusSession;

/// Session that replays a recorded event capture.
#[derive(Debug, Default)]
pub struct ReplaySession {
    events: VecDeque<ChangeEvent>,
    enumerated: bool,
}

impl ReplaySession {
    /// Open and fully parse a capture file.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Parse a capture from any buffered reader.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, Error> {
        let mut events = VecDeque::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let event: ChangeEvent =
                serde_json::from_str(trimmed).map_err(|e| Error::Decode {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            events.push_back(event);
        }
        tracing::debug!(events = events.len(), "capture loaded");
        Ok(Self::from_events(events))
    }

    pub fn from_events(events: impl IntoIterator<Item = ChangeEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            enumerated: false,
        }
    }

    /// Events not yet handed out.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl BusSession for ReplaySession {
    async fn enumerate(&mut self) -> Result<Vec<RemoteObject>, Error> {
        if self.enumerated {
            return Ok(Vec::new());
        }
        self.enumerated = true;

        let mut objects = Vec::new();
        while matches!(self.events.front(), Some(ChangeEvent::ObjectAdded { .. })) {
            if let Some(ChangeEvent::ObjectAdded {
                path,
                kind,
                properties,
            }) = self.events.pop_front()
            {
                objects.push(RemoteObject {
                    path,
                    kind,
                    properties,
                });
            }
        }
        Ok(objects)
    }

    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, Error> {
        Ok(self.events.pop_front())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CAPTURE: &str = r#"
# startup dump
{"event":"object_added","path":"/mgr","kind":"Manager","properties":{"State":70}}
{"event":"object_added","path":"/dev/0","kind":"Device","properties":{"State":30}}

{"event":"properties_changed","path":"/dev/0","properties":{"State":40}}
{"event":"object_added","path":"/ap/1","kind":"AccessPoint"}
{"event":"object_removed","path":"/ap/1"}
"#;

    #[tokio::test]
    async fn leading_adds_become_enumeration() {
        let mut session = ReplaySession::from_reader(CAPTURE.as_bytes()).unwrap();
        assert_eq!(session.remaining(), 5);

        let objects = session.enumerate().await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].path.as_str(), "/dev/0");

        let next = session.next_event().await.unwrap().unwrap();
        assert_eq!(next.label(), "properties_changed");

        // Later adds stay in the event stream.
        let next = session.next_event().await.unwrap().unwrap();
        assert_eq!(next.label(), "object_added");
        assert!(session.enumerate().await.unwrap().is_empty());
    }

    #[test]
    fn decode_error_reports_line_number() {
        let raw = "{\"event\":\"object_removed\",\"path\":\"/a\"}\n{not json}\n";
        let err = ReplaySession::from_reader(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode { line: 2, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn stream_ends_with_none() {
        let mut session = ReplaySession::from_events(Vec::new());
        assert!(session.next_event().await.unwrap().is_none());
    }
}
