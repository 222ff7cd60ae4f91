use serde::Serialize;

use super::frame::Frame;
use crate::error::EncodeError;

/// Largest message a browser accepts from a native messaging host.
pub const NATIVE_MESSAGE_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub body: Vec<u8>,
    /// Trailing fingers left out to stay under the byte limit.
    pub dropped: usize,
}

impl Encoded {
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Serializes frames to compact JSON, optionally bounded in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageEncoder {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct FrameView<'a, C> {
    frame: u64,
    timestamp: f64,
    fingers: &'a [C],
}

impl<'a, C> FrameView<'a, C> {
    fn of(frame: &Frame<C>, fingers: &'a [C]) -> Self {
        Self {
            frame: frame.frame,
            timestamp: frame.timestamp,
            fingers,
        }
    }
}

impl MessageEncoder {
    pub fn unbounded() -> Self {
        Self { limit: None }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn encode<C: Serialize>(&self, frame: &Frame<C>) -> Result<Encoded, EncodeError> {
        let body = serde_json::to_vec(&FrameView::of(frame, &frame.fingers))?;
        let Some(limit) = self.limit else {
            return Ok(Encoded { body, dropped: 0 });
        };
        if body.len() <= limit {
            return Ok(Encoded { body, dropped: 0 });
        }

        // 紧凑 JSON 里数组长度 = "[]" + 各元素 + 元素间的逗号
        let envelope = serde_json::to_vec(&FrameView::of(frame, &[]))?.len();
        if envelope > limit {
            return Err(EncodeError::Oversized {
                size: envelope,
                limit,
            });
        }

        let mut used = envelope;
        let mut kept = 0;
        for (i, finger) in frame.fingers.iter().enumerate() {
            let cost = serde_json::to_vec(finger)?.len() + usize::from(i > 0);
            if used + cost > limit {
                break;
            }
            used += cost;
            kept += 1;
        }

        let body = serde_json::to_vec(&FrameView::of(frame, &frame.fingers[..kept]))?;
        Ok(Encoded {
            body,
            dropped: frame.fingers.len() - kept,
        })
    }
}

impl Default for MessageEncoder {
    fn default() -> Self {
        Self::with_limit(NATIVE_MESSAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_dispatcher::frame::EvdevContact;

    fn contact(x: i32) -> EvdevContact {
        EvdevContact {
            x,
            y: 0,
            pressure: 0,
            wmaj: 0,
            wmin: 0,
            tmaj: 0,
            tmin: 0,
            distance: 0,
            angle: 0,
        }
    }

    fn frame(n: usize) -> Frame<EvdevContact> {
        Frame {
            frame: 3,
            timestamp: 10.5,
            fingers: (0..n as i32).map(contact).collect(),
        }
    }

    #[test]
    fn encodes_message_shape() {
        let encoded = MessageEncoder::unbounded().encode(&frame(1)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded.body).unwrap();
        assert_eq!(json["frame"], 3);
        assert_eq!(json["timestamp"], 10.5);
        assert_eq!(json["fingers"][0]["x"], 0);
        assert!(!encoded.is_truncated());
    }

    #[test]
    fn empty_frame_is_an_empty_list() {
        let encoded = MessageEncoder::default().encode(&frame(0)).unwrap();
        assert_eq!(
            String::from_utf8(encoded.body).unwrap(),
            r#"{"frame":3,"timestamp":10.5,"fingers":[]}"#
        );
    }

    #[test]
    fn overflow_drops_trailing_fingers() {
        let full = MessageEncoder::unbounded().encode(&frame(5)).unwrap();
        let three = MessageEncoder::unbounded().encode(&frame(3)).unwrap();

        // 恰好容得下三个触点
        let encoder = MessageEncoder::with_limit(three.body.len());
        let encoded = encoder.encode(&frame(5)).unwrap();
        assert_eq!(encoded.dropped, 2);
        assert_eq!(encoded.body, three.body);
        assert!(encoded.body.len() < full.body.len());

        let json: serde_json::Value = serde_json::from_slice(&encoded.body).unwrap();
        assert_eq!(json["fingers"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn limit_exactly_fitting_is_not_truncated() {
        let full = MessageEncoder::unbounded().encode(&frame(2)).unwrap();
        let encoded = MessageEncoder::with_limit(full.body.len())
            .encode(&frame(2))
            .unwrap();
        assert_eq!(encoded, full);
    }

    #[test]
    fn envelope_larger_than_limit_is_an_error() {
        let result = MessageEncoder::with_limit(8).encode(&frame(1));
        assert!(matches!(
            result,
            Err(EncodeError::Oversized { limit: 8, .. })
        ));
    }
}
