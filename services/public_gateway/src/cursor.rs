//! Opaque cursor for REST pagination (spec §6 "cursor-based pagination",
//! `next_cursor: <str|null>`). Encodes `(timestamp, index)` as base64 so
//! callers never see or construct the underlying shape.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: i64,
    pub index: usize,
}

impl Cursor {
    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.timestamp, self.index))
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = STANDARD.decode(raw).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let (ts, idx) = text.split_once(':')?;
        Some(Self {
            timestamp: ts.parse().ok()?,
            index: idx.parse().ok()?,
        })
    }
}

/// Apply offset-style pagination over an already-sorted slice, returning
/// the page and the cursor to fetch the next one (`None` once exhausted).
pub fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, limit: usize, ts_of: impl Fn(&T) -> i64) -> (Vec<T>, Option<String>, bool) {
    let start = cursor
        .and_then(Cursor::decode)
        .map(|c| c.index)
        .unwrap_or(0)
        .min(items.len());

    let end = (start + limit).min(items.len());
    let page = items[start..end].to_vec();
    let has_more = end < items.len();
    let next_cursor = has_more.then(|| {
        let ts = items.get(end).map(&ts_of).unwrap_or(0);
        Cursor { timestamp: ts, index: end }.encode()
    });
    (page, next_cursor, has_more)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips() {
        let c = Cursor { timestamp: 1_704_067_200_000, index: 42 };
        let encoded = c.encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(c, decoded);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Cursor::decode("not valid base64!!").is_none());
    }

    #[test]
    fn paginate_walks_pages_to_exhaustion() {
        let items: Vec<i64> = (0..25).collect();
        let (page1, cursor1, more1) = paginate(&items, None, 10, |x| *x);
        assert_eq!(page1.len(), 10);
        assert!(more1);

        let (page2, cursor2, more2) = paginate(&items, cursor1.as_deref(), 10, |x| *x);
        assert_eq!(page2.len(), 10);
        assert!(more2);

        let (page3, cursor3, more3) = paginate(&items, cursor2.as_deref(), 10, |x| *x);
        assert_eq!(page3.len(), 5);
        assert!(!more3);
        assert!(cursor3.is_none());
    }
}
