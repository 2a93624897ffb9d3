use serde::{Deserialize, Serialize};

/// Urgency class of an order, used for list coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Done,
    Expired,
    Urgent,
    Soon,
    Normal,
}

impl Tag {
    /// Classify by priority: done, then expired (< 0 days), urgent (0..=3),
    /// soon (4..=7), normal.
    pub fn classify(days_left: i64, is_done: bool) -> Self {
        if is_done {
            Tag::Done
        } else if days_left < 0 {
            Tag::Expired
        } else if days_left < 4 {
            Tag::Urgent
        } else if days_left <= 7 {
            Tag::Soon
        } else {
            Tag::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Done => "done",
            Tag::Expired => "expired",
            Tag::Urgent => "urgent",
            Tag::Soon => "soon",
            Tag::Normal => "normal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(Tag::classify(-1, false), Tag::Expired);
        assert_eq!(Tag::classify(-400, false), Tag::Expired);
        for d in 0..=3 {
            assert_eq!(Tag::classify(d, false), Tag::Urgent, "day {d}");
        }
        for d in 4..=7 {
            assert_eq!(Tag::classify(d, false), Tag::Soon, "day {d}");
        }
        assert_eq!(Tag::classify(8, false), Tag::Normal);
    }

    #[test]
    fn done_wins_over_date() {
        for d in [-10, 0, 5, 100] {
            assert_eq!(Tag::classify(d, true), Tag::Done);
        }
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Tag::Urgent).unwrap(), "\"urgent\"");
        assert_eq!(Tag::Soon.as_str(), "soon");
    }
}
