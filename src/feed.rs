//! Image categories and the bounded newest-first feeds shown per category

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::{self, Write};

/// Default number of images kept per category
pub const DEFAULT_FEED_CAPACITY: usize = 10;

/// strftime format used when none (or a broken one) is configured
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// True when chrono can render every specifier in `format`
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Classification label attached to every image by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cat,
    Dog,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Cat, Category::Dog];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cat => "cat",
            Category::Dog => "dog",
        }
    }

    /// Column heading
    pub fn title(self) -> &'static str {
        match self {
            Category::Cat => "Cats",
            Category::Dog => "Dogs",
        }
    }

    pub fn other(self) -> Category {
        match self {
            Category::Cat => Category::Dog,
            Category::Dog => Category::Cat,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One retrieved image as held by a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub encoded_picture: String,  // base64, trusted as delivered
    pub captured_at: String,      // local time, already formatted
}

impl DisplayImage {
    pub fn new(encoded_picture: impl Into<String>, captured_at: impl Into<String>) -> Self {
        Self {
            encoded_picture: encoded_picture.into(),
            captured_at: captured_at.into(),
        }
    }

    /// Stamp an image with the current local time
    pub fn captured_now(encoded_picture: impl Into<String>, timestamp_format: &str) -> Self {
        let now = chrono::Local::now();
        let mut captured_at = String::new();
        if write!(captured_at, "{}", now.format(timestamp_format)).is_err() {
            captured_at = now.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
        }
        Self::new(encoded_picture, captured_at)
    }

    /// Data URI the image is rendered from
    pub fn src(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.encoded_picture)
    }

    /// Decoded payload size derived from the encoded length (no decoding)
    pub fn approx_bytes(&self) -> usize {
        let encoded = self.encoded_picture.trim_end();
        let padding = encoded.bytes().rev().take_while(|b| *b == b'=').count().min(2);
        (encoded.len() / 4 * 3).saturating_sub(padding)
    }
}

/// Newest-first list of images for one category, never longer than its capacity
#[derive(Debug, Clone)]
pub struct CategoryFeed {
    capacity: usize,
    entries: VecDeque<DisplayImage>,
}

impl CategoryFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Prepend the newest image, returning whatever fell off the end
    pub fn push(&mut self, image: DisplayImage) -> Option<DisplayImage> {
        self.entries.push_front(image);
        if self.entries.len() > self.capacity {
            self.entries.pop_back()
        } else {
            None
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&DisplayImage> {
        self.entries.front()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &DisplayImage> {
        self.entries.iter()
    }
}

impl Default for CategoryFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
