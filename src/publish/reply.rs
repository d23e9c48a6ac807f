use serde::{Deserialize, Serialize};

const POST_URL_BASE: &str = "https://bsky.app/profile";
const REPLY_HEADER: &str = "Palindrome Found!\n\n";
const REPLY_BYLINE: &str = "\n\nFrom user ";

/// Half-open byte range into [`Reply::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

/// The announcement posted for a confirmed palindrome.
///
/// `link_url` is attached to the quoted palindrome (`link_span`); `mention_id` /
/// `mention_handle` tag the original author (`mention_span`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub link_url: String,
    pub link_span: ByteSpan,
    pub mention_id: String,
    pub mention_handle: String,
    pub mention_span: ByteSpan,
}

impl Reply {
    pub fn new(palindrome: &str, author_id: &str, author_handle: &str, post_id: &str) -> Self {
        let link_start = REPLY_HEADER.len();
        let link_end = link_start + palindrome.len();
        let mention_start = link_end + REPLY_BYLINE.len();

        Self {
            text: reply_text(palindrome, author_handle),
            link_url: post_url(author_handle, post_id),
            link_span: ByteSpan {
                start: link_start,
                end: link_end,
            },
            mention_id: author_id.to_string(),
            mention_handle: author_handle.to_string(),
            mention_span: ByteSpan {
                start: mention_start,
                end: mention_start + author_handle.len(),
            },
        }
    }
}

pub fn reply_text(palindrome: &str, author_handle: &str) -> String {
    format!("{}{}{}{}", REPLY_HEADER, palindrome, REPLY_BYLINE, author_handle)
}

pub fn post_url(author_handle: &str, post_id: &str) -> String {
    format!("{}/{}/post/{}", POST_URL_BASE, author_handle, post_id)
}
