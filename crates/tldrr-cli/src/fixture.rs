//! Page fixtures
//!
//! A JSON stand-in for a thread page, loaded into a [`MemoryDom`] with the
//! same markup the extension sees on the live site.

use serde::Deserialize;
use tldrr_core::dom::{Dom, MemoryDom, NodeId};

#[derive(Debug, Clone, Deserialize)]
pub struct PageFixture {
    #[serde(default = "default_path")]
    pub path: String,
    pub post: String,
    #[serde(default)]
    pub comments: Vec<CommentFixture>,
}

/// A comment body, or a body with nested replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommentFixture {
    Text(String),
    Thread {
        body: String,
        #[serde(default)]
        replies: Vec<CommentFixture>,
    },
}

fn default_path() -> String {
    "/r/fixture/comments/0/thread/".to_string()
}

impl PageFixture {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_dom(&self) -> MemoryDom {
        let mut dom = MemoryDom::new(&self.path);
        let body = dom.body();

        let post = dom.add(body, "shreddit-post");
        let text = dom.add(post, "div");
        dom.with_attr(text, "slot", "text-body");
        dom.add_text(text, &self.post);
        let share = dom.add(post, "div");
        dom.with_attr(share, "slot", "ssr-share-button");

        for comment in &self.comments {
            add_comment(&mut dom, body, comment);
        }
        dom
    }
}

fn add_comment(dom: &mut MemoryDom, parent: NodeId, fixture: &CommentFixture) {
    let (body, replies) = match fixture {
        CommentFixture::Text(body) => (body, &[][..]),
        CommentFixture::Thread { body, replies } => (body, replies.as_slice()),
    };

    let comment = dom.add(parent, "shreddit-comment");
    let md = dom.add(comment, "div");
    dom.with_class(md, "md");
    dom.add_text(md, body);
    let actions = dom.add(comment, "div");
    dom.with_attr(actions, "slot", "comment-actions");

    for reply in replies {
        add_comment(dom, comment, reply);
    }
}
