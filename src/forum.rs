//! The talking platform: a local board of posts and comments.
//!
//! Nothing here touches the server. Posts live as long as the board does and are shown
//! newest first.

use chrono::{DateTime, Utc};

use crate::error::ForumError;
use crate::utils::is_blank;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub username: String,
    pub posted_at: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub username: String,
    pub posted_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub comments: Vec<Comment>,
}

pub struct ForumBoard {
    author: String,
    posts: Vec<Post>,
    next_id: u64,
}

impl ForumBoard {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            posts: Vec::new(),
            next_id: 1,
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn publish(&mut self, title: &str, content: &str) -> Result<&Post, ForumError> {
        self.publish_at(title, content, Utc::now())
    }

    pub fn publish_at(
        &mut self,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<&Post, ForumError> {
        if is_blank(title) || is_blank(content) {
            return Err(ForumError::IncompletePost);
        }
        let post = Post {
            id: self.next_id,
            username: self.author.clone(),
            posted_at: now,
            title: title.trim().to_owned(),
            content: content.trim().to_owned(),
            comments: Vec::new(),
        };
        self.next_id += 1;
        self.posts.insert(0, post);
        Ok(&self.posts[0])
    }

    pub fn comment(&mut self, post_id: u64, content: &str) -> Result<&Comment, ForumError> {
        self.comment_at(post_id, content, Utc::now())
    }

    pub fn comment_at(
        &mut self,
        post_id: u64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<&Comment, ForumError> {
        if is_blank(content) {
            return Err(ForumError::EmptyComment);
        }
        let author = self.author.clone();
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(ForumError::PostNotFound(post_id))?;
        let id = post.comments.last().map_or(1, |c| c.id + 1);
        post.comments.push(Comment {
            id,
            username: author,
            posted_at: now,
            content: content.trim().to_owned(),
        });
        Ok(&post.comments[post.comments.len() - 1])
    }

    /// Posts whose title contains `query`, ignoring case. An empty query matches everything.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Post> + use<'a> {
        let needle = query.to_lowercase();
        self.posts
            .iter()
            .filter(move |p| p.title.to_lowercase().contains(&needle))
    }
}

/// Short relative age as shown next to a post: `Just now`, `5m`, `3h`, `2d`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed.num_minutes() < 1 {
        "Just now".to_owned()
    } else if elapsed.num_hours() < 1 {
        format!("{}m", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h", elapsed.num_hours())
    } else {
        format!("{}d", elapsed.num_days())
    }
}
