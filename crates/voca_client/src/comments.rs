//! Comments attached to words.

use crate::database::{fetch, insert_rows, Database, DbError, Query};
use std::sync::Arc;
use thiserror::Error;
use voca_api::{request as req, response as res, tables, ANONYMOUS_AUTHOR};

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("댓글 내용을 입력해주세요.")]
    Empty,
    #[error("Comment {0} does not exist")]
    NotFound(String),
    #[error("The database did not return the new comment")]
    NotReturned,
    #[error(transparent)]
    Database(#[from] DbError),
}

#[derive(Clone)]
pub struct Comments {
    db: Arc<dyn Database>,
}

impl Comments {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Adds a comment to `word_id`. A blank author is stored as anonymous.
    pub async fn add(
        &self,
        word_id: i32,
        content: &str,
        author: &str,
    ) -> Result<res::Comment, CommentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CommentError::Empty);
        }
        let author = match author.trim() {
            "" => ANONYMOUS_AUTHOR,
            author => author,
        };
        tracing::info!("Adding a comment to word {word_id}");

        let comment = req::NewComment {
            word_id,
            content: content.into(),
            author: author.into(),
        };
        let inserted: Vec<res::Comment> =
            insert_rows(&*self.db, tables::COMMENTS, &[comment], &["*"]).await?;
        let comment = inserted.into_iter().next().ok_or(CommentError::NotReturned)?;

        tracing::info!("Added comment {} to word {word_id}", comment.id);
        Ok(comment)
    }

    /// The comments on `word_id`, newest first.
    pub async fn list(&self, word_id: i32) -> Result<Vec<res::Comment>, CommentError> {
        tracing::debug!("Fetching comments for word {word_id}");
        let query = Query::table(tables::COMMENTS)
            .eq("word_id", word_id)
            .order("created_at", false);
        Ok(fetch(&*self.db, &query).await?)
    }

    pub async fn delete(&self, comment_id: &str) -> Result<(), CommentError> {
        tracing::info!("Deleting comment {comment_id}");
        let query = Query::table(tables::COMMENTS).eq("id", comment_id);
        match self.db.delete(&query).await? {
            0 => Err(CommentError::NotFound(comment_id.to_string())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::MemoryDatabase;

    fn comments() -> (MemoryDatabase, Comments) {
        let db = MemoryDatabase::new();
        let comments = Comments::new(Arc::new(db.clone()));
        (db, comments)
    }

    #[tokio::test]
    async fn adds_and_lists_newest_first() {
        let (_db, comments) = comments();
        let first = comments.add(1, " 외우기 쉬워요 ", "민지").await.unwrap();
        let second = comments.add(1, "좋아요", "").await.unwrap();
        comments.add(2, "다른 단어", "x").await.unwrap();

        assert_eq!(first.content, "외우기 쉬워요");
        assert_eq!(first.author, "민지");
        assert_eq!(second.author, ANONYMOUS_AUTHOR);

        let listed = comments.list(1).await.unwrap();
        let ids = listed.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, &[second.id.as_str(), first.id.as_str()]);
        assert!(listed[0].created_at > listed[1].created_at);
    }

    #[tokio::test]
    async fn rejects_blank_content() {
        let (db, comments) = comments();
        let err = comments.add(1, "   ", "x").await.unwrap_err();
        assert!(matches!(err, CommentError::Empty));
        assert!(db.operations().is_empty());
    }

    #[tokio::test]
    async fn deletes() {
        let (_db, comments) = comments();
        let comment = comments.add(3, "hi", "x").await.unwrap();
        comments.delete(&comment.id).await.unwrap();
        assert!(comments.list(3).await.unwrap().is_empty());
        let err = comments.delete(&comment.id).await.unwrap_err();
        assert!(matches!(err, CommentError::NotFound(_)));
    }

    #[tokio::test]
    async fn database_errors_propagate() {
        let (db, comments) = comments();
        db.inject_failure("comments");
        assert!(matches!(
            comments.list(1).await,
            Err(CommentError::Database(_))
        ));
    }
}
