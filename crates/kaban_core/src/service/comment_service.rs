//! Card comment use cases.

use super::{found, require_text, ServiceDeps, ServiceResult};
use crate::db::write_transaction;
use crate::model::comment::{CardComment, CommentPatch, NewComment};
use crate::model::lifecycle::Visibility;
use crate::model::{CardId, CommentId, EntityKind};
use crate::repo::card_repo::{CardRepository, SqliteCardRepository};
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use log::info;

/// Comment service over a migrated connection.
pub struct CommentService<'a> {
    deps: ServiceDeps<'a>,
}

impl<'a> CommentService<'a> {
    /// Creates a service after checking the connection schema.
    pub fn try_new(deps: ServiceDeps<'a>) -> ServiceResult<Self> {
        SqliteCardRepository::try_new(deps.conn)?;
        SqliteCommentRepository::try_new(deps.conn)?;
        Ok(Self { deps })
    }

    /// Visible comments of a non-deleted card, in creation order.
    pub fn get_comments(&self, card_id: CardId) -> ServiceResult<Vec<CardComment>> {
        let cards = SqliteCardRepository::new(self.deps.conn);
        found(
            cards.load(card_id, Visibility::Live)?,
            EntityKind::Card,
            card_id,
        )?;
        let repo = SqliteCommentRepository::new(self.deps.conn);
        Ok(repo.list_by_card(card_id)?)
    }

    pub fn create_comment(&self, comment: &NewComment) -> ServiceResult<CardComment> {
        require_text("comment text", &comment.text)?;
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let cards = SqliteCardRepository::new(&tx);
        found(
            cards.load(comment.card_id, Visibility::Live)?,
            EntityKind::Card,
            comment.card_id,
        )?;
        let created = SqliteCommentRepository::new(&tx).insert(comment, &ctx)?;
        tx.commit()?;

        info!(
            "event=comment_create module=service status=ok comment_id={} card_id={}",
            created.id, created.card_id
        );
        Ok(created)
    }

    pub fn update_comment(
        &self,
        id: CommentId,
        patch: &CommentPatch,
    ) -> ServiceResult<CardComment> {
        if let Some(text) = &patch.text {
            require_text("comment text", text)?;
        }
        let ctx = self.deps.request_context();

        let tx = write_transaction(self.deps.conn)?;
        let repo = SqliteCommentRepository::new(&tx);
        let mut comment = found(repo.load(id, Visibility::Live)?, EntityKind::Comment, id)?;
        if let Some(text) = &patch.text {
            comment.text = text.clone();
        }
        let updated = repo.update(&comment, &ctx)?;
        tx.commit()?;

        info!(
            "event=comment_update module=service status=ok comment_id={}",
            updated.id
        );
        Ok(updated)
    }

    /// Soft-deletes a comment. Unknown ids are a no-op.
    pub fn delete_comment(&self, id: CommentId) -> ServiceResult<()> {
        let tx = write_transaction(self.deps.conn)?;
        let deleted = SqliteCommentRepository::new(&tx).mark_deleted(id)?;
        tx.commit()?;

        info!(
            "event=comment_delete module=service status=ok comment_id={} existed={}",
            id, deleted
        );
        Ok(())
    }
}
