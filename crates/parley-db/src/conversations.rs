//! Conversation and turn repository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use parley_core::{
    Conversation, ConversationRepository, ConversationTurn, Error, Result, TurnRole,
};

/// PostgreSQL conversation repository.
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a conversation with the default placeholder title.
    ///
    /// Conversation CRUD otherwise lives outside this subsystem; this
    /// exists for provisioning and test fixtures.
    pub async fn create(&self, user_id: Uuid, title: &str) -> Result<Conversation> {
        let row = sqlx::query(
            r#"INSERT INTO conversation (id, user_id, title)
               VALUES ($1, $2, $3)
               RETURNING id, user_id, title, created_at, updated_at"#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation_from_row(&row))
    }
}

fn conversation_from_row(row: &sqlx::postgres::PgRow) -> Conversation {
    Conversation {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn turn_from_row(row: &sqlx::postgres::PgRow) -> ConversationTurn {
    let role: String = row.get("role");
    ConversationTurn {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        role: role.parse().unwrap_or(TurnRole::User),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn get(&self, id: Uuid) -> Result<Conversation> {
        let row = sqlx::query(
            "SELECT id, user_id, title, created_at, updated_at FROM conversation WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::ConversationNotFound(id))?;

        Ok(conversation_from_row(&row))
    }

    async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Conversation> {
        let row = sqlx::query(
            r#"SELECT id, user_id, title, created_at, updated_at
               FROM conversation WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::ConversationNotFound(id))?;

        Ok(conversation_from_row(&row))
    }

    async fn append_turn(
        &self,
        conversation_id: Uuid,
        role: TurnRole,
        content: &str,
    ) -> Result<ConversationTurn> {
        let row = sqlx::query(
            r#"INSERT INTO conversation_turn (id, conversation_id, role, content)
               VALUES ($1, $2, $3, $4)
               RETURNING id, conversation_id, role, content, created_at"#,
        )
        .bind(Uuid::now_v7())
        .bind(conversation_id)
        .bind(role.to_string())
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(turn_from_row(&row))
    }

    async fn first_turns(
        &self,
        conversation_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            r#"SELECT id, conversation_id, role, content, created_at
               FROM conversation_turn
               WHERE conversation_id = $1
               ORDER BY created_at ASC
               LIMIT $2"#,
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(turn_from_row).collect())
    }

    async fn turn_count(&self, conversation_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM conversation_turn WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }

    async fn set_title(&self, conversation_id: Uuid, title: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE conversation SET title = $2, updated_at = now() WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(title)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ConversationNotFound(conversation_id));
        }
        Ok(())
    }
}
