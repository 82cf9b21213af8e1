// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-history row operations.

use std::str::FromStr;

use leadflow_core::types::{ChatMessage, Sender};
use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::Database;

/// Append one message to a lead's history.
pub async fn insert_message(
    db: &Database,
    lead_id: &str,
    msg: &ChatMessage,
) -> Result<(), LeadflowError> {
    let lead_id = lead_id.to_string();
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, lead_id, sender, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    msg.id,
                    lead_id,
                    msg.sender.to_string(),
                    msg.text,
                    msg.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a lead's history in chronological order.
///
/// Runs inside an existing `call` closure so lead assembly stays a single
/// round-trip to the writer thread.
pub(crate) fn query_messages(
    conn: &rusqlite::Connection,
    lead_id: &str,
) -> rusqlite::Result<Vec<ChatMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender, content, created_at
         FROM messages WHERE lead_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![lead_id], |row| {
        let sender: String = row.get(1)?;
        let sender = Sender::from_str(&sender).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        Ok(ChatMessage {
            id: row.get(0)?,
            sender,
            text: row.get(2)?,
            timestamp: row.get(3)?,
        })
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row?);
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::leads::create_lead;
    use leadflow_core::types::Lead;
    use tempfile::tempdir;

    async fn setup_db_with_lead() -> (Database, Lead, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let lead = Lead::new("visitor@example.com".to_string());
        create_lead(&db, &lead).await.unwrap();
        (db, lead, dir)
    }

    #[tokio::test]
    async fn insert_and_read_back_in_order() {
        let (db, lead, _dir) = setup_db_with_lead().await;

        let m1 = ChatMessage {
            id: "m1".into(),
            sender: Sender::User,
            text: "hello".into(),
            timestamp: "2026-01-01T00:00:01+00:00".into(),
        };
        let m2 = ChatMessage {
            id: "m2".into(),
            sender: Sender::Ai,
            text: "hi there".into(),
            timestamp: "2026-01-01T00:00:02+00:00".into(),
        };
        insert_message(&db, lead.id.as_str(), &m1).await.unwrap();
        insert_message(&db, lead.id.as_str(), &m2).await.unwrap();

        let messages = db
            .connection()
            .call({
                let id = lead.id.as_str().to_string();
                move |conn| Ok::<_, rusqlite::Error>(query_messages(conn, &id)?)
            })
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "hello");
        assert_eq!(messages[1].sender, Sender::Ai);
    }

    #[tokio::test]
    async fn insert_for_unknown_lead_fails_foreign_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fk.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let msg = ChatMessage::now(Sender::User, "orphan".into());
        let result = insert_message(&db, "no-such-lead", &msg).await;
        assert!(result.is_err());
    }
}
