// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead document operations.
//!
//! The lead is stored relationally (a `leads` row plus `messages` rows) but
//! exposed as a document: `get_lead` reassembles the full history,
//! `save_lead` commits qualification, status, and unpersisted history rows
//! in one transaction.

use std::str::FromStr;

use leadflow_core::types::{Lead, LeadFilter, LeadId, Qualification};
use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::Database;
use crate::queries::messages::query_messages;

/// Insert a freshly created lead row.
pub async fn create_lead(db: &Database, lead: &Lead) -> Result<(), LeadflowError> {
    let lead = lead.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (id, email, qualification, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    lead.id.as_str(),
                    lead.email,
                    lead.qualification.to_string(),
                    lead.status,
                    lead.created_at,
                    lead.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a lead with its full chat history.
pub async fn get_lead(db: &Database, id: &str) -> Result<Option<Lead>, LeadflowError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, qualification, status, created_at, updated_at
                 FROM leads WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![id], map_lead_row)?;
            let Some(lead) = rows.next().transpose()? else {
                return Ok(None);
            };
            let mut lead = lead;
            lead.chat_history = query_messages(conn, lead.id.as_str())?;
            Ok(Some(lead))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whole-document save: one transaction updating the lead row and inserting
/// any history entries not yet persisted (`INSERT OR IGNORE` by message id).
pub async fn save_lead(db: &Database, lead: &Lead) -> Result<(), LeadflowError> {
    let lead = lead.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE leads SET email = ?2, qualification = ?3, status = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    lead.id.as_str(),
                    lead.email,
                    lead.qualification.to_string(),
                    lead.status,
                    lead.updated_at,
                ],
            )?;
            for msg in &lead.chat_history {
                tx.execute(
                    "INSERT OR IGNORE INTO messages (id, lead_id, sender, content, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        msg.id,
                        lead.id.as_str(),
                        msg.sender.to_string(),
                        msg.text,
                        msg.timestamp,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List leads matching the filter, newest first, with history attached.
pub async fn list_leads(db: &Database, filter: &LeadFilter) -> Result<Vec<Lead>, LeadflowError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let qualification = filter.qualification.map(|q| q.to_string());
            let mut stmt = conn.prepare(
                "SELECT id, email, qualification, status, created_at, updated_at
                 FROM leads
                 WHERE (?1 IS NULL OR status = ?1)
                   AND (?2 IS NULL OR qualification = ?2)
                 ORDER BY created_at DESC LIMIT ?3 OFFSET ?4",
            )?;
            let rows = stmt.query_map(
                params![
                    filter.status,
                    qualification,
                    filter.limit.max(1),
                    filter.offset.max(0),
                ],
                map_lead_row,
            )?;

            let mut leads = Vec::new();
            for row in rows {
                leads.push(row?);
            }
            for lead in &mut leads {
                lead.chat_history = query_messages(conn, lead.id.as_str())?;
            }
            Ok(leads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn map_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    let qualification: String = row.get(2)?;
    let qualification = Qualification::from_str(&qualification).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Lead {
        id: LeadId(row.get(0)?),
        email: row.get(1)?,
        qualification,
        status: row.get(3)?,
        chat_history: Vec::new(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
