//! Database layer for data persistence and access.
//!
//! This module implements the PostgreSQL data access layer using SQLx. Each table has a
//! repository in [`handlers`] that owns every query against it, and the records those
//! repositories read and write live in [`models`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Workflow / Store │  (verification::workflow, store::postgres)
//! └────────┬─────────┘
//!          │
//!          ↓
//! ┌──────────────────┐
//! │   Repositories   │  (db::handlers)
//! └────────┬─────────┘
//!          │
//!          ↓
//! ┌──────────────────┐
//! │      Models      │  (db::models)
//! └────────┬─────────┘
//!          │
//!          ↓
//! ┌──────────────────┐
//! │    PostgreSQL    │
//! └──────────────────┘
//! ```
//!
//! # Transactions
//!
//! Repositories borrow a `&mut PgConnection`, so they work equally over a pooled connection
//! or an open transaction. Anything that touches more than one row that must stay consistent
//! (account + profile creation, document decisions) runs inside a transaction:
//!
//! ```ignore
//! use gigwork::db::handlers::{Repository, WorkerProfiles};
//!
//! let mut tx = pool.begin().await?;
//! let profile = WorkerProfiles::new(&mut tx).lock_for_update(id).await?;
//! // ... recompute and write ...
//! tx.commit().await?;
//! ```
//!
//! Uploaded files are kept outside the database behind the
//! [`FileStorage`](handlers::file_storage::FileStorage) trait; rows only store the key.

pub mod errors;
pub mod handlers;
pub mod models;
