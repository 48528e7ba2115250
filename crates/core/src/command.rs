// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of commands a connection accepts
//!
//! Whether a command holds the connection after it returns is a property of
//! its type, never of its arguments: every [`StreamCommand`] locks, every
//! [`SimpleCommand`] does not.

use serde::{Deserialize, Serialize};

/// Commands that return a disposable value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SimpleCommand {
    GetTableSchema {
        catalog: Option<String>,
        db_schema: Option<String>,
        table: String,
    },
    Commit,
    Rollback,
    SetOption {
        key: String,
        value: String,
    },
}

impl SimpleCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SimpleCommand::GetTableSchema { .. } => "get_table_schema",
            SimpleCommand::Commit => "commit",
            SimpleCommand::Rollback => "rollback",
            SimpleCommand::SetOption { .. } => "set_option",
        }
    }
}

/// How deep a `get_objects` listing descends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectDepth {
    #[default]
    All,
    Catalogs,
    DbSchemas,
    Tables,
    Columns,
}

/// Filters for a `get_objects` listing; `None` matches everything
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectsFilter {
    pub depth: ObjectDepth,
    pub catalog: Option<String>,
    pub db_schema: Option<String>,
    pub table_name: Option<String>,
    pub table_types: Option<Vec<String>>,
    pub column_name: Option<String>,
}

impl ObjectsFilter {
    pub fn new(depth: ObjectDepth) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn db_schema(mut self, db_schema: impl Into<String>) -> Self {
        self.db_schema = Some(db_schema.into());
        self
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn table_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.table_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn column_name(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }
}

/// Commands that return a stream and lock the connection while it lives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum StreamCommand {
    GetInfo { codes: Vec<u32> },
    GetObjects(ObjectsFilter),
    GetTableTypes,
}

impl StreamCommand {
    pub fn name(&self) -> &'static str {
        match self {
            StreamCommand::GetInfo { .. } => "get_info",
            StreamCommand::GetObjects(_) => "get_objects",
            StreamCommand::GetTableTypes => "get_table_types",
        }
    }
}

/// Value produced by a [`SimpleCommand`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply<S> {
    /// Schema of a table, in the driver's representation
    Schema(S),
    /// The command has no payload
    Done,
}

impl<S> Reply<S> {
    pub fn into_schema(self) -> Option<S> {
        match self {
            Reply::Schema(schema) => Some(schema),
            Reply::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Reply::Done)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
