//! Command definitions
//!
//! A single request against the store, as parsed by the HTTP layer or the CLI.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Get,
    Set,
    Delete,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: Vec<u8> },

    /// Insert or overwrite a key-value pair
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Delete { .. } => CommandType::Delete,
        }
    }

    /// The key this command addresses
    pub fn key(&self) -> &[u8] {
        match self {
            Command::Get { key } | Command::Set { key, .. } | Command::Delete { key } => key,
        }
    }

    /// Whether executing this command rewrites the data file
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::Get { .. })
    }
}
