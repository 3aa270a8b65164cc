#![forbid(unsafe_code)]

use super::super::StoreError;
use super::super::support::validate_identifier;

/// A validated table name and its primary key column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    name: String,
    primary: String,
}

impl TableSpec {
    pub fn try_new(
        name: impl Into<String>,
        primary: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let name = name.into();
        let primary = primary.into();
        validate_identifier(&name)?;
        validate_identifier(&primary)?;
        Ok(Self { name, primary })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }
}

/// Static table binding for a model manager.
pub trait DbManager {
    const TABLE: Option<&'static str>;
    const PRIMARY: &'static str;

    fn table_spec() -> Result<TableSpec, StoreError> {
        let Some(table) = Self::TABLE else {
            return Err(StoreError::Configuration("no table bound".to_string()));
        };
        TableSpec::try_new(table, Self::PRIMARY)
    }
}

#[cfg(test)]
mod tests {
    use super::{DbManager, TableSpec};
    use crate::StoreError;

    struct Unbound;

    impl DbManager for Unbound {
        const TABLE: Option<&'static str> = None;
        const PRIMARY: &'static str = "id";
    }

    #[test]
    fn unbound_manager_is_a_configuration_error() {
        match Unbound::table_spec() {
            Err(StoreError::Configuration(message)) => assert_eq!(message, "no table bound"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn table_names_are_validated() {
        assert!(TableSpec::try_new("cards", "card_id").is_ok());
        assert!(TableSpec::try_new("cards x", "card_id").is_err());
        assert!(TableSpec::try_new("cards", "id\"").is_err());
    }
}
