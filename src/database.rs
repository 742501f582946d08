use tracing::debug;

use crate::{
    commands::CommandRegistry,
    error::Result,
    schema::Schema,
    storage::{Row, StorageDriver},
    tokenizer::split,
};

/// The main entry point of the interpreter.
/// It owns the schema and the storage backend, and dispatches each input
/// line to the matching command of a borrowed [`CommandRegistry`].
pub struct Database<'r> {
    schema: Schema,
    driver: Box<dyn StorageDriver>,
    registry: &'r CommandRegistry,
}

/// What a command hands back to its caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Rows produced by the command, in display order.
    pub rows: Vec<Row>,
    /// Free-form text to print as is, such as help output.
    pub notice: Option<String>,
}

impl Outcome {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self { rows, notice: None }
    }

    pub fn notice(text: String) -> Self {
        Self {
            rows: Vec::new(),
            notice: Some(text),
        }
    }
}

impl<'r> Database<'r> {
    /// Creates an interpreter over an already loaded schema and an opened
    /// driver.
    pub fn new(schema: Schema, driver: Box<dyn StorageDriver>, registry: &'r CommandRegistry) -> Self {
        Self {
            schema,
            driver,
            registry,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn driver(&self) -> &dyn StorageDriver {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> &mut dyn StorageDriver {
        self.driver.as_mut()
    }

    /// The command table; its lifetime is independent of `self`.
    pub fn registry(&self) -> &'r CommandRegistry {
        self.registry
    }

    /// Interprets one input line.
    ///
    /// The line goes through the whole pipeline:
    /// 1. **Tokenizes** it into words (double quotes group spaces).
    /// 2. **Resolves** the first word against the registry.
    /// 3. **Groups** the remaining words according to the command grammar.
    /// 4. **Runs** the handler against the schema and the store.
    ///
    /// A line with no words does nothing and yields an empty [`Outcome`].
    ///
    /// # Errors
    /// Returns the first error raised by any stage; the store is left as it
    /// was before the line.
    ///
    /// # Example
    /// ```
    /// use mintable::{CommandRegistry, Database, Schema, Value};
    /// use mintable::storage::{DriverKind, open_driver};
    ///
    /// let schema = Schema::from_yaml(
    ///     "columns:\n  - {name: id, type: integer, attribute: primary_key}\n  - {name: name, type: string}",
    /// )
    /// .unwrap();
    /// let driver = open_driver(DriverKind::Memory, schema.primary_key());
    /// let registry = CommandRegistry::builtin().unwrap();
    /// let mut db = Database::new(schema, driver, &registry);
    ///
    /// db.execute("add id 1 name \"Ada Lovelace\"").unwrap();
    /// let outcome = db.execute("get 1").unwrap();
    /// assert_eq!(outcome.rows[0]["name"], Value::Text("Ada Lovelace".into()));
    /// ```
    pub fn execute(&mut self, line: &str) -> Result<Outcome> {
        let words = split(line);
        let Some((command, rest)) = words.split_first() else {
            return Ok(Outcome::default());
        };

        let registry = self.registry;
        let info = registry.get(command)?;
        let args = info.grammar.group(rest)?;
        debug!(command = info.command, args = args.len(), "dispatching");

        let outcome = (info.handler)(self, args)?;
        debug!(
            command = info.command,
            rows = outcome.rows.len(),
            stored = self.driver.len(),
            "command done"
        );
        Ok(outcome)
    }
}
