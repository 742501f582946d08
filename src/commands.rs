//! Command table and handlers.
//!
//! The table is built once at startup by [`CommandRegistry::builtin`] and
//! only read afterwards; the dispatcher in [`crate::database`] borrows it.

use crate::database::{Database, Outcome};
use crate::error::{Error, Result};
use crate::grammar::{ArgsFormat, Argument, Grammar, pairs_into_map};
use crate::query::ListQuery;

/// Executes one command against the database.
pub type Handler = fn(&mut Database<'_>, Vec<Argument>) -> Result<Outcome>;

/// Metadata and handler of a registered command.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// The word typed to invoke the command.
    pub command: &'static str,
    /// Display name.
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub grammar: Grammar,
    pub handler: Handler,
}

/// Read-only lookup table from command word to [`CommandInfo`].
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandInfo>,
}

impl CommandRegistry {
    /// Builds a registry from explicit entries; order is kept for `help`.
    ///
    /// # Errors
    /// Returns [`Error::Internal`] if two entries share a command word.
    pub fn new(commands: Vec<CommandInfo>) -> Result<Self> {
        for (i, info) in commands.iter().enumerate() {
            if commands[..i].iter().any(|c| c.command == info.command) {
                return Err(Error::Internal(format!(
                    "command registered twice: {}",
                    info.command
                )));
            }
        }
        Ok(Self { commands })
    }

    /// The six built-in commands.
    ///
    /// # Errors
    /// Returns [`Error::Internal`] if the table is inconsistent.
    pub fn builtin() -> Result<Self> {
        Self::new(vec![
            CommandInfo {
                command: "add",
                name: "Add",
                description: "Adds an employee.",
                usage: "add <field> <value> [<field> <value> ...]\n\
                        \x20   every field of the schema must be given once\n\
                        \x20   e.g. add id 12345 name \"Chen Xiaoyuan\" in_date 2022-06-05",
                grammar: Grammar::new(ArgsFormat::KeyValue, Some(1), None),
                handler: command_add,
            },
            CommandInfo {
                command: "del",
                name: "Delete",
                description: "Deletes an employee.",
                usage: "del <primary key value>\n\
                        \x20   e.g. del 12345",
                grammar: Grammar::new(ArgsFormat::Value, Some(1), Some(1)),
                handler: command_del,
            },
            CommandInfo {
                command: "get",
                name: "Get",
                description: "Gets the info of an employee.",
                usage: "get <primary key value>\n\
                        \x20   e.g. get 12345",
                grammar: Grammar::new(ArgsFormat::Value, Some(1), Some(1)),
                handler: command_get,
            },
            CommandInfo {
                command: "list",
                name: "List",
                description: "Lists employees, optionally filtered and sorted.",
                usage: "list [<field> <value> ...] [$sort_asc <field>] [$sort_desc <field>] ...\n\
                        \x20   filters are exact matches joined with AND;\n\
                        \x20   the first sort directive is the primary order\n\
                        \x20   e.g. list department P1 $sort_desc position $sort_asc name",
                grammar: Grammar::new(ArgsFormat::KeyValue, None, None),
                handler: command_list,
            },
            CommandInfo {
                command: "mod",
                name: "Modify",
                description: "Modifies an employee.",
                usage: "mod <primary key> <value> <field> <value> [<field> <value> ...]\n\
                        \x20   the primary key itself cannot be changed\n\
                        \x20   e.g. mod id 12345 name hsiaoxychen",
                grammar: Grammar::new(ArgsFormat::KeyValue, Some(2), None),
                handler: command_mod,
            },
            CommandInfo {
                command: "help",
                name: "Help",
                description: "Shows this help message.",
                usage: "help [<command>]",
                grammar: Grammar::new(ArgsFormat::Value, None, Some(1)),
                handler: command_help,
            },
        ])
    }

    /// # Errors
    /// Returns [`Error::CommandNotFound`] for an unregistered word.
    pub fn get(&self, command: &str) -> Result<&CommandInfo> {
        self.commands
            .iter()
            .find(|info| info.command == command)
            .ok_or_else(|| Error::CommandNotFound(command.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandInfo> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn into_pairs(args: Vec<Argument>) -> Result<Vec<(String, String)>> {
    args.into_iter().map(Argument::into_pair).collect()
}

fn single_value(args: Vec<Argument>) -> Result<String> {
    match args.as_slice() {
        [Argument::Value(value)] => Ok(value.clone()),
        _ => Err(Error::Internal(format!(
            "expected exactly one value argument, got {args:?}"
        ))),
    }
}

fn command_add(db: &mut Database<'_>, args: Vec<Argument>) -> Result<Outcome> {
    let entry = pairs_into_map(into_pairs(args)?)?;
    let schema = db.schema();
    schema.validate_keys(&entry, true, true)?;
    let pk_name = schema.primary_key().to_string();
    let mut fields = schema.convert_types(entry)?;

    let pk = fields
        .remove(&pk_name)
        .ok_or_else(|| Error::EntryInvalid(format!("missing keys: {pk_name}")))?;
    let created = db.driver_mut().create_one(pk, fields)?;
    Ok(Outcome::rows(vec![created]))
}

fn command_del(db: &mut Database<'_>, args: Vec<Argument>) -> Result<Outcome> {
    let pk = db.schema().convert_primary_key(&single_value(args)?)?;
    let deleted = db.driver_mut().delete_one(&pk)?;
    Ok(Outcome::rows(vec![deleted]))
}

fn command_get(db: &mut Database<'_>, args: Vec<Argument>) -> Result<Outcome> {
    let pk = db.schema().convert_primary_key(&single_value(args)?)?;
    let row = db.driver().read_one(&pk)?;
    Ok(Outcome::rows(vec![row]))
}

fn command_list(db: &mut Database<'_>, args: Vec<Argument>) -> Result<Outcome> {
    let query = ListQuery::from_pairs(db.schema(), into_pairs(args)?)?;
    let rows = query.execute(db.driver())?;
    Ok(Outcome::rows(rows))
}

fn command_mod(db: &mut Database<'_>, args: Vec<Argument>) -> Result<Outcome> {
    let mut pairs = into_pairs(args)?.into_iter();
    let schema = db.schema();
    let pk_name = schema.primary_key();

    let (key, raw_pk) = pairs
        .next()
        .ok_or_else(|| Error::Internal("mod requires a target key".into()))?;
    if key != pk_name {
        return Err(Error::InvalidKeyArgument(key));
    }

    let updates: Vec<(String, String)> = pairs.collect();
    if let Some((key, _)) = updates.iter().find(|(key, _)| key == pk_name) {
        return Err(Error::InvalidKeyArgument(key.clone()));
    }
    let updates = pairs_into_map(updates)?;
    schema.validate_keys(&updates, false, true)?;

    let pk = schema.convert_primary_key(&raw_pk)?;
    let fields = schema.convert_types(updates)?;
    let updated = db.driver_mut().update_one(&pk, fields)?;
    Ok(Outcome::rows(vec![updated]))
}

fn command_help(db: &mut Database<'_>, args: Vec<Argument>) -> Result<Outcome> {
    let registry = db.registry();
    let mut text = String::from("Help:\n\n");

    match args.first().and_then(Argument::value) {
        None => {
            let width = registry.iter().map(|c| c.command.len()).max().unwrap_or(0);
            for info in registry.iter() {
                text.push_str(&format!("    {:width$}    {}\n", info.command, info.description));
            }
        }
        Some(command) => {
            let info = registry.get(command)?;
            text.push_str(&format!("    {}: {}\n", info.command, info.name));
            text.push_str(&format!("    {}\n", info.description));
            text.push_str(&format!("    usage: {}", info.usage));
        }
    }

    Ok(Outcome::notice(text.trim_end().to_string()))
}
