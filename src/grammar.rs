//! Argument grouping: turns the words following a command name into
//! structured arguments according to the command's declared grammar.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Valid key syntax. The `$` prefix marks magic directives such as `$sort_asc`.
static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?[A-Za-z_]\w*$").expect("key pattern is valid"));

/// The shape of each argument group a command expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgsFormat {
    /// `key value` pairs.
    KeyValue,
    /// Bare keys.
    Key,
    /// Bare values.
    Value,
}

/// Declared argument grammar of a command. Bounds are inclusive and count
/// groups, not words; `None` leaves that side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    pub args_format: ArgsFormat,
    pub min_args: Option<usize>,
    pub max_args: Option<usize>,
}

impl Grammar {
    pub const fn new(args_format: ArgsFormat, min_args: Option<usize>, max_args: Option<usize>) -> Self {
        Self {
            args_format,
            min_args,
            max_args,
        }
    }

    /// Groups `words` (everything after the command name).
    ///
    /// # Errors
    /// - [`Error::KeyValueUnmatched`] when a key-value grammar has a dangling key
    /// - [`Error::InvalidKeyArgument`] when a key has invalid syntax
    /// - [`Error::TooFewArguments`] / [`Error::TooManyArguments`] when the
    ///   group count is outside the bounds
    ///
    /// # Example
    /// ```
    /// # use mintable::grammar::{Argument, ArgsFormat, Grammar};
    /// let grammar = Grammar::new(ArgsFormat::KeyValue, Some(1), None);
    /// let words = vec!["Name".to_string(), "Bob".to_string()];
    /// let args = grammar.group(&words).unwrap();
    /// assert_eq!(args, vec![Argument::Pair("name".into(), "Bob".into())]);
    /// ```
    pub fn group(&self, words: &[String]) -> Result<Vec<Argument>> {
        let groups = match self.args_format {
            ArgsFormat::KeyValue => {
                let mut pairs = words.chunks_exact(2);
                let mut groups = Vec::with_capacity(words.len() / 2);
                for pair in pairs.by_ref() {
                    groups.push(Argument::Pair(normalize_key(&pair[0])?, pair[1].clone()));
                }
                if let [dangling] = pairs.remainder() {
                    return Err(Error::KeyValueUnmatched(dangling.to_lowercase()));
                }
                groups
            }
            ArgsFormat::Key => words
                .iter()
                .map(|word| normalize_key(word).map(Argument::Key))
                .collect::<Result<Vec<_>>>()?,
            ArgsFormat::Value => words.iter().cloned().map(Argument::Value).collect(),
        };

        if let Some(min) = self.min_args.filter(|min| groups.len() < *min) {
            return Err(Error::TooFewArguments {
                expected: min,
                actual: groups.len(),
            });
        }
        if let Some(max) = self.max_args.filter(|max| groups.len() > *max) {
            return Err(Error::TooManyArguments {
                expected: max,
                actual: groups.len(),
            });
        }

        Ok(groups)
    }
}

/// One grouped argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Pair(String, String),
    Key(String),
    Value(String),
}

impl Argument {
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Pair(_, value) | Self::Value(value) => Some(value),
            Self::Key(_) => None,
        }
    }

    /// Splits a pair into its key and value.
    pub fn into_pair(self) -> Result<(String, String)> {
        match self {
            Self::Pair(key, value) => Ok((key, value)),
            other => Err(Error::Internal(format!("expected a key-value argument, got {other:?}"))),
        }
    }
}

/// Collects pairs into a map.
///
/// # Errors
/// Returns [`Error::ArgumentConflict`] when a key repeats.
pub fn pairs_into_map<I>(pairs: I) -> Result<HashMap<String, String>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = HashMap::new();
    for (key, value) in pairs {
        if map.contains_key(&key) {
            return Err(Error::ArgumentConflict(key));
        }
        map.insert(key, value);
    }
    Ok(map)
}

fn normalize_key(word: &str) -> Result<String> {
    let key = word.to_lowercase();
    if KEY_RE.is_match(&key) {
        Ok(key)
    } else {
        Err(Error::InvalidKeyArgument(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn pair(k: &str, v: &str) -> Argument {
        Argument::Pair(k.into(), v.into())
    }

    #[test]
    fn test_key_value_groups() {
        let grammar = Grammar::new(ArgsFormat::KeyValue, None, None);
        let args = grammar.group(&words("ID 1 $Sort_Asc Name")).unwrap();
        assert_eq!(args, vec![pair("id", "1"), pair("$sort_asc", "Name")]);
        assert!(grammar.group(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_key_without_value() {
        let grammar = Grammar::new(ArgsFormat::KeyValue, None, None);
        let err = grammar.group(&words("id 1 name")).unwrap_err();
        assert_eq!(err, Error::KeyValueUnmatched("name".into()));
    }

    #[test]
    fn test_invalid_keys() {
        let grammar = Grammar::new(ArgsFormat::KeyValue, None, None);
        for bad in ["1abc", "na-me", "$$sort", "$", "a b"] {
            let words = vec![bad.to_string(), "v".to_string()];
            assert!(
                matches!(grammar.group(&words), Err(Error::InvalidKeyArgument(_))),
                "accepted {bad}"
            );
        }
        let key_grammar = Grammar::new(ArgsFormat::Key, None, None);
        assert!(matches!(
            key_grammar.group(&words("ok 9lives")),
            Err(Error::InvalidKeyArgument(_))
        ));
    }

    #[test]
    fn test_key_and_value_formats() {
        let keys = Grammar::new(ArgsFormat::Key, None, None);
        assert_eq!(
            keys.group(&words("Id name")).unwrap(),
            vec![Argument::Key("id".into()), Argument::Key("name".into())]
        );

        let values = Grammar::new(ArgsFormat::Value, None, None);
        assert_eq!(
            values.group(&words("Id 9lives")).unwrap(),
            vec![Argument::Value("Id".into()), Argument::Value("9lives".into())]
        );
    }

    #[test]
    fn test_bounds() {
        let exactly_one = Grammar::new(ArgsFormat::Value, Some(1), Some(1));
        assert_eq!(
            exactly_one.group(&[]).unwrap_err(),
            Error::TooFewArguments {
                expected: 1,
                actual: 0
            }
        );
        assert_eq!(
            exactly_one.group(&words("1 2")).unwrap_err(),
            Error::TooManyArguments {
                expected: 1,
                actual: 2
            }
        );
        assert!(exactly_one.group(&words("1")).is_ok());

        let at_least_two = Grammar::new(ArgsFormat::KeyValue, Some(2), None);
        assert!(matches!(
            at_least_two.group(&words("id 1")),
            Err(Error::TooFewArguments { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_accessors() {
        let arg = pair("id", "1");
        assert_eq!(arg.value(), Some("1"));
        assert_eq!(Argument::Key("k".into()).value(), None);
        assert!(Argument::Value("v".into()).into_pair().is_err());
    }

    #[test]
    fn test_pairs_into_map_conflict() {
        let map = pairs_into_map(vec![("a".into(), "1".into()), ("b".into(), "2".into())]).unwrap();
        assert_eq!(map.len(), 2);
        let err = pairs_into_map(vec![("a".into(), "1".into()), ("a".into(), "2".into())]);
        assert_eq!(err.unwrap_err(), Error::ArgumentConflict("a".into()));
    }
}
