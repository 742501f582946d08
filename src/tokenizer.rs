//! Splits one statement line into words.
//!
//! Words are separated by spaces; a double-quoted substring forms a single
//! word (quotes stripped, inner spaces kept). The splitter is a finite-state
//! machine driven by an explicit transition table:
//!
//! ```text
//! INITIAL    ( )   -> INITIAL
//! INITIAL    (")   -> IN_QUOTED   [mark next]
//! INITIAL    else  -> IN_RAW      [mark here]
//! IN_RAW     ( )   -> INITIAL     [emit]
//! IN_RAW     else  -> IN_RAW
//! IN_QUOTED  (")   -> INITIAL     [emit]
//! IN_QUOTED  else  -> IN_QUOTED
//! ```
//!
//! Words are sliced out of the input by position, never buffered per
//! character. An unterminated quote swallows the rest of the line and emits
//! nothing.

/// Splitter states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial = 0,
    InRaw = 1,
    InQuoted = 2,
}

/// Character classes the machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Space = 0,
    Quote = 1,
    Other = 2,
}

impl Trigger {
    fn of(ch: char) -> Self {
        match ch {
            ' ' => Self::Space,
            '"' => Self::Quote,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SideEffect {
    /// The word starts at the current character.
    MarkHere,
    /// The word starts right after the current character.
    MarkNext,
    /// Emit the slice between the mark and the current character.
    Emit,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    next: State,
    effects: &'static [SideEffect],
}

const fn to(next: State, effects: &'static [SideEffect]) -> Transition {
    Transition { next, effects }
}

/// `TRANSITIONS[state][trigger]`
const TRANSITIONS: [[Transition; 3]; 3] = [
    // INITIAL
    [
        to(State::Initial, &[]),
        to(State::InQuoted, &[SideEffect::MarkNext]),
        to(State::InRaw, &[SideEffect::MarkHere]),
    ],
    // IN_RAW
    [
        to(State::Initial, &[SideEffect::Emit]),
        to(State::InRaw, &[]),
        to(State::InRaw, &[]),
    ],
    // IN_QUOTED
    [
        to(State::InQuoted, &[]),
        to(State::Initial, &[SideEffect::Emit]),
        to(State::InQuoted, &[]),
    ],
];

/// A single-use word splitter over one input line.
pub struct Tokenizer<'a> {
    input: &'a str,
    state: State,
    /// Byte offset where the word being read starts.
    start: usize,
    words: Vec<String>,
}

impl<'a> Tokenizer<'a> {
    /// Creates a splitter for the given line.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            state: State::Initial,
            start: 0,
            words: Vec::new(),
        }
    }

    /// Runs the machine over the whole line and returns the words.
    ///
    /// # Example
    /// ```
    /// # use mintable::tokenizer::Tokenizer;
    /// let words = Tokenizer::new(r#"add name "Bob Dylan""#).tokenize();
    /// assert_eq!(words, vec!["add", "name", "Bob Dylan"]);
    /// ```
    pub fn tokenize(mut self) -> Vec<String> {
        let input = self.input;
        for (pos, ch) in input.char_indices() {
            self.fire(Trigger::of(ch), pos, ch.len_utf8());
        }
        // a virtual trailing space flushes the last raw word
        self.fire(Trigger::Space, input.len(), 1);
        self.words
    }

    /// Applies the transition for `trigger` seen at byte offset `pos`.
    fn fire(&mut self, trigger: Trigger, pos: usize, width: usize) {
        let transition = TRANSITIONS[self.state as usize][trigger as usize];
        for effect in transition.effects {
            match effect {
                SideEffect::MarkHere => self.start = pos,
                SideEffect::MarkNext => self.start = pos + width,
                SideEffect::Emit => self.words.push(self.input[self.start..pos].to_string()),
            }
        }
        self.state = transition.next;
    }
}

/// Splits a statement into words with quote handling.
pub fn split(line: &str) -> Vec<String> {
    Tokenizer::new(line).tokenize()
}
