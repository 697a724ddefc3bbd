use std::fmt;

/// Which of the two inputs a boundary check rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Css,
    Html,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Css => f.write_str("CSS"),
            InputKind::Html => f.write_str("HTML"),
        }
    }
}

/// Errors raised at the entry point before any pruning happens.
///
/// Malformed CSS or HTML is never an error; only input the engine cannot
/// treat as text, or that exceeds the configured size, is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PruneError {
    #[error("{input} input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidEncoding { input: InputKind, valid_up_to: usize },

    #[error("{input} input is {len} bytes, over the limit of {limit} bytes")]
    InputTooLarge {
        input: InputKind,
        len: usize,
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_input() {
        let err = PruneError::InputTooLarge {
            input: InputKind::Html,
            len: 20,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "HTML input is 20 bytes, over the limit of 10 bytes"
        );

        let err = PruneError::InvalidEncoding {
            input: InputKind::Css,
            valid_up_to: 3,
        };
        assert_eq!(err.to_string(), "CSS input is not valid UTF-8 (valid up to byte 3)");
    }
}
