/// How a single reference character is shown to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharClass {
    Untouched,
    Current,
    Correct,
    Incorrect,
}

/// Result of comparing the whole input against the reference
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classification {
    pub classes: Vec<CharClass>,
    pub correct_count: usize,
}

impl Classification {
    /// Classification of a session nobody has typed into yet
    pub fn initial(len: usize) -> Self {
        let classes = (0..len)
            .map(|idx| {
                if idx == 0 {
                    CharClass::Current
                } else {
                    CharClass::Untouched
                }
            })
            .collect();
        Self {
            classes,
            correct_count: 0,
        }
    }
}

/// Classify every reference position against the input typed so far.
///
/// Always recomputed from scratch: any earlier character may have been
/// edited since the last call. Input past the end of the reference is ignored.
pub fn classify(reference: &[char], input: &[char]) -> Classification {
    let typed = input.len().min(reference.len());
    let mut correct_count = 0;

    let classes = reference
        .iter()
        .enumerate()
        .map(|(idx, expected)| {
            if idx < typed {
                if input[idx] == *expected {
                    correct_count += 1;
                    CharClass::Correct
                } else {
                    CharClass::Incorrect
                }
            } else if idx == typed {
                CharClass::Current
            } else {
                CharClass::Untouched
            }
        })
        .collect();

    Classification {
        classes,
        correct_count,
    }
}
