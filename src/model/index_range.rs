//! Index range of a message batch and the contiguity check for eager loads

use crate::domain::{message::ChatMessage, sequence_index::SequenceIndex};

/// Smallest and largest valid index of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageIndexRange {
    /// At least one message had no valid index (missing, malformed or `"0"`)
    pub with_no_indexed: bool,
    pub min: Option<SequenceIndex>,
    pub max: Option<SequenceIndex>,
}

impl MessageIndexRange {
    /// Compute the range over `messages`
    pub fn of<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> Self {
        let mut range = Self::default();

        for message in messages {
            let Some(index) = message.sequence_index() else {
                range.with_no_indexed = true;
                continue;
            };
            if range.min.as_ref().map_or(true, |min| index < *min) {
                range.min = Some(index.clone());
            }
            if range.max.as_ref().map_or(true, |max| index > *max) {
                range.max = Some(index);
            }
        }

        range
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }
}

/// Decide whether a freshly fetched latest page has to replace the loaded window
///
/// Returns `true` when the rendered messages must be dropped before inserting
/// `range`'s batch, `false` when the batch can be merged in. A gap larger than
/// `eager_page_size - 1` between the loaded maximum and the batch minimum means
/// history in between was never loaded.
pub fn should_abort_loaded_messages(
    max_load_index: &SequenceIndex,
    range: &MessageIndexRange,
    eager_page_size: u32,
) -> bool {
    if max_load_index.is_sentinel() {
        return true;
    }
    let Some(min) = &range.min else {
        return true;
    };
    if min < max_load_index {
        return false;
    }
    let threshold = u64::from(eager_page_size.saturating_sub(1));
    min.exceeds_by(max_load_index, threshold)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const EAGER_PAGE_SIZE: u32 = 20;

    fn idx(raw: &str) -> SequenceIndex {
        SequenceIndex::parse(raw).unwrap()
    }

    fn batch(indices: &[&str]) -> Vec<ChatMessage> {
        indices
            .iter()
            .enumerate()
            .map(|(i, index)| ChatMessage::new(format!("m{i}"), *index))
            .collect()
    }

    #[test]
    fn test_range_of_empty_batch() {
        assert_eq!(
            MessageIndexRange::of(&Vec::<ChatMessage>::new()),
            MessageIndexRange {
                with_no_indexed: false,
                min: None,
                max: None,
            }
        );
    }

    #[test]
    fn test_range_of_sentinel_only() {
        assert_eq!(
            MessageIndexRange::of(&batch(&["0"])),
            MessageIndexRange {
                with_no_indexed: true,
                min: None,
                max: None,
            }
        );
    }

    #[test]
    fn test_range_with_unindexed_message() {
        let mut messages = vec![ChatMessage::unindexed("local")];
        messages.extend(batch(&["1", "2"]));

        assert_eq!(
            MessageIndexRange::of(&messages),
            MessageIndexRange {
                with_no_indexed: true,
                min: Some(idx("1")),
                max: Some(idx("2")),
            }
        );
    }

    #[test]
    fn test_range_compares_numerically() {
        let range = MessageIndexRange::of(&batch(&["100", "9", "18446744073709551617", "10"]));
        assert_eq!(range.min, Some(idx("9")));
        assert_eq!(range.max, Some(idx("18446744073709551617")));
        assert!(!range.with_no_indexed);
    }

    #[rstest]
    #[case("0", &["1", "2"], true)]
    #[case("0", &[], true)]
    #[case("10", &[], true)]
    #[case("10", &["0"], true)]
    #[case("10", &["11", "12", "20"], false)]
    #[case("10", &["30", "35"], true)]
    #[case("10", &["29", "35"], false)]
    #[case("20", &["5", "30"], false)]
    #[case("9007199254740993", &["9007199254741013"], true)]
    #[case("9007199254740993", &["9007199254741012"], false)]
    fn test_should_abort_loaded_messages(
        #[case] max_load_index: &str,
        #[case] indices: &[&str],
        #[case] expected: bool,
    ) {
        let range = MessageIndexRange::of(&batch(indices));
        assert_eq!(
            should_abort_loaded_messages(&idx(max_load_index), &range, EAGER_PAGE_SIZE),
            expected
        );
    }

    #[test]
    fn test_should_abort_is_pure() {
        let range = MessageIndexRange::of(&batch(&["30", "35"]));
        let max_load_index = idx("10");
        let first = should_abort_loaded_messages(&max_load_index, &range, EAGER_PAGE_SIZE);
        let second = should_abort_loaded_messages(&max_load_index, &range, EAGER_PAGE_SIZE);
        assert_eq!(first, second);
    }
}
