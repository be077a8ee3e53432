use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::events::{Event, TokenizedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    None,
    /// Left-pad codes with zeros to `len(str(distinct_count))` so that
    /// string order equals numeric order.
    Zero,
}

/// Value-to-code mapping for one categorical column.
///
/// Codes follow the sorted order of the distinct values, so fitting the same
/// set twice gives the same table regardless of row order. Fitting a
/// different subset reassigns codes: build the table once and pass it to
/// every stage that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTable {
    codes: BTreeMap<String, usize>,
    values: Vec<String>,
    padding: Padding,
    width: usize,
}

impl EncodingTable {
    pub fn fit<I, S>(values: I, padding: Padding) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes = BTreeMap::new();
        for value in values {
            codes.entry(value.as_ref().to_string()).or_insert(0);
        }
        let values = codes.keys().cloned().collect::<Vec<_>>();
        for (code, slot) in codes.values_mut().enumerate() {
            *slot = code;
        }
        let width = values.len().to_string().len();
        Self {
            codes,
            values,
            padding,
            width,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Rendered width of a padded code.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    pub fn value(&self, code: usize) -> Option<&str> {
        self.values.get(code).map(String::as_str)
    }

    pub fn render(&self, code: usize) -> String {
        match self.padding {
            Padding::Zero => format!("{code:0width$}", width = self.width),
            Padding::None => code.to_string(),
        }
    }

    pub fn label(&self, value: &str) -> Option<String> {
        self.code(value).map(|code| self.render(code))
    }

    /// Encodes a whole column, failing on values the table has not seen.
    pub fn encode_all<'a, I>(&self, column: &'static str, values: I) -> Result<Vec<String>, AnalysisError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values
            .into_iter()
            .map(|value| {
                self.label(value).ok_or_else(|| AnalysisError::UnknownCategory {
                    column,
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

/// Fits the event-type table that tokens are built from.
pub fn fit_type_table(events: &[Event]) -> EncodingTable {
    EncodingTable::fit(events.iter().map(|e| e.event_type.as_str()), Padding::Zero)
}

/// Attaches `type_id` and the `type_id ⧺ player_id` token to every event.
///
/// There is no separator between the two parts, so the type code must have a
/// fixed width or tokens from different types could collide.
pub fn tokenize(events: Vec<Event>, types: &EncodingTable) -> Result<Vec<TokenizedEvent>, AnalysisError> {
    if types.padding() != Padding::Zero {
        return Err(AnalysisError::UnpaddedEncoding { column: "type" });
    }
    let type_ids = types.encode_all("type", events.iter().map(|e| e.event_type.as_str()))?;
    Ok(events
        .into_iter()
        .zip(type_ids)
        .map(|(event, type_id)| {
            let token = format!("{type_id}{}", event.player_id);
            TokenizedEvent {
                event,
                type_id,
                token,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{EncodingTable, Padding, tokenize};
    use crate::error::AnalysisError;
    use crate::events::Event;

    fn event(event_type: &str, player_id: &str) -> Event {
        Event {
            match_id: 1,
            index: 1,
            event_type: event_type.to_string(),
            team: "Arsenal".to_string(),
            player: None,
            player_id: player_id.to_string(),
            position: None,
            role: None,
            shot_xg: None,
            shot_outcome: None,
            location: None,
            pass_end_location: None,
            carry_end_location: None,
            pass_recipient: None,
        }
    }

    #[test]
    fn codes_follow_sorted_values() {
        let table = EncodingTable::fit(["Shot", "Pass", "Carry", "Pass"], Padding::None);
        assert_eq!(table.len(), 3);
        assert_eq!(table.code("Carry"), Some(0));
        assert_eq!(table.code("Pass"), Some(1));
        assert_eq!(table.code("Shot"), Some(2));
        assert_eq!(table.value(1), Some("Pass"));
        assert_eq!(table.code("Duel"), None);
    }

    #[test]
    fn fitting_is_independent_of_row_order() {
        let a = EncodingTable::fit(["Shot", "Pass", "Carry"], Padding::Zero);
        let b = EncodingTable::fit(["Carry", "Carry", "Shot", "Pass"], Padding::Zero);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_padding_width_tracks_distinct_count() {
        let values = (0..12).map(|i| format!("type-{i:02}")).collect::<Vec<_>>();
        let table = EncodingTable::fit(&values, Padding::Zero);
        assert_eq!(table.width(), 2);
        let labels = values
            .iter()
            .map(|v| table.label(v).unwrap())
            .collect::<Vec<_>>();
        assert!(labels.iter().all(|l| l.len() == 2));
        assert_eq!(labels[0], "00");
        assert_eq!(labels[11], "11");

        let mut sorted = labels.clone();
        sorted.sort();
        let numeric = sorted
            .iter()
            .map(|l| l.parse::<usize>().unwrap())
            .collect::<Vec<_>>();
        assert!(numeric.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn width_uses_the_count_not_the_largest_code() {
        let values = (0..10).map(|i| i.to_string()).collect::<Vec<_>>();
        let table = EncodingTable::fit(&values, Padding::Zero);
        assert_eq!(table.width(), 2);
        assert_eq!(table.render(9), "09");
    }

    #[test]
    fn encode_all_rejects_unseen_values() {
        let table = EncodingTable::fit(["Pass"], Padding::Zero);
        let err = table.encode_all("type", ["Pass", "Shot"]).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownCategory { column: "type", .. }));
    }

    #[test]
    fn tokens_concatenate_type_and_player() {
        let events = vec![event("Pass", "22084"), event("Shot", "00000")];
        let table = EncodingTable::fit(["Pass", "Shot"], Padding::Zero);
        let tokens = tokenize(events, &table).unwrap();
        assert_eq!(tokens[0].type_id, "0");
        assert_eq!(tokens[0].token, "022084");
        assert_eq!(tokens[1].token, "100000");
    }

    #[test]
    fn tokenize_requires_padding() {
        let table = EncodingTable::fit(["Pass"], Padding::None);
        let err = tokenize(vec![event("Pass", "1")], &table).unwrap_err();
        assert!(matches!(err, AnalysisError::UnpaddedEncoding { .. }));
    }
}
