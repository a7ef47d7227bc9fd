use error_stack::Report;

use crate::error::PipelineError;
use crate::model::{DateRange, Symbol};

/// Validated pipeline input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub symbols: Vec<Symbol>,
    pub range: DateRange,
}

/// Turn the raw form fields into symbols and a date range.
///
/// Symbols keep their input order and duplicates. Dates are only trimmed;
/// a malformed date shows up later as "no data" for each symbol.
pub fn normalize(
    raw_symbols: &str,
    raw_start: &str,
    raw_end: &str,
) -> Result<NormalizedInput, Report<PipelineError>> {
    let symbols: Vec<Symbol> = raw_symbols.split(',').filter_map(Symbol::parse).collect();

    if symbols.is_empty() {
        return Err(Report::new(PipelineError::InvalidInput)
            .attach(format!("raw symbol list: {raw_symbols:?}")));
    }

    Ok(NormalizedInput {
        symbols,
        range: DateRange::new(raw_start.trim(), raw_end.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(input: &NormalizedInput) -> Vec<&str> {
        input.symbols.iter().map(Symbol::as_str).collect()
    }

    #[test]
    fn mixed_case_and_whitespace_are_normalized() {
        let input = normalize(" aapl,  Msft ,goog", "2023-01-01", "2023-12-31").unwrap();
        assert_eq!(names(&input), ["AAPL", "MSFT", "GOOG"]);
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let input = normalize(",,tsla, ,  ,nvda,", "2023-01-01", "2023-12-31").unwrap();
        assert_eq!(names(&input), ["TSLA", "NVDA"]);
    }

    #[test]
    fn duplicates_and_order_are_preserved() {
        let input = normalize("msft, aapl, MSFT", "2023-01-01", "2023-12-31").unwrap();
        assert_eq!(names(&input), ["MSFT", "AAPL", "MSFT"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        for raw in ["", "   ", ",", " , ,, ", "\t\n"] {
            let err = normalize(raw, "2023-01-01", "2023-12-31").unwrap_err();
            assert!(
                matches!(err.current_context(), PipelineError::InvalidInput),
                "input {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_dates_pass_through() {
        let input = normalize("AAPL", " yesterday ", "2023-13-45").unwrap();
        assert_eq!(input.range.start, "yesterday");
        assert_eq!(input.range.end, "2023-13-45");
    }

    #[test]
    fn inverted_range_is_not_rejected() {
        let input = normalize("AAPL", "2024-01-01", "2023-01-01").unwrap();
        assert_eq!(input.range, DateRange::new("2024-01-01", "2023-01-01"));
    }
}
