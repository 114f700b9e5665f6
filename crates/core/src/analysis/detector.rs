use crate::domain::portfolio::Portfolio;
use crate::nlp::{Entity, EntityRecognizer};
use anyhow::Context;

/// Finds the first portfolio ticker whose symbol occurs anywhere in `unit`, ignoring case.
pub fn direct_match<'p>(unit: &str, portfolio: &'p Portfolio) -> Option<&'p str> {
    let haystack = unit.to_uppercase();
    portfolio
        .tickers()
        .find(|ticker| haystack.contains(&ticker.to_uppercase()))
}

/// Matches organization entities against ticker symbols, not company names. A recognizer
/// that emits "Apple" will not resolve to `AAPL`; only entities spelled like the ticker do.
/// Entity text is compared as given; recognizers are expected to hand over trimmed words.
pub fn entity_match<'p>(entities: &[Entity], portfolio: &'p Portfolio) -> Option<&'p str> {
    entities
        .iter()
        .filter(|entity| entity.is_organization())
        .find_map(|entity| {
            let text = entity.text.to_uppercase();
            portfolio
                .tickers()
                .find(|ticker| ticker.to_uppercase() == text)
        })
}

/// Resolves the portfolio asset `unit` talks about, if any.
///
/// The entity recognizer is only consulted when no ticker appears verbatim.
pub async fn detect<'p>(
    unit: &str,
    portfolio: &'p Portfolio,
    recognizer: &dyn EntityRecognizer,
) -> anyhow::Result<Option<&'p str>> {
    if let Some(ticker) = direct_match(unit, portfolio) {
        return Ok(Some(ticker));
    }

    let entities = recognizer
        .extract_entities(unit)
        .await
        .context("entity recognition failed")?;
    Ok(entity_match(&entities, portfolio))
}
