//! Merging of amount selections that share a token and a recipient.

use itertools::Itertools;

use crate::models::selection::AmountSelection;
use crate::models::selection::TransactionPayload;

/// one entry per distinct (token, recipient) pair, amounts summed, in
/// first-seen order of the pairs.
///
/// display metadata (decimals, symbol, name) is taken from the first entry of
/// each pair.
pub fn consolidate(selections: &[AmountSelection]) -> Vec<AmountSelection> {
    selections
        .iter()
        .cloned()
        .into_grouping_map_by(|s| (s.token_address.clone(), s.recipient_address.clone()))
        .fold_first(|mut acc, _key, next| {
            acc.amount = acc.amount.saturating_add(&next.amount);
            acc
        })
        .into_values()
        .sorted_by_key(|merged| {
            selections.iter().position(|s| {
                s.token_address == merged.token_address
                    && s.recipient_address == merged.recipient_address
            })
        })
        .collect()
}

/// `payload` with its amount legs consolidated. swap payloads are returned
/// as they are.
pub fn consolidate_payload(payload: &TransactionPayload) -> TransactionPayload {
    match payload {
        TransactionPayload::Transfer(selections) => {
            TransactionPayload::Transfer(consolidate(selections))
        }
        TransactionPayload::Swap(_) => payload.clone(),
    }
}
