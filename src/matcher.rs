//! Matches compiled instructions in a fetched transaction against the known
//! discriminators of a target program.

use solana_transaction_status::{UiCompiledInstruction, UiRawMessage};

use crate::idl::{DiscriminatorTable, DISCRIMINATOR_LEN};
use crate::types::Address;

/// One instruction recognized by its discriminator, with the referenced
/// account list resolved against the message's key table in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedInstruction {
    pub name: String,
    pub account_keys: Vec<Address>,
}

/// Lazily yields every instruction in `message` that executes under
/// `target_program` and starts with a discriminator known to `table`.
///
/// Instructions with undecodable data, fewer than 8 bytes of data, or an
/// unknown discriminator are skipped, not errors. An account index that does
/// not resolve against the key table (v0 transactions can reference lookup
/// tables beyond it) makes the whole instruction non-matching: a partial key
/// list would shift positional offsets and misattribute addresses. Multiple
/// matches within one message are all yielded; any first-match policy
/// belongs to the caller.
pub fn match_instructions<'a>(
    message: &'a UiRawMessage,
    target_program: &'a str,
    table: &'a DiscriminatorTable,
) -> impl Iterator<Item = MatchedInstruction> + 'a {
    message
        .instructions
        .iter()
        .filter_map(move |ix| match_one(message, target_program, table, ix))
}

fn match_one(
    message: &UiRawMessage,
    target_program: &str,
    table: &DiscriminatorTable,
    ix: &UiCompiledInstruction,
) -> Option<MatchedInstruction> {
    let program_id = message.account_keys.get(ix.program_id_index as usize)?;
    if program_id != target_program {
        return None;
    }

    let data = bs58::decode(&ix.data).into_vec().ok()?;
    if data.len() < DISCRIMINATOR_LEN {
        return None;
    }
    let disc_hex = hex::encode(&data[..DISCRIMINATOR_LEN]);
    let name = table.name_for(&disc_hex)?;

    let account_keys = ix
        .accounts
        .iter()
        .map(|&index| message.account_keys.get(index as usize).cloned())
        .collect::<Option<Vec<_>>>()?;

    Some(MatchedInstruction {
        name: name.to_string(),
        account_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_sdk::message::MessageHeader;

    const PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";
    const OTHER_PROGRAM: &str = "11111111111111111111111111111111";

    fn table() -> DiscriminatorTable {
        let idl = json!({
            "instructions": [{ "name": "create" }, { "name": "buy" }]
        });
        DiscriminatorTable::derive(&idl).unwrap()
    }

    fn instruction(program_id_index: u8, accounts: Vec<u8>, data: &[u8]) -> UiCompiledInstruction {
        UiCompiledInstruction {
            program_id_index,
            accounts,
            data: bs58::encode(data).into_string(),
            stack_height: None,
        }
    }

    fn message(
        account_keys: Vec<&str>,
        instructions: Vec<UiCompiledInstruction>,
    ) -> UiRawMessage {
        UiRawMessage {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 0,
            },
            account_keys: account_keys.into_iter().map(str::to_string).collect(),
            recent_blockhash: "4uQeVj5tqViQh7yWWGStvkEG1Zmhx6uasJtWCJziofM".to_string(),
            instructions,
            address_table_lookups: None,
        }
    }

    fn create_data() -> Vec<u8> {
        let mut data = hex::decode("181ec828051c0777").unwrap();
        data.extend_from_slice(b"trailing args");
        data
    }

    #[test]
    fn yields_single_match_with_accounts_in_order() {
        let msg = message(
            vec!["Payer", "MintAddr", "Authority", "Curve", "AssocCurve", PROGRAM],
            vec![instruction(5, vec![1, 2, 3, 4], &create_data())],
        );

        let matches: Vec<_> = match_instructions(&msg, PROGRAM, &table()).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "create");
        assert_eq!(
            matches[0].account_keys,
            vec!["MintAddr", "Authority", "Curve", "AssocCurve"]
        );
    }

    #[test]
    fn skips_instructions_of_other_programs() {
        let msg = message(
            vec!["Payer", "MintAddr", OTHER_PROGRAM],
            vec![instruction(2, vec![1], &create_data())],
        );
        assert_eq!(match_instructions(&msg, PROGRAM, &table()).count(), 0);
    }

    #[test]
    fn short_data_is_non_matching_not_an_error() {
        let msg = message(
            vec!["Payer", PROGRAM],
            vec![instruction(1, vec![0], &[0x18, 0x1e, 0xc8])],
        );
        assert_eq!(match_instructions(&msg, PROGRAM, &table()).count(), 0);
    }

    #[test]
    fn unknown_discriminator_is_skipped() {
        let msg = message(
            vec!["Payer", PROGRAM],
            vec![instruction(1, vec![0], &[0u8; 8])],
        );
        assert_eq!(match_instructions(&msg, PROGRAM, &table()).count(), 0);
    }

    #[test]
    fn yields_every_match_in_one_message() {
        let buy_data = hex::decode("66063d1201daebea").unwrap();
        let msg = message(
            vec!["Payer", "MintAddr", PROGRAM],
            vec![
                instruction(2, vec![1], &create_data()),
                instruction(2, vec![0, 1], &buy_data),
            ],
        );

        let names: Vec<_> = match_instructions(&msg, PROGRAM, &table())
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["create", "buy"]);
    }

    #[test]
    fn unresolvable_account_index_makes_the_instruction_non_matching() {
        let msg = message(
            vec!["Payer", "MintAddr", PROGRAM],
            vec![instruction(2, vec![1, 200], &create_data())],
        );
        assert_eq!(match_instructions(&msg, PROGRAM, &table()).count(), 0);
    }

    #[test]
    fn unresolvable_index_never_shifts_later_positions() {
        // Index 200 points past the key table (a lookup-table reference on a
        // v0 transaction). Were it dropped instead of rejected, the keys
        // after it would slide one position left and resolve to the wrong
        // accounts.
        let msg = message(
            vec![PROGRAM, "MintAddr", "Authority", "Curve", "AssocCurve"],
            vec![instruction(0, vec![1, 2, 200, 3, 4], &create_data())],
        );
        assert_eq!(match_instructions(&msg, PROGRAM, &table()).count(), 0);
    }
}
