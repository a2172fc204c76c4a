//! End-to-end tests for the detection-to-trade pipeline, short of the
//! network: a synthetic raw transaction message flows through extraction,
//! the ledger and the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use solana_sdk::message::MessageHeader;
use solana_transaction_status::{UiCompiledInstruction, UiRawMessage};
use tokio::sync::mpsc;

use pump_sniper::idl::DiscriminatorTable;
use pump_sniper::ledger::TradeLedger;
use pump_sniper::listener::extract_mint_event;
use pump_sniper::orchestrator::{TradeOrchestrator, TradePolicy};

const PROGRAM: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

fn table() -> DiscriminatorTable {
    DiscriminatorTable::derive(&json!({
        "instructions": [
            { "name": "create" },
            { "name": "buy" },
            { "name": "sell" }
        ]
    }))
    .unwrap()
}

/// A message resembling what the RPC returns for a pump.fun token creation:
/// fee payer first, then the create instruction referencing
/// [mint, authority, curve, associated curve].
fn create_transaction_message() -> UiRawMessage {
    let create_data = hex::decode("181ec828051c0777").unwrap();
    UiRawMessage {
        header: MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 2,
        },
        account_keys: vec![
            "CreatorPayer".to_string(),
            "NewMint".to_string(),
            "MintAuthority".to_string(),
            "BondingCurve".to_string(),
            "AssocBondingCurve".to_string(),
            PROGRAM.to_string(),
        ],
        recent_blockhash: "4uQeVj5tqViQh7yWWGStvkEG1Zmhx6uasJtWCJziofM".to_string(),
        instructions: vec![UiCompiledInstruction {
            program_id_index: 5,
            accounts: vec![1, 2, 3, 4],
            data: bs58::encode(&create_data).into_string(),
            stack_height: None,
        }],
        address_table_lookups: None,
    }
}

#[tokio::test]
async fn create_transaction_becomes_exactly_one_simulated_buy() {
    let message = create_transaction_message();
    let event = extract_mint_event(&message, PROGRAM, &table(), "CreateSig")
        .unwrap()
        .expect("create instruction should match");

    assert_eq!(event.mint, "NewMint");
    assert_eq!(event.bonding_curve, "BondingCurve");
    assert_eq!(event.associated_bonding_curve, "AssocBondingCurve");
    assert_eq!(event.payer, "CreatorPayer");

    let ledger = Arc::new(TradeLedger::open_in_memory().await.unwrap());
    ledger.record_mint_event(&event).await.unwrap();

    let (sender, receiver) = mpsc::channel(4);
    sender.send(event.clone()).await.unwrap();
    drop(sender);

    let policy = TradePolicy {
        owner_filter: None,
        simulate: true,
        marry: false,
        sell_delay: Duration::from_millis(10),
    };
    TradeOrchestrator::new(receiver, policy, None, Arc::clone(&ledger))
        .run()
        .await;

    let sims = ledger.simulations().await.unwrap();
    assert_eq!(sims.len(), 1);
    assert_eq!(sims[0].mint, "NewMint");
    assert_eq!(sims[0].bonding_curve, "BondingCurve");

    // The durable sink holds the same event, keyed by mint.
    let stored = ledger.get_mint_event("NewMint").await.unwrap().unwrap();
    assert_eq!(stored, event);
}

#[tokio::test]
async fn reprocessing_the_same_mint_overwrites_the_sink_record() {
    let message = create_transaction_message();
    let ledger = TradeLedger::open_in_memory().await.unwrap();

    let first = extract_mint_event(&message, PROGRAM, &table(), "SigA")
        .unwrap()
        .unwrap();
    let second = extract_mint_event(&message, PROGRAM, &table(), "SigB")
        .unwrap()
        .unwrap();
    ledger.record_mint_event(&first).await.unwrap();
    ledger.record_mint_event(&second).await.unwrap();

    let stored = ledger.get_mint_event("NewMint").await.unwrap().unwrap();
    assert_eq!(stored.signature, "SigB");
}

#[tokio::test]
async fn transactions_of_other_programs_produce_no_event() {
    let mut message = create_transaction_message();
    message.account_keys[5] = "SomeOtherProgram1111111111111111111111111111".to_string();

    let event = extract_mint_event(&message, PROGRAM, &table(), "CreateSig").unwrap();
    assert!(event.is_none());
}
