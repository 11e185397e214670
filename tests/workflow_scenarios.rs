mod common;

use common::logging::tracing_logger;
use common::simulated_session::broadcaster;
use common::simulated_session::leg;
use common::simulated_session::usdc;
use common::simulated_session::weth;
use common::simulated_session::SimulatedSession;
use common::simulated_session::PASSWORD;
use shielded_tx_workflow::mock_services::Answer;
use shielded_tx_workflow::mock_services::SimulatedChain;
use shielded_tx_workflow::mock_services::SubmissionPath;
use shielded_tx_workflow::config_models::network::ChainConfig;
use shielded_tx_workflow::models::address::Address;
use shielded_tx_workflow::models::fee::FeeMode;
use shielded_tx_workflow::models::intent::TransactionIntent;
use shielded_tx_workflow::workflow::menu::MenuAction;
use shielded_tx_workflow::workflow::Outcome;

/// legs sharing token and recipient are merged before anything is priced or
/// proven: three legs, two distinct pairs, two nullifiers.
#[tokio::test]
pub async fn duplicate_legs_are_sent_as_one() -> anyhow::Result<()> {
    tracing_logger();
    let chain = SimulatedChain::new(ChainConfig::regtest())
        .with_broadcaster(broadcaster("0xb1", &usdc(), 10));
    let sim = SimulatedSession::start_with(
        chain,
        [
            Answer::Action(MenuAction::SelectEdit),
            Answer::Amounts(Some(vec![
                leg(&usdc(), "0xr1", 100),
                leg(&weth(), "0xr1", 5),
                leg(&usdc(), "0xr1", 50),
            ])),
            Answer::Action(MenuAction::ConfirmAmounts),
            Answer::Password(Some(PASSWORD.into())),
            Answer::Action(MenuAction::SelectFee),
            Answer::FeeMode(Some(FeeMode::Relayed)),
            Answer::FeeToken(Some(usdc().address)),
            Answer::Broadcaster(true),
            Answer::Action(MenuAction::GenerateProof),
            Answer::Action(MenuAction::SendTransaction),
        ],
    )?;

    let outcome = sim.workflow().run(TransactionIntent::Transfer).await;

    assert!(outcome.is_sent());
    let sent = sim.chain.sent();
    assert_eq!(1, sent.len());
    assert_eq!(
        SubmissionPath::Relayed {
            broadcaster: Address::new("0xb1"),
            nullifiers: 2,
        },
        sent[0].path
    );
    Ok(())
}

/// no broadcaster takes the first fee token: the user is told and picks
/// again, and nothing about the selections changes.
#[tokio::test]
pub async fn missing_broadcaster_loops_back_to_fee_token() -> anyhow::Result<()> {
    tracing_logger();
    let chain = SimulatedChain::new(ChainConfig::regtest())
        .with_broadcaster(broadcaster("0xb1", &usdc(), 10));
    let sim = SimulatedSession::start_with(
        chain,
        [
            Answer::Action(MenuAction::SelectEdit),
            Answer::Amounts(Some(vec![leg(&usdc(), "0xpublic", 100)])),
            Answer::Action(MenuAction::ConfirmAmounts),
            Answer::Password(Some(PASSWORD.into())),
            Answer::Action(MenuAction::SelectFee),
            Answer::FeeMode(Some(FeeMode::Relayed)),
            Answer::FeeToken(Some(weth().address)),
            Answer::FeeToken(Some(usdc().address)),
            Answer::Broadcaster(true),
            Answer::Action(MenuAction::ExitMenu),
        ],
    )?;

    let outcome = sim.workflow().run(TransactionIntent::Unshield).await;

    assert_eq!(Outcome::Cancelled, outcome);
    assert!(sim
        .prompter
        .notifications()
        .iter()
        .any(|n| n == "No broadcaster available for WETH. Select another fee token."));
    assert_eq!(vec![Address::new("0xb1")], sim
        .prompter
        .offers()
        .into_iter()
        .map(|o| o.broadcaster_address)
        .collect::<Vec<_>>());

    let last_menu = sim.prompter.menus().pop().unwrap();
    assert!(last_menu.is_enabled(MenuAction::GenerateProof));
    assert!(last_menu.is_enabled(MenuAction::DifferentBroadcaster));
    Ok(())
}

/// a crashed prover leaves the run where it was: proof generation can be
/// retried and sending stays disabled.
#[tokio::test]
pub async fn failed_proof_can_be_retried() -> anyhow::Result<()> {
    tracing_logger();
    let sim = SimulatedSession::start([
        Answer::Action(MenuAction::SelectEdit),
        Answer::Amounts(Some(vec![leg(&usdc(), "0xr1", 100)])),
        Answer::Action(MenuAction::ConfirmAmounts),
        Answer::Password(Some(PASSWORD.into())),
        Answer::Action(MenuAction::SelectFee),
        Answer::FeeMode(Some(FeeMode::SelfSigned)),
        Answer::Signer(Some(0)),
        Answer::Action(MenuAction::GenerateProof),
        Answer::Action(MenuAction::ExitMenu),
    ])?;
    sim.chain.inject(|f| f.proof = true);

    let outcome = sim.workflow().run(TransactionIntent::Transfer).await;

    assert!(outcome.is_cancelled());
    assert_eq!(1, sim.chain.calls().proofs);
    assert!(sim.chain.sent().is_empty());

    let last_menu = sim.prompter.menus().pop().unwrap();
    assert!(last_menu.is_enabled(MenuAction::GenerateProof));
    assert!(!last_menu.is_enabled(MenuAction::SendTransaction));
    assert!(last_menu.summary.iter().any(|line| line.starts_with("Gas: ")));

    // progress stopped short of completion
    let progress = sim.prompter.progress();
    assert!(!progress.is_empty());
    assert!(progress.iter().all(|p| p.percent < 100.0));
    Ok(())
}

/// the watcher of a sent transaction reports through the status queue after
/// the run that sent it has ended.
#[tokio::test]
pub async fn sent_transaction_is_watched_to_confirmation() -> anyhow::Result<()> {
    tracing_logger();
    let sim = SimulatedSession::start([
        Answer::Action(MenuAction::SelectEdit),
        Answer::Amounts(Some(vec![leg(&usdc(), "0xr1", 100)])),
        Answer::Action(MenuAction::ConfirmAmounts),
        Answer::Password(Some(PASSWORD.into())),
        Answer::Action(MenuAction::SelectFee),
        Answer::FeeMode(Some(FeeMode::SelfSigned)),
        Answer::Signer(Some(0)),
        Answer::Action(MenuAction::GenerateProof),
        Answer::Action(MenuAction::SendTransaction),
    ])?;
    sim.chain.set_polls_until_mined(3);

    let Outcome::Sent { tx_hash } = sim.workflow().run(TransactionIntent::Transfer).await else {
        panic!("transaction was not sent");
    };
    assert!(sim.watchers.contains(&tx_hash));
    assert_eq!(1, sim.chain.calls().scan_resets);

    let watched = sim.watchers.take(&tx_hash).unwrap();
    assert_eq!(TransactionIntent::Transfer, watched.intent);
    assert!(watched.handle.await?.is_confirmed());

    let status = sim.status.current(chrono::Utc::now()).unwrap();
    assert!(status.message.starts_with(&format!("Transaction {} confirmed", tx_hash)));
    Ok(())
}
