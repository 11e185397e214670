use std::sync::Arc;
use std::time::Duration;

use shielded_tx_workflow::api::Services;
use shielded_tx_workflow::config_models::cli_args::WorkflowConfig;
use shielded_tx_workflow::config_models::network::ChainConfig;
use shielded_tx_workflow::mock_services::Answer;
use shielded_tx_workflow::mock_services::ScriptedPrompter;
use shielded_tx_workflow::mock_services::SimulatedChain;
use shielded_tx_workflow::models::address::Address;
use shielded_tx_workflow::models::fee::PublicSigner;
use shielded_tx_workflow::models::fee::SelectedBroadcaster;
use shielded_tx_workflow::models::fee::TokenInfo;
use shielded_tx_workflow::models::selection::AmountSelection;
use shielded_tx_workflow::state::session::Session;
use shielded_tx_workflow::state::status::StatusQueue;
use shielded_tx_workflow::state::watchers::WatcherRegistry;
use shielded_tx_workflow::workflow::TransactionWorkflow;

pub const PASSWORD: &str = "password";

pub fn usdc() -> TokenInfo {
    TokenInfo {
        address: Address::new("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
        symbol: "USDC".into(),
        decimals: 6,
    }
}

pub fn weth() -> TokenInfo {
    TokenInfo {
        address: Address::new("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
        symbol: "WETH".into(),
        decimals: 18,
    }
}

pub fn leg(token: &TokenInfo, recipient: &str, amount: u64) -> AmountSelection {
    AmountSelection {
        token_address: token.address.clone(),
        amount: amount.into(),
        decimals: token.decimals,
        symbol: token.symbol.clone(),
        name: token.symbol.clone(),
        recipient_address: Address::new(recipient),
    }
}

pub fn broadcaster(address: &str, fee_token: &TokenInfo, fee: u64) -> SelectedBroadcaster {
    SelectedBroadcaster {
        broadcaster_address: Address::new(address),
        fee_token_address: fee_token.address.clone(),
        fee_per_unit_gas: fee.into(),
        fee_commitment: format!("quote-{}", address),
        supports_relay_adapt: true,
    }
}

/// A session over a simulated regtest chain, as a wallet front end would set
/// it up, with the process-wide status queue and watcher registry kept
/// outside the session.
pub struct SimulatedSession {
    pub chain: Arc<SimulatedChain>,
    pub status: StatusQueue,
    pub watchers: WatcherRegistry,
    pub session: Arc<Session>,
    pub prompter: Arc<ScriptedPrompter>,
}

impl SimulatedSession {
    pub fn default_config() -> WorkflowConfig {
        WorkflowConfig {
            confirmation_timeout: Duration::from_secs(5),
            confirmation_poll_interval: Duration::from_millis(2),
            status_duration: Duration::from_millis(50),
            ..WorkflowConfig::default()
        }
    }

    pub fn start(answers: impl IntoIterator<Item = Answer>) -> anyhow::Result<Self> {
        Self::start_with(SimulatedChain::new(ChainConfig::regtest()), answers)
    }

    pub fn start_with(
        chain: SimulatedChain,
        answers: impl IntoIterator<Item = Answer>,
    ) -> anyhow::Result<Self> {
        let chain = Arc::new(chain.with_token(usdc()).with_token(weth()));
        let status = StatusQueue::default();
        let watchers = WatcherRegistry::default();
        let session = Session::login(
            ChainConfig::regtest(),
            Self::default_config(),
            vec![PublicSigner {
                name: "primary".into(),
                address: Address::new("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
            }],
            status.clone(),
            watchers.clone(),
        )?;

        Ok(Self {
            chain,
            status,
            watchers,
            session: Arc::new(session),
            prompter: Arc::new(ScriptedPrompter::new(answers)),
        })
    }

    pub fn workflow(&self) -> TransactionWorkflow {
        TransactionWorkflow::new(
            Services::uniform(self.chain.clone()),
            self.session.clone(),
            self.prompter.clone(),
        )
    }
}
