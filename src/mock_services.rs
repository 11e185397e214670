//! In-process stand-ins for the workflow's collaborators.
//!
//! [`SimulatedChain`] implements every service trait in [`crate::api`] over a
//! small in-memory chain, with call counters and failure injection.
//! [`ScriptedPrompter`] answers prompts from a queue. The binary runs against
//! the simulated chain; the tests use both.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use num_bigint::BigUint;
use rand::rng;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use sha3::Digest;
use sha3::Sha3_256;
use zeroize::Zeroizing;

use crate::api::broadcaster::BroadcasterTransport;
use crate::api::broadcaster::RelayRequest;
use crate::api::chain::AllowanceService;
use crate::api::chain::BalanceScanner;
use crate::api::chain::EstimateRequest;
use crate::api::chain::GasEstimator;
use crate::api::chain::SubmissionService;
use crate::api::chain::TokenMetadata;
use crate::api::chain::TxStatus;
use crate::api::keychain::KeyChain;
use crate::api::prompts::Prompter;
use crate::api::prover::ProgressReporter;
use crate::api::prover::ProofRequest;
use crate::api::prover::ProvingService;
use crate::config_models::network::ChainConfig;
use crate::models::address::Address;
use crate::models::address::ChainId;
use crate::models::address::TxHash;
use crate::models::amount::TokenAmount;
use crate::models::fee::BroadcasterFeeRecipient;
use crate::models::fee::EvmGasType;
use crate::models::fee::FeeMode;
use crate::models::fee::FeeStrategy;
use crate::models::fee::GasDetails;
use crate::models::fee::GasEstimate;
use crate::models::fee::PublicSigner;
use crate::models::fee::SelectedBroadcaster;
use crate::models::fee::TokenInfo;
use crate::models::intent::TransactionIntent;
use crate::models::proven_transaction::ProofProgress;
use crate::models::proven_transaction::ProvenTransaction;
use crate::models::proven_transaction::UnsignedTransaction;
use crate::models::secret::EncryptionKey;
use crate::models::selection::AmountSelection;
use crate::models::selection::SwapSelection;
use crate::models::selection::TransactionPayload;
use crate::workflow::menu::Menu;
use crate::workflow::menu::MenuAction;

/// 30 gwei
const SIMULATED_GAS_PRICE: u64 = 30_000_000_000;
const APPROVAL_GAS: u64 = 46_000;

/// Failures the simulated chain injects on request.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub allowance_read: bool,
    pub estimate: bool,
    pub proof: bool,
    /// number of upcoming sends (self-signed or relayed) that fail
    pub sends: u32,
    /// sends that still succeed before the `sends` failures begin
    pub sends_before_failure: u32,
    pub broadcaster_lookup: bool,
    pub scan_reset: bool,
    pub status: bool,
    /// mined transactions revert
    pub revert: bool,
}

/// How often each service entry point was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub allowance_reads: usize,
    pub approvals_populated: usize,
    pub approval_estimates: usize,
    pub estimates: usize,
    pub proofs: usize,
    pub self_signed_sends: usize,
    pub relayed_sends: usize,
    pub status_polls: usize,
    pub broadcaster_lookups: usize,
    pub token_lookups: usize,
    pub scan_resets: usize,
    pub unlocks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPath {
    SelfSigned { signer: Address },
    Relayed { broadcaster: Address, nullifiers: usize },
}

/// A transaction the simulated chain accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub tx_hash: TxHash,
    pub path: SubmissionPath,
    pub to: Address,
}

#[derive(Debug, Clone, Copy)]
struct Inclusion {
    polls_left: u32,
    block_number: Option<u64>,
}

#[derive(Debug)]
struct SimState {
    chain: ChainConfig,
    password: String,
    tokens: HashMap<Address, TokenInfo>,
    allowances: HashMap<(Address, Address, Address), TokenAmount>,
    // approvals populated but not yet sent: (transaction, token, spender)
    approvals: Vec<(UnsignedTransaction, Address, Address)>,
    broadcasters: Vec<SelectedBroadcaster>,
    polls_until_mined: u32,
    block_number: u64,
    inclusions: HashMap<TxHash, Inclusion>,
    sent: Vec<SentTransaction>,
    proof_steps: Vec<(f64, Option<String>)>,
    step_delay: Duration,
    failures: Failures,
    calls: CallCounts,
    rng: StdRng,
}

/// An in-memory chain, prover, broadcaster network and key-chain.
#[derive(Debug, Clone)]
pub struct SimulatedChain {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedChain {
    /// an empty chain: no tokens, no broadcasters, zero allowances,
    /// transactions mined on the first poll. the key-chain password is
    /// `password`.
    pub fn new(chain: ChainConfig) -> Self {
        let wrapped = TokenInfo {
            address: chain.wrapped_base_token.clone(),
            symbol: format!("W{}", chain.base_token_symbol),
            decimals: chain.base_token_decimals,
        };
        let state = SimState {
            password: "password".to_string(),
            tokens: HashMap::from([(wrapped.address.clone(), wrapped)]),
            allowances: HashMap::new(),
            approvals: vec![],
            broadcasters: vec![],
            polls_until_mined: 0,
            block_number: 100,
            inclusions: HashMap::new(),
            sent: vec![],
            proof_steps: [0.0, 20.0, 45.0, 70.0, 95.0, 100.0]
                .into_iter()
                .zip([
                    Some("witness"),
                    Some("trace"),
                    None,
                    Some("prove"),
                    None,
                    Some("done"),
                ])
                .map(|(p, l)| (p, l.map(str::to_string)))
                .collect(),
            step_delay: Duration::ZERO,
            failures: Failures::default(),
            calls: CallCounts::default(),
            rng: StdRng::from_seed(rng().random()),
            chain,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// a chain stocked for interactive use: a few tokens, broadcasters for
    /// some of them, slow proving and a short mining delay. the key-chain
    /// password is `demo`.
    pub fn demo(chain: ChainConfig) -> Self {
        let usdc = TokenInfo {
            address: Address::new("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            symbol: "USDC".into(),
            decimals: 6,
        };
        let dai = TokenInfo {
            address: Address::new("0x6b175474e89094c44da98b954eedeac495271d0f"),
            symbol: "DAI".into(),
            decimals: 18,
        };
        let sim = Self::new(chain)
            .with_token(usdc.clone())
            .with_token(dai.clone())
            .with_broadcaster(SelectedBroadcaster {
                broadcaster_address: Address::new("0x0b0a1"),
                fee_token_address: usdc.address.clone(),
                fee_per_unit_gas: 90u64.into(),
                fee_commitment: "usdc-quote-1".into(),
                supports_relay_adapt: false,
            })
            .with_broadcaster(SelectedBroadcaster {
                broadcaster_address: Address::new("0x0b0a2"),
                fee_token_address: usdc.address,
                fee_per_unit_gas: 120u64.into(),
                fee_commitment: "usdc-quote-2".into(),
                supports_relay_adapt: true,
            })
            .with_broadcaster(SelectedBroadcaster {
                broadcaster_address: Address::new("0x0b0a3"),
                fee_token_address: dai.address,
                fee_per_unit_gas: 95_000_000_000_000u64.into(),
                fee_commitment: "dai-quote-1".into(),
                supports_relay_adapt: true,
            });
        {
            let mut state = sim.lock();
            state.password = "demo".to_string();
            state.polls_until_mined = 2;
            state.step_delay = Duration::from_millis(400);
        }
        sim
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_token(self, token: TokenInfo) -> Self {
        self.lock().tokens.insert(token.address.clone(), token);
        self
    }

    pub fn with_broadcaster(self, broadcaster: SelectedBroadcaster) -> Self {
        self.add_broadcaster(broadcaster);
        self
    }

    pub fn add_broadcaster(&self, broadcaster: SelectedBroadcaster) {
        self.lock().broadcasters.push(broadcaster);
    }

    pub fn tokens(&self) -> Vec<TokenInfo> {
        let mut tokens = self.lock().tokens.values().cloned().collect::<Vec<_>>();
        tokens.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tokens
    }

    pub fn set_allowance(&self, token: &Address, owner: &Address, spender: &Address, amount: TokenAmount) {
        self.lock()
            .allowances
            .insert((token.clone(), owner.clone(), spender.clone()), amount);
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> TokenAmount {
        self.lock()
            .allowances
            .get(&(token.clone(), owner.clone(), spender.clone()))
            .cloned()
            .unwrap_or_else(TokenAmount::zero)
    }

    pub fn set_polls_until_mined(&self, polls: u32) {
        self.lock().polls_until_mined = polls;
    }

    pub fn set_step_delay(&self, delay: Duration) {
        self.lock().step_delay = delay;
    }

    /// progress events the prover reports, in order
    pub fn set_proof_steps(&self, steps: Vec<(f64, Option<String>)>) {
        self.lock().proof_steps = steps;
    }

    pub fn inject(&self, f: impl FnOnce(&mut Failures)) {
        f(&mut self.lock().failures);
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn sent(&self) -> Vec<SentTransaction> {
        self.lock().sent.clone()
    }

    fn accept(&self, path: SubmissionPath, to: Address) -> anyhow::Result<TxHash> {
        let mut state = self.lock();
        if state.failures.sends > 0 {
            if state.failures.sends_before_failure > 0 {
                state.failures.sends_before_failure -= 1;
            } else {
                state.failures.sends -= 1;
                bail!("simulated submission failure");
            }
        }
        let bytes: [u8; 32] = state.rng.random();
        let tx_hash = TxHash::new(format!("0x{}", hex(&bytes)));
        let polls_left = state.polls_until_mined;
        state.inclusions.insert(
            tx_hash.clone(),
            Inclusion {
                polls_left,
                block_number: None,
            },
        );
        state.sent.push(SentTransaction {
            tx_hash: tx_hash.clone(),
            path,
            to,
        });
        Ok(tx_hash)
    }

    fn price(&self, intent: TransactionIntent, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate> {
        let mut state = self.lock();
        state.calls.estimates += 1;
        if state.failures.estimate {
            bail!("simulated gas estimation failure");
        }
        if req.payload.is_empty() {
            bail!("nothing to estimate");
        }

        let gas_limit = simulated_gas_limit(intent, req.payload);
        let gas_details = GasDetails {
            evm_gas_type: EvmGasType::Eip1559,
            gas_limit,
            max_fee_per_gas: SIMULATED_GAS_PRICE.into(),
            max_priority_fee_per_gas: Some(1_000_000_000u64.into()),
        };

        Ok(match req.fee_strategy {
            Some(FeeStrategy::Relayed(fee)) => {
                let amount = TokenAmount::from(
                    BigUint::from(gas_limit) * fee.fee_per_unit_gas.as_biguint(),
                );
                GasEstimate {
                    fee_token_symbol: fee.fee_token_symbol.clone(),
                    gas_details,
                    estimated_cost: format!(
                        "{} {}",
                        amount.format_units(fee.fee_token_decimals),
                        fee.fee_token_symbol
                    ),
                    broadcaster_fee_recipient: Some(BroadcasterFeeRecipient {
                        recipient_address: fee.broadcaster_address.clone(),
                        token_address: fee.fee_token_address.clone(),
                        amount,
                    }),
                }
            }
            Some(FeeStrategy::SelfSigned { .. }) | None => {
                let cost = TokenAmount::from(BigUint::from(gas_limit) * SIMULATED_GAS_PRICE);
                GasEstimate {
                    fee_token_symbol: state.chain.base_token_symbol.clone(),
                    gas_details,
                    estimated_cost: format!(
                        "{} {}",
                        cost.format_units(state.chain.base_token_decimals),
                        state.chain.base_token_symbol
                    ),
                    broadcaster_fee_recipient: None,
                }
            }
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn simulated_gas_limit(intent: TransactionIntent, payload: &TransactionPayload) -> u64 {
    let legs = payload.amount_selections().len().max(1) as u64;
    match intent {
        TransactionIntent::Transfer | TransactionIntent::Unshield => 900_000 + 150_000 * legs,
        TransactionIntent::UnshieldBase => 1_100_000,
        TransactionIntent::PrivateSwap => 1_600_000,
        TransactionIntent::Shield => 250_000 + 60_000 * legs,
        TransactionIntent::ShieldBase => 280_000,
        TransactionIntent::PublicTransfer => 65_000 * legs,
        TransactionIntent::PublicBaseTransfer => 21_000 * legs,
        TransactionIntent::PublicSwap => 240_000,
    }
}

#[async_trait::async_trait]
impl AllowanceService for SimulatedChain {
    async fn get_allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> anyhow::Result<TokenAmount> {
        {
            let mut state = self.lock();
            state.calls.allowance_reads += 1;
            if state.failures.allowance_read {
                bail!("simulated allowance read failure");
            }
        }
        Ok(self.allowance(token, owner, spender))
    }

    async fn populate_approval(
        &self,
        token: &Address,
        spender: &Address,
        amount: &TokenAmount,
    ) -> anyhow::Result<UnsignedTransaction> {
        let mut state = self.lock();
        state.calls.approvals_populated += 1;
        let transaction = UnsignedTransaction {
            to: token.clone(),
            data: format!("approve({},{})", spender, amount).into_bytes(),
            value: TokenAmount::zero(),
            gas_details: GasDetails {
                evm_gas_type: EvmGasType::Eip1559,
                gas_limit: APPROVAL_GAS,
                max_fee_per_gas: SIMULATED_GAS_PRICE.into(),
                max_priority_fee_per_gas: Some(1_000_000_000u64.into()),
            },
        };
        state
            .approvals
            .push((transaction.clone(), token.clone(), spender.clone()));
        Ok(transaction)
    }

    async fn estimate_approval(
        &self,
        _signer: &PublicSigner,
        approval: &UnsignedTransaction,
    ) -> anyhow::Result<GasEstimate> {
        let mut state = self.lock();
        state.calls.approval_estimates += 1;
        if state.failures.estimate {
            bail!("simulated gas estimation failure");
        }
        let cost = TokenAmount::from(
            BigUint::from(approval.gas_details.gas_limit) * SIMULATED_GAS_PRICE,
        );
        Ok(GasEstimate {
            fee_token_symbol: state.chain.base_token_symbol.clone(),
            gas_details: approval.gas_details.clone(),
            estimated_cost: format!(
                "{} {}",
                cost.format_units(state.chain.base_token_decimals),
                state.chain.base_token_symbol
            ),
            broadcaster_fee_recipient: None,
        })
    }
}

#[async_trait::async_trait]
impl GasEstimator for SimulatedChain {
    async fn estimate_transfer(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::Transfer, req)
    }

    async fn estimate_unshield(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::Unshield, req)
    }

    async fn estimate_unshield_base(
        &self,
        req: EstimateRequest<'_>,
    ) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::UnshieldBase, req)
    }

    async fn estimate_shield(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::Shield, req)
    }

    async fn estimate_shield_base(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::ShieldBase, req)
    }

    async fn estimate_public_transfer(
        &self,
        req: EstimateRequest<'_>,
    ) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::PublicTransfer, req)
    }

    async fn estimate_public_base_transfer(
        &self,
        req: EstimateRequest<'_>,
    ) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::PublicBaseTransfer, req)
    }

    async fn estimate_public_swap(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::PublicSwap, req)
    }

    async fn estimate_private_swap(
        &self,
        req: EstimateRequest<'_>,
    ) -> anyhow::Result<GasEstimate> {
        self.price(TransactionIntent::PrivateSwap, req)
    }
}

#[async_trait::async_trait]
impl ProvingService for SimulatedChain {
    async fn generate_proof(
        &self,
        request: ProofRequest<'_>,
        progress: ProgressReporter,
    ) -> anyhow::Result<ProvenTransaction> {
        let (steps, delay, fail) = {
            let mut state = self.lock();
            state.calls.proofs += 1;
            (
                state.proof_steps.clone(),
                state.step_delay,
                state.failures.proof,
            )
        };

        let fail_at = steps.len() / 2;
        for (i, (percent, label)) in steps.iter().enumerate() {
            if fail && i == fail_at {
                bail!("simulated prover crash at {}%", percent);
            }
            progress.report(*percent, label.as_deref());
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
        }
        if fail {
            bail!("simulated prover crash");
        }

        let intent = request.intent;
        let digest = request.payload.digest();
        let mut hasher = Sha3_256::new();
        hasher.update(request.encryption_key.expose());
        hasher.update(digest.to_string().as_bytes());
        let data = hasher.finalize().to_vec();

        let to = if intent.uses_relay_adapt() {
            request.chain.relay_adapt_contract.clone()
        } else if intent.requires_proof()
            || matches!(intent, TransactionIntent::Shield | TransactionIntent::ShieldBase)
        {
            request.chain.privacy_pool_contract.clone()
        } else if intent == TransactionIntent::PublicSwap {
            request.chain.swap_spender.clone()
        } else {
            request
                .payload
                .amount_selections()
                .first()
                .map(|s| s.recipient_address.clone())
                .unwrap_or_else(|| request.chain.privacy_pool_contract.clone())
        };

        let (nullifiers, pre_transaction_proofs) = if intent.requires_proof() {
            let legs = request.payload.amount_selections().len().max(1);
            let nullifiers = (0..legs)
                .map(|i| format!("0x{}{:02x}", hex(&data[..8]), i))
                .collect();
            (nullifiers, vec![format!("snark:{}", hex(&data[8..16]))])
        } else {
            (vec![], vec![])
        };

        Ok(ProvenTransaction {
            intent,
            transaction: UnsignedTransaction {
                to,
                data,
                value: TokenAmount::zero(),
                gas_details: request.gas_estimate.gas_details.clone(),
            },
            nullifiers,
            pre_transaction_proofs,
            uses_relay_adapt: intent.uses_relay_adapt(),
            built_from: digest,
        })
    }
}

#[async_trait::async_trait]
impl SubmissionService for SimulatedChain {
    async fn send_self_signed(
        &self,
        signer: &PublicSigner,
        transaction: &UnsignedTransaction,
    ) -> anyhow::Result<TxHash> {
        self.lock().calls.self_signed_sends += 1;
        let tx_hash = self.accept(
            SubmissionPath::SelfSigned {
                signer: signer.address.clone(),
            },
            transaction.to.clone(),
        )?;

        let mut state = self.lock();
        if let Some(index) = state.approvals.iter().position(|(tx, _, _)| tx == transaction) {
            let (_, token, spender) = state.approvals.remove(index);
            state.allowances.insert(
                (token, signer.address.clone(), spender),
                TokenAmount::max_uint256(),
            );
        }
        Ok(tx_hash)
    }

    async fn transaction_status(&self, tx_hash: &TxHash) -> anyhow::Result<TxStatus> {
        let mut state = self.lock();
        state.calls.status_polls += 1;
        if state.failures.status {
            bail!("simulated provider failure");
        }
        let revert = state.failures.revert;
        let next_block = state.block_number + 1;

        let Some(inclusion) = state.inclusions.get_mut(tx_hash) else {
            bail!("unknown transaction {}", tx_hash);
        };
        if let Some(block_number) = inclusion.block_number {
            return Ok(if revert {
                TxStatus::Reverted { block_number }
            } else {
                TxStatus::Mined { block_number }
            });
        }
        if inclusion.polls_left > 0 {
            inclusion.polls_left -= 1;
            return Ok(TxStatus::Pending);
        }
        inclusion.block_number = Some(next_block);
        state.block_number = next_block;
        Ok(if revert {
            TxStatus::Reverted {
                block_number: next_block,
            }
        } else {
            TxStatus::Mined {
                block_number: next_block,
            }
        })
    }
}

#[async_trait::async_trait]
impl BroadcasterTransport for SimulatedChain {
    async fn find_best_broadcaster(
        &self,
        chain_id: ChainId,
        fee_token: &Address,
        requires_relay_adapt: bool,
        excluded: &[Address],
    ) -> anyhow::Result<Option<SelectedBroadcaster>> {
        let mut state = self.lock();
        state.calls.broadcaster_lookups += 1;
        if state.failures.broadcaster_lookup {
            bail!("simulated broadcaster network failure");
        }
        if chain_id != state.chain.chain_id {
            return Ok(None);
        }
        Ok(state
            .broadcasters
            .iter()
            .filter(|b| &b.fee_token_address == fee_token)
            .filter(|b| b.supports_relay_adapt || !requires_relay_adapt)
            .filter(|b| !excluded.contains(&b.broadcaster_address))
            .min_by(|a, b| a.fee_per_unit_gas.cmp(&b.fee_per_unit_gas))
            .cloned())
    }

    async fn send(&self, request: RelayRequest) -> anyhow::Result<TxHash> {
        {
            let mut state = self.lock();
            state.calls.relayed_sends += 1;
            if !state
                .broadcasters
                .iter()
                .any(|b| b.broadcaster_address == request.broadcaster_address)
            {
                bail!("broadcaster {} is offline", request.broadcaster_address);
            }
        }
        self.accept(
            SubmissionPath::Relayed {
                broadcaster: request.broadcaster_address,
                nullifiers: request.nullifiers.len(),
            },
            request.transaction.to,
        )
    }
}

#[async_trait::async_trait]
impl KeyChain for SimulatedChain {
    async fn unlock(&self, password: &str) -> anyhow::Result<EncryptionKey> {
        let mut state = self.lock();
        state.calls.unlocks += 1;
        if password != state.password {
            bail!("wrong password");
        }
        Ok(EncryptionKey::new(
            Sha3_256::digest(password.as_bytes()).to_vec(),
        ))
    }
}

#[async_trait::async_trait]
impl BalanceScanner for SimulatedChain {
    async fn reset_scan_state(&self, _chain: &ChainConfig) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.calls.scan_resets += 1;
        if state.failures.scan_reset {
            bail!("simulated scanner failure");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenMetadata for SimulatedChain {
    async fn token_info(&self, _chain_id: ChainId, token: &Address) -> anyhow::Result<TokenInfo> {
        let mut state = self.lock();
        state.calls.token_lookups += 1;
        match state.tokens.get(token) {
            Some(info) => Ok(info.clone()),
            None => bail!("unknown token {}", token),
        }
    }
}

/// One scripted answer of a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Action(MenuAction),
    Amounts(Option<Vec<AmountSelection>>),
    Swap(Option<SwapSelection>),
    Password(Option<String>),
    Confirm(bool),
    FeeMode(Option<FeeMode>),
    FeeToken(Option<Address>),
    Broadcaster(bool),
    /// index into the signer list
    Signer(Option<usize>),
}

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<Answer>,
    menus: Vec<Menu>,
    notifications: Vec<String>,
    progress: Vec<ProofProgress>,
    confirmations: Vec<String>,
    offers: Vec<SelectedBroadcaster>,
}

/// A prompter answering from a queue, recording what it was shown.
///
/// An answer of the wrong kind, or an exhausted queue, is an error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        let prompter = Self::default();
        prompter.lock().answers.extend(answers);
        prompter
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, answer: Answer) {
        self.lock().answers.push_back(answer);
    }

    pub fn remaining(&self) -> usize {
        self.lock().answers.len()
    }

    pub fn menus(&self) -> Vec<Menu> {
        self.lock().menus.clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.lock().notifications.clone()
    }

    pub fn progress(&self) -> Vec<ProofProgress> {
        self.lock().progress.clone()
    }

    /// the messages of every `confirm` prompt shown
    pub fn confirmations(&self) -> Vec<String> {
        self.lock().confirmations.clone()
    }

    /// the broadcaster offers shown
    pub fn offers(&self) -> Vec<SelectedBroadcaster> {
        self.lock().offers.clone()
    }

    fn next(&self, expected: &str) -> anyhow::Result<Answer> {
        match self.lock().answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("script exhausted while waiting for {}", expected),
        }
    }
}

#[async_trait::async_trait]
impl Prompter for ScriptedPrompter {
    async fn select_action(&self, menu: &Menu) -> anyhow::Result<MenuAction> {
        self.lock().menus.push(menu.clone());
        match self.next("menu action")? {
            Answer::Action(action) if menu.is_enabled(action) => Ok(action),
            Answer::Action(action) => bail!("scripted action {} is disabled", action),
            other => bail!("expected a menu action, got {:?}", other),
        }
    }

    async fn select_amounts(
        &self,
        _intent: TransactionIntent,
    ) -> anyhow::Result<Option<Vec<AmountSelection>>> {
        match self.next("amounts")? {
            Answer::Amounts(amounts) => Ok(amounts),
            other => bail!("expected amounts, got {:?}", other),
        }
    }

    async fn select_swap(&self, _intent: TransactionIntent) -> anyhow::Result<Option<SwapSelection>> {
        match self.next("swap")? {
            Answer::Swap(swap) => Ok(swap),
            other => bail!("expected a swap, got {:?}", other),
        }
    }

    async fn password(&self, _prompt: &str) -> anyhow::Result<Option<Zeroizing<String>>> {
        match self.next("password")? {
            Answer::Password(password) => Ok(password.map(Zeroizing::new)),
            other => bail!("expected a password, got {:?}", other),
        }
    }

    async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        self.lock().confirmations.push(message.to_string());
        match self.next("confirmation")? {
            Answer::Confirm(yes) => Ok(yes),
            other => bail!("expected a confirmation, got {:?}", other),
        }
    }

    async fn select_fee_mode(&self, modes: &[FeeMode]) -> anyhow::Result<Option<FeeMode>> {
        match self.next("fee mode")? {
            Answer::FeeMode(Some(mode)) if !modes.contains(&mode) => {
                bail!("fee mode {} was not offered", mode)
            }
            Answer::FeeMode(mode) => Ok(mode),
            other => bail!("expected a fee mode, got {:?}", other),
        }
    }

    async fn select_fee_token(&self, _chain: &ChainConfig) -> anyhow::Result<Option<Address>> {
        match self.next("fee token")? {
            Answer::FeeToken(token) => Ok(token),
            other => bail!("expected a fee token, got {:?}", other),
        }
    }

    async fn confirm_broadcaster(
        &self,
        offer: &SelectedBroadcaster,
        _fee_token: &TokenInfo,
    ) -> anyhow::Result<bool> {
        self.lock().offers.push(offer.clone());
        match self.next("broadcaster confirmation")? {
            Answer::Broadcaster(yes) => Ok(yes),
            other => bail!("expected a broadcaster confirmation, got {:?}", other),
        }
    }

    async fn select_signer(
        &self,
        signers: &[PublicSigner],
    ) -> anyhow::Result<Option<PublicSigner>> {
        match self.next("signer")? {
            Answer::Signer(Some(index)) => match signers.get(index) {
                Some(signer) => Ok(Some(signer.clone())),
                None => bail!("no signer at index {}", index),
            },
            Answer::Signer(None) => Ok(None),
            other => bail!("expected a signer, got {:?}", other),
        }
    }

    fn show_progress(&self, progress: &ProofProgress) {
        self.lock().progress.push(progress.clone());
    }

    fn notify(&self, message: &str) {
        self.lock().notifications.push(message.to_string());
    }
}
